//! Assessment encoding
//!
//! This module combines a summary's verdict and score into a versioned assessment
//! payload and serializes it to JSON.

use crate::classifier::classify_feedback;
use crate::error::ComputeError;
use crate::normalizer::{compute_score, raw_score};
use crate::types::{
    Assessment, AssessmentProducer, AssessmentVerdict, FeedbackSummary, FeedbackVerdict,
};
use crate::{ENGINE_VERSION, PRODUCER_NAME};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Current assessment schema version
pub const ASSESSMENT_VERSION: &str = "1.0.0";

/// Assessment encoder for producing versioned JSON payloads
pub struct AssessmentEncoder {
    instance_id: String,
}

impl Default for AssessmentEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AssessmentEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Classify and score a summary, then build the assessment.
    ///
    /// Either both units succeed or no assessment is produced.
    pub fn assess(&self, summary: &FeedbackSummary) -> Result<Assessment, ComputeError> {
        let verdict = classify_feedback(&summary.mental_state, &summary.metrics)?;
        let score = compute_score(&summary.metrics)?;
        let raw = raw_score(&summary.metrics)?;

        let computed_at = Utc::now();
        let observed_at = observed_at(summary.timestamp)?;

        Ok(Assessment {
            assessment_version: ASSESSMENT_VERSION.to_string(),
            producer: AssessmentProducer {
                name: PRODUCER_NAME.to_string(),
                version: ENGINE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            observed_at_utc: observed_at.to_rfc3339(),
            computed_at_utc: computed_at.to_rfc3339(),
            freshness_sec: (computed_at - observed_at).num_seconds(),
            iterations_analyzed: summary.iterations_analyzed,
            verdict: build_verdict(&verdict),
            score,
            raw_score: raw,
        })
    }

    /// Assess and encode to a pretty-printed JSON string
    pub fn assess_to_json(&self, summary: &FeedbackSummary) -> Result<String, ComputeError> {
        let assessment = self.assess(summary)?;
        encode_json(&assessment)
    }
}

/// Serialize an assessment to pretty JSON
pub fn encode_json(assessment: &Assessment) -> Result<String, ComputeError> {
    serde_json::to_string_pretty(assessment).map_err(|e| ComputeError::EncodingError(e.to_string()))
}

fn build_verdict(verdict: &FeedbackVerdict) -> AssessmentVerdict {
    AssessmentVerdict {
        is_positive: verdict.is_positive,
        reason: verdict.reason,
        message: verdict.reason.message().to_string(),
        next_action: verdict.next_action(),
        action_text: verdict.action_text(),
        indicators: verdict.indicators,
    }
}

/// Convert fractional unix seconds to a UTC timestamp
fn observed_at(timestamp: f64) -> Result<DateTime<Utc>, ComputeError> {
    let millis = (timestamp * 1000.0).round();
    if !millis.is_finite() || millis.abs() > i64::MAX as f64 {
        return Err(ComputeError::non_finite("timestamp", timestamp));
    }
    DateTime::<Utc>::from_timestamp_millis(millis as i64).ok_or_else(|| {
        ComputeError::InvalidInput(format!("timestamp {timestamp} is out of range"))
    })
}
