//! Pipeline orchestration
//!
//! This module provides the public API for Mind City Flux. It takes summaries
//! from wire JSON or from the rolling tracker through classification and scoring
//! to an encoded assessment.

use crate::config::EngineConfig;
use crate::encoder::{encode_json, AssessmentEncoder};
use crate::error::ComputeError;
use crate::features::{BandPowers, FeatureDeriver};
use crate::schema::{unix_now, EegMessage, SchemaAdapter};
use crate::tracker::MetricsTracker;
use crate::types::{Assessment, FeedbackSummary, MetricsSample};
use tracing::{debug, trace, warn};

/// Assess one summary payload and return the assessment as pretty JSON.
///
/// `summary_json` is the `data` object of a `summary` message.
///
/// # Example
/// ```ignore
/// let assessment_json = assess_summary(summary_json)?;
/// ```
pub fn assess_summary(summary_json: String) -> Result<String, ComputeError> {
    let payload = SchemaAdapter::parse_summary(&summary_json)?;
    let summary = payload.validate()?;
    AssessmentEncoder::new().assess_to_json(&summary)
}

/// Stateful processor owning a metrics tracker and an encoder.
///
/// Use this for a live session: feed it messages or per-epoch samples and it
/// produces an assessment whenever a summary is available.
pub struct FeedbackProcessor {
    tracker: MetricsTracker,
    encoder: AssessmentEncoder,
}

impl Default for FeedbackProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackProcessor {
    /// Create a new processor with default settings
    pub fn new() -> Self {
        Self {
            tracker: MetricsTracker::default(),
            encoder: AssessmentEncoder::new(),
        }
    }

    /// Create a processor summarizing every `interval` samples
    pub fn with_interval(interval: usize) -> Self {
        Self {
            tracker: MetricsTracker::new(interval),
            encoder: AssessmentEncoder::new(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let encoder = match &config.instance_id {
            Some(id) => AssessmentEncoder::with_instance_id(id.clone()),
            None => AssessmentEncoder::new(),
        };
        Self {
            tracker: MetricsTracker::new(config.summary_interval),
            encoder,
        }
    }

    pub fn tracker(&self) -> &MetricsTracker {
        &self.tracker
    }

    pub fn instance_id(&self) -> &str {
        self.encoder.instance_id()
    }

    /// Classify, score and encode a validated summary
    pub fn assess(&self, summary: &FeedbackSummary) -> Result<Assessment, ComputeError> {
        let assessment = self.encoder.assess(summary)?;
        debug!(
            is_positive = assessment.verdict.is_positive,
            reason = ?assessment.verdict.reason,
            score = assessment.score.get(),
            iterations = summary.iterations_analyzed,
            "summary assessed"
        );
        Ok(assessment)
    }

    /// Decode and handle one wire message.
    ///
    /// Summaries yield an assessment; real-time frames are validated and ignored.
    pub fn process_message(&mut self, json: &str) -> Result<Option<Assessment>, ComputeError> {
        let message: EegMessage = serde_json::from_str(json)?;
        self.handle_message(&message)
    }

    /// Handle an already-decoded message
    pub fn handle_message(
        &mut self,
        message: &EegMessage,
    ) -> Result<Option<Assessment>, ComputeError> {
        match message {
            EegMessage::Summary(payload) => {
                let summary = payload.validate()?;
                self.assess(&summary).map(Some)
            }
            EegMessage::RealTime(frame) => {
                frame.validate()?;
                trace!(
                    timestamp = frame.timestamp,
                    channels = frame.channels.len(),
                    has_metrics = frame.metrics.is_some(),
                    "real-time frame ignored"
                );
                Ok(None)
            }
        }
    }

    /// Like [`process_message`](Self::process_message), encoding the result to JSON
    pub fn process_message_json(&mut self, json: &str) -> Result<Option<String>, ComputeError> {
        self.process_message(json)?
            .map(|assessment| encode_json(&assessment))
            .transpose()
    }

    /// Track one per-epoch sample; returns an assessment at each summary boundary.
    ///
    /// A rejected sample leaves the tracker unchanged.
    pub fn ingest_metrics(
        &mut self,
        sample: &MetricsSample,
    ) -> Result<Option<Assessment>, ComputeError> {
        self.tracker.add_metrics(sample)?;

        if !self.tracker.should_summarize() {
            return Ok(None);
        }

        debug!(
            iterations = self.tracker.iterations(),
            window = self.tracker.len(),
            "summary boundary reached"
        );
        let summary = self.tracker.summarize(unix_now())?;
        self.assess(&summary).map(Some)
    }

    /// Derive metrics from band powers, then track them
    pub fn ingest_band_powers(
        &mut self,
        bands: &BandPowers,
    ) -> Result<Option<Assessment>, ComputeError> {
        let sample = FeatureDeriver::derive(bands)?;
        self.ingest_metrics(&sample)
    }

    /// Load tracker state from JSON.
    ///
    /// The loaded state keeps its own interval; a state that fails validation
    /// leaves the current tracker in place.
    pub fn load_tracker(&mut self, json: &str) -> Result<(), ComputeError> {
        let loaded =
            MetricsTracker::from_json(json).map_err(|e| ComputeError::ParseError(e.to_string()))?;
        if loaded.interval() != self.tracker.interval() {
            warn!(
                configured = self.tracker.interval(),
                loaded = loaded.interval(),
                "loaded tracker state overrides the summary interval"
            );
        }
        self.tracker = loaded;
        Ok(())
    }

    /// Save tracker state to JSON
    pub fn save_tracker(&self) -> Result<String, ComputeError> {
        self.tracker
            .to_json()
            .map_err(|e| ComputeError::EncodingError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Channel, NextAction, Reason};

    fn sample_summary_json() -> &'static str {
        r#"{
            "metrics": {
                "alpha_relaxation": 0.7,
                "beta_concentration": 0.6,
                "theta_relaxation": 0.5,
                "engagement_index": 0.05,
                "arousal_index": 0.4,
                "frustration_index": 1.8,
                "mindfulness_index": 3.0
            },
            "mental_state": {
                "relaxation": "Low",
                "concentration": "low",
                "calm": "low",
                "engagement": "low",
                "arousal": "medium",
                "frustration": "HIGH",
                "mindfulness": "low"
            },
            "timestamp": 1705327200.0,
            "iterations_analyzed": 50
        }"#
    }

    fn uniform_sample(value: f64) -> MetricsSample {
        Channel::ALL
            .into_iter()
            .fold(MetricsSample::default(), |s, c| s.with(c, value))
    }

    #[test]
    fn test_assess_summary() {
        let json = assess_summary(sample_summary_json().to_string()).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(payload["assessment_version"], "1.0.0");
        assert_eq!(payload["producer"]["name"], "mindcity-flux");
        assert_eq!(payload["iterations_analyzed"], 50);
        assert_eq!(payload["verdict"]["is_positive"], false);
        assert_eq!(payload["verdict"]["reason"], "frustrated");
        assert_eq!(payload["verdict"]["next_action"], "different_city");
        assert_eq!(
            payload["verdict"]["action_text"],
            "Showing a different city - You seemed frustrated viewing this city"
        );
        // raw = 0.02 + 1.2 + 0.08 - 0.54 = 0.76 -> 6.28 -> 6
        assert_eq!(payload["score"], 6);
    }

    #[test]
    fn test_assess_summary_rejects_missing_metrics() {
        let err = assess_summary(r#"{"mental_state": {}}"#.to_string()).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_invalid_json() {
        let err = assess_summary("not valid json".to_string()).unwrap_err();
        assert!(matches!(err, ComputeError::JsonError(_)));
    }

    #[test]
    fn test_process_message_summary_and_realtime() {
        let mut processor = FeedbackProcessor::new();

        let realtime = r#"{"type": "real_time", "data": {"timestamp": 1.5, "channels": {"AF3": 4.2}}}"#;
        assert!(processor.process_message(realtime).unwrap().is_none());

        let summary = format!(r#"{{"type": "summary", "data": {}}}"#, sample_summary_json());
        let assessment = processor.process_message(&summary).unwrap().unwrap();
        assert_eq!(assessment.verdict.reason, Reason::Frustrated);
        assert_eq!(assessment.verdict.next_action, NextAction::DifferentCity);
        assert_eq!(assessment.producer.instance_id, processor.instance_id());
    }

    #[test]
    fn test_process_message_backend_realtime_frame() {
        let mut processor = FeedbackProcessor::with_interval(1);
        let frame = r#"{"type": "real_time", "metrics": {"alpha_relaxation": 1.1, "beta_concentration": 0.9, "theta_relaxation": 0.7, "engagement_index": 0.45, "arousal_index": 0.8, "frustration_index": 1.3, "mindfulness_index": 6.2}, "timestamp": 1717171717.2}"#;

        assert!(processor.process_message(frame).unwrap().is_none());
        assert!(processor.process_message_json(frame).unwrap().is_none());
        // Real-time frames never feed the tracker
        assert!(processor.tracker().is_empty());
    }

    #[test]
    fn test_process_message_json() {
        let mut processor = FeedbackProcessor::new();
        let summary = format!(r#"{{"type": "summary", "data": {}}}"#, sample_summary_json());

        let json = processor.process_message_json(&summary).unwrap().unwrap();
        let decoded: Assessment = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.score.get(), 6);
    }

    #[test]
    fn test_tracker_driven_assessments() {
        let mut processor = FeedbackProcessor::with_interval(3);

        let mut emitted = Vec::new();
        for i in 0..7 {
            if let Some(a) = processor.ingest_metrics(&uniform_sample(2.0)).unwrap() {
                emitted.push((i, a));
            }
        }

        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[0].0, 2);
        assert_eq!(emitted[1].0, 5);

        let assessment = &emitted[0].1;
        assert_eq!(assessment.iterations_analyzed, 3);
        assert!(assessment.verdict.is_positive);
        assert_eq!(assessment.verdict.reason, Reason::Relaxed);
    }

    #[test]
    fn test_ingest_band_powers() {
        let mut processor = FeedbackProcessor::with_interval(1);
        let bands = BandPowers {
            delta: 2.0,
            theta: 1.0,
            alpha: 4.0,
            beta: 3.0,
        };

        let assessment = processor.ingest_band_powers(&bands).unwrap().unwrap();
        assert_eq!(assessment.iterations_analyzed, 1);
        assert_eq!(processor.tracker().iterations(), 1);
    }

    #[test]
    fn test_failed_ingest_leaves_tracker_untouched() {
        let mut processor = FeedbackProcessor::with_interval(1);
        let err = processor
            .ingest_metrics(&MetricsSample::scoring(0.5, 1.0, 0.3, 0.2))
            .unwrap_err();

        assert!(err.is_invalid_input());
        assert!(processor.tracker().is_empty());
    }

    #[test]
    fn test_tracker_serialization() {
        let mut processor = FeedbackProcessor::with_interval(4);
        processor.ingest_metrics(&uniform_sample(1.2)).unwrap();
        processor.ingest_metrics(&uniform_sample(1.2)).unwrap();

        let saved = processor.save_tracker().unwrap();

        let mut restored = FeedbackProcessor::new();
        restored.load_tracker(&saved).unwrap();
        assert_eq!(restored.tracker().interval(), 4);

        // Two more samples complete the window begun before the save
        assert!(restored.ingest_metrics(&uniform_sample(1.2)).unwrap().is_none());
        let assessment = restored.ingest_metrics(&uniform_sample(1.2)).unwrap();
        assert_eq!(assessment.unwrap().iterations_analyzed, 4);
    }

    #[test]
    fn test_from_config() {
        let config = EngineConfig {
            summary_interval: 5,
            instance_id: Some("kiosk-1".to_string()),
            ..EngineConfig::default()
        };
        let processor = FeedbackProcessor::from_config(&config);

        assert_eq!(processor.tracker().interval(), 5);
        assert_eq!(processor.instance_id(), "kiosk-1");
    }

    #[test]
    fn test_load_tracker_rejects_garbage() {
        let mut processor = FeedbackProcessor::new();
        let err = processor.load_tracker("{}").unwrap_err();
        assert!(matches!(err, ComputeError::ParseError(_)));
    }

    #[test]
    fn test_load_tracker_rejects_zero_interval() {
        let mut processor = FeedbackProcessor::with_interval(2);
        let err = processor
            .load_tracker(r#"{"window":[],"interval":0,"iterations":0}"#)
            .unwrap_err();
        assert!(matches!(err, ComputeError::ParseError(_)));

        // Current tracker survives and keeps summarizing
        assert_eq!(processor.tracker().interval(), 2);
        assert!(processor.ingest_metrics(&uniform_sample(1.0)).unwrap().is_none());
        assert!(processor.ingest_metrics(&uniform_sample(1.0)).unwrap().is_some());
    }

    #[test]
    fn test_loaded_interval_replaces_configured_one() {
        let mut source = FeedbackProcessor::with_interval(4);
        source.ingest_metrics(&uniform_sample(1.0)).unwrap();
        let saved = source.save_tracker().unwrap();

        let mut processor = FeedbackProcessor::with_interval(10);
        processor.load_tracker(&saved).unwrap();
        assert_eq!(processor.tracker().interval(), 4);
        assert_eq!(processor.tracker().iterations(), 1);
    }
}
