//! mindcity.eeg_message.v1 schema definition
//!
//! Messages are adjacently tagged:
//! - `{"type": "summary", "data": {...}}` aggregated metrics and mental state
//! - `{"type": "real_time", "data": {...}}` raw electrode readings for charting
//!
//! The acquisition backend also emits real-time frames flat, as
//! `{"type": "real_time", "metrics": {...}, "timestamp": ...}`. Both forms decode
//! to [`EegMessage::RealTime`]; encoding always uses the `data` envelope.

use crate::error::ComputeError;
use crate::types::{Channel, FeedbackSummary, MentalStateSample, MetricsSample, RawMentalState};
use crate::validate::{require_channel, require_finite};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current schema version
pub const SCHEMA_VERSION: &str = "mindcity.eeg_message.v1";

/// Channels a summary must carry for both classification and scoring
pub const REQUIRED_CHANNELS: [Channel; 4] = [
    Channel::EngagementIndex,
    Channel::MindfulnessIndex,
    Channel::ArousalIndex,
    Channel::FrustrationIndex,
];

/// Electrodes reported in real-time frames (14-channel headset layout)
pub const ELECTRODES: [&str; 14] = [
    "AF3", "F7", "F3", "FC5", "T7", "P7", "O1", "O2", "P8", "T8", "FC6", "F4", "F8", "AF4",
];

/// One message from the metrics stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "snake_case",
    try_from = "WireMessage"
)]
pub enum EegMessage {
    Summary(SummaryPayload),
    RealTime(RealtimeFrame),
}

/// Decoding form accepting both real-time layouts
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireMessage {
    Summary {
        data: SummaryPayload,
    },
    RealTime {
        #[serde(default)]
        data: Option<RealtimeFrame>,
        #[serde(default)]
        metrics: Option<MetricsSample>,
        #[serde(default)]
        timestamp: Option<f64>,
    },
}

impl TryFrom<WireMessage> for EegMessage {
    type Error = String;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        match wire {
            WireMessage::Summary { data } => Ok(EegMessage::Summary(data)),
            WireMessage::RealTime {
                data: Some(frame), ..
            } => Ok(EegMessage::RealTime(frame)),
            WireMessage::RealTime {
                data: None,
                metrics: Some(metrics),
                timestamp: Some(timestamp),
            } => Ok(EegMessage::RealTime(RealtimeFrame {
                timestamp,
                channels: BTreeMap::new(),
                metrics: Some(metrics),
            })),
            WireMessage::RealTime { .. } => Err(
                "real_time message needs a `data` object or top-level `metrics` and `timestamp`"
                    .to_string(),
            ),
        }
    }
}

impl EegMessage {
    pub fn type_name(&self) -> &'static str {
        match self {
            EegMessage::Summary(_) => "summary",
            EegMessage::RealTime(_) => "real_time",
        }
    }

    /// Validate the message payload
    pub fn validate(&self) -> Result<(), ComputeError> {
        match self {
            EegMessage::Summary(payload) => payload.validate().map(|_| ()),
            EegMessage::RealTime(frame) => frame.validate(),
        }
    }
}

/// Summary payload as it appears on the wire
///
/// `metrics` and `mental_state` default to empty so that an absent block is reported
/// as invalid input by [`SummaryPayload::validate`] rather than as a JSON error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryPayload {
    #[serde(default)]
    pub metrics: MetricsSample,
    #[serde(default)]
    pub mental_state: RawMentalState,
    /// Unix timestamp in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations_analyzed: Option<u32>,
}

impl SummaryPayload {
    /// Validate into a [`FeedbackSummary`].
    ///
    /// A missing timestamp defaults to now; missing `iterations_analyzed` to 0.
    pub fn validate(&self) -> Result<FeedbackSummary, ComputeError> {
        let mental_state = MentalStateSample::try_from(&self.mental_state)?;

        for channel in REQUIRED_CHANNELS {
            require_channel(&self.metrics, channel)?;
        }

        let timestamp = match self.timestamp {
            Some(ts) if !ts.is_finite() => return Err(ComputeError::non_finite("timestamp", ts)),
            Some(ts) => ts,
            None => unix_now(),
        };

        Ok(FeedbackSummary {
            metrics: self.metrics.clone(),
            mental_state,
            timestamp,
            iterations_analyzed: self.iterations_analyzed.unwrap_or(0),
        })
    }
}

impl From<&FeedbackSummary> for SummaryPayload {
    fn from(summary: &FeedbackSummary) -> Self {
        Self {
            metrics: summary.metrics.clone(),
            mental_state: RawMentalState::from(&summary.mental_state),
            timestamp: Some(summary.timestamp),
            iterations_analyzed: Some(summary.iterations_analyzed),
        }
    }
}

/// Readings at one instant: electrode values, per-epoch metrics, or both
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeFrame {
    pub timestamp: f64,
    #[serde(default)]
    pub channels: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsSample>,
}

impl RealtimeFrame {
    /// Timestamp and every metric that is present must be finite
    pub fn validate(&self) -> Result<(), ComputeError> {
        if !self.timestamp.is_finite() {
            return Err(ComputeError::non_finite("timestamp", self.timestamp));
        }
        if let Some(metrics) = &self.metrics {
            for channel in Channel::ALL {
                if let Some(value) = metrics.get(channel) {
                    require_finite(&format!("metrics.{}", channel.as_str()), Some(value))?;
                }
            }
        }
        Ok(())
    }
}

/// Current time as fractional unix seconds
pub(crate) fn unix_now() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}
