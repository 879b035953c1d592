//! Score normalization
//!
//! This module converts four cognitive metrics into a 1-10 preference score:
//! - Weighted linear combination of the metrics
//! - Clamp into the expected raw range [-1, 2]
//! - Linear rescale onto [1, 10], rounded half away from zero

use crate::error::ComputeError;
use crate::types::{Channel, MetricsSample, PreferenceScore};
use crate::validate::{clamp_range, require_channel};

pub const ENGAGEMENT_WEIGHT: f64 = 0.4;
pub const MINDFULNESS_WEIGHT: f64 = 0.4;
pub const AROUSAL_WEIGHT: f64 = 0.2;
pub const FRUSTRATION_WEIGHT: f64 = 0.3;

/// Lower bound of the raw score range mapped onto the scale
pub const MIN_EXPECTED_RAW: f64 = -1.0;

/// Upper bound of the raw score range mapped onto the scale
pub const MAX_EXPECTED_RAW: f64 = 2.0;

/// Weighted sum of the scoring channels, before clamping.
///
/// Frustration counts against the score.
pub fn raw_score(metrics: &MetricsSample) -> Result<f64, ComputeError> {
    let engagement = require_channel(metrics, Channel::EngagementIndex)?;
    let mindfulness = require_channel(metrics, Channel::MindfulnessIndex)?;
    let arousal = require_channel(metrics, Channel::ArousalIndex)?;
    let frustration = require_channel(metrics, Channel::FrustrationIndex)?;

    Ok(ENGAGEMENT_WEIGHT * engagement
        + MINDFULNESS_WEIGHT * mindfulness
        + AROUSAL_WEIGHT * arousal
        - FRUSTRATION_WEIGHT * frustration)
}

/// Compute the 1-10 preference score for a metrics sample.
///
/// Requires finite `engagement_index`, `mindfulness_index`, `arousal_index` and
/// `frustration_index`. The result is always within `[1, 10]`.
pub fn compute_score(metrics: &MetricsSample) -> Result<PreferenceScore, ComputeError> {
    let raw = raw_score(metrics)?;
    Ok(scale_raw_score(raw))
}

/// Map a raw score onto the 1-10 scale; infinities clamp to the ends
fn scale_raw_score(raw: f64) -> PreferenceScore {
    let clamped = clamp_range(raw, MIN_EXPECTED_RAW, MAX_EXPECTED_RAW);
    let span = MAX_EXPECTED_RAW - MIN_EXPECTED_RAW;
    let steps = f64::from(PreferenceScore::MAX - PreferenceScore::MIN);
    let normalized = ((clamped - MIN_EXPECTED_RAW) / span) * steps + f64::from(PreferenceScore::MIN);

    let bounded = clamp_range(
        normalized,
        f64::from(PreferenceScore::MIN),
        f64::from(PreferenceScore::MAX),
    );

    PreferenceScore::saturating(bounded.round() as u8)
}
