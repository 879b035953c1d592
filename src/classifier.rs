//! Feedback classification
//!
//! Decides whether a subject liked the city on screen from one summary:
//! - mental-state labels counted towards a positive reaction
//! - three metric thresholds (frustration, engagement, mindfulness)
//! - an ordered reason cascade for the user-facing message
//!
//! The verdict is a plain disjunction of independent predicates. Any one of them
//! makes the verdict positive, including high mindfulness on its own.

use crate::error::ComputeError;
use crate::types::{
    Channel, FeedbackIndicators, FeedbackVerdict, Level, MentalStateSample, MetricsSample, Reason,
};
use crate::validate::require_channel;

/// Minimum number of `high`/`medium` dimensions for a positive verdict
pub const POSITIVE_STATE_THRESHOLD: usize = 4;

/// `frustration_index` strictly below this counts as low frustration
pub const LOW_FRUSTRATION_BELOW: f64 = 1.0;

/// `engagement_index` strictly above this counts as high engagement
pub const HIGH_ENGAGEMENT_ABOVE: f64 = 0.4;

/// `mindfulness_index` strictly above this makes the verdict positive
pub const HIGH_MINDFULNESS_ABOVE: f64 = 15.0;

/// `mindfulness_index` above this earns the mindful-attention message
pub const MINDFUL_ATTENTION_ABOVE: f64 = 20.0;

/// `engagement_index` below this earns the failed-to-engage message
pub const FAILED_ENGAGEMENT_BELOW: f64 = 0.1;

/// Inputs visible to the reason cascade
struct Evidence<'a> {
    state: &'a MentalStateSample,
    engagement: f64,
    mindfulness: f64,
}

type Rule = (fn(&Evidence<'_>) -> bool, Reason);

const POSITIVE_RULES: &[Rule] = &[
    (relaxed, Reason::Relaxed),
    (engaged, Reason::Engaged),
    (mindful_attention, Reason::MindfulAttention),
];

const NEGATIVE_RULES: &[Rule] = &[
    (frustrated, Reason::Frustrated),
    (disinterested, Reason::Disinterested),
    (failed_to_engage, Reason::FailedToEngage),
];

fn relaxed(e: &Evidence<'_>) -> bool {
    e.state.relaxation == Level::High
}

fn engaged(e: &Evidence<'_>) -> bool {
    e.state.engagement == Level::High
}

fn mindful_attention(e: &Evidence<'_>) -> bool {
    e.mindfulness > MINDFUL_ATTENTION_ABOVE
}

fn frustrated(e: &Evidence<'_>) -> bool {
    e.state.frustration == Level::High
}

fn disinterested(e: &Evidence<'_>) -> bool {
    e.state.relaxation == Level::Low && e.state.concentration == Level::Low
}

fn failed_to_engage(e: &Evidence<'_>) -> bool {
    e.engagement < FAILED_ENGAGEMENT_BELOW
}

/// First matching rule wins; `fallback` when none match
fn first_match(rules: &[Rule], evidence: &Evidence<'_>, fallback: Reason) -> Reason {
    rules
        .iter()
        .find(|(applies, _)| applies(evidence))
        .map(|(_, reason)| *reason)
        .unwrap_or(fallback)
}

/// Classify one summary as a positive or negative reaction.
///
/// Requires finite `frustration_index`, `engagement_index` and `mindfulness_index`;
/// anything else in `metrics` is ignored.
///
/// # Example
/// ```
/// use mindcity_flux::classifier::classify_feedback;
/// use mindcity_flux::types::{Level, MentalStateSample, MetricsSample, Reason};
///
/// let metrics = MetricsSample {
///     frustration_index: Some(0.1),
///     engagement_index: Some(0.5),
///     mindfulness_index: Some(5.0),
///     ..Default::default()
/// };
/// let verdict = classify_feedback(&MentalStateSample::uniform(Level::High), &metrics).unwrap();
/// assert!(verdict.is_positive);
/// assert_eq!(verdict.reason, Reason::Relaxed);
/// ```
pub fn classify_feedback(
    mental_state: &MentalStateSample,
    metrics: &MetricsSample,
) -> Result<FeedbackVerdict, ComputeError> {
    let frustration = require_channel(metrics, Channel::FrustrationIndex)?;
    let engagement = require_channel(metrics, Channel::EngagementIndex)?;
    let mindfulness = require_channel(metrics, Channel::MindfulnessIndex)?;

    let indicators = FeedbackIndicators {
        positive_states: mental_state.elevated_count(),
        low_frustration: frustration < LOW_FRUSTRATION_BELOW,
        high_engagement: engagement > HIGH_ENGAGEMENT_ABOVE,
        high_mindfulness: mindfulness > HIGH_MINDFULNESS_ABOVE,
    };

    let is_positive = indicators.positive_states >= POSITIVE_STATE_THRESHOLD
        || (indicators.low_frustration && indicators.high_engagement)
        || indicators.high_mindfulness;

    let evidence = Evidence {
        state: mental_state,
        engagement,
        mindfulness,
    };

    let reason = if is_positive {
        first_match(POSITIVE_RULES, &evidence, Reason::PositiveSignals)
    } else {
        first_match(NEGATIVE_RULES, &evidence, Reason::NegativeSignals)
    };

    Ok(FeedbackVerdict {
        is_positive,
        reason,
        indicators,
    })
}
