//! Core types for the Mind City Flux engine
//!
//! This module defines the records that flow through the engine: metric samples and
//! mental-state labels on the way in, verdicts, scores and assessments on the way out.

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordinal label attached to a mental-state dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
        }
    }

    /// `high` and `medium` both count towards a positive reaction
    pub fn is_elevated(&self) -> bool {
        matches!(self, Level::High | Level::Medium)
    }
}

impl FromStr for Level {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("low") {
            Ok(Level::Low)
        } else if s.eq_ignore_ascii_case("medium") {
            Ok(Level::Medium)
        } else if s.eq_ignore_ascii_case("high") {
            Ok(Level::High)
        } else {
            Err(ComputeError::InvalidInput(format!(
                "unknown mental-state label `{s}` (expected low, medium or high)"
            )))
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mental-state dimensions reported alongside every summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Relaxation,
    Concentration,
    Calm,
    Engagement,
    Arousal,
    Frustration,
    Mindfulness,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Dimension::Relaxation,
        Dimension::Concentration,
        Dimension::Calm,
        Dimension::Engagement,
        Dimension::Arousal,
        Dimension::Frustration,
        Dimension::Mindfulness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Relaxation => "relaxation",
            Dimension::Concentration => "concentration",
            Dimension::Calm => "calm",
            Dimension::Engagement => "engagement",
            Dimension::Arousal => "arousal",
            Dimension::Frustration => "frustration",
            Dimension::Mindfulness => "mindfulness",
        }
    }
}

/// Numeric metric channels carried by a [`MetricsSample`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    AlphaRelaxation,
    BetaConcentration,
    ThetaRelaxation,
    EngagementIndex,
    ArousalIndex,
    FrustrationIndex,
    MindfulnessIndex,
}

impl Channel {
    pub const ALL: [Channel; 7] = [
        Channel::AlphaRelaxation,
        Channel::BetaConcentration,
        Channel::ThetaRelaxation,
        Channel::EngagementIndex,
        Channel::ArousalIndex,
        Channel::FrustrationIndex,
        Channel::MindfulnessIndex,
    ];

    /// Field name used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::AlphaRelaxation => "alpha_relaxation",
            Channel::BetaConcentration => "beta_concentration",
            Channel::ThetaRelaxation => "theta_relaxation",
            Channel::EngagementIndex => "engagement_index",
            Channel::ArousalIndex => "arousal_index",
            Channel::FrustrationIndex => "frustration_index",
            Channel::MindfulnessIndex => "mindfulness_index",
        }
    }
}

/// Aggregated cognitive metrics for one observation window
///
/// Every channel is optional on the wire; operations report a missing channel they
/// depend on as [`ComputeError::InvalidInput`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSample {
    /// Alpha / delta band-power ratio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha_relaxation: Option<f64>,
    /// Beta / theta band-power ratio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta_concentration: Option<f64>,
    /// Theta / alpha band-power ratio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theta_relaxation: Option<f64>,
    /// Beta / (alpha + theta)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engagement_index: Option<f64>,
    /// Beta / alpha
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arousal_index: Option<f64>,
    /// (beta + theta) / alpha
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frustration_index: Option<f64>,
    /// Theta / beta
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mindfulness_index: Option<f64>,
}

impl MetricsSample {
    /// Sample carrying exactly the four channels the score normalizer reads
    pub fn scoring(engagement: f64, mindfulness: f64, arousal: f64, frustration: f64) -> Self {
        Self {
            engagement_index: Some(engagement),
            mindfulness_index: Some(mindfulness),
            arousal_index: Some(arousal),
            frustration_index: Some(frustration),
            ..Default::default()
        }
    }

    /// Return a copy with `channel` set to `value`
    pub fn with(mut self, channel: Channel, value: f64) -> Self {
        *self.slot_mut(channel) = Some(value);
        self
    }

    pub fn get(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::AlphaRelaxation => self.alpha_relaxation,
            Channel::BetaConcentration => self.beta_concentration,
            Channel::ThetaRelaxation => self.theta_relaxation,
            Channel::EngagementIndex => self.engagement_index,
            Channel::ArousalIndex => self.arousal_index,
            Channel::FrustrationIndex => self.frustration_index,
            Channel::MindfulnessIndex => self.mindfulness_index,
        }
    }

    fn slot_mut(&mut self, channel: Channel) -> &mut Option<f64> {
        match channel {
            Channel::AlphaRelaxation => &mut self.alpha_relaxation,
            Channel::BetaConcentration => &mut self.beta_concentration,
            Channel::ThetaRelaxation => &mut self.theta_relaxation,
            Channel::EngagementIndex => &mut self.engagement_index,
            Channel::ArousalIndex => &mut self.arousal_index,
            Channel::FrustrationIndex => &mut self.frustration_index,
            Channel::MindfulnessIndex => &mut self.mindfulness_index,
        }
    }
}

/// Mental-state labels as they arrive on the wire, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawMentalState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relaxation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concentration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engagement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arousal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frustration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mindfulness: Option<String>,
}

impl RawMentalState {
    pub fn get(&self, dimension: Dimension) -> Option<&str> {
        let label = match dimension {
            Dimension::Relaxation => &self.relaxation,
            Dimension::Concentration => &self.concentration,
            Dimension::Calm => &self.calm,
            Dimension::Engagement => &self.engagement,
            Dimension::Arousal => &self.arousal,
            Dimension::Frustration => &self.frustration,
            Dimension::Mindfulness => &self.mindfulness,
        };
        label.as_deref()
    }
}

/// Validated mental state: every dimension carries a known [`Level`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MentalStateSample {
    pub relaxation: Level,
    pub concentration: Level,
    pub calm: Level,
    pub engagement: Level,
    pub arousal: Level,
    pub frustration: Level,
    pub mindfulness: Level,
}

impl MentalStateSample {
    /// Every dimension set to the same level
    pub fn uniform(level: Level) -> Self {
        Self {
            relaxation: level,
            concentration: level,
            calm: level,
            engagement: level,
            arousal: level,
            frustration: level,
            mindfulness: level,
        }
    }

    /// Return a copy with `dimension` set to `level`
    pub fn with(mut self, dimension: Dimension, level: Level) -> Self {
        match dimension {
            Dimension::Relaxation => self.relaxation = level,
            Dimension::Concentration => self.concentration = level,
            Dimension::Calm => self.calm = level,
            Dimension::Engagement => self.engagement = level,
            Dimension::Arousal => self.arousal = level,
            Dimension::Frustration => self.frustration = level,
            Dimension::Mindfulness => self.mindfulness = level,
        }
        self
    }

    pub fn get(&self, dimension: Dimension) -> Level {
        match dimension {
            Dimension::Relaxation => self.relaxation,
            Dimension::Concentration => self.concentration,
            Dimension::Calm => self.calm,
            Dimension::Engagement => self.engagement,
            Dimension::Arousal => self.arousal,
            Dimension::Frustration => self.frustration,
            Dimension::Mindfulness => self.mindfulness,
        }
    }

    /// Number of dimensions labelled `high` or `medium` (0-7)
    pub fn elevated_count(&self) -> usize {
        Dimension::ALL
            .iter()
            .filter(|d| self.get(**d).is_elevated())
            .count()
    }
}

impl TryFrom<&RawMentalState> for MentalStateSample {
    type Error = ComputeError;

    fn try_from(raw: &RawMentalState) -> Result<Self, Self::Error> {
        let level = |dimension: Dimension| -> Result<Level, ComputeError> {
            raw.get(dimension)
                .ok_or_else(|| ComputeError::missing(&format!("mental_state.{}", dimension.as_str())))?
                .parse()
        };

        Ok(Self {
            relaxation: level(Dimension::Relaxation)?,
            concentration: level(Dimension::Concentration)?,
            calm: level(Dimension::Calm)?,
            engagement: level(Dimension::Engagement)?,
            arousal: level(Dimension::Arousal)?,
            frustration: level(Dimension::Frustration)?,
            mindfulness: level(Dimension::Mindfulness)?,
        })
    }
}

impl From<&MentalStateSample> for RawMentalState {
    fn from(state: &MentalStateSample) -> Self {
        let label = |dimension: Dimension| Some(state.get(dimension).as_str().to_string());
        Self {
            relaxation: label(Dimension::Relaxation),
            concentration: label(Dimension::Concentration),
            calm: label(Dimension::Calm),
            engagement: label(Dimension::Engagement),
            arousal: label(Dimension::Arousal),
            frustration: label(Dimension::Frustration),
            mindfulness: label(Dimension::Mindfulness),
        }
    }
}

/// Validated summary: metrics plus mental state for one observation window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackSummary {
    pub metrics: MetricsSample,
    pub mental_state: MentalStateSample,
    /// Unix timestamp (seconds) at which the summary was produced
    pub timestamp: f64,
    /// Number of samples aggregated into the summary
    pub iterations_analyzed: u32,
}

/// Why the classifier reached its verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    Relaxed,
    Engaged,
    MindfulAttention,
    PositiveSignals,
    Frustrated,
    Disinterested,
    FailedToEngage,
    NegativeSignals,
}

impl Reason {
    /// User-facing message for this reason
    pub fn message(&self) -> &'static str {
        match self {
            Reason::Relaxed => "You seemed relaxed viewing this city",
            Reason::Engaged => "You appeared engaged with this city",
            Reason::MindfulAttention => "This city captured your mindful attention",
            Reason::PositiveSignals => "Your brain signals showed positive feedback",
            Reason::Frustrated => "You seemed frustrated viewing this city",
            Reason::Disinterested => "You appeared disinterested in this city",
            Reason::FailedToEngage => "This city failed to engage your interest",
            Reason::NegativeSignals => "Your brain signals showed negative feedback",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// What the stimulus sequencer should show next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    SimilarCity,
    DifferentCity,
}

impl NextAction {
    pub fn for_verdict(is_positive: bool) -> Self {
        if is_positive {
            NextAction::SimilarCity
        } else {
            NextAction::DifferentCity
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            NextAction::SimilarCity => "Showing a city with similar vibe",
            NextAction::DifferentCity => "Showing a different city",
        }
    }
}

/// Boolean predicates the classifier combined into its verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackIndicators {
    /// Dimensions labelled `high` or `medium`
    pub positive_states: usize,
    pub low_frustration: bool,
    pub high_engagement: bool,
    pub high_mindfulness: bool,
}

/// Liked/disliked decision for one stimulus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackVerdict {
    pub is_positive: bool,
    pub reason: Reason,
    pub indicators: FeedbackIndicators,
}

impl FeedbackVerdict {
    pub fn next_action(&self) -> NextAction {
        NextAction::for_verdict(self.is_positive)
    }

    /// Toast text shown while the next city loads
    pub fn action_text(&self) -> String {
        format!("{} - {}", self.next_action().prefix(), self.reason.message())
    }
}

/// Integer preference rating, always within `[1, 10]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PreferenceScore(u8);

impl PreferenceScore {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    /// Clamp `value` into `[MIN, MAX]`
    pub fn saturating(value: u8) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for PreferenceScore {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("score {value} outside 1-10"))
    }
}

impl From<PreferenceScore> for u8 {
    fn from(score: PreferenceScore) -> Self {
        score.0
    }
}

impl fmt::Display for PreferenceScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Assessment producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Verdict section of an encoded assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentVerdict {
    pub is_positive: bool,
    pub reason: Reason,
    pub message: String,
    pub next_action: NextAction,
    pub action_text: String,
    pub indicators: FeedbackIndicators,
}

/// Complete assessment payload for one summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub assessment_version: String,
    pub producer: AssessmentProducer,
    pub observed_at_utc: String,
    pub computed_at_utc: String,
    /// Seconds between the summary timestamp and encoding
    pub freshness_sec: i64,
    pub iterations_analyzed: u32,
    pub verdict: AssessmentVerdict,
    pub score: PreferenceScore,
    /// Weighted sum before clamping and rescaling
    pub raw_score: f64,
}
