//! Rolling metrics tracker
//!
//! This module accumulates per-epoch metric samples in a rolling window and turns
//! the window into a [`FeedbackSummary`] every `interval` samples. Channel averages
//! are mapped to mental-state labels with fixed thresholds.

use crate::error::ComputeError;
use crate::types::{Channel, FeedbackSummary, Level, MentalStateSample, MetricsSample};
use crate::validate::require_channel;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default summary interval (and window size) in samples
pub const DEFAULT_SUMMARY_INTERVAL: usize = 50;

/// `(high_above, medium_above)` cut-offs for a channel average
fn thresholds(channel: Channel) -> (f64, f64) {
    match channel {
        Channel::ThetaRelaxation => (1.2, 0.8),
        _ => (1.5, 1.0),
    }
}

/// Label a channel average; both cut-offs are strict
pub fn label_for(channel: Channel, average: f64) -> Level {
    let (high, medium) = thresholds(channel);
    if average > high {
        Level::High
    } else if average > medium {
        Level::Medium
    } else {
        Level::Low
    }
}

/// Rolling window of metric samples
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TrackerState")]
pub struct MetricsTracker {
    /// One row per sample, channels in [`Channel::ALL`] order
    window: VecDeque<[f64; 7]>,
    /// Samples per summary, also the window capacity
    interval: usize,
    /// Samples accepted since creation
    iterations: u64,
}

/// Persisted tracker fields before their invariants are checked
#[derive(Deserialize)]
struct TrackerState {
    window: VecDeque<[f64; 7]>,
    interval: usize,
    iterations: u64,
}

impl TryFrom<TrackerState> for MetricsTracker {
    type Error = String;

    fn try_from(state: TrackerState) -> Result<Self, Self::Error> {
        if state.interval == 0 {
            return Err("tracker interval must be at least 1".to_string());
        }
        if state.window.len() > state.interval {
            return Err(format!(
                "tracker window holds {} samples, more than its interval of {}",
                state.window.len(),
                state.interval
            ));
        }
        if state.iterations < state.window.len() as u64 {
            return Err(format!(
                "tracker iterations ({}) is less than its window length ({})",
                state.iterations,
                state.window.len()
            ));
        }
        if let Some(channel) = state.window.iter().find_map(|row| {
            Channel::ALL
                .into_iter()
                .zip(row)
                .find(|(_, value)| !value.is_finite())
                .map(|(channel, _)| channel)
        }) {
            return Err(format!(
                "tracker window holds a non-finite {} value",
                channel.as_str()
            ));
        }

        Ok(Self {
            window: state.window,
            interval: state.interval,
            iterations: state.iterations,
        })
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SUMMARY_INTERVAL)
    }
}

impl MetricsTracker {
    /// Create a tracker summarizing every `interval` samples (minimum 1)
    pub fn new(interval: usize) -> Self {
        let interval = interval.max(1);
        Self {
            window: VecDeque::with_capacity(interval),
            interval,
            iterations: 0,
        }
    }

    pub fn interval(&self) -> usize {
        self.interval
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Add one sample. All seven channels must be present and finite; on failure
    /// the tracker is left unchanged.
    pub fn add_metrics(&mut self, sample: &MetricsSample) -> Result<(), ComputeError> {
        let mut row = [0.0; 7];
        for (slot, channel) in row.iter_mut().zip(Channel::ALL) {
            *slot = require_channel(sample, channel)?;
        }

        self.window.push_back(row);
        while self.window.len() > self.interval {
            self.window.pop_front();
        }
        self.iterations += 1;
        Ok(())
    }

    /// True on every `interval`-th accepted sample
    pub fn should_summarize(&self) -> bool {
        self.iterations > 0 && self.iterations % self.interval as u64 == 0
    }

    /// Average the window into a summary stamped with `timestamp` (unix seconds)
    pub fn summarize(&self, timestamp: f64) -> Result<FeedbackSummary, ComputeError> {
        if self.window.is_empty() {
            return Err(ComputeError::InvalidInput(
                "no metrics tracked yet".to_string(),
            ));
        }

        let count = self.window.len() as f64;
        let mut averages = [0.0; 7];
        for row in &self.window {
            for (avg, value) in averages.iter_mut().zip(row) {
                *avg += value;
            }
        }
        averages.iter_mut().for_each(|avg| *avg /= count);

        let metrics = Channel::ALL
            .into_iter()
            .zip(averages)
            .fold(MetricsSample::default(), |sample, (channel, avg)| {
                sample.with(channel, avg)
            });

        let label = |channel: Channel| {
            label_for(channel, metrics.get(channel).unwrap_or_default())
        };

        let mental_state = MentalStateSample {
            relaxation: label(Channel::AlphaRelaxation),
            concentration: label(Channel::BetaConcentration),
            calm: label(Channel::ThetaRelaxation),
            engagement: label(Channel::EngagementIndex),
            arousal: label(Channel::ArousalIndex),
            frustration: label(Channel::FrustrationIndex),
            mindfulness: label(Channel::MindfulnessIndex),
        };

        Ok(FeedbackSummary {
            metrics,
            mental_state,
            timestamp,
            iterations_analyzed: self.window.len() as u32,
        })
    }

    /// Load tracker state from JSON.
    ///
    /// Rejects a zero interval, a window longer than the interval, an iteration
    /// count below the window length, and non-finite stored values.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize tracker state to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn uniform_sample(value: f64) -> MetricsSample {
        Channel::ALL
            .into_iter()
            .fold(MetricsSample::default(), |s, c| s.with(c, value))
    }

    #[test]
    fn test_summary_cadence() {
        let mut tracker = MetricsTracker::new(3);
        assert!(!tracker.should_summarize());

        for i in 1..=7 {
            tracker.add_metrics(&uniform_sample(1.0)).unwrap();
            assert_eq!(tracker.should_summarize(), i % 3 == 0, "iteration {i}");
        }
    }

    #[test]
    fn test_window_rolling_average() {
        let mut tracker = MetricsTracker::new(3);

        // 1, 2, 3, 4, 5 -> window keeps 3, 4, 5
        for i in 1..=5 {
            tracker.add_metrics(&uniform_sample(i as f64)).unwrap();
        }

        let summary = tracker.summarize(1_700_000_000.0).unwrap();
        assert_eq!(summary.iterations_analyzed, 3);
        assert!((summary.metrics.engagement_index.unwrap() - 4.0).abs() < 1e-12);
        assert_eq!(summary.mental_state, MentalStateSample::uniform(Level::High));
        assert_eq!(summary.timestamp, 1_700_000_000.0);
    }

    #[test]
    fn test_threshold_labels() {
        assert_eq!(label_for(Channel::AlphaRelaxation, 1.5), Level::Medium);
        assert_eq!(label_for(Channel::AlphaRelaxation, 1.51), Level::High);
        assert_eq!(label_for(Channel::AlphaRelaxation, 1.0), Level::Low);
        assert_eq!(label_for(Channel::ThetaRelaxation, 1.0), Level::Medium);
        assert_eq!(label_for(Channel::ThetaRelaxation, 1.3), Level::High);
        assert_eq!(label_for(Channel::ThetaRelaxation, 0.8), Level::Low);
    }

    #[test]
    fn test_calm_uses_theta_thresholds() {
        let mut tracker = MetricsTracker::new(1);
        tracker.add_metrics(&uniform_sample(0.9)).unwrap();

        let summary = tracker.summarize(0.0).unwrap();
        assert_eq!(summary.mental_state.calm, Level::Medium);
        assert_eq!(summary.mental_state.relaxation, Level::Low);
        assert_eq!(summary.mental_state.elevated_count(), 1);
    }

    #[test]
    fn test_incomplete_sample_rejected_without_side_effects() {
        let mut tracker = MetricsTracker::new(2);
        let partial = MetricsSample::scoring(1.0, 1.0, 1.0, 1.0);

        let err = tracker.add_metrics(&partial).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(tracker.is_empty());
        assert_eq!(tracker.iterations(), 0);
    }

    #[test]
    fn test_empty_summary_is_invalid_input() {
        let tracker = MetricsTracker::default();
        assert!(tracker.summarize(0.0).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_serialization() {
        let mut tracker = MetricsTracker::new(4);
        tracker.add_metrics(&uniform_sample(1.2)).unwrap();
        tracker.add_metrics(&uniform_sample(0.4)).unwrap();

        let json = tracker.to_json().unwrap();
        let loaded = MetricsTracker::from_json(&json).unwrap();

        assert_eq!(loaded.iterations(), 2);
        assert_eq!(loaded.interval(), 4);
        assert_eq!(
            tracker.summarize(5.0).unwrap(),
            loaded.summarize(5.0).unwrap()
        );
    }

    #[test]
    fn test_zero_interval_state_rejected() {
        let err = MetricsTracker::from_json(r#"{"window":[],"interval":0,"iterations":0}"#)
            .unwrap_err();
        assert!(err.to_string().contains("interval must be at least 1"));
    }

    #[test]
    fn test_overfull_window_state_rejected() {
        let row = "[1.0,1.0,1.0,1.0,1.0,1.0,1.0]";
        let json = format!(r#"{{"window":[{row},{row},{row}],"interval":2,"iterations":3}}"#);

        let err = MetricsTracker::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("more than its interval of 2"));
    }

    #[test]
    fn test_iterations_below_window_rejected() {
        let row = "[1.0,1.0,1.0,1.0,1.0,1.0,1.0]";
        let json = format!(r#"{{"window":[{row},{row}],"interval":4,"iterations":1}}"#);

        assert!(MetricsTracker::from_json(&json).is_err());
    }

    #[test]
    fn test_non_finite_state_rejected() {
        let mut window = VecDeque::new();
        window.push_back([1.0, 1.0, f64::INFINITY, 1.0, 1.0, 1.0, 1.0]);
        let state = TrackerState {
            window,
            interval: 3,
            iterations: 1,
        };

        let err = MetricsTracker::try_from(state).unwrap_err();
        assert_eq!(err, "tracker window holds a non-finite theta_relaxation value");
    }

    #[test]
    fn test_loaded_state_keeps_cadence() {
        let row = "[1.0,1.0,1.0,1.0,1.0,1.0,1.0]";
        let json = format!(r#"{{"window":[{row}],"interval":2,"iterations":1}}"#);
        let mut tracker = MetricsTracker::from_json(&json).unwrap();

        tracker.add_metrics(&uniform_sample(1.0)).unwrap();
        assert!(tracker.should_summarize());
        assert_eq!(tracker.summarize(0.0).unwrap().iterations_analyzed, 2);
    }
}
