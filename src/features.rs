//! Metric derivation from band powers
//!
//! This module derives the seven cognitive metric channels from already-extracted
//! EEG band powers (delta, theta, alpha, beta). Band-power extraction itself happens
//! upstream of this crate.

use crate::error::ComputeError;
use crate::types::{Channel, MetricsSample};
use crate::validate::require_finite;
use serde::{Deserialize, Serialize};

/// Smoothed band powers for one epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandPowers {
    pub delta: f64,
    pub theta: f64,
    pub alpha: f64,
    pub beta: f64,
}

/// Feature deriver for computing metric channels from band powers
pub struct FeatureDeriver;

impl FeatureDeriver {
    /// Derive all seven metric channels.
    ///
    /// Fails with `InvalidInput` on a non-finite band or when a ratio has a zero
    /// denominator.
    pub fn derive(bands: &BandPowers) -> Result<MetricsSample, ComputeError> {
        let delta = require_finite("bands.delta", Some(bands.delta))?;
        let theta = require_finite("bands.theta", Some(bands.theta))?;
        let alpha = require_finite("bands.alpha", Some(bands.alpha))?;
        let beta = require_finite("bands.beta", Some(bands.beta))?;

        let ratios = [
            (Channel::AlphaRelaxation, alpha / delta),
            (Channel::BetaConcentration, beta / theta),
            (Channel::ThetaRelaxation, theta / alpha),
            (Channel::EngagementIndex, beta / (alpha + theta)),
            (Channel::ArousalIndex, beta / alpha),
            (Channel::FrustrationIndex, (beta + theta) / alpha),
            (Channel::MindfulnessIndex, theta / beta),
        ];

        ratios
            .into_iter()
            .try_fold(MetricsSample::default(), |sample, (channel, value)| {
                let value = require_finite(&format!("metrics.{}", channel.as_str()), Some(value))?;
                Ok(sample.with(channel, value))
            })
    }
}
