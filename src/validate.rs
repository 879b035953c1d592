//! Shared metric validation and clamping helpers

use crate::error::ComputeError;
use crate::types::{Channel, MetricsSample};

/// Return `value` if present and finite, otherwise `InvalidInput` naming `field`
pub fn require_finite(field: &str, value: Option<f64>) -> Result<f64, ComputeError> {
    match value {
        None => Err(ComputeError::missing(field)),
        Some(v) if !v.is_finite() => Err(ComputeError::non_finite(field, v)),
        Some(v) => Ok(v),
    }
}

/// Read a required, finite channel from a metrics sample
pub fn require_channel(metrics: &MetricsSample, channel: Channel) -> Result<f64, ComputeError> {
    require_finite(
        &format!("metrics.{}", channel.as_str()),
        metrics.get(channel),
    )
}

/// `max(min, min(value, max))`; callers reject NaN before clamping
pub fn clamp_range(value: f64, min: f64, max: f64) -> f64 {
    min.max(value.min(max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_finite() {
        assert_eq!(require_finite("x", Some(1.5)).unwrap(), 1.5);
        assert!(require_finite("x", None).unwrap_err().is_invalid_input());
        assert!(require_finite("x", Some(f64::NAN)).unwrap_err().is_invalid_input());
        assert!(require_finite("x", Some(f64::NEG_INFINITY))
            .unwrap_err()
            .is_invalid_input());
    }

    #[test]
    fn test_require_channel_names_field() {
        let err = require_channel(&MetricsSample::default(), Channel::ArousalIndex).unwrap_err();
        assert!(err.to_string().contains("metrics.arousal_index"));
    }

    #[test]
    fn test_clamp_range() {
        assert_eq!(clamp_range(5.0, -1.0, 2.0), 2.0);
        assert_eq!(clamp_range(-5.0, -1.0, 2.0), -1.0);
        assert_eq!(clamp_range(0.25, -1.0, 2.0), 0.25);
    }
}
