//! Batch decoding of EEG messages
//!
//! Parses message batches (JSON arrays or NDJSON) and reports per-message
//! validation failures.

use crate::error::ComputeError;
use crate::schema::message::{EegMessage, SummaryPayload};

/// Adapter for decoding message batches
pub struct SchemaAdapter;

impl SchemaAdapter {
    /// Parse a JSON string containing an array of messages
    pub fn parse_array(json: &str) -> Result<Vec<EegMessage>, ComputeError> {
        let messages: Vec<EegMessage> = serde_json::from_str(json)?;
        Ok(messages)
    }

    /// Parse NDJSON (newline-delimited JSON) containing messages
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<EegMessage>, ComputeError> {
        let mut messages = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<EegMessage>(trimmed) {
                Ok(message) => messages.push(message),
                Err(e) => {
                    return Err(ComputeError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(messages)
    }

    /// Parse a single summary payload (the `data` object of a summary message)
    pub fn parse_summary(json: &str) -> Result<SummaryPayload, ComputeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate messages, returning only the failures
    pub fn validate_messages(messages: &[EegMessage]) -> Vec<ValidationResult> {
        messages
            .iter()
            .enumerate()
            .filter_map(|(index, message)| {
                message.validate().err().map(|e| ValidationResult {
                    index,
                    message_type: message.type_name(),
                    error: e.to_string(),
                })
            })
            .collect()
    }
}

/// Result of message validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub index: usize,
    pub message_type: &'static str,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const NDJSON: &str = r#"{"type": "real_time", "data": {"timestamp": 1.0, "channels": {"AF3": 10.5}}}

{"type": "summary", "data": {"metrics": {"engagement_index": 0.5, "mindfulness_index": 4.0, "arousal_index": 0.3, "frustration_index": 0.2}, "mental_state": {"relaxation": "low", "concentration": "low", "calm": "low", "engagement": "low", "arousal": "low", "frustration": "low", "mindfulness": "low"}}}
{"type": "summary", "data": {"metrics": {"engagement_index": 0.5}, "mental_state": {}}}
"#;

    #[test]
    fn test_parse_ndjson_skips_blank_lines() {
        let messages = SchemaAdapter::parse_ndjson(NDJSON).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].type_name(), "real_time");
        assert_eq!(messages[1].type_name(), "summary");
    }

    #[test]
    fn test_parse_ndjson_reports_line_number() {
        let err = SchemaAdapter::parse_ndjson("{\"type\": \"real_time\", \"data\": {\"timestamp\": 1.0, \"channels\": {}}}\nnot json\n")
            .unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_array() {
        let json = r#"[{"type": "real_time", "data": {"timestamp": 2.0, "channels": {}}}]"#;
        let messages = SchemaAdapter::parse_array(json).unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_unknown_message_type_rejected() {
        let err = SchemaAdapter::parse_array(r#"[{"type": "raw", "data": {}}]"#).unwrap_err();
        assert!(matches!(err, ComputeError::JsonError(_)));
    }

    #[test]
    fn test_validate_messages() {
        let messages = SchemaAdapter::parse_ndjson(NDJSON).unwrap();
        let results = SchemaAdapter::validate_messages(&messages);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].index, 2);
        assert_eq!(results[0].message_type, "summary");
        assert!(results[0].error.contains("Invalid input"));
    }

    #[test]
    fn test_parse_ndjson_accepts_backend_realtime_frames() {
        let ndjson = r#"{"type": "real_time", "metrics": {"alpha_relaxation": 1.1, "beta_concentration": 0.9, "theta_relaxation": 0.7, "engagement_index": 0.45, "arousal_index": 0.8, "frustration_index": 1.3, "mindfulness_index": 6.2}, "timestamp": 1717171717.2}
{"type": "real_time", "data": {"timestamp": 1717171717.4, "channels": {"AF3": 10.5}}}
"#;
        let messages = SchemaAdapter::parse_ndjson(ndjson).unwrap();

        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m.type_name() == "real_time"));
        assert!(SchemaAdapter::validate_messages(&messages).is_empty());
    }
}
