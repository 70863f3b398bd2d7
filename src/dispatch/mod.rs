//! Tool-call dispatch: translates structured commands issued by the voice
//! assistant into exactly one store mutation (or read-only query) and one
//! human-readable confirmation string.
//!
//! Each command's parameters are modeled as a typed struct deserialized at
//! the boundary; malformed payloads and unknown command names come back as
//! [`DispatchError`] values, which the session turns into error responses.
//! Every dispatched call produces exactly one disposition, never zero,
//! never more than one.

mod address;
mod market;
mod tasks;

pub use address::normalize_address;
pub use market::dispatch_market;
pub use tasks::dispatch_tasks;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{DispatchError, DispatchResult};

/// The outcome of one dispatched tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disposition {
    /// Confirmation (or recovery) text returned to the assistant.
    pub content: String,
    /// Whether the session should tear down after flushing the response.
    pub end_session: bool,
}

impl Disposition {
    /// A plain reply.
    pub fn reply(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            end_session: false,
        }
    }

    /// A reply that also ends the session once flushed.
    pub fn end(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            end_session: true,
        }
    }
}

/// Deserialize command parameters, tolerating the transport's quirks:
/// absent parameters mean `{}`, and some assistants deliver the payload as
/// a JSON-encoded string rather than an object.
pub(crate) fn parse_parameters<T: DeserializeOwned>(
    command: &str,
    parameters: Option<Value>,
) -> DispatchResult<T> {
    let value = match parameters {
        None | Some(Value::Null) => Value::Object(Default::default()),
        Some(Value::String(raw)) => {
            serde_json::from_str(&raw).map_err(|e| DispatchError::InvalidParameters {
                command: command.to_string(),
                message: format!("parameters string is not valid JSON: {}", e),
            })?
        }
        Some(other) => other,
    };

    serde_json::from_value(value).map_err(|e| DispatchError::InvalidParameters {
        command: command.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        name: String,
        #[serde(default)]
        count: u32,
    }

    #[test]
    fn test_parse_object_parameters() {
        let params = serde_json::json!({ "name": "dress", "count": 2 });
        let sample: Sample = parse_parameters("cmd", Some(params)).unwrap();
        assert_eq!(sample.name, "dress");
        assert_eq!(sample.count, 2);
    }

    #[test]
    fn test_parse_string_encoded_parameters() {
        let params = Value::String(r#"{"name":"dress"}"#.to_string());
        let sample: Sample = parse_parameters("cmd", Some(params)).unwrap();
        assert_eq!(sample.name, "dress");
        assert_eq!(sample.count, 0);
    }

    #[test]
    fn test_missing_parameters_treated_as_empty() {
        #[derive(Debug, Deserialize)]
        struct Empty {}
        let result: DispatchResult<Empty> = parse_parameters("cmd", None);
        assert!(result.is_ok());
    }

    #[test]
    fn test_malformed_parameters_rejected() {
        let params = Value::String("not json".to_string());
        let result: DispatchResult<Sample> = parse_parameters("cmd", Some(params));
        assert!(matches!(
            result,
            Err(DispatchError::InvalidParameters { .. })
        ));
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let params = serde_json::json!({ "count": 2 });
        let result: DispatchResult<Sample> = parse_parameters("cmd", Some(params));
        match result {
            Err(DispatchError::InvalidParameters { command, .. }) => assert_eq!(command, "cmd"),
            other => panic!("expected InvalidParameters, got {:?}", other),
        }
    }
}
