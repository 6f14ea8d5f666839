// Inbound event models
// Feature: Agent Chat Panel (001-agent-chat-panel)
//
// Named events pushed by the agent backend. Each event carries a flat
// mapping of named parameters; decoding turns the pair into a typed variant.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::confirmation::RiskLevel;
use super::conversation::ToolInput;
use crate::error::{PanelError, PanelResult};

/// Every event name the backend may emit
pub const EVENT_NAMES: &[&str] = &[
    "stream_message_start",
    "stream_chunk",
    "stream_complete",
    "stream_error",
    "tool_call_start",
    "tool_result",
    "tool_blocked",
    "confirmation_required",
];

/// Event as it appears on the wire, before decoding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawEvent {
    pub event: String,
    #[serde(default)]
    pub params: Value,
}

/// Typed inbound event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "params", rename_all = "snake_case")]
pub enum PanelEvent {
    StreamMessageStart {
        message_id: String,
    },
    StreamChunk {
        message_id: String,
        delta: String,
    },
    StreamComplete {
        message_id: String,
    },
    StreamError {
        message_id: String,
        error: String,
    },
    ToolCallStart {
        message_id: String,
        tool_id: String,
        tool_name: String,
    },
    ToolResult {
        message_id: String,
        tool_id: String,
        #[serde(default)]
        result: Value,
    },
    ToolBlocked {
        message_id: String,
        tool_id: String,
        #[serde(default)]
        reason: String,
    },
    ConfirmationRequired {
        message_id: String,
        pending_id: String,
        tool_id: String,
        tool_name: String,
        #[serde(default)]
        tool_input: ToolInput,
        risk: RiskLevel,
        #[serde(default)]
        human_description: String,
    },
}

impl PanelEvent {
    /// Decode a named event and its parameter mapping
    pub fn from_named(name: &str, params: Value) -> PanelResult<Self> {
        if !EVENT_NAMES.contains(&name) {
            return Err(PanelError::UnknownEvent(name.to_string()));
        }
        let params = if params.is_null() { json!({}) } else { params };
        serde_json::from_value(json!({ "event": name, "params": params })).map_err(|e| {
            PanelError::MalformedEvent {
                event: name.to_string(),
                reason: e.to_string(),
            }
        })
    }

    pub fn from_raw(raw: RawEvent) -> PanelResult<Self> {
        Self::from_named(&raw.event, raw.params)
    }

    pub fn name(&self) -> &'static str {
        match self {
            PanelEvent::StreamMessageStart { .. } => "stream_message_start",
            PanelEvent::StreamChunk { .. } => "stream_chunk",
            PanelEvent::StreamComplete { .. } => "stream_complete",
            PanelEvent::StreamError { .. } => "stream_error",
            PanelEvent::ToolCallStart { .. } => "tool_call_start",
            PanelEvent::ToolResult { .. } => "tool_result",
            PanelEvent::ToolBlocked { .. } => "tool_blocked",
            PanelEvent::ConfirmationRequired { .. } => "confirmation_required",
        }
    }

    pub fn message_id(&self) -> &str {
        match self {
            PanelEvent::StreamMessageStart { message_id }
            | PanelEvent::StreamChunk { message_id, .. }
            | PanelEvent::StreamComplete { message_id }
            | PanelEvent::StreamError { message_id, .. }
            | PanelEvent::ToolCallStart { message_id, .. }
            | PanelEvent::ToolResult { message_id, .. }
            | PanelEvent::ToolBlocked { message_id, .. }
            | PanelEvent::ConfirmationRequired { message_id, .. } => message_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PanelErrorCode;

    #[test]
    fn test_decode_chunk() {
        let event = PanelEvent::from_named(
            "stream_chunk",
            json!({"message_id": "m1", "delta": "Hello"}),
        )
        .unwrap();

        assert_eq!(
            event,
            PanelEvent::StreamChunk {
                message_id: "m1".to_string(),
                delta: "Hello".to_string(),
            }
        );
        assert_eq!(event.name(), "stream_chunk");
        assert_eq!(event.message_id(), "m1");
    }

    #[test]
    fn test_decode_confirmation_without_input() {
        let event = PanelEvent::from_named(
            "confirmation_required",
            json!({
                "message_id": "m1",
                "pending_id": "p1",
                "tool_id": "t1",
                "tool_name": "delete_dataset",
                "risk": "high",
                "human_description": "Permanently delete dataset 'quickstart'",
            }),
        )
        .unwrap();

        match event {
            PanelEvent::ConfirmationRequired { tool_input, risk, .. } => {
                assert!(tool_input.is_empty());
                assert_eq!(risk, RiskLevel::High);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_event_name() {
        let err = PanelEvent::from_named("stream_restart", json!({})).unwrap_err();
        assert_eq!(err.code(), PanelErrorCode::UnknownEvent);
    }

    #[test]
    fn test_missing_parameter_is_malformed() {
        let err = PanelEvent::from_named("stream_chunk", json!({"message_id": "m1"})).unwrap_err();
        assert_eq!(err.code(), PanelErrorCode::MalformedEvent);

        let err = PanelEvent::from_named("stream_complete", Value::Null).unwrap_err();
        assert_eq!(err.code(), PanelErrorCode::MalformedEvent);
    }

    #[test]
    fn test_unknown_risk_is_malformed() {
        let err = PanelEvent::from_named(
            "confirmation_required",
            json!({
                "message_id": "m1",
                "pending_id": "p1",
                "tool_id": "t1",
                "tool_name": "x",
                "risk": "low",
            }),
        )
        .unwrap_err();
        assert_eq!(err.code(), PanelErrorCode::MalformedEvent);
    }

    #[test]
    fn test_from_raw_wire_line() {
        let raw: RawEvent = serde_json::from_str(
            r#"{"event":"tool_result",
                "params":{"message_id":"m1","tool_id":"t1","result":{"count":200}}}"#,
        )
        .unwrap();
        let event = PanelEvent::from_raw(raw).unwrap();
        assert_eq!(
            event,
            PanelEvent::ToolResult {
                message_id: "m1".to_string(),
                tool_id: "t1".to_string(),
                result: json!({"count": 200}),
            }
        );
    }
}
