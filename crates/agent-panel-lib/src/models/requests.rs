// Outbound request models
// Feature: Agent Chat Panel (001-agent-chat-panel)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::config::McpServer;
use super::conversation::HistoryEntry;

/// Request to start a new assistant turn
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// New user message
    pub message: String,
    /// Prior transcript, oldest first, ending with the new message
    pub history: Vec<HistoryEntry>,
    pub active_skills: Vec<String>,
    /// The single active MCP endpoint, if any
    pub mcp_config: Option<McpServer>,
    pub model: String,
    pub max_tokens: u32,
}

/// Request to resume or abort a suspended operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingOperationRequest {
    pub pending_id: String,
}

/// Backend acknowledgement of `send_message`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SendMessageAck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SendMessageAck {
    /// Backend-reported rejection, if any
    pub fn rejection(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }
}
