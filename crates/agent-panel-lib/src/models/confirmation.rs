// Confirmation data models
// Feature: Agent Chat Panel (001-agent-chat-panel)

use serde::{Deserialize, Serialize};

use super::conversation::ToolInput;

/// Severity the backend assigns to a risky tool call
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// A tool call suspended on the backend until the user decides
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingConfirmation {
    /// Backend handle for the suspended operation
    pub pending_id: String,
    pub tool_call_id: String,
    pub message_id: String,
    pub tool_name: String,
    /// Snapshot for display, independent of the tool call's own input
    pub tool_input: ToolInput,
    pub risk: RiskLevel,
    pub human_description: String,
}
