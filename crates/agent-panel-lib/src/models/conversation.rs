// Conversation data models
// Feature: Agent Chat Panel (001-agent-chat-panel)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Tool parameters keyed by parameter name
pub type ToolInput = Map<String, Value>;

/// Reason recorded when the user rejects a confirmation
pub const CANCELLED_BY_USER: &str = "Cancelled by user.";

// ============================================================================
// Messages
// ============================================================================

/// Message author role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl std::str::FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            _ => Err(format!("Invalid message role: {}", s)),
        }
    }
}

/// One turn in the conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Stable identifier for the lifetime of the message
    pub id: String,
    /// Message author role
    pub role: MessageRole,
    /// Accumulated text
    pub content: String,
    /// Tool calls in call order (always empty for user messages)
    pub tool_calls: Vec<ToolCall>,
    /// True until the session controller finalizes the message
    pub is_streaming: bool,
    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a finalized user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: MessageRole::User,
            content: content.into(),
            tool_calls: Vec::new(),
            is_streaming: false,
            timestamp: Utc::now(),
        }
    }

    /// Create an empty assistant message that is still receiving chunks
    pub fn streaming_assistant(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: MessageRole::Assistant,
            content: String::new(),
            tool_calls: Vec::new(),
            is_streaming: true,
            timestamp: Utc::now(),
        }
    }

    /// Create a finalized assistant message with fixed content
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: MessageRole::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            is_streaming: false,
            timestamp: Utc::now(),
        }
    }

    /// Rebuild a finalized message from a persisted history entry
    pub fn from_history(entry: &HistoryEntry) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: entry.role,
            content: entry.content.clone(),
            tool_calls: Vec::new(),
            is_streaming: false,
            timestamp: Utc::now(),
        }
    }

    pub fn tool_call(&self, tool_id: &str) -> Option<&ToolCall> {
        self.tool_calls.iter().find(|tc| tc.id == tool_id)
    }

    pub fn tool_call_mut(&mut self, tool_id: &str) -> Option<&mut ToolCall> {
        self.tool_calls.iter_mut().find(|tc| tc.id == tool_id)
    }

    pub fn to_history(&self) -> HistoryEntry {
        HistoryEntry {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// Persisted and outbound form of a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub role: MessageRole,
    pub content: String,
}

// ============================================================================
// Tool Calls
// ============================================================================

/// Tool call lifecycle state
///
/// `Completed` and `Blocked` are terminal. `AwaitingConfirmation` is entered
/// from `Executing` (or on creation by a confirmation event) and leaves only
/// to `Executing` or `Blocked`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    Executing,
    AwaitingConfirmation,
    Completed,
    Blocked,
}

impl ToolCallStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ToolCallStatus::Completed | ToolCallStatus::Blocked)
    }
}

impl std::fmt::Display for ToolCallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolCallStatus::Executing => write!(f, "executing"),
            ToolCallStatus::AwaitingConfirmation => write!(f, "awaiting_confirmation"),
            ToolCallStatus::Completed => write!(f, "completed"),
            ToolCallStatus::Blocked => write!(f, "blocked"),
        }
    }
}

/// One invocation the assistant requested
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    /// Unique within the owning message
    pub id: String,
    /// Tool identifier
    pub name: String,
    /// Tool parameters (may arrive late, with a confirmation)
    pub input: ToolInput,
    pub status: ToolCallStatus,
    /// Present only when completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Present only when blocked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,
}

impl ToolCall {
    /// Create a tool call that has started executing
    pub fn executing(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input: ToolInput::new(),
            status: ToolCallStatus::Executing,
            result: None,
            blocked_reason: None,
        }
    }

    /// Create a tool call first seen through a confirmation request
    pub fn awaiting_confirmation(
        id: impl Into<String>,
        name: impl Into<String>,
        input: ToolInput,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
            status: ToolCallStatus::AwaitingConfirmation,
            result: None,
            blocked_reason: None,
        }
    }

    /// `executing -> completed`. Returns false when the transition is not allowed.
    pub fn complete(&mut self, result: Value) -> bool {
        if self.status != ToolCallStatus::Executing {
            return false;
        }
        self.status = ToolCallStatus::Completed;
        self.result = Some(result);
        true
    }

    /// `executing | awaiting_confirmation -> blocked`
    pub fn block(&mut self, reason: impl Into<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = ToolCallStatus::Blocked;
        self.blocked_reason = Some(reason.into());
        true
    }

    /// `executing -> awaiting_confirmation`
    pub fn await_confirmation(&mut self) -> bool {
        if self.status != ToolCallStatus::Executing {
            return false;
        }
        self.status = ToolCallStatus::AwaitingConfirmation;
        true
    }

    /// `awaiting_confirmation -> executing`, filling `input` if it is still empty
    pub fn resume(&mut self, input: &ToolInput) -> bool {
        if self.status != ToolCallStatus::AwaitingConfirmation {
            return false;
        }
        self.status = ToolCallStatus::Executing;
        if self.input.is_empty() {
            self.input = input.clone();
        }
        true
    }
}
