// Agent Panel Error Types
// Feature: Agent Chat Panel (001-agent-chat-panel)

use thiserror::Error;

/// Agent panel error
#[derive(Error, Debug)]
pub enum PanelError {
    /// Send attempted with an empty message
    #[error("No message provided")]
    EmptyMessage,

    /// Send attempted while a response is still generating
    #[error("A response is already being generated")]
    Busy,

    /// Confirm/cancel attempted with no open confirmation
    #[error("No operation is awaiting confirmation")]
    NoPendingConfirmation,

    /// Confirm/cancel targeted a confirmation that is not the open one
    #[error("Confirmation {0} is not pending")]
    PendingMismatch(String),

    /// Inbound event carried parameters that do not match its name
    #[error("Malformed event '{event}': {reason}")]
    MalformedEvent { event: String, reason: String },

    /// Inbound event name is not part of the protocol
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    /// Transport to the agent backend failed
    #[error("Cannot reach agent backend: {0}")]
    Transport(String),

    /// Agent backend answered with an error
    #[error("{0}")]
    Backend(String),

    /// Request did not complete in time
    #[error("Agent backend did not respond within {0}s")]
    Timeout(u64),

    /// Agent process exited while requests were outstanding
    #[error("Agent process exited")]
    AgentExited,

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for PanelError {
    fn from(err: serde_json::Error) -> Self {
        PanelError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for PanelError {
    fn from(err: std::io::Error) -> Self {
        PanelError::Io(err.to_string())
    }
}

impl From<rusqlite::Error> for PanelError {
    fn from(err: rusqlite::Error) -> Self {
        PanelError::Storage(err.to_string())
    }
}

/// Result type for panel operations
pub type PanelResult<T> = Result<T, PanelError>;

/// Panel error codes for the host UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelErrorCode {
    EmptyMessage,
    Busy,
    NoPendingConfirmation,
    PendingMismatch,
    MalformedEvent,
    UnknownEvent,
    Transport,
    Backend,
    Timeout,
    AgentExited,
    Storage,
    Parse,
    Io,
    InvalidConfig,
}

impl PanelErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PanelErrorCode::EmptyMessage => "PANEL_EMPTY_MESSAGE",
            PanelErrorCode::Busy => "PANEL_BUSY",
            PanelErrorCode::NoPendingConfirmation => "PANEL_NO_PENDING_CONFIRMATION",
            PanelErrorCode::PendingMismatch => "PANEL_PENDING_MISMATCH",
            PanelErrorCode::MalformedEvent => "PANEL_MALFORMED_EVENT",
            PanelErrorCode::UnknownEvent => "PANEL_UNKNOWN_EVENT",
            PanelErrorCode::Transport => "AGENT_TRANSPORT_ERROR",
            PanelErrorCode::Backend => "AGENT_BACKEND_ERROR",
            PanelErrorCode::Timeout => "AGENT_TIMEOUT",
            PanelErrorCode::AgentExited => "AGENT_EXITED",
            PanelErrorCode::Storage => "PANEL_STORAGE_ERROR",
            PanelErrorCode::Parse => "PANEL_PARSE_ERROR",
            PanelErrorCode::Io => "PANEL_IO_ERROR",
            PanelErrorCode::InvalidConfig => "PANEL_INVALID_CONFIG",
        }
    }
}

impl PanelError {
    pub fn code(&self) -> PanelErrorCode {
        match self {
            PanelError::EmptyMessage => PanelErrorCode::EmptyMessage,
            PanelError::Busy => PanelErrorCode::Busy,
            PanelError::NoPendingConfirmation => PanelErrorCode::NoPendingConfirmation,
            PanelError::PendingMismatch(_) => PanelErrorCode::PendingMismatch,
            PanelError::MalformedEvent { .. } => PanelErrorCode::MalformedEvent,
            PanelError::UnknownEvent(_) => PanelErrorCode::UnknownEvent,
            PanelError::Transport(_) => PanelErrorCode::Transport,
            PanelError::Backend(_) => PanelErrorCode::Backend,
            PanelError::Timeout(_) => PanelErrorCode::Timeout,
            PanelError::AgentExited => PanelErrorCode::AgentExited,
            PanelError::Storage(_) => PanelErrorCode::Storage,
            PanelError::Parse(_) => PanelErrorCode::Parse,
            PanelError::Io(_) => PanelErrorCode::Io,
            PanelError::InvalidConfig(_) => PanelErrorCode::InvalidConfig,
        }
    }
}

impl From<PanelError> for String {
    fn from(err: PanelError) -> Self {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(PanelError::Busy.code().as_str(), "PANEL_BUSY");
        assert_eq!(PanelError::Timeout(5).code(), PanelErrorCode::Timeout);
        assert_eq!(
            PanelError::Storage("locked".to_string()).code().as_str(),
            "PANEL_STORAGE_ERROR"
        );
    }

    #[test]
    fn test_backend_error_message_is_verbatim() {
        let err = PanelError::Backend("No API key configured. Set ANTHROPIC_API_KEY.".to_string());
        assert_eq!(err.to_string(), "No API key configured. Set ANTHROPIC_API_KEY.");
    }
}
