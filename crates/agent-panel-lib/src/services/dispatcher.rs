// Outbound Request Dispatcher
// Feature: Agent Chat Panel (001-agent-chat-panel)
//
// Translates user intent into single round-trip requests against the host's
// operator transport. Holds no protocol state: sequencing is driven by the
// inbound event stream, independent of when these calls complete.

use async_trait::async_trait;

use crate::error::PanelResult;
use crate::models::{ConfigUpdate, LoadedConfig, SendMessageAck, SendMessageRequest};

/// Operator names understood by the agent backend
pub mod operators {
    pub const SEND_MESSAGE: &str = "send_message";
    pub const CONFIRM_OPERATION: &str = "confirm_operation";
    pub const CANCEL_OPERATION: &str = "cancel_operation";
    pub const STOP_GENERATION: &str = "stop_generation";
    pub const LOAD_CONFIG: &str = "load_config";
    pub const SAVE_CONFIG: &str = "save_config";
    pub const CLEAR_HISTORY: &str = "clear_history";
    pub const LIST_SKILLS: &str = "list_skills";
}

#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Start a new assistant turn
    async fn send_message(&self, request: SendMessageRequest) -> PanelResult<SendMessageAck>;

    /// Resume a suspended operation
    async fn confirm_operation(&self, pending_id: &str) -> PanelResult<()>;

    /// Abort a suspended operation
    async fn cancel_operation(&self, pending_id: &str) -> PanelResult<()>;

    /// Ask the backend to end the current stream
    async fn stop_generation(&self) -> PanelResult<()>;

    async fn load_config(&self) -> PanelResult<LoadedConfig>;

    /// Persist only the supplied fields
    async fn save_config(&self, update: ConfigUpdate) -> PanelResult<()>;

    async fn clear_history(&self) -> PanelResult<()>;
}
