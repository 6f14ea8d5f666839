// Data models for the agent panel

pub mod config;
pub mod confirmation;
pub mod conversation;
pub mod events;
pub mod requests;

pub use config::{
    AgentConfig, AgentSettings, ConfigUpdate, LoadedConfig, McpServer, PermissionMode, SkillInfo,
};
pub use confirmation::{PendingConfirmation, RiskLevel};
pub use conversation::{
    HistoryEntry, Message, MessageRole, ToolCall, ToolCallStatus, ToolInput, CANCELLED_BY_USER,
};
pub use events::{PanelEvent, RawEvent};
pub use requests::{PendingOperationRequest, SendMessageAck, SendMessageRequest};
