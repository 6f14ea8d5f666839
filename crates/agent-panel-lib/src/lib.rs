// Agent Panel - core library
// Streaming conversation and tool confirmation protocol for an agent chat panel

pub mod error;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;

// Re-export models for use by hosts
pub use error::{PanelError, PanelErrorCode, PanelResult};
pub use models::*;
pub use services::{
    event_bus, AgentCommand, AgentPanel, AgentProcess, Dispatcher, EventReceiver, EventSender,
    HostDispatcher, PanelSnapshot, PanelState,
};
