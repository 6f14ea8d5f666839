// Services module
// Conversation state machine, transport and dispatch

pub mod agent_process;
pub mod confirmation;
pub mod conversation_store;
pub mod dispatcher;
pub mod event_bus;
pub mod host_dispatcher;
pub mod panel;
pub mod session;
pub mod tool_lifecycle;

pub use agent_process::{AgentCommand, AgentProcess};
pub use confirmation::ConfirmationGate;
pub use conversation_store::ConversationStore;
pub use dispatcher::Dispatcher;
pub use event_bus::{event_bus, EventReceiver, EventSender};
pub use host_dispatcher::HostDispatcher;
pub use panel::{AgentPanel, PanelSnapshot, PanelState};
pub use session::{SessionPhase, StreamingSession};
