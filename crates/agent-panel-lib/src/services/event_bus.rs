// Event Bus
// Feature: Agent Chat Panel (001-agent-chat-panel)
//
// Inbound channel for named events pushed by the agent process. Events are
// decoded on entry and delivered in arrival order; malformed or unknown
// events are logged and dropped.

use serde_json::Value;
use tokio::sync::mpsc;

use crate::models::{PanelEvent, RawEvent};

/// Create a connected sender/receiver pair
pub fn event_bus() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventReceiver { rx })
}

/// Producer side, cloneable across transport tasks
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<PanelEvent>,
}

impl EventSender {
    /// Push a decoded event. Returns false once the receiver is gone.
    pub fn send(&self, event: PanelEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Decode and push a named event
    pub fn emit(&self, name: &str, params: Value) -> bool {
        match PanelEvent::from_named(name, params) {
            Ok(event) => self.send(event),
            Err(e) => {
                log::warn!("Dropping inbound event: {}", e);
                false
            }
        }
    }

    pub fn emit_raw(&self, raw: RawEvent) -> bool {
        self.emit(&raw.event, raw.params)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side, owned by the panel's event loop
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<PanelEvent>,
}

impl EventReceiver {
    /// Next event, or None once every sender is dropped
    pub async fn recv(&mut self) -> Option<PanelEvent> {
        self.rx.recv().await
    }

    /// Next buffered event without waiting
    pub fn try_recv(&mut self) -> Option<PanelEvent> {
        self.rx.try_recv().ok()
    }
}
