// Streaming Session Controller
// Feature: Agent Chat Panel (001-agent-chat-panel)
//
// Owns the invariant that at most one assistant message is in flight.
// The generating flag is derived from the streaming id, so the pair
// (is_generating, streaming_id) can only be Idle (false, None) or
// Active (true, Some(id)).
//
// A send that has not yet been acknowledged or answered by a stream start
// is tracked separately, so a second send cannot race the first one.

use crate::services::conversation_store::ConversationStore;

/// Session phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Active { message_id: String },
}

/// Tracks the single in-flight assistant message
#[derive(Debug, Clone, Default)]
pub struct StreamingSession {
    streaming_id: Option<String>,
    send_in_flight: bool,
}

impl StreamingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_generating(&self) -> bool {
        self.streaming_id.is_some()
    }

    pub fn is_sending(&self) -> bool {
        self.send_in_flight
    }

    /// Generating, or waiting on a send that has not been answered yet
    pub fn is_busy(&self) -> bool {
        self.is_generating() || self.send_in_flight
    }

    pub fn begin_send(&mut self) {
        self.send_in_flight = true;
    }

    pub fn end_send(&mut self) {
        self.send_in_flight = false;
    }

    pub fn streaming_id(&self) -> Option<&str> {
        self.streaming_id.as_deref()
    }

    pub fn phase(&self) -> SessionPhase {
        match &self.streaming_id {
            Some(id) => SessionPhase::Active {
                message_id: id.clone(),
            },
            None => SessionPhase::Idle,
        }
    }

    fn is_streaming(&self, message_id: &str) -> bool {
        self.streaming_id.as_deref() == Some(message_id)
    }

    /// Idle -> Active. No-op while another stream is active.
    pub fn start(&mut self, store: &mut ConversationStore, message_id: &str) -> bool {
        if let Some(active) = &self.streaming_id {
            log::warn!(
                "Ignoring stream start for {} while {} is still streaming",
                message_id,
                active
            );
            return false;
        }
        if !store.start_assistant(message_id) {
            log::debug!("Ignoring stream start for existing message {}", message_id);
            return false;
        }
        self.streaming_id = Some(message_id.to_string());
        self.send_in_flight = false;
        log::info!("Stream started: {}", message_id);
        true
    }

    /// Append a chunk to the active message
    pub fn chunk(
        &mut self,
        store: &mut ConversationStore,
        message_id: &str,
        delta: &str,
    ) -> bool {
        if !self.is_streaming(message_id) {
            log::debug!("Dropping chunk for inactive message {}", message_id);
            return false;
        }
        store.append_delta(message_id, delta)
    }

    /// Active -> Idle on normal completion
    pub fn complete(&mut self, store: &mut ConversationStore, message_id: &str) -> bool {
        if !self.is_streaming(message_id) {
            log::debug!("Dropping completion for inactive message {}", message_id);
            return false;
        }
        store.finalize(message_id);
        self.streaming_id = None;
        log::info!("Stream completed: {}", message_id);
        true
    }

    /// Active -> Idle with an error note injected into the transcript
    pub fn fail(
        &mut self,
        store: &mut ConversationStore,
        message_id: &str,
        error: &str,
    ) -> bool {
        if !self.is_streaming(message_id) {
            log::debug!("Dropping stream error for inactive message {}", message_id);
            return false;
        }
        store.append_error_note(message_id, error);
        store.finalize(message_id);
        self.streaming_id = None;
        log::warn!("Stream failed: {}: {}", message_id, error);
        true
    }

    /// Return to Idle without touching the transcript
    pub fn reset(&mut self) {
        self.streaming_id = None;
        self.send_in_flight = false;
    }
}
