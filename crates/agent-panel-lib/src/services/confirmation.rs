// Confirmation Gate
// Feature: Agent Chat Panel (001-agent-chat-panel)
//
// Single-slot register for the tool call the backend has suspended pending a
// user decision. The slot is emptied synchronously on confirm/cancel, before
// the resume/abort request is dispatched.

use crate::error::{PanelError, PanelResult};
use crate::models::{PendingConfirmation, ToolCall, CANCELLED_BY_USER};
use crate::services::conversation_store::ConversationStore;

/// At most one pending confirmation
#[derive(Debug, Clone, Default)]
pub struct ConfirmationGate {
    pending: Option<PendingConfirmation>,
}

impl ConfirmationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<&PendingConfirmation> {
        self.pending.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.pending.is_some()
    }

    /// Open the gate for a suspended tool call.
    ///
    /// Upserts the tool call: an existing executing call moves to
    /// awaiting_confirmation, a missing one is created in that state.
    /// A newer request replaces any open one. Requests for unknown messages
    /// are dropped.
    pub fn open(&mut self, store: &mut ConversationStore, request: PendingConfirmation) -> bool {
        let Some(message) = store.get(&request.message_id) else {
            log::debug!(
                "Dropping confirmation {} for unknown message {}",
                request.pending_id,
                request.message_id
            );
            return false;
        };

        if message.tool_call(&request.tool_call_id).is_some() {
            let moved = store
                .update_tool_call(
                    &request.message_id,
                    &request.tool_call_id,
                    ToolCall::await_confirmation,
                )
                .unwrap_or(false);
            if !moved {
                log::debug!(
                    "Tool call {} cannot await confirmation from its current state",
                    request.tool_call_id
                );
            }
        } else {
            store.add_tool_call(
                &request.message_id,
                ToolCall::awaiting_confirmation(
                    request.tool_call_id.clone(),
                    request.tool_name.clone(),
                    request.tool_input.clone(),
                ),
            );
        }

        if let Some(previous) = &self.pending {
            log::warn!(
                "Confirmation {} replaced by {} before the user decided",
                previous.pending_id,
                request.pending_id
            );
        }
        log::info!(
            "Confirmation required for {} ({} risk): {}",
            request.tool_name,
            request.risk,
            request.pending_id
        );
        self.pending = Some(request);
        true
    }

    fn take(&mut self, pending_id: &str) -> PanelResult<PendingConfirmation> {
        let matches = match &self.pending {
            Some(p) => p.pending_id == pending_id,
            None => return Err(PanelError::NoPendingConfirmation),
        };
        if !matches {
            return Err(PanelError::PendingMismatch(pending_id.to_string()));
        }
        self.pending.take().ok_or(PanelError::NoPendingConfirmation)
    }

    /// Accept: clear the slot and resume the tool call
    pub fn confirm(
        &mut self,
        store: &mut ConversationStore,
        pending_id: &str,
    ) -> PanelResult<PendingConfirmation> {
        let pending = self.take(pending_id)?;
        let resumed = store
            .update_tool_call(&pending.message_id, &pending.tool_call_id, |tc| {
                tc.resume(&pending.tool_input)
            })
            .unwrap_or(false);
        if !resumed {
            log::debug!("Tool call {} was not awaiting confirmation", pending.tool_call_id);
        }
        Ok(pending)
    }

    /// Reject: clear the slot and block the tool call
    pub fn cancel(
        &mut self,
        store: &mut ConversationStore,
        pending_id: &str,
    ) -> PanelResult<PendingConfirmation> {
        let pending = self.take(pending_id)?;
        let blocked = store
            .update_tool_call(&pending.message_id, &pending.tool_call_id, |tc| {
                tc.block(CANCELLED_BY_USER)
            })
            .unwrap_or(false);
        if !blocked {
            log::debug!("Tool call {} was already terminal", pending.tool_call_id);
        }
        Ok(pending)
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}
