// Tool call lifecycle
// Feature: Agent Chat Panel (001-agent-chat-panel)
//
// Applies tool events to the owning message's tool-call list:
//   executing -> completed              (tool_result)
//   executing -> blocked                (tool_blocked)
//   executing -> awaiting_confirmation  (confirmation_required, see confirmation.rs)
// A confirmation event may also create the call directly in
// awaiting_confirmation when no tool_call_start was seen for it.

use serde_json::Value;

use crate::models::ToolCall;
use crate::services::conversation_store::ConversationStore;

/// Append an executing tool call
pub fn start_tool(
    store: &mut ConversationStore,
    message_id: &str,
    tool_id: &str,
    tool_name: &str,
) -> bool {
    let added = store.add_tool_call(message_id, ToolCall::executing(tool_id, tool_name));
    if !added {
        log::debug!("Ignoring tool start {} on message {}", tool_id, message_id);
    }
    added
}

/// Record a tool result
pub fn complete_tool(
    store: &mut ConversationStore,
    message_id: &str,
    tool_id: &str,
    result: Value,
) -> bool {
    let applied = store
        .update_tool_call(message_id, tool_id, |tc| tc.complete(result))
        .unwrap_or(false);
    if !applied {
        log::debug!("Ignoring tool result for {} on message {}", tool_id, message_id);
    }
    applied
}

/// Record a backend refusal
pub fn block_tool(
    store: &mut ConversationStore,
    message_id: &str,
    tool_id: &str,
    reason: &str,
) -> bool {
    let applied = store
        .update_tool_call(message_id, tool_id, |tc| tc.block(reason))
        .unwrap_or(false);
    if !applied {
        log::debug!("Ignoring tool block for {} on message {}", tool_id, message_id);
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ToolCallStatus;
    use serde_json::json;

    fn store_with_message() -> ConversationStore {
        let mut store = ConversationStore::new();
        store.start_assistant("m1");
        store
    }

    #[test]
    fn test_start_then_result() {
        let mut store = store_with_message();
        assert!(start_tool(&mut store, "m1", "t1", "count_samples"));
        assert!(complete_tool(&mut store, "m1", "t1", json!({"count": 200})));

        let call = store.get("m1").unwrap().tool_call("t1").unwrap();
        assert_eq!(call.status, ToolCallStatus::Completed);
        assert_eq!(call.result, Some(json!({"count": 200})));
    }

    #[test]
    fn test_blocked_is_terminal() {
        let mut store = store_with_message();
        start_tool(&mut store, "m1", "t1", "delete_dataset");
        assert!(block_tool(&mut store, "m1", "t1", "Permission mode is block_all"));
        assert!(!complete_tool(&mut store, "m1", "t1", json!("late")));

        let call = store.get("m1").unwrap().tool_call("t1").unwrap();
        assert_eq!(call.status, ToolCallStatus::Blocked);
        assert_eq!(call.blocked_reason.as_deref(), Some("Permission mode is block_all"));
        assert!(call.result.is_none());
    }

    #[test]
    fn test_unknown_targets_are_ignored() {
        let mut store = store_with_message();
        assert!(!start_tool(&mut store, "m2", "t1", "x"));
        assert!(!complete_tool(&mut store, "m1", "t9", json!(1)));
        assert!(!block_tool(&mut store, "m2", "t1", "x"));
        assert!(store.get("m1").unwrap().tool_calls.is_empty());
    }

    #[test]
    fn test_duplicate_start_keeps_first() {
        let mut store = store_with_message();
        start_tool(&mut store, "m1", "t1", "first");
        assert!(!start_tool(&mut store, "m1", "t1", "second"));
        let message = store.get("m1").unwrap();
        assert_eq!(message.tool_calls.len(), 1);
        assert_eq!(message.tool_calls[0].name, "first");
    }
}
