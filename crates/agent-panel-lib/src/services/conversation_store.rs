// Conversation Store
// Feature: Agent Chat Panel (001-agent-chat-panel)
//
// Ordered transcript of messages, the single source of truth for rendering.
// Messages are only appended or patched in place by id; the only removal is
// `clear`, which empties the whole sequence. Every keyed operation is a no-op
// when the id is unknown, since events can arrive after a clear.

use crate::models::{HistoryEntry, Message, ToolCall};

/// Ordered, append-only message collection
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, message_id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == message_id)
    }

    fn get_mut(&mut self, message_id: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == message_id)
    }

    /// Append a message, keeping timestamps non-decreasing
    pub fn push(&mut self, mut message: Message) {
        if let Some(last) = self.messages.last() {
            if message.timestamp < last.timestamp {
                message.timestamp = last.timestamp;
            }
        }
        self.messages.push(message);
    }

    /// Append a user message and return its id
    pub fn push_user(&mut self, content: impl Into<String>) -> String {
        let message = Message::user(content);
        let id = message.id.clone();
        self.push(message);
        id
    }

    /// Create an empty streaming assistant message. Refuses duplicate ids.
    pub fn start_assistant(&mut self, message_id: &str) -> bool {
        if self.get(message_id).is_some() {
            return false;
        }
        self.push(Message::streaming_assistant(message_id));
        true
    }

    /// Append a delta to a message that is still streaming
    pub fn append_delta(&mut self, message_id: &str, delta: &str) -> bool {
        match self.get_mut(message_id) {
            Some(message) if message.is_streaming => {
                message.content.push_str(delta);
                true
            }
            _ => false,
        }
    }

    /// Append a visibly marked error note, separated by a blank line
    pub fn append_error_note(&mut self, message_id: &str, error: &str) -> bool {
        match self.get_mut(message_id) {
            Some(message) => {
                if !message.content.is_empty() {
                    message.content.push_str("\n\n");
                }
                message.content.push_str("⚠️ Error: ");
                message.content.push_str(error);
                true
            }
            None => false,
        }
    }

    /// Clear the streaming flag on a message
    pub fn finalize(&mut self, message_id: &str) -> bool {
        match self.get_mut(message_id) {
            Some(message) => {
                message.is_streaming = false;
                true
            }
            None => false,
        }
    }

    /// Append a tool call to a message. Refuses duplicate tool ids.
    pub fn add_tool_call(&mut self, message_id: &str, tool_call: ToolCall) -> bool {
        match self.get_mut(message_id) {
            Some(message) if message.tool_call(&tool_call.id).is_none() => {
                message.tool_calls.push(tool_call);
                true
            }
            _ => false,
        }
    }

    /// Patch a tool call in place. Returns None when message or tool is unknown.
    pub fn update_tool_call<R>(
        &mut self,
        message_id: &str,
        tool_id: &str,
        f: impl FnOnce(&mut ToolCall) -> R,
    ) -> Option<R> {
        self.get_mut(message_id)
            .and_then(|message| message.tool_call_mut(tool_id))
            .map(f)
    }

    /// Empty the whole transcript
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Finalized messages as `{role, content}` pairs, oldest first
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.messages
            .iter()
            .filter(|m| !m.is_streaming)
            .map(Message::to_history)
            .collect()
    }

    pub fn streaming_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_streaming).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageRole, ToolCallStatus};
    use chrono::Duration;

    #[test]
    fn test_append_delta_only_while_streaming() {
        let mut store = ConversationStore::new();
        assert!(store.start_assistant("m1"));
        assert!(store.append_delta("m1", "Hello"));
        assert!(store.append_delta("m1", " world"));
        assert!(store.finalize("m1"));
        assert!(!store.append_delta("m1", "!"));

        let message = store.get("m1").unwrap();
        assert_eq!(message.content, "Hello world");
        assert!(!message.is_streaming);
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let mut store = ConversationStore::new();
        store.push_user("hi");

        assert!(!store.append_delta("nope", "x"));
        assert!(!store.finalize("nope"));
        assert!(!store.append_error_note("nope", "x"));
        assert!(!store.add_tool_call("nope", ToolCall::executing("t1", "x")));
        assert!(store.update_tool_call("nope", "t1", |_| ()).is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(store.messages()[0].content, "hi");
    }

    #[test]
    fn test_start_assistant_refuses_duplicate_id() {
        let mut store = ConversationStore::new();
        assert!(store.start_assistant("m1"));
        store.append_delta("m1", "kept");
        assert!(!store.start_assistant("m1"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("m1").unwrap().content, "kept");
    }

    #[test]
    fn test_error_note_separator() {
        let mut store = ConversationStore::new();
        store.start_assistant("m1");
        store.append_error_note("m1", "timeout");
        assert_eq!(store.get("m1").unwrap().content, "⚠️ Error: timeout");

        store.start_assistant("m2");
        store.append_delta("m2", "partial");
        store.append_error_note("m2", "timeout");
        assert_eq!(store.get("m2").unwrap().content, "partial\n\n⚠️ Error: timeout");
    }

    #[test]
    fn test_tool_calls_keep_call_order_and_reject_duplicates() {
        let mut store = ConversationStore::new();
        store.start_assistant("m1");
        assert!(store.add_tool_call("m1", ToolCall::executing("t1", "a")));
        assert!(store.add_tool_call("m1", ToolCall::executing("t2", "b")));
        assert!(!store.add_tool_call("m1", ToolCall::executing("t1", "c")));

        let ids: Vec<_> = store
            .get("m1")
            .unwrap()
            .tool_calls
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["t1", "t2"]);

        let status = store.update_tool_call("m1", "t2", |tc| {
            tc.complete(serde_json::json!("ok"));
            tc.status
        });
        assert_eq!(status, Some(ToolCallStatus::Completed));
    }

    #[test]
    fn test_timestamps_non_decreasing() {
        let mut store = ConversationStore::new();
        let mut late = Message::user("first");
        late.timestamp += Duration::seconds(60);
        let late_ts = late.timestamp;
        store.push(late);
        store.push(Message::user("second"));

        assert!(store.messages()[1].timestamp >= late_ts);
    }

    #[test]
    fn test_history_skips_streaming_and_clear_empties() {
        let mut store = ConversationStore::new();
        store.push_user("question");
        store.start_assistant("m1");
        store.append_delta("m1", "partial");

        let history = store.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, MessageRole::User);

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.streaming_count(), 0);
    }
}
