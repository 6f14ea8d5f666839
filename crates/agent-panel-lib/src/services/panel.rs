// Agent Panel Controller
// Feature: Agent Chat Panel (001-agent-chat-panel)
//
// Root controller for the panel:
// - PanelState owns the conversation store, streaming session, confirmation
//   gate and configuration, and is only mutated through its methods
// - apply_event is the single dispatch point for inbound events
// - AgentPanel pairs the shared state with a dispatcher for user actions
//
// No state lock is held across an await, so inbound events keep applying
// while a dispatcher call is outstanding.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::error::{PanelError, PanelResult};
use crate::models::{
    AgentConfig, AgentSettings, ConfigUpdate, LoadedConfig, McpServer, Message, PanelEvent,
    PendingConfirmation, SendMessageRequest,
};
use crate::services::confirmation::ConfirmationGate;
use crate::services::conversation_store::ConversationStore;
use crate::services::dispatcher::Dispatcher;
use crate::services::event_bus::EventReceiver;
use crate::services::session::StreamingSession;
use crate::services::tool_lifecycle;

/// Read-only copy of the panel state for rendering
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelSnapshot {
    pub messages: Vec<Message>,
    pub pending_confirmation: Option<PendingConfirmation>,
    pub is_generating: bool,
    pub is_sending: bool,
    pub streaming_message_id: Option<String>,
    pub config: AgentConfig,
}

/// Application state owned by the panel's root controller
#[derive(Debug, Default)]
pub struct PanelState {
    store: ConversationStore,
    session: StreamingSession,
    gate: ConfirmationGate,
    config: AgentConfig,
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn session(&self) -> &StreamingSession {
        &self.session
    }

    pub fn gate(&self) -> &ConfirmationGate {
        &self.gate
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub(crate) fn config_mut(&mut self) -> &mut AgentConfig {
        &mut self.config
    }

    pub fn is_generating(&self) -> bool {
        self.session.is_generating()
    }

    pub fn pending_confirmation(&self) -> Option<&PendingConfirmation> {
        self.gate.pending()
    }

    /// Apply one inbound event. Returns whether anything changed.
    pub fn apply_event(&mut self, event: PanelEvent) -> bool {
        match event {
            PanelEvent::StreamMessageStart { message_id } => {
                self.session.start(&mut self.store, &message_id)
            }
            PanelEvent::StreamChunk { message_id, delta } => {
                self.session.chunk(&mut self.store, &message_id, &delta)
            }
            PanelEvent::StreamComplete { message_id } => {
                self.session.complete(&mut self.store, &message_id)
            }
            PanelEvent::StreamError { message_id, error } => {
                self.session.fail(&mut self.store, &message_id, &error)
            }
            PanelEvent::ToolCallStart {
                message_id,
                tool_id,
                tool_name,
            } => tool_lifecycle::start_tool(&mut self.store, &message_id, &tool_id, &tool_name),
            PanelEvent::ToolResult {
                message_id,
                tool_id,
                result,
            } => tool_lifecycle::complete_tool(&mut self.store, &message_id, &tool_id, result),
            PanelEvent::ToolBlocked {
                message_id,
                tool_id,
                reason,
            } => tool_lifecycle::block_tool(&mut self.store, &message_id, &tool_id, &reason),
            PanelEvent::ConfirmationRequired {
                message_id,
                pending_id,
                tool_id,
                tool_name,
                tool_input,
                risk,
                human_description,
            } => self.gate.open(
                &mut self.store,
                PendingConfirmation {
                    pending_id,
                    tool_call_id: tool_id,
                    message_id,
                    tool_name,
                    tool_input,
                    risk,
                    human_description,
                },
            ),
        }
    }

    /// Validate user input, append it to the transcript and build the request
    pub fn prepare_send(&mut self, text: &str) -> PanelResult<SendMessageRequest> {
        if text.trim().is_empty() {
            return Err(PanelError::EmptyMessage);
        }
        if self.session.is_busy() {
            return Err(PanelError::Busy);
        }

        self.store.push_user(text);
        self.session.begin_send();

        Ok(SendMessageRequest {
            message: text.to_string(),
            history: self.store.history(),
            active_skills: self.config.active_skills.clone(),
            mcp_config: self.config.active_mcp_server().cloned(),
            model: self.config.settings.model.clone(),
            max_tokens: self.config.settings.max_tokens,
        })
    }

    /// Settle an outstanding send. A failure is recorded in the transcript.
    pub fn finish_send(&mut self, failure: Option<&str>) {
        self.session.end_send();
        if let Some(details) = failure {
            self.store.push(Message::assistant(format!("Error: {}", details)));
        }
    }

    pub fn begin_confirm(&mut self, pending_id: &str) -> PanelResult<PendingConfirmation> {
        self.gate.confirm(&mut self.store, pending_id)
    }

    pub fn begin_cancel(&mut self, pending_id: &str) -> PanelResult<PendingConfirmation> {
        self.gate.cancel(&mut self.store, pending_id)
    }

    /// Install configuration loaded at panel mount
    pub fn apply_loaded_config(&mut self, loaded: LoadedConfig) {
        self.config.set_mcp_servers(loaded.mcp_servers);
        self.config.set_active_skills(loaded.active_skills);
        self.config.available_skills = loaded.available_skills;
        self.config.settings = loaded.settings;

        if self.config.settings.persist_history && self.store.is_empty() {
            for entry in &loaded.history {
                self.store.push(Message::from_history(entry));
            }
        }
    }

    /// Everything the user can save, with history only when it is persisted
    pub fn config_update(&self) -> ConfigUpdate {
        ConfigUpdate {
            mcp_servers: Some(self.config.mcp_servers.clone()),
            active_skills: Some(self.config.active_skills.clone()),
            settings: Some(self.config.settings.clone()),
            history: self
                .config
                .settings
                .persist_history
                .then(|| self.store.history()),
        }
    }

    /// Empty the transcript and return to Idle. An open confirmation is kept
    /// so the suspended backend operation can still be resolved.
    pub fn clear_history(&mut self) {
        self.store.clear();
        self.session.reset();
    }

    pub fn snapshot(&self) -> PanelSnapshot {
        PanelSnapshot {
            messages: self.store.messages().to_vec(),
            pending_confirmation: self.gate.pending().cloned(),
            is_generating: self.session.is_generating(),
            is_sending: self.session.is_sending(),
            streaming_message_id: self.session.streaming_id().map(str::to_string),
            config: self.config.clone(),
        }
    }
}

/// Panel controller shared between the event loop and user actions
#[derive(Clone)]
pub struct AgentPanel {
    state: Arc<RwLock<PanelState>>,
    dispatcher: Arc<dyn Dispatcher>,
}

impl AgentPanel {
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            state: Arc::new(RwLock::new(PanelState::new())),
            dispatcher,
        }
    }

    /// Shared state handle
    pub fn state(&self) -> Arc<RwLock<PanelState>> {
        Arc::clone(&self.state)
    }

    pub async fn snapshot(&self) -> PanelSnapshot {
        self.state.read().await.snapshot()
    }

    pub async fn is_generating(&self) -> bool {
        self.state.read().await.is_generating()
    }

    pub async fn handle_event(&self, event: PanelEvent) -> bool {
        let name = event.name();
        let applied = self.state.write().await.apply_event(event);
        if !applied {
            log::debug!("Event {} had no effect", name);
        }
        applied
    }

    /// Apply events until every sender is dropped
    pub async fn run_events(&self, mut receiver: EventReceiver) {
        while let Some(event) = receiver.recv().await {
            self.handle_event(event).await;
        }
        log::info!("Event bus closed");
    }

    pub fn spawn_event_loop(&self, receiver: EventReceiver) -> JoinHandle<()> {
        let panel = self.clone();
        tokio::spawn(async move { panel.run_events(receiver).await })
    }

    /// Send a user message.
    ///
    /// Validation errors are returned. Transport failures and backend
    /// rejections are recorded in the transcript as `Error: <details>`.
    pub async fn send_message(&self, text: &str) -> PanelResult<()> {
        let request = self.state.write().await.prepare_send(text)?;

        log::info!(
            "Sending message ({} history entries, model {})",
            request.history.len(),
            request.model
        );

        let failure = match self.dispatcher.send_message(request).await {
            Ok(ack) => ack.rejection().map(str::to_string),
            Err(e) => {
                log::error!("send_message failed: {}", e);
                Some(e.to_string())
            }
        };

        self.state.write().await.finish_send(failure.as_deref());
        Ok(())
    }

    /// Accept the pending operation identified by `pending_id`
    pub async fn confirm_operation(&self, pending_id: &str) -> PanelResult<()> {
        let pending = self.state.write().await.begin_confirm(pending_id)?;
        if let Err(e) = self.dispatcher.confirm_operation(&pending.pending_id).await {
            log::warn!("confirm_operation {} failed: {}", pending.pending_id, e);
        }
        Ok(())
    }

    /// Reject the pending operation identified by `pending_id`
    pub async fn cancel_operation(&self, pending_id: &str) -> PanelResult<()> {
        let pending = self.state.write().await.begin_cancel(pending_id)?;
        if let Err(e) = self.dispatcher.cancel_operation(&pending.pending_id).await {
            log::warn!("cancel_operation {} failed: {}", pending.pending_id, e);
        }
        Ok(())
    }

    async fn current_pending_id(&self) -> PanelResult<String> {
        self.state
            .read()
            .await
            .pending_confirmation()
            .map(|p| p.pending_id.clone())
            .ok_or(PanelError::NoPendingConfirmation)
    }

    /// Accept whatever confirmation is currently shown
    pub async fn confirm(&self) -> PanelResult<()> {
        let pending_id = self.current_pending_id().await?;
        self.confirm_operation(&pending_id).await
    }

    /// Reject whatever confirmation is currently shown
    pub async fn cancel(&self) -> PanelResult<()> {
        let pending_id = self.current_pending_id().await?;
        self.cancel_operation(&pending_id).await
    }

    /// Ask the backend to stop the current stream. Returns false when idle.
    ///
    /// The stream still ends through the backend's own completion or error
    /// event; nothing is finalized locally.
    pub async fn stop_generation(&self) -> PanelResult<bool> {
        if !self.is_generating().await {
            return Ok(false);
        }
        if let Err(e) = self.dispatcher.stop_generation().await {
            log::warn!("stop_generation failed: {}", e);
        }
        Ok(true)
    }

    /// Load configuration (and persisted history) once at panel mount
    pub async fn load_config(&self) -> PanelResult<()> {
        let loaded = self.dispatcher.load_config().await?;
        log::info!(
            "Loaded config: {} MCP servers, {} active skills, {} history entries",
            loaded.mcp_servers.len(),
            loaded.active_skills.len(),
            loaded.history.len()
        );
        self.state.write().await.apply_loaded_config(loaded);
        Ok(())
    }

    /// Persist the current configuration
    pub async fn save_config(&self) -> PanelResult<()> {
        let update = self.state.read().await.config_update();
        self.dispatcher.save_config(update).await?;
        log::info!("Config saved");
        Ok(())
    }

    // ========================================================================
    // Configuration edits (local until save_config)
    // ========================================================================

    /// Returns whether the skill is now active
    pub async fn toggle_skill(&self, skill_id: &str) -> bool {
        self.state.write().await.config_mut().toggle_skill(skill_id)
    }

    pub async fn set_active_skills(&self, skills: Vec<String>) {
        self.state.write().await.config_mut().set_active_skills(skills);
    }

    pub async fn add_mcp_server(&self, server: McpServer) -> PanelResult<()> {
        self.state.write().await.config_mut().add_mcp_server(server)
    }

    pub async fn remove_mcp_server(&self, label: &str) -> bool {
        self.state.write().await.config_mut().remove_mcp_server(label)
    }

    /// Enabling a server disables every other one
    pub async fn set_mcp_server_enabled(&self, label: &str, enabled: bool) -> bool {
        self.state
            .write()
            .await
            .config_mut()
            .set_mcp_server_enabled(label, enabled)
    }

    pub async fn update_settings(&self, settings: AgentSettings) -> PanelResult<()> {
        self.state.write().await.config_mut().update_settings(settings)
    }

    /// Clear the transcript locally, then the persisted history
    pub async fn clear_history(&self) -> PanelResult<()> {
        self.state.write().await.clear_history();
        self.dispatcher.clear_history().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HistoryEntry, MessageRole};
    use serde_json::json;

    fn event(name: &str, params: serde_json::Value) -> PanelEvent {
        PanelEvent::from_named(name, params).unwrap()
    }

    #[test]
    fn test_prepare_send_validation() {
        let mut state = PanelState::new();
        assert!(matches!(state.prepare_send("   "), Err(PanelError::EmptyMessage)));
        assert!(state.store().is_empty());

        state.apply_event(event("stream_message_start", json!({"message_id": "m1"})));
        assert!(matches!(state.prepare_send("again"), Err(PanelError::Busy)));
        assert_eq!(state.store().len(), 1);
    }

    #[test]
    fn test_second_send_rejected_until_first_settles() {
        let mut state = PanelState::new();
        state.prepare_send("first").unwrap();

        assert!(matches!(state.prepare_send("second"), Err(PanelError::Busy)));
        assert_eq!(state.store().len(), 1);
        assert!(state.snapshot().is_sending);

        state.finish_send(None);
        let request = state.prepare_send("second").unwrap();
        assert_eq!(request.history.len(), 2);
    }

    #[test]
    fn test_send_in_flight_cleared_by_stream_start() {
        let mut state = PanelState::new();
        state.prepare_send("first").unwrap();
        state.apply_event(event("stream_message_start", json!({"message_id": "m1"})));
        state.apply_event(event("stream_complete", json!({"message_id": "m1"})));

        assert!(state.prepare_send("second").is_ok());
    }

    #[test]
    fn test_prepare_send_builds_request() {
        let mut state = PanelState::new();
        let mut server = McpServer::new("fiftyone", "fiftyone-mcp", vec![]);
        server.enabled = true;
        state.config_mut().add_mcp_server(server).unwrap();
        state.config_mut().toggle_skill("dataset_stats");

        let request = state.prepare_send("How many samples?").unwrap();

        assert_eq!(request.message, "How many samples?");
        assert_eq!(
            request.history,
            vec![HistoryEntry {
                role: MessageRole::User,
                content: "How many samples?".to_string(),
            }]
        );
        assert_eq!(request.active_skills, vec!["dataset_stats".to_string()]);
        assert_eq!(request.mcp_config.map(|s| s.label), Some("fiftyone".to_string()));
        assert_eq!(request.max_tokens, 1024);
    }

    #[test]
    fn test_loaded_history_restored_once() {
        let mut state = PanelState::new();
        let loaded = LoadedConfig {
            history: vec![
                HistoryEntry {
                    role: MessageRole::User,
                    content: "hi".to_string(),
                },
                HistoryEntry {
                    role: MessageRole::Assistant,
                    content: "hello".to_string(),
                },
            ],
            active_skills: vec!["a".into(), "a".into()],
            mcp_servers: vec![
                McpServer {
                    enabled: true,
                    ..McpServer::new("one", "mcp-one", vec![])
                },
                McpServer {
                    enabled: true,
                    ..McpServer::new("two", "mcp-two", vec![])
                },
            ],
            ..LoadedConfig::default()
        };

        state.apply_loaded_config(loaded.clone());
        state.apply_loaded_config(loaded);

        assert_eq!(state.store().len(), 2);
        assert!(state.store().messages().iter().all(|m| !m.is_streaming));
        assert_eq!(state.config().active_skills, vec!["a".to_string()]);
        assert_eq!(
            state.config().active_mcp_server().map(|s| s.label.as_str()),
            Some("one")
        );
        assert!(!state.config().mcp_servers[1].enabled);
    }

    #[test]
    fn test_config_update_respects_persist_history() {
        let mut state = PanelState::new();
        state.store.push_user("hi");
        assert_eq!(state.config_update().history.map(|h| h.len()), Some(1));

        state.config_mut().settings.persist_history = false;
        assert!(state.config_update().history.is_none());
    }

    #[test]
    fn test_clear_history_returns_to_idle() {
        let mut state = PanelState::new();
        state.apply_event(event("stream_message_start", json!({"message_id": "m1"})));
        state.clear_history();

        assert!(!state.is_generating());
        let stale = event("stream_chunk", json!({"message_id": "m1", "delta": "x"}));
        assert!(!state.apply_event(stale));
        assert!(!state.apply_event(event("stream_complete", json!({"message_id": "m1"}))));
        assert!(state.store().is_empty());
    }

    #[test]
    fn test_snapshot_serializes_for_host() {
        let mut state = PanelState::new();
        state.apply_event(event("stream_message_start", json!({"message_id": "m1"})));
        let value = serde_json::to_value(state.snapshot()).unwrap();
        assert_eq!(value["isGenerating"], json!(true));
        assert_eq!(value["streamingMessageId"], json!("m1"));
        assert_eq!(value["pendingConfirmation"], serde_json::Value::Null);
    }
}
