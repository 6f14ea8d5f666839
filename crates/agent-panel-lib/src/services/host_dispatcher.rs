// Host Dispatcher
// Feature: Agent Chat Panel (001-agent-chat-panel)
//
// Dispatcher used inside the host application. Conversation requests go to
// the agent process. Configuration is persisted in the host's key-value store
// and every change is forwarded to the agent, which enforces the permission
// mode and owns its own copy of the history.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::PanelResult;
use crate::models::{
    ConfigUpdate, LoadedConfig, PendingOperationRequest, SendMessageAck, SendMessageRequest,
    SkillInfo,
};
use crate::repositories::ConfigRepository;
use crate::services::agent_process::AgentProcess;
use crate::services::dispatcher::{operators, Dispatcher};

pub struct HostDispatcher {
    agent: Arc<AgentProcess>,
    config: ConfigRepository,
}

impl HostDispatcher {
    pub fn new(agent: Arc<AgentProcess>, config: ConfigRepository) -> Self {
        Self { agent, config }
    }

    async fn pending_operation(&self, method: &str, pending_id: &str) -> PanelResult<()> {
        let params = serde_json::to_value(PendingOperationRequest {
            pending_id: pending_id.to_string(),
        })?;
        self.agent.request(method, params).await?;
        Ok(())
    }

    /// Announce the persisted configuration to the agent at mount
    async fn sync_agent(&self, loaded: &LoadedConfig) -> PanelResult<()> {
        let update = ConfigUpdate {
            mcp_servers: Some(loaded.mcp_servers.clone()),
            active_skills: Some(loaded.active_skills.clone()),
            settings: Some(loaded.settings.clone()),
            history: None,
        };
        self.agent
            .request(operators::LOAD_CONFIG, serde_json::to_value(&update)?)
            .await?;
        Ok(())
    }

    /// Skill catalog from the backend. Accepts a bare list or `{"skills": [...]}`.
    async fn available_skills(&self) -> Vec<SkillInfo> {
        let value = match self.agent.request(operators::LIST_SKILLS, json!({})).await {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Failed to list skills: {}", e);
                return Vec::new();
            }
        };
        let list = match value {
            Value::Object(mut map) => map.remove("skills").unwrap_or(Value::Null),
            other => other,
        };
        if list.is_null() {
            return Vec::new();
        }
        serde_json::from_value(list).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable skill catalog: {}", e);
            Vec::new()
        })
    }
}

#[async_trait]
impl Dispatcher for HostDispatcher {
    async fn send_message(&self, request: SendMessageRequest) -> PanelResult<SendMessageAck> {
        let value = self
            .agent
            .request(operators::SEND_MESSAGE, serde_json::to_value(&request)?)
            .await?;
        if value.is_null() {
            return Ok(SendMessageAck::default());
        }
        Ok(serde_json::from_value(value)?)
    }

    async fn confirm_operation(&self, pending_id: &str) -> PanelResult<()> {
        self.pending_operation(operators::CONFIRM_OPERATION, pending_id).await
    }

    async fn cancel_operation(&self, pending_id: &str) -> PanelResult<()> {
        self.pending_operation(operators::CANCEL_OPERATION, pending_id).await
    }

    async fn stop_generation(&self) -> PanelResult<()> {
        self.agent.request(operators::STOP_GENERATION, json!({})).await?;
        Ok(())
    }

    async fn load_config(&self) -> PanelResult<LoadedConfig> {
        let mut loaded = self.config.load()?;
        if let Err(e) = self.sync_agent(&loaded).await {
            log::warn!("Failed to send stored config to agent: {}", e);
        }
        loaded.available_skills = self.available_skills().await;
        Ok(loaded)
    }

    async fn save_config(&self, update: ConfigUpdate) -> PanelResult<()> {
        self.config.save(&update)?;
        self.agent
            .request(operators::SAVE_CONFIG, serde_json::to_value(&update)?)
            .await?;
        Ok(())
    }

    async fn clear_history(&self) -> PanelResult<()> {
        self.config.clear_history()?;
        self.agent.request(operators::CLEAR_HISTORY, json!({})).await?;
        Ok(())
    }
}
