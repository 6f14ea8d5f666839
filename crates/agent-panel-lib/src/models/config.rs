// Agent configuration models
// Feature: Agent Chat Panel (001-agent-chat-panel)
//
// Process-wide panel configuration: model settings, permission mode,
// active skills and registered MCP tool-provider endpoints.

use serde::{Deserialize, Serialize};

use super::conversation::HistoryEntry;
use crate::error::{PanelError, PanelResult};

/// Default model used when none is configured
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Default response token limit
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_true() -> bool {
    true
}

/// How the backend gates tool execution
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PermissionMode {
    /// Backend decides which tools need confirmation (default)
    #[default]
    Auto,
    /// Every tool call requires confirmation
    ConfirmAll,
    /// Every tool call is blocked
    BlockAll,
}

impl std::fmt::Display for PermissionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionMode::Auto => write!(f, "auto"),
            PermissionMode::ConfirmAll => write!(f, "confirm_all"),
            PermissionMode::BlockAll => write!(f, "block_all"),
        }
    }
}

/// Registered MCP tool-provider endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct McpServer {
    pub label: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub enabled: bool,
}

impl McpServer {
    pub fn new(label: impl Into<String>, command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            label: label.into(),
            command: command.into(),
            args,
            enabled: false,
        }
    }
}

/// Model and permission settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgentSettings {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub permission_mode: PermissionMode,
    #[serde(default = "default_true")]
    pub persist_history: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            permission_mode: PermissionMode::Auto,
            persist_history: true,
        }
    }
}

/// Skill offered by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkillInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Panel configuration, loaded once per session and saved on demand
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    pub mcp_servers: Vec<McpServer>,
    pub active_skills: Vec<String>,
    /// Read-only, supplied by the backend
    pub available_skills: Vec<SkillInfo>,
    pub settings: AgentSettings,
}

impl AgentConfig {
    /// The endpoint sent with each message: the first enabled server
    pub fn active_mcp_server(&self) -> Option<&McpServer> {
        self.mcp_servers.iter().find(|server| server.enabled)
    }

    /// Toggle a skill on or off. Returns whether it is now active.
    pub fn toggle_skill(&mut self, skill_id: &str) -> bool {
        if let Some(pos) = self.active_skills.iter().position(|s| s == skill_id) {
            self.active_skills.remove(pos);
            false
        } else {
            self.active_skills.push(skill_id.to_string());
            true
        }
    }

    /// Replace active skills, keeping first occurrence order
    pub fn set_active_skills(&mut self, skills: Vec<String>) {
        let mut unique: Vec<String> = Vec::with_capacity(skills.len());
        for skill in skills {
            if !unique.contains(&skill) {
                unique.push(skill);
            }
        }
        self.active_skills = unique;
    }

    pub fn add_mcp_server(&mut self, server: McpServer) -> PanelResult<()> {
        if server.label.trim().is_empty() {
            return Err(PanelError::InvalidConfig("MCP server label is required".to_string()));
        }
        if server.command.trim().is_empty() {
            return Err(PanelError::InvalidConfig("MCP server command is required".to_string()));
        }
        if self.mcp_servers.iter().any(|s| s.label == server.label) {
            return Err(PanelError::InvalidConfig(format!(
                "MCP server already exists: {}",
                server.label
            )));
        }
        let enable = server.enabled;
        let label = server.label.clone();
        self.mcp_servers.push(server);
        if enable {
            self.set_mcp_server_enabled(&label, true);
        }
        Ok(())
    }

    /// Replace the server list. Only the first enabled server stays enabled.
    pub fn set_mcp_servers(&mut self, servers: Vec<McpServer>) {
        let mut seen_enabled = false;
        self.mcp_servers = servers
            .into_iter()
            .map(|mut server| {
                if server.enabled && seen_enabled {
                    log::warn!("Disabling extra enabled MCP server: {}", server.label);
                    server.enabled = false;
                }
                seen_enabled |= server.enabled;
                server
            })
            .collect();
    }

    pub fn remove_mcp_server(&mut self, label: &str) -> bool {
        let before = self.mcp_servers.len();
        self.mcp_servers.retain(|s| s.label != label);
        self.mcp_servers.len() != before
    }

    /// Enable or disable a server. Enabling one disables all others.
    pub fn set_mcp_server_enabled(&mut self, label: &str, enabled: bool) -> bool {
        if !self.mcp_servers.iter().any(|s| s.label == label) {
            return false;
        }
        for server in &mut self.mcp_servers {
            if server.label == label {
                server.enabled = enabled;
            } else if enabled {
                server.enabled = false;
            }
        }
        true
    }

    pub fn update_settings(&mut self, settings: AgentSettings) -> PanelResult<()> {
        if settings.model.trim().is_empty() {
            return Err(PanelError::InvalidConfig("Model is required".to_string()));
        }
        if settings.max_tokens == 0 {
            return Err(PanelError::InvalidConfig(
                "Max tokens must be greater than zero".to_string(),
            ));
        }
        self.settings = settings;
        Ok(())
    }
}

/// Result of `load_config`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoadedConfig {
    #[serde(default)]
    pub mcp_servers: Vec<McpServer>,
    #[serde(default)]
    pub active_skills: Vec<String>,
    #[serde(default)]
    pub available_skills: Vec<SkillInfo>,
    #[serde(default)]
    pub settings: AgentSettings,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// Partial `save_config` payload. Only supplied fields are persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp_servers: Option<Vec<McpServer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_skills: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<AgentSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryEntry>>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self.mcp_servers.is_none()
            && self.active_skills.is_none()
            && self.settings.is_none()
            && self.history.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn server(label: &str) -> McpServer {
        McpServer::new(label, "npx", vec!["-y".to_string(), label.to_string()])
    }

    #[test]
    fn test_enabling_server_disables_others() {
        let mut config = AgentConfig::default();
        config.add_mcp_server(server("a")).unwrap();
        config.add_mcp_server(server("b")).unwrap();

        assert!(config.active_mcp_server().is_none());

        config.set_mcp_server_enabled("a", true);
        config.set_mcp_server_enabled("b", true);

        let enabled: Vec<_> = config.mcp_servers.iter().filter(|s| s.enabled).collect();
        assert_eq!(enabled.len(), 1);
        assert_eq!(config.active_mcp_server().map(|s| s.label.as_str()), Some("b"));

        assert!(!config.set_mcp_server_enabled("missing", true));
    }

    #[test]
    fn test_add_mcp_server_validation() {
        let mut config = AgentConfig::default();
        assert!(matches!(
            config.add_mcp_server(McpServer::new("", "npx", vec![])),
            Err(PanelError::InvalidConfig(_))
        ));
        assert!(config.add_mcp_server(McpServer::new("x", " ", vec![])).is_err());
        config.add_mcp_server(server("x")).unwrap();

        let err = config.add_mcp_server(server("x")).unwrap_err();
        assert_eq!(err.code().as_str(), "PANEL_INVALID_CONFIG");
        assert_eq!(err.to_string(), "Invalid configuration: MCP server already exists: x");
        assert!(config.remove_mcp_server("x"));
        assert!(!config.remove_mcp_server("x"));
    }

    #[test]
    fn test_skill_toggling_and_dedup() {
        let mut config = AgentConfig::default();
        assert!(config.toggle_skill("label_review"));
        assert!(!config.toggle_skill("label_review"));
        assert!(config.active_skills.is_empty());

        config.set_active_skills(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(config.active_skills, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_settings_defaults_and_wire_shape() {
        let settings: AgentSettings = serde_json::from_value(json!({})).unwrap();
        assert_eq!(settings, AgentSettings::default());
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.max_tokens, 1024);

        let value = serde_json::to_value(AgentSettings {
            permission_mode: PermissionMode::ConfirmAll,
            ..AgentSettings::default()
        })
        .unwrap();
        assert_eq!(value["permissionMode"], json!("confirm_all"));
        assert_eq!(value["maxTokens"], json!(1024));
        assert_eq!(value["persistHistory"], json!(true));
    }

    #[test]
    fn test_update_settings_rejects_invalid() {
        let mut config = AgentConfig::default();
        let bad = AgentSettings {
            max_tokens: 0,
            ..AgentSettings::default()
        };
        assert!(matches!(
            config.update_settings(bad),
            Err(PanelError::InvalidConfig(_))
        ));
        assert_eq!(config.settings, AgentSettings::default());
    }

    #[test]
    fn test_set_mcp_servers_keeps_first_enabled() {
        let mut config = AgentConfig::default();
        let mut a = server("a");
        let mut b = server("b");
        let c = server("c");
        a.enabled = true;
        b.enabled = true;

        config.set_mcp_servers(vec![c, a, b]);

        let enabled: Vec<_> = config
            .mcp_servers
            .iter()
            .filter(|s| s.enabled)
            .map(|s| s.label.as_str())
            .collect();
        assert_eq!(enabled, vec!["a"]);
        assert_eq!(config.mcp_servers.len(), 3);
    }

    #[test]
    fn test_config_update_omits_unset_fields() {
        let update = ConfigUpdate {
            active_skills: Some(vec!["a".into()]),
            ..ConfigUpdate::default()
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value, json!({"activeSkills": ["a"]}));
        assert!(ConfigUpdate::default().is_empty());
    }
}
