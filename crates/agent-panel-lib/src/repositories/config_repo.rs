// Config Repository
// Persists panel configuration and history in the host key-value store
// Feature: Agent Chat Panel (001-agent-chat-panel)

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::PanelResult;
use crate::models::{ConfigUpdate, LoadedConfig};
use crate::utils::database::{self, Database};

pub const KEY_MCP_SERVERS: &str = "mcp_servers";
pub const KEY_ACTIVE_SKILLS: &str = "active_skills";
pub const KEY_SETTINGS: &str = "settings";
pub const KEY_HISTORY: &str = "history";

/// Repository for persisted panel configuration
#[derive(Clone)]
pub struct ConfigRepository {
    db: Database,
}

impl ConfigRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Load every persisted key. Missing or unreadable values load as defaults.
    /// `available_skills` is not stored here and is always empty.
    pub fn load(&self) -> PanelResult<LoadedConfig> {
        self.db.with_connection(|conn| {
            Ok(LoadedConfig {
                mcp_servers: read_key(conn, KEY_MCP_SERVERS)?,
                active_skills: read_key(conn, KEY_ACTIVE_SKILLS)?,
                available_skills: Vec::new(),
                settings: read_key(conn, KEY_SETTINGS)?,
                history: read_key(conn, KEY_HISTORY)?,
            })
        })
    }

    /// Write the supplied fields in one transaction
    pub fn save(&self, update: &ConfigUpdate) -> PanelResult<()> {
        if update.is_empty() {
            return Ok(());
        }

        self.db.with_transaction(|conn| {
            if let Some(servers) = &update.mcp_servers {
                write_key(conn, KEY_MCP_SERVERS, servers)?;
            }
            if let Some(skills) = &update.active_skills {
                write_key(conn, KEY_ACTIVE_SKILLS, skills)?;
            }
            if let Some(settings) = &update.settings {
                write_key(conn, KEY_SETTINGS, settings)?;
            }
            if let Some(history) = &update.history {
                write_key(conn, KEY_HISTORY, history)?;
            }
            Ok(())
        })
    }

    /// Drop the persisted transcript
    pub fn clear_history(&self) -> PanelResult<()> {
        self.db.delete_value(KEY_HISTORY)?;
        Ok(())
    }
}

fn read_key<T>(conn: &rusqlite::Connection, key: &str) -> PanelResult<T>
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = database::get_value(conn, key)? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            log::warn!("Ignoring unreadable stored value for '{}': {}", key, e);
            Ok(T::default())
        }
    }
}

fn write_key<T: Serialize>(conn: &rusqlite::Connection, key: &str, value: &T) -> PanelResult<()> {
    let raw = serde_json::to_string(value)?;
    database::set_value(conn, key, &raw)
}
