use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Mutex;

use crate::error::Result;
use crate::logging;

/// Well-known storage keys. Each holds one independently-serialized JSON
/// document; there is no cross-key schema or version field.
pub const KEY_CONVERSATIONS: &str = "conversations";
pub const KEY_CURRENT_CONVERSATION: &str = "currentConversationId";
pub const KEY_KNOWLEDGE_BASE: &str = "knowledgeBase";
pub const KEY_SETTINGS: &str = "settings";

/// JSON key/value persistence over a local SQLite database.
///
/// Reads fail soft: a missing key, an unreadable row, or a value that no
/// longer deserializes all fall back to the caller-supplied default. Writes
/// overwrite whatever was stored before.
pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS app_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    fn with_connection<F, T>(&self, f: F) -> rusqlite::Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self.conn.lock().unwrap();
        f(&conn)
    }

    /// Load the value stored under `key`, or `default` if the key is absent
    /// or the stored blob cannot be read back. Never surfaces the failure.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let raw: Option<String> = match self.with_connection(|conn| {
            conn.query_row(
                "SELECT value FROM app_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
        }) {
            Ok(raw) => raw,
            Err(e) => {
                logging::log_error(None, &format!("load of '{}' failed: {}", key, e));
                return default;
            }
        };

        match raw {
            Some(text) => match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(e) => {
                    logging::log_storage(&format!(
                        "stored value for '{}' is corrupt, using default: {}",
                        key, e
                    ));
                    default
                }
            },
            None => default,
        }
    }

    /// Serialize `value` and store it under `key`, replacing any previous
    /// value.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let text = serde_json::to_string(value)?;
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO app_state (key, value) VALUES (?1, ?2)",
                params![key, text],
            )?;
            Ok(())
        })?;
        Ok(())
    }

    /// Best-effort save: failures are logged and swallowed so a persistence
    /// hiccup never unwinds the in-memory mutation it trails.
    pub fn save_best_effort<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.save(key, value) {
            logging::log_error(None, &format!("save of '{}' failed: {}", key, e));
        }
    }
}
