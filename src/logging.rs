//! Structured logging for the assistant engine.
//!
//! Writes categorized lines to a per-day file under the state directory:
//! - STORAGE: persistence fallbacks and save failures
//! - CONVERSATION: conversation lifecycle (start, delete, select)
//! - KNOWLEDGE: knowledge base changes
//! - GENERATOR: which response rule produced a reply
//! - ERROR: everything that went wrong

use chrono::{Local, Utc};
use once_cell::sync::Lazy;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy)]
pub enum LogCategory {
    Storage,
    Conversation,
    Knowledge,
    Generator,
    Error,
}

impl LogCategory {
    fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Storage => "STORAGE",
            LogCategory::Conversation => "CONVERSATION",
            LogCategory::Knowledge => "KNOWLEDGE",
            LogCategory::Generator => "GENERATOR",
            LogCategory::Error => "ERROR",
        }
    }
}

/// Directory the log files go to; unset until `init_logging` runs.
static LOG_DIR: Lazy<Mutex<Option<PathBuf>>> = Lazy::new(|| Mutex::new(None));

fn log_file_path(dir: &Path) -> PathBuf {
    let today = Local::now().format("%Y-%m-%d").to_string();
    dir.join(format!("aide-{}.log", today))
}

/// Point the logger at `dir`, creating it if needed.
pub fn init_logging(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    *LOG_DIR.lock().unwrap() = Some(dir.to_path_buf());

    log(LogCategory::Conversation, None, "logging initialized");
    Ok(())
}

/// Log a message with category and optional conversation context.
pub fn log(category: LogCategory, conversation_id: Option<&str>, message: &str) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let conv_context = conversation_id
        .map(|id| format!("conversation={} | ", &id[..8.min(id.len())]))
        .unwrap_or_default();

    let log_line = format!(
        "[{}] [{}] {}{}\n",
        timestamp,
        category.as_str(),
        conv_context,
        message
    );

    // Always print to console (for dev)
    print!("{}", log_line);

    let dir = LOG_DIR.lock().unwrap().clone();
    if let Some(dir) = dir {
        if let Ok(mut file) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file_path(&dir))
        {
            let _ = file.write_all(log_line.as_bytes());
        }
    }
}

pub fn log_storage(message: &str) {
    log(LogCategory::Storage, None, message);
}

pub fn log_conversation(conversation_id: Option<&str>, message: &str) {
    log(LogCategory::Conversation, conversation_id, message);
}

pub fn log_knowledge(message: &str) {
    log(LogCategory::Knowledge, None, message);
}

pub fn log_generator(conversation_id: Option<&str>, message: &str) {
    log(LogCategory::Generator, conversation_id, message);
}

pub fn log_error(conversation_id: Option<&str>, message: &str) {
    log(LogCategory::Error, conversation_id, message);
}

/// Clean up old log files (keep last 7 days).
pub fn cleanup_old_logs() -> Result<usize, Box<dyn std::error::Error>> {
    let dir = LOG_DIR.lock().unwrap().clone();
    let Some(dir) = dir else {
        return Ok(0);
    };

    let mut deleted = 0;
    if !dir.exists() {
        return Ok(0);
    }

    let cutoff = Utc::now() - chrono::Duration::days(7);

    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        let path = entry.path();

        if let Ok(metadata) = entry.metadata() {
            if let Ok(modified) = metadata.modified() {
                let modified_time: chrono::DateTime<Utc> = modified.into();
                if modified_time < cutoff && fs::remove_file(&path).is_ok() {
                    deleted += 1;
                }
            }
        }
    }

    Ok(deleted)
}
