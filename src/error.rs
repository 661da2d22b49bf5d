use thiserror::Error;

/// Error type shared across the engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("knowledge item not found: {0}")]
    KnowledgeItemNotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("import failed: {0}")]
    Import(String),

    #[error("could not reach the assistant service")]
    GenerationFailed,
}

pub type Result<T> = std::result::Result<T, Error>;
