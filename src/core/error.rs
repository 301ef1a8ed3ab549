use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown action category: {0}")]
    UnknownCategory(String),

    #[error("Bias table is missing category {0}")]
    MissingCategory(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Combatant task failed: {0}")]
    RuntimeError(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
