use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
///
/// Every variant is fatal: the run aborts before any certificate is inspected.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file {0}: {1}")]
    FileRead(PathBuf, std::io::Error),

    #[error("Config file {0} does not exist")]
    FileMissing(PathBuf),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to parse .env file: {0}")]
    DotenvParse(#[from] dotenvy::Error),

    #[error("DOMAINS is not set: configure at least one domain")]
    MissingDomains,

    #[error("Domain '{0}' is configured more than once")]
    DuplicateDomain(String),

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
