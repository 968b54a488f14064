// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::time::Duration;

use thiserror::Error;

use crate::names::NameLookupError;

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Name lookup failed: {0}")]
    NameLookup(#[from] NameLookupError),

    #[error("Publish failed: {0}")]
    PublishError(String),

    #[error("Category '{category}' still executing after {waited:?}")]
    CoordinationTimeout { category: String, waited: Duration },

    #[error("Refresh of '{category}' exceeded its time limit of {limit:?}")]
    TimeLimitExceeded { category: String, limit: Duration },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RosterError {
    /// Whether the task runner should try again after this error.
    ///
    /// Configuration mismatches never heal by retrying.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            RosterError::ConfigError(_) | RosterError::UnknownCategory(_)
        )
    }
}

impl From<redis::RedisError> for RosterError {
    fn from(err: redis::RedisError) -> Self {
        RosterError::StoreError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RosterError>;
