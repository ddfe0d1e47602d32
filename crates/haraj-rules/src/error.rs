//! Error types for the extraction rules subsystem.

use thiserror::Error;

/// Errors that can occur while loading extraction rules.
#[derive(Error, Debug)]
pub enum RulesError {
    /// Failed to read a rules file
    #[error("failed to load extraction rules from {path}: {source}")]
    LoadError {
        /// Path to the rules file
        path: String,
        /// Underlying error
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to parse rules TOML
    #[error("failed to parse extraction rules TOML in {path}: {source}")]
    ParseError {
        /// Path to the rules file (`<builtin>` for the embedded copy)
        path: String,
        /// TOML parse error
        #[source]
        source: toml::de::Error,
    },

    /// Rules parsed but are unusable
    #[error("invalid extraction rules for {site_id}: {reason}")]
    ValidationError {
        /// Site the rules describe
        site_id: String,
        /// Reason for validation failure
        reason: String,
    },
}

/// Result type for rules operations.
pub type Result<T> = std::result::Result<T, RulesError>;
