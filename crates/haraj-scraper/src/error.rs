use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("listing content never appeared on {url} within {waited:?}")]
    RenderTimeout { url: String, waited: Duration },

    #[error("required element not found: {0}")]
    ElementNotFound(String),

    #[error("HTTP request to {url} failed: {reason}")]
    HttpFailure { url: String, reason: String },

    #[error("reveal sequence aborted at {step}: {reason}")]
    AuthFailure { step: String, reason: String },

    #[error("no listings found on {0}")]
    EmptyResult(String),

    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("Browser error: {0}")]
    Browser(#[from] haraj_browser::BrowserError),

    #[error("Rules error: {0}")]
    Rules(#[from] haraj_rules::RulesError),

    #[error(transparent)]
    Core(#[from] haraj_core::HarajError),
}

impl ScrapeError {
    /// Whether the detail-fetch retry policy applies to this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::HttpFailure { .. })
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
