//! Configuration management for the harvester.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides. Login secrets are never serialized.

use crate::error::{ConfigError, ConfigResult};
use crate::types::SiteOrigin;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use zeroize::Zeroizing;

/// Main application configuration.
///
/// This is loaded from `~/.config/haraj/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Target site and rule locations
    pub general: GeneralConfig,
    /// Record cap, retries and pipeline toggles
    pub scraping: ScrapingConfig,
    /// Page rendering and pagination timings
    pub renderer: RenderConfig,
    /// Authenticated phone reveal settings
    pub reveal: RevealConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// Static detail-page fetch settings
    pub http: HttpConfig,
    /// HTTP API settings
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides, then validate.
    ///
    /// Supports the following environment variables:
    /// - `HARAJ_BASE_URL`: Override the marketplace origin
    /// - `HARAJ_MAX_LISTINGS`: Override the record cap
    /// - `HARAJ_HEADLESS`: Override browser headless mode (true/false)
    /// - `HARAJ_USERNAME` / `HARAJ_PASSWORD`: Login used to reveal phones
    /// - `HARAJ_RULES_PATH`: Extraction rules file
    /// - `HARAJ_BIND_ADDR`: HTTP API listen address
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process environment).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("HARAJ_BASE_URL") {
            tracing::debug!("Override general.base_url from env: {}", val);
            self.general.base_url = val;
        }

        if let Some(val) = lookup("HARAJ_MAX_LISTINGS") {
            if let Ok(max) = val.parse() {
                self.scraping.max_listings = max;
                tracing::debug!("Override scraping.max_listings from env: {}", max);
            }
        }

        if let Some(val) = lookup("HARAJ_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Some(val) = lookup("HARAJ_USERNAME") {
            self.reveal.username = Some(val);
        }

        if let Some(val) = lookup("HARAJ_PASSWORD") {
            self.reveal.password = Some(Zeroizing::new(val));
        }

        if let Some(val) = lookup("HARAJ_RULES_PATH") {
            self.general.rules_path = Some(PathBuf::from(val));
        }

        if let Some(val) = lookup("HARAJ_BIND_ADDR") {
            self.server.bind_addr = val;
        }
    }

    /// Check values that would otherwise fail deep inside a scrape.
    pub fn validate(&self) -> ConfigResult<()> {
        SiteOrigin::new(&self.general.base_url).map_err(|e| ConfigError::InvalidValue {
            field: "general.base_url".to_string(),
            reason: e.to_string(),
        })?;

        if self.scraping.max_listings == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scraping.max_listings".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.scraping.max_concurrent_listings == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scraping.max_concurrent_listings".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.scraping.detail_retry_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scraping.detail_retry_attempts".to_string(),
                reason: "must be at least one attempt".to_string(),
            });
        }

        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/haraj/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("sa", "haraj", "haraj").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Target site settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Marketplace origin used to absolutize links and open the login page
    pub base_url: String,
    /// Extraction rules file; the builtin rules are used when unset
    pub rules_path: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            base_url: "https://haraj.com.sa".to_string(),
            rules_path: None,
        }
    }
}

/// Pipeline behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ScrapingConfig {
    /// Maximum number of records any orchestration call returns
    pub max_listings: usize,
    /// Listings assembled concurrently within one page
    pub max_concurrent_listings: usize,
    /// Detail-page fetch attempts before giving up
    pub detail_retry_attempts: u32,
    /// Delay between detail-page fetch attempts in milliseconds
    pub detail_retry_delay_ms: u64,
    /// Whether to log in and reveal hidden phone numbers
    pub reveal_phones: bool,
    /// Reuse one authenticated browser session for all reveals of a run
    pub reuse_reveal_session: bool,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            max_listings: 1000,
            max_concurrent_listings: 1,
            detail_retry_attempts: 3,
            detail_retry_delay_ms: 2000,
            reveal_phones: true,
            reuse_reveal_session: true,
        }
    }
}

impl ScrapingConfig {
    /// Delay between detail-page fetch attempts.
    #[must_use]
    pub fn detail_retry_delay(&self) -> Duration {
        Duration::from_millis(self.detail_retry_delay_ms)
    }
}

/// Page rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// How long to wait for the first listing to appear, in seconds
    pub ready_timeout_secs: u64,
    /// Upper bound on scroll/"load more" iterations
    pub max_scroll_iterations: u32,
    /// Pause after each scroll in milliseconds
    pub scroll_pause_ms: u64,
    /// Pause after clicking "load more" in milliseconds
    pub load_more_pause_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            ready_timeout_secs: 20,
            max_scroll_iterations: 150,
            scroll_pause_ms: 8000,
            load_more_pause_ms: 8000,
        }
    }
}

/// Authenticated phone reveal settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Timeout for each wait in the login/reveal sequence, in seconds
    pub wait_timeout_secs: u64,
    /// Interval between element polls in milliseconds
    pub poll_interval_ms: u64,
    /// Login identity
    pub username: Option<String>,
    /// Login secret (from `HARAJ_PASSWORD`, never written to disk)
    #[serde(skip)]
    pub password: Option<Zeroizing<String>>,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            wait_timeout_secs: 30,
            poll_interval_ms: 250,
            username: None,
            password: None,
        }
    }
}

impl fmt::Debug for RevealConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevealConfig")
            .field("wait_timeout_secs", &self.wait_timeout_secs)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl RevealConfig {
    /// Login credentials, when both halves are configured.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some(Credentials::new(username.clone(), password.as_str()))
            }
            _ => None,
        }
    }
}

/// Login identity for the reveal sequence.
#[derive(Clone)]
pub struct Credentials {
    /// Account name typed into the login form
    pub username: String,
    password: Zeroizing<String>,
}

impl Credentials {
    /// Create credentials; the password is wiped from memory on drop.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    /// The login secret.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Navigation timeout in seconds
    pub navigation_timeout_secs: u64,
    /// Fixed user agent; a randomized desktop fingerprint is used when unset
    pub user_agent: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            navigation_timeout_secs: 30,
            user_agent: None,
        }
    }
}

/// Static detail-page fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User agent sent with detail-page requests
    pub user_agent: String,
    /// Accept-Language header value
    pub accept_language: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36".to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
            timeout_secs: 30,
        }
    }
}

/// HTTP API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the API listens on
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
        }
    }
}
