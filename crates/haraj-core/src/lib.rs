//! Haraj Core - Foundation crate for the Haraj listing harvester.
//!
//! This crate provides the listing data model, field sentinels, configuration
//! management and the central error type that the other harvester crates
//! depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Listing records, field sentinels and URL resolution
//!
//! # Example
//!
//! ```rust
//! use haraj_core::{sanitize_phone, ListingRecord, PHONE_UNDEFINED};
//!
//! let mut record = ListingRecord::default();
//! record.phone = sanitize_phone("تواصل", "تواصل");
//! assert_eq!(record.phone, PHONE_UNDEFINED);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, BrowserConfig, Credentials, GeneralConfig, HttpConfig, RenderConfig, RevealConfig,
    ScrapingConfig, ServerConfig,
};
pub use error::{ConfigError, ConfigResult, HarajError, Result};
pub use types::{
    sanitize_phone, DetailFieldSet, ListingField, ListingRecord, SiteOrigin, NOT_AVAILABLE,
    PHONE_UNDEFINED,
};
