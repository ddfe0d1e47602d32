//! Haraj Scraper - listing extraction pipeline.
//!
//! Turns marketplace pages into [`ListingRecord`](haraj_core::ListingRecord)s:
//!
//! - [`renderer`] renders a JavaScript listing page and paginates it by scrolling
//! - [`extractor`] applies the selector chains from the rules table
//! - [`fetcher`] fetches detail pages over plain HTTP
//! - [`assembler`] fills gaps from detail pages and hands hidden phones to the
//!   [`revealer`]
//! - [`discovery`] finds section pages on the homepage
//! - [`orchestrator`] drives all of the above under a global record cap
//!
//! # Example
//!
//! ```rust,ignore
//! use haraj_core::AppConfig;
//! use haraj_rules::RulesLoader;
//! use haraj_scraper::ScrapeOrchestrator;
//!
//! let config = AppConfig::load_with_env()?;
//! let rules = RulesLoader::load(config.general.rules_path.as_deref())?;
//! let orchestrator = ScrapeOrchestrator::from_config(&config, &rules)?;
//!
//! let report = orchestrator.scrape_one("https://haraj.com.sa/tags/cars").await;
//! for page in &report.pages {
//!     println!("{}: {:?}", page.url, page.status);
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod assembler;
pub mod discovery;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod orchestrator;
pub mod renderer;
pub mod report;
pub mod revealer;

// Re-export commonly used types
pub use assembler::{ListingAssembler, RetryPolicy};
pub use discovery::SectionDiscoverer;
pub use error::{Result, ScrapeError};
pub use extractor::{CompiledChain, FieldExtractor, ListingExtractor};
pub use fetcher::{DetailFetcher, StaticFetcher};
pub use orchestrator::{ScrapeOrchestrator, DEFAULT_MAX_LISTINGS};
pub use renderer::{PageRenderer, RenderSettings, Renderer};
pub use report::{PageReport, PageStatus, ScrapeReport};
pub use revealer::{
    AuthenticatedRevealer, PhoneRevealer, RevealOutcome, RevealSettings, RevealStep, SessionState,
};
