//! Haraj Rules - extraction rules for the marketplace markup.
//!
//! Every selector the harvester uses is data, not code: listing fragments,
//! per-field selector chains (one table for listing pages, one for detail
//! pages), section navigation and the login/reveal locators.
//!
//! # Example
//!
//! ```rust
//! use haraj_core::ListingField;
//! use haraj_rules::RulesLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rules = RulesLoader::load(None)?;
//! let price = rules.fields.detail.chain(ListingField::Price).expect("price chain");
//! assert_eq!(price.candidates()[1], ".price");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod definition;
pub mod error;
pub mod loader;

pub use definition::{
    ExtractionRules, FieldRules, FieldTables, ListingRules, RevealRules, SectionRules,
    SelectorChain, SiteRules,
};
pub use error::{Result, RulesError};
pub use loader::RulesLoader;
