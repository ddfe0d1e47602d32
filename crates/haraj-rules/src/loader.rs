//! Extraction rules loading.
//!
//! The rules for haraj.com.sa are embedded at build time; a file on disk can
//! replace them without rebuilding when the site's markup changes.

use crate::{
    definition::ExtractionRules,
    error::{Result, RulesError},
};
use std::path::Path;
use tracing::{debug, info};

const BUILTIN_RULES: &str = include_str!("../rules/haraj.toml");
const BUILTIN_PATH: &str = "<builtin>";

/// Loader for extraction rules.
pub struct RulesLoader;

impl RulesLoader {
    /// Parse and validate the embedded rules.
    pub fn builtin() -> Result<ExtractionRules> {
        let rules = Self::parse(BUILTIN_RULES, BUILTIN_PATH)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Load and validate rules from a TOML file.
    ///
    /// # Errors
    /// Returns error if the file can't be read, doesn't parse, or is invalid.
    pub fn load_from_path(path: &Path) -> Result<ExtractionRules> {
        let contents = std::fs::read_to_string(path).map_err(|e| RulesError::LoadError {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;

        let rules = Self::parse(&contents, &path.display().to_string())?;
        rules.validate()?;

        info!(
            site = %rules.id(),
            path = %path.display(),
            "loaded extraction rules"
        );

        Ok(rules)
    }

    /// Load rules from `path` when given, otherwise the embedded copy.
    pub fn load(path: Option<&Path>) -> Result<ExtractionRules> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => {
                let rules = Self::builtin()?;
                debug!(site = %rules.id(), "using builtin extraction rules");
                Ok(rules)
            }
        }
    }

    fn parse(contents: &str, path: &str) -> Result<ExtractionRules> {
        toml::from_str(contents).map_err(|e| RulesError::ParseError {
            path: path.to_string(),
            source: e,
        })
    }
}
