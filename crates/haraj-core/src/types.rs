//! Shared types used across the harvester.
//!
//! Every textual listing field is always populated: either with extracted
//! content or with the field's sentinel. Phone numbers additionally go
//! through [`sanitize_phone`] so the site's "reveal" label is never stored.

use crate::error::HarajError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;
use url::Url;

/// Sentinel for a textual field that could not be resolved.
pub const NOT_AVAILABLE: &str = "N/A";

/// Sentinel for a phone number that could not be resolved.
pub const PHONE_UNDEFINED: &str = "undefined";

/// Fields of a [`ListingRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingField {
    /// Heading text of the listing
    Title,
    /// Absolute URL of the detail page
    Url,
    /// Price as displayed, unnormalized
    Price,
    /// City or area
    Location,
    /// Contact phone number
    Phone,
    /// Free-text body of the ad
    Description,
    /// Display name of the poster
    AuthorName,
}

impl ListingField {
    /// Fields a detail page can supply.
    pub const DETAIL: [ListingField; 5] = [
        ListingField::Price,
        ListingField::Location,
        ListingField::Phone,
        ListingField::Description,
        ListingField::AuthorName,
    ];

    /// Fields whose absence triggers a detail-page fetch.
    pub const GAPS: [ListingField; 4] = [
        ListingField::Price,
        ListingField::Description,
        ListingField::Phone,
        ListingField::AuthorName,
    ];

    /// Sentinel stored when the field is unresolved.
    #[must_use]
    pub fn sentinel(self) -> &'static str {
        match self {
            Self::Phone => PHONE_UNDEFINED,
            _ => NOT_AVAILABLE,
        }
    }

    /// Snake-case name of the field.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Url => "url",
            Self::Price => "price",
            Self::Location => "location",
            Self::Phone => "phone",
            Self::Description => "description",
            Self::AuthorName => "author_name",
        }
    }
}

impl fmt::Display for ListingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified ad discovered on a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    /// Heading text of the listing
    pub title: String,
    /// Absolute detail-page URL, or `N/A`
    pub url: String,
    /// Price as displayed
    pub price: String,
    /// City or area
    pub location: String,
    /// Phone digits, or `undefined`
    pub phone: String,
    /// Ad body
    pub description: String,
    /// Poster display name
    pub author_name: String,
}

impl Default for ListingRecord {
    fn default() -> Self {
        Self {
            title: NOT_AVAILABLE.to_string(),
            url: NOT_AVAILABLE.to_string(),
            price: NOT_AVAILABLE.to_string(),
            location: NOT_AVAILABLE.to_string(),
            phone: PHONE_UNDEFINED.to_string(),
            description: NOT_AVAILABLE.to_string(),
            author_name: NOT_AVAILABLE.to_string(),
        }
    }
}

impl ListingRecord {
    /// Get a field value.
    #[must_use]
    pub fn get(&self, field: ListingField) -> &str {
        match field {
            ListingField::Title => &self.title,
            ListingField::Url => &self.url,
            ListingField::Price => &self.price,
            ListingField::Location => &self.location,
            ListingField::Phone => &self.phone,
            ListingField::Description => &self.description,
            ListingField::AuthorName => &self.author_name,
        }
    }

    fn slot(&mut self, field: ListingField) -> &mut String {
        match field {
            ListingField::Title => &mut self.title,
            ListingField::Url => &mut self.url,
            ListingField::Price => &mut self.price,
            ListingField::Location => &mut self.location,
            ListingField::Phone => &mut self.phone,
            ListingField::Description => &mut self.description,
            ListingField::AuthorName => &mut self.author_name,
        }
    }

    /// Set a field, falling back to its sentinel when `value` is blank.
    pub fn set(&mut self, field: ListingField, value: impl Into<String>) {
        let value = value.into();
        let value = if value.trim().is_empty() {
            field.sentinel().to_string()
        } else {
            value
        };
        *self.slot(field) = value;
    }

    /// Whether the field still holds its sentinel.
    #[must_use]
    pub fn is_unresolved(&self, field: ListingField) -> bool {
        self.get(field) == field.sentinel()
    }

    /// Whether the record carries a resolvable detail-page URL.
    #[must_use]
    pub fn has_url(&self) -> bool {
        !self.is_unresolved(ListingField::Url)
    }

    /// Gap fields still at their sentinel.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<ListingField> {
        ListingField::GAPS
            .into_iter()
            .filter(|field| self.is_unresolved(*field))
            .collect()
    }

    /// Whether a detail-page fetch could fill anything.
    #[must_use]
    pub fn needs_detail(&self) -> bool {
        self.has_url() && !self.missing_fields().is_empty()
    }
}

/// Field values scraped from a standalone detail page.
///
/// Every detail field starts at `N/A`; values only ever replace record fields
/// that are still unresolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailFieldSet {
    values: BTreeMap<ListingField, String>,
}

impl Default for DetailFieldSet {
    fn default() -> Self {
        Self::new()
    }
}

impl DetailFieldSet {
    /// Create a set with every detail field at `N/A`.
    #[must_use]
    pub fn new() -> Self {
        let values = ListingField::DETAIL
            .into_iter()
            .map(|field| (field, NOT_AVAILABLE.to_string()))
            .collect();
        Self { values }
    }

    /// Record an extracted value. Fields outside [`ListingField::DETAIL`] are ignored.
    pub fn set(&mut self, field: ListingField, value: impl Into<String>) {
        if let Some(slot) = self.values.get_mut(&field) {
            let value = value.into();
            if !value.trim().is_empty() {
                *slot = value;
            }
        }
    }

    /// Value for a field, `N/A` when unresolved.
    #[must_use]
    pub fn get(&self, field: ListingField) -> &str {
        self.values
            .get(&field)
            .map_or(NOT_AVAILABLE, String::as_str)
    }

    /// Whether a usable value was extracted for the field.
    #[must_use]
    pub fn is_resolved(&self, field: ListingField) -> bool {
        self.get(field) != NOT_AVAILABLE
    }

    /// Copy resolved values onto `record` fields that are still unresolved.
    ///
    /// Phone values go through [`sanitize_phone`] first. Returns the number of
    /// record fields that changed.
    pub fn apply_to(&self, record: &mut ListingRecord, placeholder: &str) -> usize {
        let mut applied = 0;
        for (field, value) in &self.values {
            if value == NOT_AVAILABLE || !record.is_unresolved(*field) {
                continue;
            }
            let value = if *field == ListingField::Phone {
                sanitize_phone(value, placeholder)
            } else {
                value.clone()
            };
            if value != field.sentinel() {
                record.set(*field, value);
                applied += 1;
            }
        }
        applied
    }
}

/// Normalize a scraped phone value.
///
/// Returns [`PHONE_UNDEFINED`] when the value is the reveal placeholder or
/// carries no digit at all.
#[must_use]
pub fn sanitize_phone(raw: &str, placeholder: &str) -> String {
    static DIGIT: OnceLock<Regex> = OnceLock::new();
    let digit = DIGIT.get_or_init(|| Regex::new(r"\d").expect("valid regex"));

    let phone = raw.trim();
    let placeholder = placeholder.trim();
    let is_placeholder =
        !placeholder.is_empty() && phone.to_lowercase() == placeholder.to_lowercase();

    if is_placeholder || !digit.is_match(phone) {
        PHONE_UNDEFINED.to_string()
    } else {
        phone.to_string()
    }
}

/// Origin of the marketplace, used to absolutize scraped links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteOrigin(Url);

impl SiteOrigin {
    /// Parse and validate a base URL.
    ///
    /// # Errors
    /// Returns error if the URL does not parse or is not http(s).
    pub fn new(base_url: &str) -> Result<Self, HarajError> {
        let url = Url::parse(base_url.trim()).map_err(|e| {
            HarajError::Validation(format!("invalid base URL '{base_url}': {e}"))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(HarajError::Validation(format!(
                "invalid base URL '{base_url}': scheme must be http or https"
            )));
        }

        Ok(Self(url))
    }

    /// The origin as a string without trailing slash.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str().trim_end_matches('/')
    }

    /// Resolve an `href` against the origin.
    ///
    /// Absolute `http(s)` links are kept as-is. Blank hrefs and links that
    /// resolve to another scheme yield `None`.
    #[must_use]
    pub fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        let url = self.0.join(href).ok()?;
        matches!(url.scheme(), "http" | "https").then(|| url.to_string())
    }
}

impl fmt::Display for SiteOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
