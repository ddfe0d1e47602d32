//! Structured results of an orchestration run.
//!
//! The listings vector is always usable as-is. Page reports say, per page,
//! whether it was scraped completely, cut at the cap, legitimately empty,
//! failed or cancelled.

use haraj_core::ListingRecord;
use serde::Serialize;

/// How processing of one page ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PageStatus {
    /// Every fragment on the page was assembled
    Complete,
    /// The cap was reached mid-page
    Truncated,
    /// The page rendered but had no listing fragments
    Empty,
    /// Rendering failed; the page contributed nothing
    Failed { reason: String },
    /// The run was cancelled while on this page
    Cancelled,
}

/// Outcome for one listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageReport {
    pub url: String,
    #[serde(flatten)]
    pub status: PageStatus,
    /// Records this page contributed
    pub listings: usize,
}

impl PageReport {
    pub fn new(url: impl Into<String>, status: PageStatus, listings: usize) -> Self {
        Self {
            url: url.into(),
            status,
            listings,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, PageStatus::Failed { .. })
    }
}

/// Records gathered by one orchestration call plus per-page outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeReport {
    pub listings: Vec<ListingRecord>,
    pub pages: Vec<PageReport>,
    /// Set when the homepage could not be rendered in all-sections mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery_error: Option<String>,
}

impl ScrapeReport {
    pub fn push_page(&mut self, page: PageReport, listings: Vec<ListingRecord>) {
        self.listings.extend(listings);
        self.pages.push(page);
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Whether any page failed or discovery failed.
    pub fn has_errors(&self) -> bool {
        self.discovery_error.is_some() || self.pages.iter().any(PageReport::is_failed)
    }

    pub fn into_listings(self) -> Vec<ListingRecord> {
        self.listings
    }
}
