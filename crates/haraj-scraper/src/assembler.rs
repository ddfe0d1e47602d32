use crate::extractor::ListingExtractor;
use crate::fetcher::DetailFetcher;
use crate::revealer::PhoneRevealer;
use haraj_core::{ListingField, ListingRecord, ScrapingConfig};
use scraper::ElementRef;
use std::sync::Arc;
use std::time::Duration;

/// Retry policy for detail-page fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Pause between consecutive attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(2000),
        }
    }
}

impl From<&ScrapingConfig> for RetryPolicy {
    fn from(config: &ScrapingConfig) -> Self {
        Self {
            max_attempts: config.detail_retry_attempts.max(1),
            delay: config.detail_retry_delay(),
        }
    }
}

/// Builds complete records from listing fragments.
///
/// Fields are resolved in three passes: listing page, detail page for gaps,
/// then the authenticated revealer for a phone that is still unresolved.
pub struct ListingAssembler {
    extractor: Arc<ListingExtractor>,
    fetcher: Arc<dyn DetailFetcher>,
    revealer: Option<Arc<dyn PhoneRevealer>>,
    retry: RetryPolicy,
}

impl ListingAssembler {
    pub fn new(
        extractor: Arc<ListingExtractor>,
        fetcher: Arc<dyn DetailFetcher>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            extractor,
            fetcher,
            revealer: None,
            retry,
        }
    }

    #[must_use]
    pub fn with_revealer(mut self, revealer: Arc<dyn PhoneRevealer>) -> Self {
        self.revealer = Some(revealer);
        self
    }

    pub fn has_revealer(&self) -> bool {
        self.revealer.is_some()
    }

    /// First-pass record for a single listing fragment.
    pub fn assemble(&self, fragment: ElementRef<'_>) -> ListingRecord {
        self.extractor.extract_fields(fragment)
    }

    /// First-pass records for every fragment on a rendered page.
    pub fn assemble_page(&self, html: &str) -> Vec<ListingRecord> {
        self.extractor.extract_listings(html)
    }

    /// Fill gap fields from the detail page.
    ///
    /// Only fields still at their sentinel are written. Fetch failures leave
    /// the record as it was.
    pub async fn resolve_gaps(&self, mut record: ListingRecord) -> ListingRecord {
        if !record.needs_detail() {
            return record;
        }

        let missing = record.missing_fields();
        tracing::debug!(url = %record.url, ?missing, "resolving gaps from detail page");

        let Some(html) = self.fetch_with_retry(&record.url).await else {
            return record;
        };

        let applied = self
            .extractor
            .detail_fields(&html)
            .apply_to(&mut record, self.extractor.placeholder());
        tracing::debug!(url = %record.url, applied, "applied detail fields");

        record
    }

    /// Run every pass after the listing page on one record.
    pub async fn complete(&self, record: ListingRecord) -> ListingRecord {
        let mut record = self.resolve_gaps(record).await;

        if record.is_unresolved(ListingField::Phone) && record.has_url() {
            if let Some(revealer) = &self.revealer {
                let phone = revealer.reveal(&record.url).await;
                record.set(ListingField::Phone, self.extractor.sanitize_phone(&phone));
            }
        }

        record
    }

    /// Release resources held across listings (the cached reveal session).
    pub async fn finish(&self) {
        if let Some(revealer) = &self.revealer {
            revealer.finish().await;
        }
    }

    async fn fetch_with_retry(&self, url: &str) -> Option<String> {
        let attempts = self.retry.max_attempts.max(1);

        for attempt in 1..=attempts {
            match self.fetcher.fetch(url).await {
                Ok(html) => return Some(html),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    tracing::warn!(
                        "Detail fetch failed for {} (attempt {}/{}), retrying in {:?}: {}",
                        url,
                        attempt,
                        attempts,
                        self.retry.delay,
                        e
                    );
                    tokio::time::sleep(self.retry.delay).await;
                }
                Err(e) => {
                    tracing::error!("Detail fetch for {} gave up: {}", url, e);
                    return None;
                }
            }
        }

        None
    }
}
