//! Scrape orchestrator for single pages, page lists and whole homepages.
//!
//! Every mode returns a [`ScrapeReport`] whose listing count never exceeds
//! the configured cap. Pages are processed in the order given; once the cap
//! is reached no further page is rendered. Failures are recorded per page and
//! never propagated to the caller.

use crate::assembler::{ListingAssembler, RetryPolicy};
use crate::discovery::SectionDiscoverer;
use crate::error::{Result, ScrapeError};
use crate::extractor::ListingExtractor;
use crate::fetcher::StaticFetcher;
use crate::renderer::{PageRenderer, RenderSettings, Renderer};
use crate::report::{PageReport, PageStatus, ScrapeReport};
use crate::revealer::{AuthenticatedRevealer, RevealSettings};
use futures::stream::{self, StreamExt};
use haraj_browser::{BrowserLauncher, ChromiumLauncher, LaunchSettings};
use haraj_core::{AppConfig, ListingRecord, SiteOrigin};
use haraj_rules::ExtractionRules;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default cap on records returned by one orchestration call.
pub const DEFAULT_MAX_LISTINGS: usize = 1000;

/// Orchestrates rendering, extraction and gap resolution across pages.
pub struct ScrapeOrchestrator {
    renderer: Arc<dyn Renderer>,
    assembler: Arc<ListingAssembler>,
    discoverer: SectionDiscoverer,
    max_listings: usize,
    max_concurrent_listings: usize,
    cancel: CancellationToken,
}

impl ScrapeOrchestrator {
    /// Create an orchestrator from its components.
    #[must_use]
    pub fn new(
        renderer: Arc<dyn Renderer>,
        assembler: Arc<ListingAssembler>,
        discoverer: SectionDiscoverer,
    ) -> Self {
        Self {
            renderer,
            assembler,
            discoverer,
            max_listings: DEFAULT_MAX_LISTINGS,
            max_concurrent_listings: 1,
            cancel: CancellationToken::new(),
        }
    }

    /// Wire Chromium, the static fetcher and (when credentials are
    /// configured) the authenticated revealer from configuration.
    pub fn from_config(config: &AppConfig, rules: &ExtractionRules) -> Result<Self> {
        let origin = SiteOrigin::new(&config.general.base_url)?;
        let rules_origin = SiteOrigin::new(&rules.site.base_url)?;
        if rules_origin != origin {
            return Err(ScrapeError::Configuration(format!(
                "rules '{}' target {} but the configured base URL is {}",
                rules.id(),
                rules_origin,
                origin
            )));
        }

        let launch = LaunchSettings {
            headless: config.browser.headless,
            window: Some((config.browser.window_width, config.browser.window_height)),
            navigation_timeout: Duration::from_secs(config.browser.navigation_timeout_secs),
            user_agent: config.browser.user_agent.clone(),
            poll_interval: Duration::from_millis(config.reveal.poll_interval_ms),
            ..LaunchSettings::default()
        };
        let launcher: Arc<dyn BrowserLauncher> = Arc::new(ChromiumLauncher::new(launch));

        let renderer = PageRenderer::new(
            launcher.clone(),
            &rules.listing,
            RenderSettings::from(&config.renderer),
        );

        let extractor = Arc::new(ListingExtractor::new(rules, origin.clone())?);
        let fetcher = Arc::new(StaticFetcher::new(&config.http, &origin)?);
        let mut assembler =
            ListingAssembler::new(extractor, fetcher, RetryPolicy::from(&config.scraping));

        if config.scraping.reveal_phones {
            match config.reveal.credentials() {
                Some(credentials) => {
                    let revealer = AuthenticatedRevealer::new(
                        launcher,
                        rules.reveal.clone(),
                        credentials,
                        origin.clone(),
                        RevealSettings::from_config(
                            &config.reveal,
                            config.scraping.reuse_reveal_session,
                        ),
                    );
                    assembler = assembler.with_revealer(Arc::new(revealer));
                }
                None => tracing::info!(
                    "no reveal credentials configured; hidden phones stay undefined"
                ),
            }
        }

        let discoverer = SectionDiscoverer::new(&rules.sections, origin)?;

        Ok(Self::new(Arc::new(renderer), Arc::new(assembler), discoverer)
            .with_max_listings(config.scraping.max_listings)
            .with_max_concurrent_listings(config.scraping.max_concurrent_listings))
    }

    /// Set the cap on returned records.
    #[must_use]
    pub fn with_max_listings(mut self, max: usize) -> Self {
        self.max_listings = max;
        self
    }

    /// Set how many listings of a page are completed concurrently.
    #[must_use]
    pub fn with_max_concurrent_listings(mut self, max: usize) -> Self {
        self.max_concurrent_listings = max.max(1);
        self
    }

    /// Use an external token to cancel in-flight runs.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn max_listings(&self) -> usize {
        self.max_listings
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Scrape a single listing page.
    pub async fn scrape_one(&self, url: &str) -> ScrapeReport {
        let urls = [url.to_string()];
        let report = self.collect(&urls).await;
        self.assembler.finish().await;
        report
    }

    /// Scrape pages in order until the cap is reached.
    pub async fn scrape_many(&self, urls: &[String]) -> ScrapeReport {
        let report = self.collect(urls).await;
        self.assembler.finish().await;
        report
    }

    /// Scrape every section linked from the homepage.
    pub async fn scrape_all(&self, homepage_url: &str) -> ScrapeReport {
        tracing::info!("discovering sections from {}", homepage_url);

        let report = match self.renderer.render(homepage_url, &self.cancel).await {
            Ok(html) => {
                let sections = self.discoverer.discover_sections(&html);
                if sections.is_empty() {
                    tracing::warn!("no sections found on {}", homepage_url);
                }
                self.collect(&sections).await
            }
            Err(e) => {
                tracing::error!("failed to render homepage {}: {}", homepage_url, e);
                ScrapeReport {
                    discovery_error: Some(e.to_string()),
                    ..ScrapeReport::default()
                }
            }
        };

        self.assembler.finish().await;
        tracing::info!(
            total = report.len(),
            "extraction from all sections finished"
        );
        report
    }

    async fn collect(&self, urls: &[String]) -> ScrapeReport {
        let mut report = ScrapeReport::default();

        for url in urls {
            let remaining = self.max_listings.saturating_sub(report.len());
            if remaining == 0 {
                tracing::info!(cap = self.max_listings, "listing cap reached");
                break;
            }

            let (page, listings) = self.scrape_page(url, remaining).await;
            let cancelled = page.status == PageStatus::Cancelled;
            report.push_page(page, listings);
            if cancelled {
                break;
            }
        }

        tracing::info!(total = report.len(), pages = report.pages.len(), "scrape finished");
        report
    }

    async fn scrape_page(&self, url: &str, remaining: usize) -> (PageReport, Vec<ListingRecord>) {
        let html = match self.renderer.render(url, &self.cancel).await {
            Ok(html) => html,
            Err(ScrapeError::Cancelled) => {
                return (PageReport::new(url, PageStatus::Cancelled, 0), Vec::new());
            }
            Err(e) => {
                tracing::error!("Error while scraping {}: {}", url, e);
                let status = PageStatus::Failed {
                    reason: e.to_string(),
                };
                return (PageReport::new(url, status, 0), Vec::new());
            }
        };

        let mut records = self.assembler.assemble_page(&html);
        tracing::info!(url = %url, found = records.len(), "extracted listing fragments");
        if records.is_empty() {
            tracing::warn!("{}", ScrapeError::EmptyResult(url.to_string()));
            return (PageReport::new(url, PageStatus::Empty, 0), Vec::new());
        }

        let truncated = records.len() > remaining;
        records.truncate(remaining);
        let expected = records.len();

        let assembler = &self.assembler;
        let listings: Vec<ListingRecord> = stream::iter(records)
            .map(|record| assembler.complete(record))
            .buffered(self.max_concurrent_listings)
            .take_until(self.cancel.cancelled())
            .collect()
            .await;

        let status = if listings.len() < expected {
            PageStatus::Cancelled
        } else if truncated {
            PageStatus::Truncated
        } else {
            PageStatus::Complete
        };

        tracing::info!(
            url = %url,
            listings = listings.len(),
            ?status,
            "page finished"
        );
        (PageReport::new(url, status, listings.len()), listings)
    }
}
