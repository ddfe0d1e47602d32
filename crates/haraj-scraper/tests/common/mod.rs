//! Scripted stand-ins for the browser, HTTP and reveal seams.

#![allow(dead_code)]

use async_trait::async_trait;
use haraj_browser::{BrowserActions, BrowserError, BrowserLauncher, Locator, WaitCondition};
use haraj_core::SiteOrigin;
use haraj_rules::{ExtractionRules, RulesLoader};
use haraj_scraper::{DetailFetcher, ListingExtractor, PhoneRevealer, Renderer, ScrapeError};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const BASE_URL: &str = "https://haraj.com.sa";

pub fn rules() -> ExtractionRules {
    RulesLoader::builtin().expect("builtin rules")
}

pub fn origin() -> SiteOrigin {
    SiteOrigin::new(BASE_URL).expect("valid origin")
}

pub fn extractor() -> Arc<ListingExtractor> {
    Arc::new(ListingExtractor::new(&rules(), origin()).expect("compile rules"))
}

/// A listing card the way the site lays it out.
pub fn listing_card(href: &str, title: &str, price: Option<&str>, phone: Option<&str>) -> String {
    let price = price
        .map(|p| format!(r#"<div class="mb-8 flex w-full justify-end px-2"><strong>{p}</strong></div>"#))
        .unwrap_or_default();
    let phone = phone
        .map(|p| format!(r#"<button data-testid="post-contact">{p}</button>"#))
        .unwrap_or_default();
    format!(
        r#"<div class="post"><a href="{href}"><h3>{title}</h3></a>{price}<span class="city">Riyadh</span>{phone}<article data-testid="post-article">Listing body</article><a data-testid="post-author">Seller</a></div>"#
    )
}

pub fn listing_page(cards: &[String]) -> String {
    format!("<html><body>{}</body></html>", cards.concat())
}

/// Browser whose page state is scripted up front.
#[derive(Default)]
pub struct ScriptedBrowser {
    html: String,
    heights: Mutex<VecDeque<i64>>,
    last_height: Mutex<i64>,
    missing: HashSet<String>,
    present: HashSet<String>,
    texts: Mutex<HashMap<String, VecDeque<String>>>,
    attributes: HashMap<(String, String), String>,
    log: Mutex<Vec<String>>,
    closes: AtomicUsize,
}

impl ScriptedBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = html.into();
        self
    }

    pub fn with_heights(self, heights: &[i64]) -> Self {
        *self.heights.lock().unwrap() = heights.iter().copied().collect();
        self
    }

    /// Waits on this locator time out and clicks on it fail.
    pub fn without(mut self, locator: &Locator) -> Self {
        self.missing.insert(locator.to_string());
        self
    }

    /// `exists` reports this locator as present.
    pub fn with_present(mut self, locator: &Locator) -> Self {
        self.present.insert(locator.to_string());
        self
    }

    /// Successive texts for a locator; the last one repeats.
    pub fn with_texts(self, locator: &Locator, texts: &[&str]) -> Self {
        self.texts.lock().unwrap().insert(
            locator.to_string(),
            texts.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    pub fn with_attribute(mut self, locator: &Locator, name: &str, value: &str) -> Self {
        self.attributes
            .insert((locator.to_string(), name.to_string()), value.to_string());
        self
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.log().iter().filter(|entry| entry.starts_with(prefix)).count()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl BrowserActions for ScriptedBrowser {
    async fn navigate(&self, url: &str) -> haraj_browser::Result<()> {
        self.record(format!("navigate {url}"));
        Ok(())
    }

    async fn wait_for(
        &self,
        locator: &Locator,
        condition: WaitCondition,
        timeout: Duration,
    ) -> haraj_browser::Result<()> {
        self.record(format!("wait {locator} {condition}"));
        if self.missing.contains(&locator.to_string()) {
            return Err(BrowserError::Timeout(format!(
                "{locator} not {condition} after {timeout:?}"
            )));
        }
        Ok(())
    }

    async fn exists(&self, locator: &Locator) -> haraj_browser::Result<bool> {
        Ok(self.present.contains(&locator.to_string()))
    }

    async fn click(&self, locator: &Locator) -> haraj_browser::Result<()> {
        self.record(format!("click {locator}"));
        if self.missing.contains(&locator.to_string()) {
            return Err(BrowserError::SelectorNotFound(locator.to_string()));
        }
        Ok(())
    }

    async fn fill_field(&self, locator: &Locator, value: &str) -> haraj_browser::Result<()> {
        self.record(format!("fill {locator} {value}"));
        Ok(())
    }

    async fn extract_text(&self, locator: &Locator) -> haraj_browser::Result<String> {
        let mut texts = self.texts.lock().unwrap();
        let queue = texts
            .get_mut(&locator.to_string())
            .ok_or_else(|| BrowserError::SelectorNotFound(locator.to_string()))?;
        let text = if queue.len() > 1 {
            queue.pop_front().unwrap_or_default()
        } else {
            queue.front().cloned().unwrap_or_default()
        };
        Ok(text)
    }

    async fn extract_attribute(
        &self,
        locator: &Locator,
        name: &str,
    ) -> haraj_browser::Result<Option<String>> {
        Ok(self
            .attributes
            .get(&(locator.to_string(), name.to_string()))
            .cloned())
    }

    async fn scroll_to_bottom(&self) -> haraj_browser::Result<()> {
        self.record("scroll".to_string());
        Ok(())
    }

    async fn scroll_height(&self) -> haraj_browser::Result<i64> {
        let mut last = self.last_height.lock().unwrap();
        if let Some(height) = self.heights.lock().unwrap().pop_front() {
            *last = height;
        }
        Ok(*last)
    }

    async fn content(&self) -> haraj_browser::Result<String> {
        Ok(self.html.clone())
    }

    async fn close(&self) -> haraj_browser::Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out the same scripted browser on every launch.
pub struct FakeLauncher {
    browser: Arc<ScriptedBrowser>,
    launches: AtomicUsize,
}

impl FakeLauncher {
    pub fn new(browser: Arc<ScriptedBrowser>) -> Self {
        Self {
            browser,
            launches: AtomicUsize::new(0),
        }
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> haraj_browser::Result<Arc<dyn BrowserActions>> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(self.browser.clone())
    }
}

/// Scripted detail-page responses.
#[derive(Debug, Clone)]
pub enum Reply {
    Html(String),
    HttpFailure,
    Malformed,
}

#[derive(Default)]
pub struct FakeFetcher {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replies for a URL in order; the last one repeats.
    pub fn with_replies(self, url: &str, replies: Vec<Reply>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(url.to_string(), replies.into());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DetailFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> haraj_scraper::Result<String> {
        self.calls.lock().unwrap().push(url.to_string());

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            match replies.get_mut(url) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(Reply::Html(html)) => Ok(html),
            Some(Reply::Malformed) => Err(ScrapeError::Configuration(format!(
                "cannot fetch {url}"
            ))),
            Some(Reply::HttpFailure) | None => Err(ScrapeError::HttpFailure {
                url: url.to_string(),
                reason: "status 503".to_string(),
            }),
        }
    }
}

/// Renderer serving canned markup per URL.
#[derive(Default)]
pub struct FakeRenderer {
    pages: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn render(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> haraj_scraper::Result<String> {
        if cancel.is_cancelled() {
            return Err(ScrapeError::Cancelled);
        }
        self.calls.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::RenderTimeout {
                url: url.to_string(),
                waited: Duration::from_secs(20),
            })
    }
}

/// Revealer returning a fixed value.
pub struct FakeRevealer {
    phone: String,
    calls: Mutex<Vec<String>>,
    finished: AtomicUsize,
}

impl FakeRevealer {
    pub fn new(phone: &str) -> Self {
        Self {
            phone: phone.to_string(),
            calls: Mutex::new(Vec::new()),
            finished: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PhoneRevealer for FakeRevealer {
    async fn reveal(&self, listing_url: &str) -> String {
        self.calls.lock().unwrap().push(listing_url.to_string());
        self.phone.clone()
    }

    async fn finish(&self) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}
