use crate::error::{Result, ScrapeError};
use haraj_browser::{
    BrowserActions, BrowserError, BrowserLauncher, Locator, ScopedSession, WaitCondition,
};
use haraj_core::RenderConfig;
use haraj_rules::ListingRules;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Produces fully rendered markup for a listing page.
#[async_trait::async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &str, cancel: &CancellationToken) -> Result<String>;
}

/// Timings and budget for the scroll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    pub ready_timeout: Duration,
    pub max_iterations: u32,
    pub scroll_pause: Duration,
    pub load_more_pause: Duration,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::from(&RenderConfig::default())
    }
}

impl From<&RenderConfig> for RenderSettings {
    fn from(config: &RenderConfig) -> Self {
        Self {
            ready_timeout: Duration::from_secs(config.ready_timeout_secs),
            max_iterations: config.max_scroll_iterations,
            scroll_pause: Duration::from_millis(config.scroll_pause_ms),
            load_more_pause: Duration::from_millis(config.load_more_pause_ms),
        }
    }
}

/// Headless-browser renderer with incremental scroll pagination.
///
/// One browser per call, released on every exit path.
pub struct PageRenderer {
    launcher: Arc<dyn BrowserLauncher>,
    ready: Locator,
    load_more: Option<Locator>,
    settings: RenderSettings,
}

impl PageRenderer {
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        rules: &ListingRules,
        settings: RenderSettings,
    ) -> Self {
        Self {
            launcher,
            ready: Locator::css(rules.ready.as_str()),
            load_more: rules.load_more.as_deref().map(Locator::css),
            settings,
        }
    }

    async fn drive(
        &self,
        browser: &dyn BrowserActions,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        browser.navigate(url).await?;
        browser
            .wait_for(&self.ready, WaitCondition::Present, self.settings.ready_timeout)
            .await
            .map_err(|e| match e {
                BrowserError::Timeout(_) => ScrapeError::RenderTimeout {
                    url: url.to_string(),
                    waited: self.settings.ready_timeout,
                },
                other => other.into(),
            })?;

        let iterations = self.paginate(browser, cancel).await?;
        tracing::debug!(url = %url, iterations, "pagination finished");

        Ok(browser.content().await?)
    }

    /// Scroll (and click "load more") until the document stops growing.
    ///
    /// Returns the number of iterations performed, at most
    /// `max_iterations`.
    pub async fn paginate(
        &self,
        browser: &dyn BrowserActions,
        cancel: &CancellationToken,
    ) -> Result<u32> {
        let mut last_height = browser.scroll_height().await?;
        let mut iterations = 0;
        let mut settled = false;

        while iterations < self.settings.max_iterations {
            iterations += 1;

            browser.scroll_to_bottom().await?;
            pause(self.settings.scroll_pause, cancel).await?;
            let height = browser.scroll_height().await?;

            if let Some(load_more) = &self.load_more {
                if browser.exists(load_more).await.unwrap_or(false) {
                    match browser.click(load_more).await {
                        Ok(()) => pause(self.settings.load_more_pause, cancel).await?,
                        Err(e) => tracing::warn!("load-more click failed: {}", e),
                    }
                }
            }

            if height == last_height {
                settled = true;
                break;
            }
            last_height = height;
        }

        if !settled {
            tracing::warn!(
                iterations,
                "scroll budget exhausted before content stopped growing"
            );
        }

        Ok(iterations)
    }
}

async fn pause(duration: Duration, cancel: &CancellationToken) -> Result<()> {
    tokio::select! {
        () = cancel.cancelled() => Err(ScrapeError::Cancelled),
        () = tokio::time::sleep(duration) => Ok(()),
    }
}

#[async_trait::async_trait]
impl Renderer for PageRenderer {
    async fn render(&self, url: &str, cancel: &CancellationToken) -> Result<String> {
        if cancel.is_cancelled() {
            return Err(ScrapeError::Cancelled);
        }

        tracing::info!("rendering {}", url);
        let session = ScopedSession::open(self.launcher.as_ref()).await?;

        let result = tokio::select! {
            () = cancel.cancelled() => Err(ScrapeError::Cancelled),
            result = self.drive(&*session, url, cancel) => result,
        };

        if let Err(e) = session.release().await {
            tracing::warn!("failed to release render session: {}", e);
        }

        if let Ok(html) = &result {
            tracing::debug!(url = %url, bytes = html.len(), "rendered page");
        }
        result
    }
}
