use crate::actions::{BrowserActions, Locator, WaitCondition, ELEMENT_STATE_SCRIPT};
use crate::error::{BrowserError, Result};
use crate::fingerprint::FingerprintConfig;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Launch options for a Chromium session.
#[derive(Debug, Clone)]
pub struct LaunchSettings {
    pub headless: bool,
    /// Fixed viewport; a random desktop size is used when `None`
    pub window: Option<(u32, u32)>,
    pub navigation_timeout: Duration,
    /// Fixed user agent; a random desktop agent is used when `None`
    pub user_agent: Option<String>,
    /// Interval between element state probes while waiting
    pub poll_interval: Duration,
    pub extra_args: Vec<String>,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            headless: true,
            window: Some((1920, 1080)),
            navigation_timeout: Duration::from_secs(30),
            user_agent: None,
            poll_interval: Duration::from_millis(250),
            extra_args: vec!["--disable-gpu".to_string()],
        }
    }
}

/// Browser automation engine driving a single Chromium tab.
pub struct BrowserEngine {
    browser: Mutex<Option<Browser>>,
    handler: Mutex<Option<JoinHandle<()>>>,
    page: Page,
    settings: LaunchSettings,
}

impl BrowserEngine {
    /// Launch a new browser and open a blank tab
    pub async fn launch(settings: LaunchSettings) -> Result<Self> {
        let fingerprint = FingerprintConfig::randomized()
            .with_user_agent(settings.user_agent.as_deref())
            .with_viewport(settings.window);

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(fingerprint.viewport_width, fingerprint.viewport_height)
            .request_timeout(settings.navigation_timeout);
        if !settings.headless {
            builder = builder.with_head();
        }
        for arg in &settings.extra_args {
            builder = builder.arg(arg.as_str());
        }
        let config = builder.build().map_err(BrowserError::ChromiumError)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        // Spawn browser handler
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("browser handler event error: {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(e.into());
            }
        };
        page.set_user_agent(fingerprint.user_agent.clone()).await?;

        tracing::debug!(
            headless = settings.headless,
            width = fingerprint.viewport_width,
            height = fingerprint.viewport_height,
            "launched browser"
        );

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            handler: Mutex::new(Some(handler)),
            page,
            settings,
        })
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::ScriptError(e.to_string()))?;
        result
            .into_value::<T>()
            .map_err(|e| BrowserError::ScriptError(e.to_string()))
    }

    async fn element_state(&self, locator: &Locator) -> Result<String> {
        self.eval(ELEMENT_STATE_SCRIPT.replace("__LOOKUP__", &locator.js_lookup()))
            .await
    }

    async fn find(&self, locator: &Locator) -> Result<Element> {
        let found = match locator {
            Locator::Css(selector) => self.page.find_element(selector.as_str()).await,
            Locator::XPath(expression) => self.page.find_xpath(expression.as_str()).await,
        };
        found.map_err(|_| BrowserError::SelectorNotFound(locator.to_string()))
    }
}

#[async_trait::async_trait]
impl BrowserActions for BrowserEngine {
    async fn navigate(&self, url: &str) -> Result<()> {
        let timeout = self.settings.navigation_timeout;
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {
                tracing::debug!("navigated to {}", url);
                Ok(())
            }
            Ok(Err(e)) => Err(BrowserError::NavigationError(format!("{url}: {e}"))),
            Err(_) => Err(BrowserError::Timeout(format!(
                "navigation to {url} exceeded {}s",
                timeout.as_secs()
            ))),
        }
    }

    async fn wait_for(
        &self,
        locator: &Locator,
        condition: WaitCondition,
        timeout: Duration,
    ) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            // Probe failures during page transitions count as "not yet"
            match self.element_state(locator).await {
                Ok(state) if condition.is_met(&state) => return Ok(()),
                Ok(_) => {}
                Err(e) => tracing::trace!("state probe for {} failed: {}", locator, e),
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout(format!(
                    "{locator} not {condition} after {}s",
                    timeout.as_secs()
                )));
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }

    async fn exists(&self, locator: &Locator) -> Result<bool> {
        Ok(self.element_state(locator).await? != "absent")
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        let element = self.find(locator).await?;
        element.scroll_into_view().await?;
        element.click().await?;
        Ok(())
    }

    async fn fill_field(&self, locator: &Locator, value: &str) -> Result<()> {
        let clear = format!(
            "(() => {{ const el = {}; if (el) {{ el.value = ''; }} }})()",
            locator.js_lookup()
        );
        self.page
            .evaluate(clear)
            .await
            .map_err(|e| BrowserError::ScriptError(e.to_string()))?;

        let element = self.find(locator).await?;
        element.click().await?;
        element.type_str(value).await?;
        Ok(())
    }

    async fn extract_text(&self, locator: &Locator) -> Result<String> {
        let element = self.find(locator).await?;
        Ok(element.inner_text().await?.unwrap_or_default())
    }

    async fn extract_attribute(&self, locator: &Locator, name: &str) -> Result<Option<String>> {
        let element = self.find(locator).await?;
        Ok(element.attribute(name).await?)
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await
            .map_err(|e| BrowserError::ScriptError(e.to_string()))?;
        Ok(())
    }

    async fn scroll_height(&self) -> Result<i64> {
        self.eval("document.body.scrollHeight".to_string()).await
    }

    async fn content(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    async fn close(&self) -> Result<()> {
        let browser = self.browser.lock().await.take();
        if let Some(mut browser) = browser {
            if let Err(e) = browser.close().await {
                tracing::warn!("failed to close browser cleanly: {}", e);
            }
            if let Err(e) = browser.wait().await {
                tracing::warn!("failed to reap browser process: {}", e);
            }
            tracing::debug!("browser closed");
        }
        if let Some(handler) = self.handler.lock().await.take() {
            handler.abort();
        }
        Ok(())
    }
}
