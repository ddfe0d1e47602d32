use crate::error::{Result, ScrapeError};
use haraj_core::{HttpConfig, SiteOrigin};
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, REFERER, USER_AGENT,
};
use reqwest::Client;
use std::time::Duration;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Fetches raw detail-page markup.
#[async_trait::async_trait]
pub trait DetailFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Plain HTTP GET with browser-like headers, no JavaScript.
#[derive(Debug, Clone)]
pub struct StaticFetcher {
    client: Client,
}

impl StaticFetcher {
    pub fn new(config: &HttpConfig, origin: &SiteOrigin) -> Result<Self> {
        let client = Client::builder()
            .default_headers(browser_headers(config, origin)?)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ScrapeError::Configuration(format!("HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

fn header(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| ScrapeError::Configuration(format!("invalid {name} header '{value}': {e}")))
}

fn browser_headers(config: &HttpConfig, origin: &SiteOrigin) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, header("User-Agent", &config.user_agent)?);
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(
        ACCEPT_LANGUAGE,
        header("Accept-Language", &config.accept_language)?,
    );
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(REFERER, header("Referer", origin.as_str())?);
    Ok(headers)
}

#[async_trait::async_trait]
impl DetailFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let failure = |reason: String| ScrapeError::HttpFailure {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| failure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failure(format!("HTTP {status}")));
        }

        let body = response.text().await.map_err(|e| failure(e.to_string()))?;
        tracing::debug!(url = %url, bytes = body.len(), "fetched detail page");
        Ok(body)
    }
}
