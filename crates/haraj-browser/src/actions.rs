use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// How an interactive element is located on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locator {
    /// CSS selector
    Css(String),
    /// XPath expression
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath(expression.into())
    }

    /// JavaScript expression evaluating to the first matching element or `null`.
    pub fn js_lookup(&self) -> String {
        // serde_json string encoding doubles as JS string literal escaping
        match self {
            Self::Css(selector) => {
                let literal = serde_json::to_string(selector).unwrap_or_default();
                format!("document.querySelector({literal})")
            }
            Self::XPath(expression) => {
                let literal = serde_json::to_string(expression).unwrap_or_default();
                format!(
                    "document.evaluate({literal}, document, null, \
                     XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue"
                )
            }
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(selector) => write!(f, "css `{selector}`"),
            Self::XPath(expression) => write!(f, "xpath `{expression}`"),
        }
    }
}

/// Element state a wait blocks on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    /// Attached to the DOM
    Present,
    /// Attached and rendered with a non-empty box
    Visible,
    /// Visible and not disabled
    Clickable,
    /// Detached or not rendered
    Invisible,
}

impl WaitCondition {
    /// Whether an element probe state (see [`ELEMENT_STATE_SCRIPT`]) satisfies the condition.
    pub fn is_met(self, state: &str) -> bool {
        match self {
            Self::Present => state != "absent",
            Self::Visible => matches!(state, "visible" | "clickable"),
            Self::Clickable => state == "clickable",
            Self::Invisible => matches!(state, "absent" | "hidden"),
        }
    }
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Present => "present",
            Self::Visible => "visible",
            Self::Clickable => "clickable",
            Self::Invisible => "invisible",
        };
        f.write_str(name)
    }
}

/// Probe body classifying an element as `absent`, `hidden`, `visible` or `clickable`.
/// `__LOOKUP__` is replaced with [`Locator::js_lookup`].
pub const ELEMENT_STATE_SCRIPT: &str = r"
(() => {
    const el = __LOOKUP__;
    if (!el) return 'absent';
    const rect = el.getBoundingClientRect();
    const style = window.getComputedStyle(el);
    const shown = rect.width > 0 && rect.height > 0
        && style.visibility !== 'hidden' && style.display !== 'none';
    if (!shown) return 'hidden';
    return el.disabled ? 'visible' : 'clickable';
})()
";

/// Browser actions for automation
#[async_trait::async_trait]
pub trait BrowserActions: Send + Sync {
    /// Navigate to a URL
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Block until the element satisfies `condition`, failing with
    /// [`BrowserError::Timeout`](crate::BrowserError::Timeout) after `timeout`
    async fn wait_for(
        &self,
        locator: &Locator,
        condition: WaitCondition,
        timeout: Duration,
    ) -> Result<()>;

    /// Whether the element is currently attached
    async fn exists(&self, locator: &Locator) -> Result<bool>;

    /// Click an element
    async fn click(&self, locator: &Locator) -> Result<()>;

    /// Clear a form field and type a value into it
    async fn fill_field(&self, locator: &Locator, value: &str) -> Result<()>;

    /// Extract the rendered text of an element
    async fn extract_text(&self, locator: &Locator) -> Result<String>;

    /// Read an attribute of an element
    async fn extract_attribute(&self, locator: &Locator, name: &str) -> Result<Option<String>>;

    /// Scroll the window to the bottom of the document
    async fn scroll_to_bottom(&self) -> Result<()>;

    /// Current `document.body.scrollHeight`
    async fn scroll_height(&self) -> Result<i64>;

    /// Serialized DOM of the current page
    async fn content(&self) -> Result<String>;

    /// Tear down the browser
    async fn close(&self) -> Result<()>;
}
