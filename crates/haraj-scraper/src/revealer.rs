//! Authenticated phone reveal.
//!
//! Phones hidden behind the site's "contact" placeholder are only shown to a
//! logged-in user. [`AuthenticatedRevealer`] drives a browser through the
//! login modal and the reveal click as an explicit sequence of
//! [`RevealStep`]s, each gated by a bounded wait. Any failed step aborts the
//! whole sequence and yields the `undefined` sentinel.
//!
//! With session reuse enabled, the authenticated browser is kept after a
//! successful reveal and later reveals start at
//! [`RevealStep::NavigateToListing`]. Reveals are serialized on that session.

use crate::error::{Result, ScrapeError};
use haraj_browser::{BrowserActions, BrowserLauncher, Locator, ScopedSession, WaitCondition};
use haraj_core::{sanitize_phone, Credentials, RevealConfig, SiteOrigin, PHONE_UNDEFINED};
use haraj_rules::RevealRules;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Resolves a phone number hidden behind the reveal placeholder.
#[async_trait::async_trait]
pub trait PhoneRevealer: Send + Sync {
    /// Phone for the listing at `listing_url`, or `undefined`.
    async fn reveal(&self, listing_url: &str) -> String;

    /// Release any session kept between reveals.
    async fn finish(&self) {}
}

/// States of the login/reveal sequence, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RevealStep {
    OpenHome,
    ClickLogin,
    AwaitLoginModal,
    FillUsername,
    ClickNext,
    FillPassword,
    ClickSubmit,
    AwaitModalDismissed,
    NavigateToListing,
    ClickReveal,
    AwaitRevealedValue,
    ExtractPhone,
    Validate,
}

impl RevealStep {
    /// Step that follows this one, `None` after [`RevealStep::Validate`].
    pub fn next(self) -> Option<Self> {
        match self {
            Self::OpenHome => Some(Self::ClickLogin),
            Self::ClickLogin => Some(Self::AwaitLoginModal),
            Self::AwaitLoginModal => Some(Self::FillUsername),
            Self::FillUsername => Some(Self::ClickNext),
            Self::ClickNext => Some(Self::FillPassword),
            Self::FillPassword => Some(Self::ClickSubmit),
            Self::ClickSubmit => Some(Self::AwaitModalDismissed),
            Self::AwaitModalDismissed => Some(Self::NavigateToListing),
            Self::NavigateToListing => Some(Self::ClickReveal),
            Self::ClickReveal => Some(Self::AwaitRevealedValue),
            Self::AwaitRevealedValue => Some(Self::ExtractPhone),
            Self::ExtractPhone => Some(Self::Validate),
            Self::Validate => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenHome => "open_home",
            Self::ClickLogin => "click_login",
            Self::AwaitLoginModal => "await_login_modal",
            Self::FillUsername => "fill_username",
            Self::ClickNext => "click_next",
            Self::FillPassword => "fill_password",
            Self::ClickSubmit => "click_submit",
            Self::AwaitModalDismissed => "await_modal_dismissed",
            Self::NavigateToListing => "navigate_to_listing",
            Self::ClickReveal => "click_reveal",
            Self::AwaitRevealedValue => "await_revealed_value",
            Self::ExtractPhone => "extract_phone",
            Self::Validate => "validate",
        }
    }
}

impl fmt::Display for RevealStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state of one reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealOutcome {
    Success(String),
    Failed { step: RevealStep, reason: String },
}

impl RevealOutcome {
    /// The revealed phone, or `undefined` on failure.
    pub fn into_phone(self) -> String {
        match self {
            Self::Success(phone) => phone,
            Self::Failed { .. } => PHONE_UNDEFINED.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Login state of the browser driving a reveal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionState {
    pub authenticated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealSettings {
    /// Bound on every wait in the sequence
    pub wait_timeout: Duration,
    /// Interval between polls of the revealed value
    pub poll_interval: Duration,
    /// Keep the authenticated session between reveals
    pub reuse_session: bool,
}

impl Default for RevealSettings {
    fn default() -> Self {
        Self::from_config(&RevealConfig::default(), true)
    }
}

impl RevealSettings {
    pub fn from_config(config: &RevealConfig, reuse_session: bool) -> Self {
        Self {
            wait_timeout: Duration::from_secs(config.wait_timeout_secs),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            reuse_session,
        }
    }
}

/// Browser-driven revealer that logs in before clicking "contact".
pub struct AuthenticatedRevealer {
    launcher: Arc<dyn BrowserLauncher>,
    rules: RevealRules,
    credentials: Credentials,
    origin: SiteOrigin,
    settings: RevealSettings,
    session: Mutex<Option<ScopedSession>>,
}

impl AuthenticatedRevealer {
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        rules: RevealRules,
        credentials: Credentials,
        origin: SiteOrigin,
        settings: RevealSettings,
    ) -> Self {
        Self {
            launcher,
            rules,
            credentials,
            origin,
            settings,
            session: Mutex::new(None),
        }
    }

    /// Run the sequence for one listing and report how it ended.
    pub async fn attempt(&self, listing_url: &str) -> RevealOutcome {
        let mut cached = self.session.lock().await;

        let (session, mut state) = match cached.take() {
            Some(session) => (session, SessionState { authenticated: true }),
            None => match ScopedSession::open(self.launcher.as_ref()).await {
                Ok(session) => (session, SessionState::default()),
                Err(e) => {
                    return self.failed(RevealStep::OpenHome, e.to_string(), listing_url);
                }
            },
        };

        let outcome = match self.run(&*session, &mut state, listing_url).await {
            Ok(phone) => RevealOutcome::Success(phone),
            Err((step, e)) => self.failed(step, e.to_string(), listing_url),
        };

        if outcome.is_success() && state.authenticated && self.settings.reuse_session {
            *cached = Some(session);
        } else if let Err(e) = session.release().await {
            tracing::warn!("failed to release reveal session: {}", e);
        }

        outcome
    }

    fn failed(&self, step: RevealStep, reason: String, listing_url: &str) -> RevealOutcome {
        tracing::error!(
            step = %step,
            url = %listing_url,
            "phone reveal aborted: {}",
            reason
        );
        RevealOutcome::Failed { step, reason }
    }

    async fn run(
        &self,
        browser: &dyn BrowserActions,
        state: &mut SessionState,
        listing_url: &str,
    ) -> std::result::Result<String, (RevealStep, ScrapeError)> {
        let mut step = if state.authenticated {
            RevealStep::NavigateToListing
        } else {
            RevealStep::OpenHome
        };
        let mut phone = String::new();

        loop {
            tracing::debug!(step = %step, url = %listing_url, "reveal step");
            self.perform(step, browser, listing_url, &mut phone)
                .await
                .map_err(|e| (step, e))?;

            if step == RevealStep::AwaitModalDismissed {
                state.authenticated = true;
            }
            match step.next() {
                Some(next) => step = next,
                None => return Ok(phone),
            }
        }
    }

    async fn perform(
        &self,
        step: RevealStep,
        browser: &dyn BrowserActions,
        listing_url: &str,
        phone: &mut String,
    ) -> Result<()> {
        let rules = &self.rules;
        match step {
            RevealStep::OpenHome => browser.navigate(self.origin.as_str()).await?,
            RevealStep::ClickLogin => {
                self.await_state(browser, &rules.login_button, WaitCondition::Clickable)
                    .await?;
                browser.click(&rules.login_button).await?;
            }
            RevealStep::AwaitLoginModal => {
                self.await_state(browser, &rules.login_modal, WaitCondition::Visible)
                    .await?;
            }
            RevealStep::FillUsername => {
                self.await_state(browser, &rules.username, WaitCondition::Visible)
                    .await?;
                browser
                    .fill_field(&rules.username, &self.credentials.username)
                    .await?;
            }
            RevealStep::ClickNext => {
                self.await_state(browser, &rules.next_button, WaitCondition::Clickable)
                    .await?;
                browser.click(&rules.next_button).await?;
            }
            RevealStep::FillPassword => {
                self.await_state(browser, &rules.password, WaitCondition::Visible)
                    .await?;
                browser
                    .fill_field(&rules.password, self.credentials.password())
                    .await?;
            }
            RevealStep::ClickSubmit => {
                self.await_state(browser, &rules.submit, WaitCondition::Clickable)
                    .await?;
                browser.click(&rules.submit).await?;
            }
            RevealStep::AwaitModalDismissed => {
                self.await_state(browser, &rules.modal_container, WaitCondition::Invisible)
                    .await?;
            }
            RevealStep::NavigateToListing => browser.navigate(listing_url).await?,
            RevealStep::ClickReveal => {
                self.await_state(browser, &rules.contact_button, WaitCondition::Clickable)
                    .await?;
                browser.click(&rules.contact_button).await?;
            }
            RevealStep::AwaitRevealedValue => {
                self.await_state(browser, &rules.revealed_phone, WaitCondition::Visible)
                    .await?;
            }
            RevealStep::ExtractPhone => *phone = self.extract_phone(browser).await?,
            RevealStep::Validate => {
                let validated = sanitize_phone(phone, &rules.placeholder);
                if validated == PHONE_UNDEFINED {
                    return Err(ScrapeError::AuthFailure {
                        step: step.to_string(),
                        reason: "revealed value carries no phone number".to_string(),
                    });
                }
                *phone = validated;
            }
        }
        Ok(())
    }

    async fn await_state(
        &self,
        browser: &dyn BrowserActions,
        locator: &Locator,
        condition: WaitCondition,
    ) -> Result<()> {
        browser
            .wait_for(locator, condition, self.settings.wait_timeout)
            .await
            .map_err(|e| ScrapeError::ElementNotFound(format!("{locator} ({e})")))
    }

    /// Wait for the revealed node to stop showing the placeholder, then
    /// read it, falling back to a `tel:` link when the text is empty.
    async fn extract_phone(&self, browser: &dyn BrowserActions) -> Result<String> {
        let rules = &self.rules;
        let deadline = Instant::now() + self.settings.wait_timeout;

        let text = loop {
            if let Ok(text) = browser.extract_text(&rules.revealed_phone).await {
                let text = text.trim().to_string();
                if !is_placeholder(&text, &rules.placeholder) {
                    break text;
                }
            }
            if Instant::now() >= deadline {
                return Err(ScrapeError::AuthFailure {
                    step: RevealStep::ExtractPhone.to_string(),
                    reason: format!(
                        "revealed value still showed the placeholder after {:?}",
                        self.settings.wait_timeout
                    ),
                });
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        };

        if !text.is_empty() {
            return Ok(text);
        }

        for link in std::iter::once(&rules.revealed_phone).chain(rules.phone_link.as_ref()) {
            if let Ok(Some(href)) = browser.extract_attribute(link, "href").await {
                if let Some(number) = href.trim().strip_prefix("tel:") {
                    return Ok(number.trim().to_string());
                }
            }
        }

        Ok(text)
    }
}

fn is_placeholder(text: &str, placeholder: &str) -> bool {
    text.to_lowercase() == placeholder.trim().to_lowercase()
}

#[async_trait::async_trait]
impl PhoneRevealer for AuthenticatedRevealer {
    async fn reveal(&self, listing_url: &str) -> String {
        let outcome = self.attempt(listing_url).await;
        if matches!(outcome, RevealOutcome::Success(_)) {
            tracing::info!(url = %listing_url, "revealed phone");
        }
        outcome.into_phone()
    }

    async fn finish(&self) {
        let session = self.session.lock().await.take();
        if let Some(session) = session {
            tracing::debug!("releasing cached reveal session");
            if let Err(e) = session.release().await {
                tracing::warn!("failed to release reveal session: {}", e);
            }
        }
    }
}
