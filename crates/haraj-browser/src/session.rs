//! Browser session lifecycle.
//!
//! Every component that needs a browser obtains one through a
//! [`BrowserLauncher`] and holds it in a [`ScopedSession`]. Calling
//! [`ScopedSession::release`] closes the browser; a session dropped without
//! being released (early return, cancellation, panic unwinding) schedules the
//! close on the current runtime instead.

use crate::actions::BrowserActions;
use crate::engine::{BrowserEngine, LaunchSettings};
use crate::error::Result;
use std::ops::Deref;
use std::sync::Arc;

/// Factory for browser sessions.
#[async_trait::async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Start a fresh browser.
    async fn launch(&self) -> Result<Arc<dyn BrowserActions>>;
}

/// Launches headless (or headed) Chromium through [`BrowserEngine`].
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher {
    settings: LaunchSettings,
}

impl ChromiumLauncher {
    pub fn new(settings: LaunchSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &LaunchSettings {
        &self.settings
    }
}

#[async_trait::async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Arc<dyn BrowserActions>> {
        let engine = BrowserEngine::launch(self.settings.clone()).await?;
        Ok(Arc::new(engine))
    }
}

/// A browser that is torn down exactly once.
pub struct ScopedSession {
    inner: Arc<dyn BrowserActions>,
    released: bool,
}

impl ScopedSession {
    /// Launch a browser and take ownership of its lifetime.
    pub async fn open(launcher: &dyn BrowserLauncher) -> Result<Self> {
        let inner = launcher.launch().await?;
        Ok(Self {
            inner,
            released: false,
        })
    }

    /// Close the browser and wait for teardown.
    pub async fn release(mut self) -> Result<()> {
        self.released = true;
        self.inner.close().await
    }
}

impl Deref for ScopedSession {
    type Target = dyn BrowserActions;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl Drop for ScopedSession {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let inner = Arc::clone(&self.inner);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = inner.close().await {
                        tracing::warn!("failed to close abandoned browser session: {}", e);
                    }
                });
            }
            Err(_) => tracing::warn!("browser session dropped outside a runtime; not closed"),
        }
    }
}
