//! Browser automation for the JavaScript-rendered marketplace.
//!
//! Provides headless Chromium sessions behind the [`BrowserActions`] trait,
//! launched through a [`BrowserLauncher`] and held in a [`ScopedSession`]
//! that always tears the browser down.

pub mod actions;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod session;

pub use actions::{BrowserActions, Locator, WaitCondition};
pub use engine::{BrowserEngine, LaunchSettings};
pub use error::{BrowserError, Result};
pub use session::{BrowserLauncher, ChromiumLauncher, ScopedSession};
