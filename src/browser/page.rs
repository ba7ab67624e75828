//! The page abstraction scenarios and the resolver are written against.

use crate::error::Result;
use crate::locator::Locator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Outcome of a completed navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigation {
    pub url: String,
    /// HTTP status of the main document, when the browser reported one.
    pub status: Option<u16>,
}

/// Snapshot of the elements a locator currently matches.
///
/// `visible`, `enabled` and `text` describe the first visible match, or the
/// first match when none is visible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementState {
    pub count: usize,
    pub visible: bool,
    pub enabled: bool,
    pub text: Option<String>,
}

/// A JavaScript dialog (alert/confirm/prompt) the page opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialog {
    pub kind: String,
    pub message: String,
}

/// One browser page owned by a single scenario.
///
/// Dialogs are accepted as soon as they open; `dialogs` returns everything
/// seen so far, oldest first.
#[async_trait]
pub trait Page: Send + Sync {
    /// Navigate and wait for the load event.
    async fn goto(&self, url: &str) -> Result<Navigation>;

    async fn current_url(&self) -> Result<String>;

    /// Read-only inspection of what `locator` matches right now.
    async fn inspect(&self, locator: &Locator) -> Result<ElementState>;

    async fn click(&self, locator: &Locator) -> Result<()>;

    async fn fill(&self, locator: &Locator, value: &str) -> Result<()>;

    async fn evaluate(&self, expression: &str) -> Result<serde_json::Value>;

    /// PNG bytes of the current viewport.
    async fn screenshot(&self) -> Result<Vec<u8>>;

    fn dialogs(&self) -> Vec<Dialog>;

    /// Number of main-frame load events observed.
    fn load_count(&self) -> u64;

    /// Release the underlying browser.
    async fn close(&self) -> Result<()>;
}

/// Opens a fresh, isolated page per scenario.
#[async_trait]
pub trait PageFactory: Send + Sync {
    async fn open(&self, scenario: &str) -> Result<Box<dyn Page>>;
}
