//! [`Page`] backed by a real Chrome process.

use crate::browser::cdp::{CDPClient, PageEvents};
use crate::browser::launcher::{find_chrome, LaunchOptions};
use crate::browser::page::{Dialog, ElementState, Navigation, Page, PageFactory};
use crate::browser::port::allocate_cdp_port;
use crate::browser::script::{locator_expression, LocatorOp};
use crate::config::schema::{BrowserSettings, TimeoutSettings};
use crate::error::{Result, UiScoutError};
use crate::locator::Locator;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub struct CdpPage {
    client: CDPClient,
    events: Arc<PageEvents>,
    navigation_timeout: Duration,
}

impl CdpPage {
    pub fn new(client: CDPClient, navigation_timeout: Duration) -> Self {
        let events = client.events();
        Self {
            client,
            events,
            navigation_timeout,
        }
    }

    pub fn client(&self) -> &CDPClient {
        &self.client
    }

    async fn run(&self, locator: &Locator, op: LocatorOp, arg: Option<&str>) -> Result<bool> {
        let value = self
            .client
            .evaluate(&locator_expression(locator, op, arg))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }
}

#[async_trait]
impl Page for CdpPage {
    async fn goto(&self, url: &str) -> Result<Navigation> {
        self.client.navigate(url, self.navigation_timeout).await
    }

    async fn current_url(&self) -> Result<String> {
        self.client.get_url().await
    }

    async fn inspect(&self, locator: &Locator) -> Result<ElementState> {
        let value = self
            .client
            .evaluate(&locator_expression(locator, LocatorOp::Inspect, None))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        if self.run(locator, LocatorOp::Click, None).await? {
            tracing::debug!("Clicked element: {}", locator);
            Ok(())
        } else {
            Err(UiScoutError::Browser(format!(
                "No visible element to click: {}",
                locator
            )))
        }
    }

    async fn fill(&self, locator: &Locator, value: &str) -> Result<()> {
        if self.run(locator, LocatorOp::Fill, Some(value)).await? {
            tracing::debug!("Filled element: {}", locator);
            Ok(())
        } else {
            Err(UiScoutError::Browser(format!(
                "No visible element to fill: {}",
                locator
            )))
        }
    }

    async fn evaluate(&self, expression: &str) -> Result<serde_json::Value> {
        self.client.evaluate(expression).await
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.client.screenshot().await
    }

    fn dialogs(&self) -> Vec<Dialog> {
        self.events.dialogs()
    }

    fn load_count(&self) -> u64 {
        self.events.load_count()
    }

    async fn close(&self) -> Result<()> {
        self.client.close().await
    }
}

/// Launches one Chrome per scenario, each with its own profile directory.
pub struct ChromeFactory {
    chrome_path: PathBuf,
    browser: BrowserSettings,
    timeouts: TimeoutSettings,
}

impl ChromeFactory {
    pub fn new(browser: BrowserSettings, timeouts: TimeoutSettings) -> Result<Self> {
        let chrome_path = find_chrome(browser.chrome_path.as_deref()).ok_or_else(|| {
            UiScoutError::Config(
                "Chrome not found; set browser.chrome_path or CHROME_PATH".to_string(),
            )
        })?;
        tracing::info!("Using Chrome at {:?}", chrome_path);
        Ok(Self {
            chrome_path,
            browser,
            timeouts,
        })
    }
}

#[async_trait]
impl PageFactory for ChromeFactory {
    async fn open(&self, scenario: &str) -> Result<Box<dyn Page>> {
        let options = LaunchOptions::from_settings(&self.browser, allocate_cdp_port());
        let mut client = CDPClient::new(
            scenario,
            Duration::from_millis(self.timeouts.command_ms),
        );
        client
            .launch(&self.chrome_path, &options, self.browser.launch_retries)
            .await?;
        Ok(Box::new(CdpPage::new(
            client,
            Duration::from_millis(self.timeouts.navigation_ms),
        )))
    }
}
