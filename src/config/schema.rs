use crate::locator::{ResolveMode, WaitSettings};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub browser: BrowserSettings,

    #[serde(default)]
    pub timeouts: TimeoutSettings,

    #[serde(default)]
    pub runner: RunnerSettings,

    /// Base URLs of the applications under test
    #[serde(default)]
    pub sites: SiteSettings,

    /// Login portal credentials
    #[serde(default)]
    pub credentials: Credentials,
}

impl AppConfig {
    pub fn wait_settings(&self) -> WaitSettings {
        WaitSettings {
            default_timeout: Duration::from_millis(self.timeouts.expect_ms),
            poll_interval: Duration::from_millis(self.timeouts.poll_interval_ms),
            default_mode: self.runner.resolve_mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserSettings {
    /// Chrome executable; discovered when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<PathBuf>,

    #[serde(default = "default_true")]
    pub headless: bool,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,

    /// Extra Chrome command-line arguments
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Attempts to reach the DevTools endpoint after spawning Chrome
    #[serde(default = "default_launch_retries")]
    pub launch_retries: u32,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            window_width: default_window_width(),
            window_height: default_window_height(),
            extra_args: Vec::new(),
            launch_retries: default_launch_retries(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutSettings {
    /// Default window for expectations and element resolution
    #[serde(default = "default_expect_ms")]
    pub expect_ms: u64,

    #[serde(default = "default_navigation_ms")]
    pub navigation_ms: u64,

    /// Single CDP command round trip
    #[serde(default = "default_command_ms")]
    pub command_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            expect_ms: default_expect_ms(),
            navigation_ms: default_navigation_ms(),
            command_ms: default_command_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerSettings {
    /// Scenarios running at the same time, one browser each
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Mode for targets that don't pick one
    #[serde(default)]
    pub resolve_mode: ResolveMode,

    /// Directory of extra `*.json` scenario files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_dir: Option<PathBuf>,

    /// Where to write a screenshot of each failed scenario
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_dir: Option<PathBuf>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            resolve_mode: ResolveMode::default(),
            scenario_dir: None,
            screenshot_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSettings {
    #[serde(default = "default_storefront_url")]
    pub storefront_url: String,

    #[serde(default = "default_portal_url")]
    pub portal_url: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            storefront_url: default_storefront_url(),
            portal_url: default_portal_url(),
        }
    }
}

/// Fallback credentials plus the environment variables that override them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default = "default_email")]
    pub email: String,

    #[serde(default = "default_password")]
    pub password: String,

    #[serde(default = "default_email_env")]
    pub email_env: String,

    #[serde(default = "default_password_env")]
    pub password_env: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            email: default_email(),
            password: default_password(),
            email_env: default_email_env(),
            password_env: default_password_env(),
        }
    }
}

impl Credentials {
    /// Email and password with environment overrides applied.
    pub fn effective(&self) -> (String, String) {
        self.effective_with(|name| std::env::var(name).ok())
    }

    pub fn effective_with(&self, lookup: impl Fn(&str) -> Option<String>) -> (String, String) {
        let email = lookup(&self.email_env)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.email.clone());
        let password = lookup(&self.password_env)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.password.clone());
        (email, password)
    }
}

fn default_true() -> bool {
    true
}

fn default_window_width() -> u32 {
    1280
}

fn default_window_height() -> u32 {
    800
}

fn default_launch_retries() -> u32 {
    40
}

fn default_expect_ms() -> u64 {
    5000
}

fn default_navigation_ms() -> u64 {
    30000
}

fn default_command_ms() -> u64 {
    30000
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_workers() -> usize {
    2
}

fn default_storefront_url() -> String {
    "https://www.demoblaze.com".to_string()
}

fn default_portal_url() -> String {
    "https://f1tcloud.f1tdemo.xyz".to_string()
}

fn default_email() -> String {
    "admin@test.com".to_string()
}

fn default_password() -> String {
    "123456".to_string()
}

fn default_email_env() -> String {
    "F1T_EMAIL".to_string()
}

fn default_password_env() -> String {
    "F1T_PASS".to_string()
}
