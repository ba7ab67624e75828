//! Resilient element resolution.
//!
//! A [`Target`] names something a scenario needs ("the submit control", "a
//! login error") and lists the locator strategies that may find it, most
//! specific first. The resolver returns the first strategy whose element is
//! visible, or [`UiScoutError::TargetNotFound`] carrying every strategy it
//! tried, in priority order.
//!
//! Two modes:
//! - [`ResolveMode::Sequential`]: each strategy gets its own window, one after
//!   another. A full miss costs the sum of all windows.
//! - [`ResolveMode::Race`]: every strategy is probed concurrently against one
//!   shared deadline. The first hit wins and the other probes are dropped.

use crate::browser::Page;
use crate::error::{Result, UiScoutError};
use crate::locator::Locator;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// How the strategies of a target are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResolveMode {
    Sequential,
    #[default]
    Race,
}

/// One locator with its own visibility window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    pub locator: Locator,
    /// Falls back to the configured expect timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Strategy {
    pub fn new(locator: Locator) -> Self {
        Self {
            locator,
            timeout_ms: None,
        }
    }

    pub fn with_timeout(locator: Locator, timeout_ms: u64) -> Self {
        Self {
            locator,
            timeout_ms: Some(timeout_ms),
        }
    }
}

/// A semantic element target backed by prioritized strategies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    pub strategies: Vec<Strategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ResolveMode>,
    /// Shared deadline for [`ResolveMode::Race`]. Defaults to the largest
    /// strategy window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
}

impl Target {
    /// Target found by a single locator, named after it.
    pub fn locator(locator: Locator) -> Self {
        Self {
            name: locator.describe(),
            strategies: vec![Strategy::new(locator)],
            mode: None,
            deadline_ms: None,
        }
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::locator(Locator::css(selector))
    }

    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::locator(Locator::role_named(role, name))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::locator(Locator::text(text))
    }

    pub fn first_of(name: impl Into<String>, strategies: Vec<Strategy>) -> Self {
        Self {
            name: name.into(),
            strategies,
            mode: None,
            deadline_ms: None,
        }
    }

    pub fn sequential(mut self) -> Self {
        self.mode = Some(ResolveMode::Sequential);
        self
    }

    pub fn race(mut self, deadline_ms: u64) -> Self {
        self.mode = Some(ResolveMode::Race);
        self.deadline_ms = Some(deadline_ms);
        self
    }

    /// Give every strategy without an explicit window this one.
    pub fn within(mut self, timeout_ms: u64) -> Self {
        for strategy in &mut self.strategies {
            strategy.timeout_ms.get_or_insert(timeout_ms);
        }
        self
    }

    /// The locator used when a step needs a plain locator (hidden checks).
    pub fn primary(&self) -> Option<&Locator> {
        self.strategies.first().map(|s| &s.locator)
    }

    pub fn attempted(&self) -> Vec<String> {
        self.strategies.iter().map(|s| s.locator.describe()).collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.strategies.is_empty() {
            return Err(UiScoutError::Validation(format!(
                "Target '{}' has no locator strategies",
                self.name
            )));
        }
        for strategy in &self.strategies {
            strategy.locator.validate()?;
        }
        Ok(())
    }
}

/// Wait parameters shared by the resolver and the step assertions.
#[derive(Debug, Clone, Copy)]
pub struct WaitSettings {
    pub default_timeout: Duration,
    pub poll_interval: Duration,
    pub default_mode: ResolveMode,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_millis(5000),
            poll_interval: Duration::from_millis(100),
            default_mode: ResolveMode::Race,
        }
    }
}

impl WaitSettings {
    fn window(&self, strategy: &Strategy) -> Duration {
        strategy
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(self.default_timeout)
    }
}

/// The strategy that matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub strategy_index: usize,
    pub locator: Locator,
    pub elapsed: Duration,
}

/// Find the first strategy of `target` whose element becomes visible.
pub async fn resolve(
    page: &dyn Page,
    target: &Target,
    settings: &WaitSettings,
) -> Result<Resolved> {
    target.validate()?;
    let started = Instant::now();
    let mode = target.mode.unwrap_or(settings.default_mode);

    let hit = match mode {
        ResolveMode::Sequential => resolve_sequential(page, target, settings).await?,
        ResolveMode::Race => resolve_race(page, target, settings).await?,
    };

    match hit {
        Some(index) => {
            let locator = target.strategies[index].locator.clone();
            tracing::debug!(
                "Resolved '{}' via strategy {} ({})",
                target.name,
                index,
                locator
            );
            Ok(Resolved {
                strategy_index: index,
                locator,
                elapsed: started.elapsed(),
            })
        }
        None => Err(UiScoutError::TargetNotFound {
            target: target.name.clone(),
            attempted: target.attempted(),
        }),
    }
}

async fn resolve_sequential(
    page: &dyn Page,
    target: &Target,
    settings: &WaitSettings,
) -> Result<Option<usize>> {
    for (index, strategy) in target.strategies.iter().enumerate() {
        let deadline = Instant::now() + settings.window(strategy);
        if wait_visible(page, &strategy.locator, deadline, settings.poll_interval).await? {
            return Ok(Some(index));
        }
        tracing::debug!(
            "Strategy {} for '{}' missed: {}",
            index,
            target.name,
            strategy.locator
        );
    }
    Ok(None)
}

async fn resolve_race(
    page: &dyn Page,
    target: &Target,
    settings: &WaitSettings,
) -> Result<Option<usize>> {
    let budget = target.deadline_ms.map(Duration::from_millis).unwrap_or_else(|| {
        target
            .strategies
            .iter()
            .map(|s| settings.window(s))
            .max()
            .unwrap_or(settings.default_timeout)
    });
    let deadline = Instant::now() + budget;

    let mut probes: FuturesUnordered<_> = target
        .strategies
        .iter()
        .enumerate()
        .map(|(index, strategy)| async move {
            wait_visible(page, &strategy.locator, deadline, settings.poll_interval)
                .await
                .map(|visible| visible.then_some(index))
        })
        .collect();

    while let Some(outcome) = probes.next().await {
        if let Some(index) = outcome? {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

/// Poll until `locator` matches a visible element or `deadline` passes.
pub async fn wait_visible(
    page: &dyn Page,
    locator: &Locator,
    deadline: Instant,
    poll: Duration,
) -> Result<bool> {
    loop {
        if page.inspect(locator).await?.visible {
            return Ok(true);
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(false);
        }
        tokio::time::sleep(poll.min(deadline - now)).await;
    }
}
