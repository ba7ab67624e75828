//! Scenario data structures and serialization.

use crate::error::{Result, UiScoutError};
use crate::locator::{Locator, Target};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// One independent browser-driven test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Scenario variables; values may reference built-ins such as `${run_id}`.
    #[serde(default)]
    pub variables: HashMap<String, String>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            tags: Vec::new(),
            variables: HashMap::new(),
            steps: Vec::new(),
        }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(UiScoutError::Validation(
                "Scenario name cannot be empty".to_string(),
            ));
        }
        if self.steps.is_empty() {
            return Err(UiScoutError::Validation(format!(
                "Scenario '{}' has no steps",
                self.name
            )));
        }
        for (index, step) in self.steps.iter().enumerate() {
            step.validate().map_err(|e| {
                UiScoutError::Validation(format!("{} step {}: {}", self.name, index + 1, e))
            })?;
        }
        Ok(())
    }
}

/// Expected element count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountExpectation {
    Exactly(usize),
    /// A count stored by `remember_count`, shifted by `delta`.
    Relative { key: String, delta: i64 },
}

/// A single scenario step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Goto {
        url: String,
    },
    Click {
        target: Target,
    },
    /// Click and wait for the resulting page load.
    ClickAndWaitForLoad {
        target: Target,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
    Fill {
        target: Target,
        value: String,
    },
    ExpectVisible {
        target: Target,
    },
    ExpectHidden {
        target: Target,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
    ExpectEnabled {
        target: Target,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
    ExpectText {
        target: Target,
        contains: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
    /// `matches: false` asserts the URL does *not* match.
    ExpectUrl {
        pattern: String,
        #[serde(default = "default_true")]
        matches: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
    /// The URL still equals the one the last `goto` landed on.
    ExpectUrlUnchanged,
    /// HTTP status of the last document navigation.
    ExpectStatus {
        status: u16,
    },
    RememberCount {
        locator: Locator,
        key: String,
    },
    ExpectCount {
        locator: Locator,
        count: CountExpectation,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
    /// Wait for the next (already accepted) JavaScript dialog.
    WaitForDialog {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        contains: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
    ClearStorage,
    /// Unconditional sleep.
    Pause {
        duration_ms: u64,
    },
    /// Alternatives tried in order; the first that passes wins.
    AnyOf {
        steps: Vec<Step>,
    },
}

fn default_true() -> bool {
    true
}

impl Step {
    pub fn goto(url: impl Into<String>) -> Self {
        Step::Goto { url: url.into() }
    }

    pub fn click(target: Target) -> Self {
        Step::Click { target }
    }

    pub fn fill(target: Target, value: impl Into<String>) -> Self {
        Step::Fill {
            target,
            value: value.into(),
        }
    }

    pub fn expect_visible(target: Target) -> Self {
        Step::ExpectVisible { target }
    }

    pub fn expect_hidden(target: Target) -> Self {
        Step::ExpectHidden {
            target,
            timeout_ms: None,
        }
    }

    pub fn wait_for_dialog(contains: impl Into<String>) -> Self {
        Step::WaitForDialog {
            contains: Some(contains.into()),
            timeout_ms: None,
        }
    }

    /// One-line description for logs and results. Secret values are masked.
    pub fn describe(&self) -> String {
        match self {
            Step::Goto { url } => format!("goto {}", url),
            Step::Click { target } => format!("click {}", target.name),
            Step::ClickAndWaitForLoad { target, .. } => {
                format!("click {} and wait for load", target.name)
            }
            Step::Fill { target, value } => {
                let secret = target.strategies.iter().any(|s| s.locator.is_secret());
                if secret {
                    format!("fill {} with ***", target.name)
                } else {
                    format!("fill {} with '{}'", target.name, value)
                }
            }
            Step::ExpectVisible { target } => format!("expect {} visible", target.name),
            Step::ExpectHidden { target, .. } => format!("expect {} hidden", target.name),
            Step::ExpectEnabled { target, .. } => format!("expect {} enabled", target.name),
            Step::ExpectText {
                target, contains, ..
            } => format!("expect {} to contain '{}'", target.name, contains),
            Step::ExpectUrl {
                pattern, matches, ..
            } => {
                if *matches {
                    format!("expect url =~ /{}/", pattern)
                } else {
                    format!("expect url !~ /{}/", pattern)
                }
            }
            Step::ExpectUrlUnchanged => "expect url unchanged".to_string(),
            Step::ExpectStatus { status } => format!("expect status {}", status),
            Step::RememberCount { locator, key } => {
                format!("remember count of {} as '{}'", locator, key)
            }
            Step::ExpectCount { locator, count, .. } => match count {
                CountExpectation::Exactly(n) => format!("expect {} count == {}", locator, n),
                CountExpectation::Relative { key, delta } => {
                    format!("expect {} count == {} {:+}", locator, key, delta)
                }
            },
            Step::WaitForDialog { contains, .. } => match contains {
                Some(text) => format!("wait for dialog containing '{}'", text),
                None => "wait for dialog".to_string(),
            },
            Step::ClearStorage => "clear storage".to_string(),
            Step::Pause { duration_ms } => format!("pause {}ms", duration_ms),
            Step::AnyOf { steps } => format!(
                "any of [{}]",
                steps
                    .iter()
                    .map(Step::describe)
                    .collect::<Vec<_>>()
                    .join(" | ")
            ),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Step::Goto { url } if url.trim().is_empty() => {
                Err(UiScoutError::Validation("goto url cannot be empty".to_string()))
            }
            Step::Click { target }
            | Step::ClickAndWaitForLoad { target, .. }
            | Step::Fill { target, .. }
            | Step::ExpectVisible { target }
            | Step::ExpectHidden { target, .. }
            | Step::ExpectEnabled { target, .. }
            | Step::ExpectText { target, .. } => target.validate(),
            Step::ExpectUrl { pattern, .. } => regex::Regex::new(pattern)
                .map(|_| ())
                .map_err(|e| UiScoutError::Validation(format!("Invalid url pattern: {}", e))),
            Step::RememberCount { locator, .. } | Step::ExpectCount { locator, .. } => {
                locator.validate()
            }
            Step::AnyOf { steps } if steps.is_empty() => Err(UiScoutError::Validation(
                "any_of needs at least one alternative".to_string(),
            )),
            Step::AnyOf { steps } => steps.iter().try_for_each(Step::validate),
            _ => Ok(()),
        }
    }
}

/// Scenario or step status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Passed,
    Failed,
}

/// Result of a single step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub index: usize,
    pub description: String,
    pub status: RunStatus,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// One execution of a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRun {
    pub id: String,
    pub scenario: String,
    pub status: RunStatus,
    pub step_results: Vec<StepResult>,
    pub started_at: u64,
    pub completed_at: Option<u64>,
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
}

impl ScenarioRun {
    pub fn new(scenario: impl Into<String>, total_steps: usize) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            scenario: scenario.into(),
            status: RunStatus::Pending,
            step_results: Vec::with_capacity(total_steps),
            started_at: now_ms(),
            completed_at: None,
            error: None,
            screenshot: None,
        }
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(now_ms());
    }

    pub fn pass(&mut self) {
        self.status = RunStatus::Passed;
        self.completed_at = Some(now_ms());
    }

    pub fn duration_ms(&self) -> u64 {
        self.completed_at
            .unwrap_or_else(now_ms)
            .saturating_sub(self.started_at)
    }

    /// The step that ended the run, if it failed on one.
    pub fn failed_step(&self) -> Option<&StepResult> {
        self.step_results
            .iter()
            .find(|r| r.status == RunStatus::Failed)
    }
}

/// Outcome of a batch of scenarios, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub runs: Vec<ScenarioRun>,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

impl RunSummary {
    pub fn from_runs(runs: Vec<ScenarioRun>, duration_ms: u64) -> Self {
        let passed = runs.iter().filter(|r| r.status == RunStatus::Passed).count();
        let failed = runs.len() - passed;
        Self {
            runs,
            passed,
            failed,
            duration_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
