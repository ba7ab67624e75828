//! Scenario executor: runs steps in order against one page and records results.

use crate::browser::script::CLEAR_STORAGE;
use crate::browser::Page;
use crate::config::AppConfig;
use crate::error::{Result, UiScoutError};
use crate::locator::{resolve, Locator, WaitSettings};
use crate::scenario::expect::{poll_until, Check};
use crate::scenario::schema::{
    now_ms, CountExpectation, RunStatus, Scenario, ScenarioRun, Step, StepResult,
};
use crate::scenario::session::{interpolate_str, Session};
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::Instrument;

/// Executes scenarios step by step. The first failing step ends the scenario.
pub struct ScenarioExecutor {
    wait: WaitSettings,
    navigation_timeout: Duration,
    /// Built-in variables available to every scenario
    variables: HashMap<String, String>,
}

impl ScenarioExecutor {
    pub fn new(config: &AppConfig) -> Self {
        let (email, password) = config.credentials.effective();
        Self::with_settings(
            config.wait_settings(),
            Duration::from_millis(config.timeouts.navigation_ms),
        )
        .with_variable("portal_email", email)
        .with_variable("portal_password", password)
        .with_variable("storefront_url", config.sites.storefront_url.trim_end_matches('/'))
        .with_variable("portal_url", config.sites.portal_url.trim_end_matches('/'))
    }

    pub fn with_settings(wait: WaitSettings, navigation_timeout: Duration) -> Self {
        Self {
            wait,
            navigation_timeout,
            variables: HashMap::new(),
        }
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Built-ins, a fresh `run_id` unless one was pinned, then the scenario's
    /// own variables.
    fn variables_for(&self, scenario: &Scenario) -> HashMap<String, String> {
        let mut vars = self.variables.clone();
        vars.entry("run_id".to_string()).or_insert_with(|| {
            format!(
                "{}{}",
                now_ms(),
                &uuid::Uuid::new_v4().simple().to_string()[..4]
            )
        });
        let resolved: Vec<(String, String)> = scenario
            .variables
            .iter()
            .map(|(k, v)| (k.clone(), interpolate_str(v, &vars)))
            .collect();
        vars.extend(resolved);
        vars
    }

    /// Execute a scenario to completion or first failure.
    pub async fn execute(&self, scenario: &Scenario, page: &dyn Page) -> ScenarioRun {
        let span = tracing::info_span!("scenario", name = %scenario.name);
        self.execute_inner(scenario, page).instrument(span).await
    }

    async fn execute_inner(&self, scenario: &Scenario, page: &dyn Page) -> ScenarioRun {
        let mut run = ScenarioRun::new(scenario.name.clone(), scenario.steps.len());

        if let Err(e) = scenario.validate() {
            run.fail(e.to_string());
            return run;
        }

        run.status = RunStatus::Running;
        let mut session = Session::new(page, self.variables_for(scenario), self.wait);
        tracing::info!("Starting scenario ({} steps)", scenario.steps.len());

        for (index, step) in scenario.steps.iter().enumerate() {
            let step = session.interpolate(step);
            let description = step.describe();
            tracing::debug!("Step {}: {}", index + 1, description);

            let started = Instant::now();
            let outcome = self.run_step(&mut session, &step).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            match outcome {
                Ok(()) => run.step_results.push(StepResult {
                    index,
                    description,
                    status: RunStatus::Passed,
                    duration_ms,
                    error: None,
                }),
                Err(e) => {
                    if e.is_scenario_failure() {
                        tracing::warn!("Step {} failed: {}: {}", index + 1, description, e);
                    } else {
                        tracing::error!("Step {} aborted: {}: {}", index + 1, description, e);
                    }
                    run.fail(format!("step {} ({}): {}", index + 1, description, e));
                    run.step_results.push(StepResult {
                        index,
                        description,
                        status: RunStatus::Failed,
                        duration_ms,
                        error: Some(e.to_string()),
                    });
                    return run;
                }
            }
        }

        run.pass();
        tracing::info!("Scenario passed in {}ms", run.duration_ms());
        run
    }

    fn timeout(&self, timeout_ms: Option<u64>, wait: &WaitSettings) -> Duration {
        timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(wait.default_timeout)
    }

    fn run_step<'a, 'p: 'a>(
        &'a self,
        session: &'a mut Session<'p>,
        step: &'a Step,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            let page = session.page();
            let wait = session.wait;
            let poll = wait.poll_interval;

            match step {
                Step::Goto { url } => {
                    let nav = page.goto(url).await?;
                    session.last_url = Some(nav.url);
                    session.last_status = nav.status;
                    Ok(())
                }

                Step::Click { target } => {
                    let resolved = resolve(page, target, &wait).await?;
                    page.click(&resolved.locator).await
                }

                Step::ClickAndWaitForLoad { target, timeout_ms } => {
                    let resolved = resolve(page, target, &wait).await?;
                    let loads_before = page.load_count();
                    page.click(&resolved.locator).await?;

                    let timeout = timeout_ms
                        .map(Duration::from_millis)
                        .unwrap_or(self.navigation_timeout);
                    poll_until(timeout, poll, move || async move {
                        Ok(if page.load_count() > loads_before {
                            Check::Done(())
                        } else {
                            Check::Pending("no load event".to_string())
                        })
                    })
                    .await?
                    .map_err(|_| UiScoutError::Timeout {
                        what: format!("page load after clicking {}", target.name),
                        timeout_ms: timeout.as_millis() as u64,
                    })
                }

                Step::Fill { target, value } => {
                    let resolved = resolve(page, target, &wait).await?;
                    page.fill(&resolved.locator, value).await
                }

                Step::ExpectVisible { target } => resolve(page, target, &wait).await.map(|_| ()),

                Step::ExpectHidden { target, timeout_ms } => {
                    let locators: Vec<Locator> =
                        target.strategies.iter().map(|s| s.locator.clone()).collect();
                    let locators = &locators;
                    poll_until(self.timeout(*timeout_ms, &wait), poll, move || async move {
                        for locator in locators {
                            if page.inspect(locator).await?.visible {
                                return Ok(Check::Pending(format!("visible via {}", locator)));
                            }
                        }
                        Ok(Check::Done(()))
                    })
                    .await?
                    .map_err(|actual| UiScoutError::AssertionFailed {
                        what: target.name.clone(),
                        expected: "hidden".to_string(),
                        actual,
                    })
                }

                Step::ExpectEnabled { target, timeout_ms } => {
                    let resolved = resolve(page, target, &wait).await?;
                    let locator = &resolved.locator;
                    poll_until(self.timeout(*timeout_ms, &wait), poll, move || async move {
                        Ok(if page.inspect(locator).await?.enabled {
                            Check::Done(())
                        } else {
                            Check::Pending("disabled".to_string())
                        })
                    })
                    .await?
                    .map_err(|actual| UiScoutError::AssertionFailed {
                        what: target.name.clone(),
                        expected: "enabled".to_string(),
                        actual,
                    })
                }

                Step::ExpectText {
                    target,
                    contains,
                    timeout_ms,
                } => {
                    let resolved = resolve(page, target, &wait).await?;
                    let locator = &resolved.locator;
                    let needle = contains.as_str();
                    poll_until(self.timeout(*timeout_ms, &wait), poll, move || async move {
                        let text = page.inspect(locator).await?.text.unwrap_or_default();
                        Ok(if text.contains(needle) {
                            Check::Done(())
                        } else {
                            Check::Pending(format!("'{}'", text))
                        })
                    })
                    .await?
                    .map_err(|actual| UiScoutError::AssertionFailed {
                        what: target.name.clone(),
                        expected: format!("text containing '{}'", contains),
                        actual,
                    })
                }

                Step::ExpectUrl {
                    pattern,
                    matches,
                    timeout_ms,
                } => {
                    let re = regex::Regex::new(pattern).map_err(|e| {
                        UiScoutError::Validation(format!("Invalid url pattern: {}", e))
                    })?;
                    let re = &re;
                    let want = *matches;
                    poll_until(self.timeout(*timeout_ms, &wait), poll, move || async move {
                        let url = page.current_url().await?;
                        Ok(if re.is_match(&url) == want {
                            Check::Done(())
                        } else {
                            Check::Pending(url)
                        })
                    })
                    .await?
                    .map_err(|actual| UiScoutError::AssertionFailed {
                        what: "page url".to_string(),
                        expected: if want {
                            format!("url matching /{}/", pattern)
                        } else {
                            format!("url not matching /{}/", pattern)
                        },
                        actual,
                    })
                }

                Step::ExpectUrlUnchanged => {
                    let expected = session.last_url.clone().ok_or_else(|| {
                        UiScoutError::Validation(
                            "expect_url_unchanged needs an earlier goto".to_string(),
                        )
                    })?;
                    let actual = page.current_url().await?;
                    if actual == expected {
                        Ok(())
                    } else {
                        Err(UiScoutError::AssertionFailed {
                            what: "page url".to_string(),
                            expected,
                            actual,
                        })
                    }
                }

                Step::ExpectStatus { status } => match session.last_status {
                    Some(actual) if actual == *status => Ok(()),
                    actual => Err(UiScoutError::AssertionFailed {
                        what: "document status".to_string(),
                        expected: status.to_string(),
                        actual: actual.map_or("no status".to_string(), |s| s.to_string()),
                    }),
                },

                Step::RememberCount { locator, key } => {
                    let count = page.inspect(locator).await?.count;
                    tracing::debug!("Remembered {} = {}", key, count);
                    session.remember_count(key, count);
                    Ok(())
                }

                Step::ExpectCount {
                    locator,
                    count,
                    timeout_ms,
                } => {
                    let expected = match count {
                        CountExpectation::Exactly(n) => *n,
                        CountExpectation::Relative { key, delta } => {
                            let base = session.count(key).ok_or_else(|| {
                                UiScoutError::Validation(format!("No remembered count '{}'", key))
                            })?;
                            usize::try_from(base as i64 + delta).map_err(|_| {
                                UiScoutError::Validation(format!(
                                    "Count '{}' ({}) shifted by {} is negative",
                                    key, base, delta
                                ))
                            })?
                        }
                    };
                    poll_until(self.timeout(*timeout_ms, &wait), poll, move || async move {
                        let actual = page.inspect(locator).await?.count;
                        Ok(if actual == expected {
                            Check::Done(())
                        } else {
                            Check::Pending(actual.to_string())
                        })
                    })
                    .await?
                    .map_err(|actual| UiScoutError::AssertionFailed {
                        what: format!("count of {}", locator),
                        expected: expected.to_string(),
                        actual,
                    })
                }

                Step::WaitForDialog {
                    contains,
                    timeout_ms,
                } => {
                    let timeout = self.timeout(*timeout_ms, &wait);
                    let needle = contains.as_deref();
                    let shared: &Session = session;
                    let found = poll_until(timeout, poll, move || async move {
                        let pending = shared.pending_dialogs();
                        let hit = pending
                            .iter()
                            .find(|(_, d)| needle.map_or(true, |n| d.message.contains(n)));
                        Ok(match hit {
                            Some((index, dialog)) => Check::Done((*index, dialog.message.clone())),
                            None => Check::Pending(
                                pending
                                    .iter()
                                    .map(|(_, d)| format!("'{}'", d.message))
                                    .collect::<Vec<_>>()
                                    .join(", "),
                            ),
                        })
                    })
                    .await?;

                    match found {
                        Ok((index, message)) => {
                            tracing::debug!("Dialog observed: {}", message);
                            session.consume_dialog(index);
                            Ok(())
                        }
                        Err(seen) if seen.is_empty() => Err(UiScoutError::Timeout {
                            what: "dialog".to_string(),
                            timeout_ms: timeout.as_millis() as u64,
                        }),
                        Err(seen) => Err(UiScoutError::AssertionFailed {
                            what: "dialog".to_string(),
                            expected: format!("message containing '{}'", needle.unwrap_or("")),
                            actual: seen,
                        }),
                    }
                }

                Step::ClearStorage => page.evaluate(CLEAR_STORAGE).await.map(|_| ()),

                Step::Pause { duration_ms } => {
                    tracing::warn!("Fixed pause of {}ms", duration_ms);
                    tokio::time::sleep(Duration::from_millis(*duration_ms)).await;
                    Ok(())
                }

                Step::AnyOf { steps } => {
                    let mut failures = Vec::with_capacity(steps.len());
                    for (i, alternative) in steps.iter().enumerate() {
                        match self.run_step(&mut *session, alternative).await {
                            Ok(()) => {
                                tracing::debug!(
                                    "Alternative {} passed: {}",
                                    i + 1,
                                    alternative.describe()
                                );
                                return Ok(());
                            }
                            Err(e) => {
                                tracing::debug!("Alternative {} failed: {}", i + 1, e);
                                failures.push(format!("{}: {}", alternative.describe(), e));
                            }
                        }
                    }
                    Err(UiScoutError::AssertionFailed {
                        what: "alternatives".to_string(),
                        expected: "at least one to pass".to_string(),
                        actual: failures.join("; "),
                    })
                }
            }
        }
        .boxed()
    }
}
