//! Runs a batch of scenarios, each on its own page, with bounded concurrency.

use crate::browser::{Page, PageFactory};
use crate::error::Result;
use crate::scenario::executor::ScenarioExecutor;
use crate::scenario::schema::{RunStatus, RunSummary, Scenario, ScenarioRun};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::Instant;

pub struct ScenarioRunner {
    factory: Arc<dyn PageFactory>,
    executor: Arc<ScenarioExecutor>,
    workers: usize,
    screenshot_dir: Option<PathBuf>,
}

impl ScenarioRunner {
    pub fn new(factory: Arc<dyn PageFactory>, executor: ScenarioExecutor, workers: usize) -> Self {
        Self {
            factory,
            executor: Arc::new(executor),
            workers: workers.max(1),
            screenshot_dir: None,
        }
    }

    pub fn with_screenshot_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.screenshot_dir = dir;
        self
    }

    /// Run every scenario and collect results in input order.
    pub async fn run(&self, scenarios: Vec<Scenario>) -> RunSummary {
        let started = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.workers));
        tracing::info!(
            "Running {} scenario(s) with {} worker(s)",
            scenarios.len(),
            self.workers
        );

        let handles: Vec<_> = scenarios
            .into_iter()
            .map(|scenario| {
                let semaphore = Arc::clone(&semaphore);
                let factory = Arc::clone(&self.factory);
                let executor = Arc::clone(&self.executor);
                let screenshot_dir = self.screenshot_dir.clone();
                let name = scenario.name.clone();
                let handle = tokio::spawn(async move {
                    // The semaphore is never closed
                    let _permit = semaphore.acquire_owned().await.ok();
                    run_one(
                        factory.as_ref(),
                        &executor,
                        &scenario,
                        screenshot_dir.as_deref(),
                    )
                    .await
                });
                (name, handle)
            })
            .collect();

        let mut runs = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let run = match handle.await {
                Ok(run) => run,
                Err(e) => {
                    tracing::error!("Scenario task {} aborted: {}", name, e);
                    let mut run = ScenarioRun::new(name, 0);
                    run.fail(format!("scenario task aborted: {}", e));
                    run
                }
            };
            runs.push(run);
        }

        let summary = RunSummary::from_runs(runs, started.elapsed().as_millis() as u64);
        tracing::info!(
            "Finished: {} passed, {} failed in {}ms",
            summary.passed,
            summary.failed,
            summary.duration_ms
        );
        summary
    }
}

async fn run_one(
    factory: &dyn PageFactory,
    executor: &ScenarioExecutor,
    scenario: &Scenario,
    screenshot_dir: Option<&Path>,
) -> ScenarioRun {
    let page = match factory.open(&scenario.name).await {
        Ok(page) => page,
        Err(e) => {
            tracing::error!("Failed to open browser for {}: {}", scenario.name, e);
            let mut run = ScenarioRun::new(scenario.name.clone(), 0);
            run.fail(format!("browser launch failed: {}", e));
            return run;
        }
    };

    let mut run = executor.execute(scenario, page.as_ref()).await;

    if run.status == RunStatus::Failed {
        if let Some(dir) = screenshot_dir {
            match capture(page.as_ref(), dir, &run).await {
                Ok(path) => {
                    tracing::info!("Saved failure screenshot to {:?}", path);
                    run.screenshot = Some(path);
                }
                Err(e) => tracing::warn!("Failed to capture screenshot for {}: {}", run.scenario, e),
            }
        }
    }

    if let Err(e) = page.close().await {
        tracing::warn!("Failed to close browser for {}: {}", scenario.name, e);
    }

    match run.status {
        RunStatus::Passed => tracing::info!("PASS {} ({}ms)", run.scenario, run.duration_ms()),
        _ => tracing::warn!(
            "FAIL {}: {}",
            run.scenario,
            run.error.as_deref().unwrap_or("unknown error")
        ),
    }
    run
}

async fn capture(page: &dyn Page, dir: &Path, run: &ScenarioRun) -> Result<PathBuf> {
    let png = page.screenshot().await?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}-{}.png", file_stem(&run.scenario), run.id));
    std::fs::write(&path, png)?;
    Ok(path)
}

/// Scenario names come from JSON files; keep them inside the screenshot dir.
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
