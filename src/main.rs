//! uiscout - run browser scenarios against live web apps.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uiscout_lib::browser::ChromeFactory;
use uiscout_lib::config::{self, AppConfig};
use uiscout_lib::scenario::{Catalog, RunStatus, RunSummary, ScenarioExecutor, ScenarioRunner};

#[derive(Parser)]
#[command(name = "uiscout", about = "Browser scenario runner with resilient element lookup")]
#[command(version, long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/uiscout/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run scenarios (all when no names are given)
    Run {
        names: Vec<String>,

        /// Only scenarios with this tag
        #[arg(long)]
        tag: Option<String>,

        /// Scenarios running at once
        #[arg(long)]
        workers: Option<usize>,

        /// Show the browser window
        #[arg(long)]
        headed: bool,

        /// Print the run summary as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// List available scenarios
    List {
        #[arg(long)]
        tag: Option<String>,
    },

    /// Write a default config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    uiscout_lib::logging::init(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(config::get_config_path);

    let result = match cli.command {
        Command::Run {
            names,
            tag,
            workers,
            headed,
            json,
        } => run(&config_path, names, tag, workers, headed, json).await,
        Command::List { tag } => list(&config_path, tag.as_deref()),
        Command::InitConfig { force } => init_config(&config_path, force),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(2);
        }
    }
}

fn load(path: &Path) -> anyhow::Result<(AppConfig, Catalog)> {
    let config = config::load_config(path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    config::validate_config(&config).context("invalid config")?;

    let mut catalog = Catalog::builtin();
    if let Some(dir) = &config.runner.scenario_dir {
        let loaded = catalog
            .load_dir(dir)
            .with_context(|| format!("failed to read scenarios from {}", dir.display()))?;
        tracing::info!("Loaded {} scenario file(s) from {:?}", loaded, dir);
    }
    Ok((config, catalog))
}

async fn run(
    config_path: &Path,
    names: Vec<String>,
    tag: Option<String>,
    workers: Option<usize>,
    headed: bool,
    json: bool,
) -> anyhow::Result<bool> {
    let (mut config, catalog) = load(config_path)?;
    if headed {
        config.browser.headless = false;
    }
    if let Some(workers) = workers {
        config.runner.workers = workers;
    }

    let scenarios = catalog.select(&names, tag.as_deref())?;
    if scenarios.is_empty() {
        bail!("no scenarios selected");
    }

    let factory = ChromeFactory::new(config.browser.clone(), config.timeouts)?;
    let runner = ScenarioRunner::new(
        Arc::new(factory),
        ScenarioExecutor::new(&config),
        config.runner.workers,
    )
    .with_screenshot_dir(config.runner.screenshot_dir.clone());

    let summary = runner.run(scenarios).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(summary.is_success())
}

fn print_summary(summary: &RunSummary) {
    for run in &summary.runs {
        let status = match run.status {
            RunStatus::Passed => "PASS",
            _ => "FAIL",
        };
        println!("{} {} ({}ms)", status, run.scenario, run.duration_ms());
        if let Some(error) = &run.error {
            println!("     {}", error);
        }
        if let Some(path) = &run.screenshot {
            println!("     screenshot: {}", path.display());
        }
    }
    println!(
        "\n{} passed, {} failed in {}ms",
        summary.passed, summary.failed, summary.duration_ms
    );
}

fn list(config_path: &Path, tag: Option<&str>) -> anyhow::Result<bool> {
    let (_, catalog) = load(config_path)?;
    for scenario in catalog.list(tag) {
        println!(
            "{:<36} [{}] {}",
            scenario.name,
            scenario.tags.join(","),
            scenario.description
        );
    }
    Ok(true)
}

fn init_config(config_path: &Path, force: bool) -> anyhow::Result<bool> {
    config::init_config(config_path, force)?;
    println!("Wrote default config to {}", config_path.display());
    Ok(true)
}
