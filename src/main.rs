use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::io::Write;

mod cli;

use cli::Cli;
use cli::commands::Commands;
use debug_mode::{Config, InitRequest, Orchestrator, TeardownReport};

fn setup_logging(cli: &Cli, config: &Config) -> Result<()> {
    let mut builder = if std::env::var_os("RUST_LOG").is_some() {
        env_logger::Builder::from_default_env()
    } else {
        let level = if cli.is_verbose() {
            "debug"
        } else {
            config.log_level.as_deref().unwrap_or("info")
        };
        let mut builder = env_logger::Builder::new();
        builder.parse_filters(level);
        builder
    };

    // stdout carries only command results
    match &config.log_file {
        Some(log_file) => {
            if let Some(parent) = log_file.parent() {
                fs::create_dir_all(parent).context("Failed to create log directory")?;
            }
            let target = Box::new(
                fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(log_file)
                    .context("Failed to open log file")?,
            );
            builder.target(env_logger::Target::Pipe(target));
        }
        None => {
            builder.target(env_logger::Target::Stderr);
        }
    }

    builder.init();
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{}", text);
    Ok(())
}

fn warn_leftovers(report: &TeardownReport) {
    for failure in &report.errors {
        eprintln!("{} {}", "Error:".red(), failure);
    }
    if report.debug_marker_lines.is_empty() {
        return;
    }
    eprintln!(
        "{} {} line(s) still contain debug instrumentation, remove them manually:",
        "Warning:".yellow(),
        report.debug_marker_lines.len()
    );
    for line in &report.debug_marker_lines {
        eprintln!("  {}", line.to_string().yellow());
    }
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    let orchestrator = Orchestrator::from_config(config).context("Failed to set up orchestrator")?;

    match &cli.command {
        Commands::Init {
            project_root,
            bug,
            repro,
            hypotheses,
        } => {
            let request = InitRequest {
                bug_description: bug.clone(),
                reproduction_command: repro.clone(),
                hypotheses: hypotheses.clone(),
            };
            let report = orchestrator
                .initialize(project_root, &request)
                .await
                .context("Failed to initialize debug session")?;
            print_json(&report)
        }
        Commands::Run {
            track,
            iteration,
            prompt,
        } => {
            let receipt = orchestrator
                .run_iteration(track, *iteration, prompt)
                .await
                .with_context(|| format!("Failed to launch {} iteration {}", track, iteration))?;
            print_json(&receipt)
        }
        Commands::Poll { track } => {
            let status = orchestrator
                .check_status(track)
                .await
                .with_context(|| format!("Failed to poll {}", track))?;
            print_json(&json!({ "track": track, "status": status }))
        }
        Commands::Kill { track } => {
            let killed = orchestrator
                .kill(track)
                .await
                .with_context(|| format!("Failed to kill {}", track))?;
            print_json(&json!({ "track": track, "killed": killed }))
        }
        Commands::Status { track } => {
            let status = orchestrator
                .read_signal(track)
                .await
                .with_context(|| format!("Failed to read signal for {}", track))?;
            print_json(&status)
        }
        Commands::Diff { track } => {
            let patch = orchestrator
                .diff(track)
                .await
                .with_context(|| format!("Failed to diff {}", track))?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(patch.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
        Commands::Apply { track, project_root } => {
            orchestrator
                .apply(track, project_root)
                .await
                .with_context(|| format!("Failed to apply {} to {}", track, project_root.display()))?;
            eprintln!("{} {} changes applied", "Success:".green(), track);
            Ok(())
        }
        Commands::Cleanup { project_root } => {
            let report = orchestrator.teardown(project_root).await;
            warn_leftovers(&report);
            print_json(&report)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(&cli, &config).context("Failed to setup logging")?;
    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
