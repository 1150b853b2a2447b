mod args;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use ozconv_core::{
    load_config, validate_config, Config, JobEvent, JobOrchestrator, JobOutcome, JobReport,
    ProcessInvoker, ToolRunner,
};

use args::Cli;

/// Buffer size for the job event channel
const EVENT_BUFFER_SIZE: usize = 1000;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether every job succeeded.
async fn run() -> Result<bool> {
    let cli = Cli::parse();

    let fmt_layer = if cli.log_json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(fmt_layer)
        .init();

    let config = match cli.config {
        Some(ref path) => {
            info!("Loading configuration from {:?}", path);
            load_config(path)
                .with_context(|| format!("Failed to load config from {:?}", path))?
        }
        None => Config::default(),
    };
    validate_config(&config).context("Configuration validation failed")?;

    if cli.check_tools {
        return Ok(print_tool_status(&config, cli.json));
    }

    let Some(ref command) = cli.command else {
        anyhow::bail!("A subcommand is required (see --help)");
    };
    let jobs = command.jobs();
    info!("Queued {} job(s): {}", jobs.len(), command.conversion().0);

    let runner: Arc<dyn ToolRunner> = Arc::new(ProcessInvoker::new(config.invoker.clone()));
    let orchestrator = JobOrchestrator::new(&config, runner);

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            shutdown.cancel();
        }
    });

    let (events_tx, mut events_rx) = mpsc::channel(EVENT_BUFFER_SIZE);
    let json = cli.json;
    let printer = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            print_event(&event, json);
        }
    });

    let reports = orchestrator
        .run_batch(&jobs, Some(events_tx), cancel)
        .await;
    // All senders are gone once the batch returns.
    if let Err(e) = printer.await {
        warn!("Event printer stopped: {}", e);
    }

    for report in &reports {
        print_report(report, cli.json);
    }

    let failed = reports.iter().filter(|r| !r.is_success()).count();
    info!(
        "{} of {} job(s) succeeded",
        reports.len() - failed,
        reports.len()
    );
    Ok(failed == 0)
}

fn print_tool_status(config: &Config, json: bool) -> bool {
    let statuses = config.tools.check_all();
    if json {
        for status in &statuses {
            match serde_json::to_string(status) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("Failed to encode tool status: {}", e),
            }
        }
    } else {
        for status in &statuses {
            match status.resolved {
                Some(ref path) => println!("{:<12} {}", status.tool.key(), path.display()),
                None => println!(
                    "{:<12} not found ({})",
                    status.tool.key(),
                    status.configured.display()
                ),
            }
        }
    }
    statuses.iter().all(|s| s.resolved.is_some())
}

fn print_event(event: &JobEvent, json: bool) {
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("Failed to encode event: {}", e),
        }
        return;
    }
    match event {
        JobEvent::StateChanged { job_id, state } => info!("[{}] {}", short_id(job_id), state),
        JobEvent::Log { line, .. } => println!("  {}", line),
        JobEvent::Warning { job_id, message } => warn!("[{}] {}", short_id(job_id), message),
        // Terminal events are summarised from the reports.
        JobEvent::Completed { .. } | JobEvent::Failed { .. } => {}
    }
}

fn print_report(report: &JobReport, json: bool) {
    if json {
        match serde_json::to_string(report) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("Failed to encode report: {}", e),
        }
        return;
    }
    match report.outcome {
        JobOutcome::Success {
            ref artifacts,
            report: ref text,
        } => {
            println!("OK     {} ({} ms)", report.input.display(), report.duration_ms);
            for path in artifacts {
                println!("  -> {}", path.display());
            }
            if let Some(text) = text {
                println!("{}", text.trim_end());
            }
        }
        JobOutcome::Failure {
            ref classification,
            ref diagnostic,
            failed_state,
        } => {
            println!(
                "FAILED {} [{} during {}]",
                report.input.display(),
                classification,
                failed_state
            );
            for line in diagnostic.lines() {
                println!("  {}", line);
            }
        }
    }
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }
    for notice in &report.notices {
        println!("  note: {}", notice);
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
