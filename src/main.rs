// Command-line front end: builds the run configuration, plans the jobs, hands
// them to the scheduler and renders its events.

mod cli;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use image_upscaler_lib::core::{
    ProgressSink, RunContext, RunEvent, discover_models, model_scale_factor, plan_jobs,
};
use image_upscaler_lib::processing::ProcessRunner;
use image_upscaler_lib::utils::validate_config;
use image_upscaler_lib::worker::Scheduler;

#[cfg(windows)]
const EXECUTABLE_NAME: &str = "realesrgan-ncnn-vulkan.exe";
#[cfg(not(windows))]
const EXECUTABLE_NAME: &str = "realesrgan-ncnn-vulkan";

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // stdout carries the progress lines
        .compact()
        .init();
}

/// The upscaler is expected next to this binary unless given explicitly.
fn resolve_executable(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    let current = std::env::current_exe().context("Cannot locate the running binary")?;
    let dir = current
        .parent()
        .context("Running binary has no parent directory")?;
    Ok(dir.join(EXECUTABLE_NAME))
}

fn list_models(models_dir: &Path) -> Result<()> {
    let models = discover_models(models_dir)
        .with_context(|| format!("Cannot read models from {}", models_dir.display()))?;
    if models.is_empty() {
        warn!("No models found in {}", models_dir.display());
    }
    for model in models {
        println!("{model}\tx{}", model_scale_factor(&model));
    }
    Ok(())
}

async fn run(args: cli::Args) -> Result<ExitCode> {
    let executable = resolve_executable(args.executable.clone())?;

    if args.list_models {
        let models_dir = match &args.models_dir {
            Some(dir) => dir.clone(),
            None => executable
                .parent()
                .map(|dir| dir.join("models"))
                .unwrap_or_else(|| PathBuf::from("models")),
        };
        list_models(&models_dir)?;
        return Ok(ExitCode::SUCCESS);
    }

    let input = args
        .input
        .clone()
        .context("An input file or directory is required")?;

    if !executable.is_file() {
        bail!(
            "Upscaler not found at {}. Place {} next to this binary or pass --executable",
            executable.display(),
            EXECUTABLE_NAME
        );
    }

    let config = args.config();
    validate_config(&config)?;
    debug!("Run configuration: {:?}", config);

    let queue = plan_jobs(&input, args.output.as_deref(), Arc::new(config))?;

    let mut runner = ProcessRunner::new(&executable)
        .with_timeout(args.timeout_secs.map(Duration::from_secs));
    if let Some(dir) = &args.working_dir {
        runner = runner.with_working_dir(dir);
    }
    let ctx = RunContext::new(runner);
    let cancel = ctx.cancel_token().clone();

    let (sink, mut events) = ProgressSink::channel();
    let handle = Scheduler::new(ctx).spawn(queue, sink);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling run");
            cancel.cancel();
        }
    });

    while let Some(event) = events.recv().await {
        if args.json {
            println!("{}", serde_json::to_string(&event)?);
        } else if let RunEvent::Line { text } = &event {
            println!("{text}");
        }
        if event == RunEvent::Completed {
            break;
        }
    }

    let summary = handle.await.context("Scheduler worker panicked")?;
    info!(
        "{} tasks done, {} failed{}",
        summary.done,
        summary.failed,
        if summary.cancelled { ", run cancelled" } else { "" }
    );

    if summary.failed > 0 || summary.cancelled {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::Args::parse();
    init_tracing(args.verbose);

    info!("=== Image Upscaler Starting ===");

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
