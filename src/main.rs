use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod capture;
mod cli;
mod config;
mod resolvers;
mod transport;
mod utils;

use universal_capturer::CaptureError;

use capture::{CaptureOrchestrator, CaptureOutcome, CaptureRequest, TaskRegistry};
use cli::{Cli, Commands};
use config::Config;
use resolvers::ResolverRegistry;
use transport::{ConsoleSink, EventSink};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "capturer=debug"
    } else if cli.quiet {
        "capturer=warn"
    } else {
        "capturer=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().await?;

    // Check for required external engines (non-fatal, tools may still appear in PATH later)
    let missing_deps =
        utils::check_dependencies(&config.engines.ffmpeg_path, &config.engines.yt_dlp_path).await;
    if !missing_deps.is_empty() {
        eprintln!("⚠️  Dependency check warnings:");
        for dep in missing_deps {
            eprintln!("   • {}", dep);
        }
        eprintln!("   (Continuing anyway - tools may be available)");
    }

    match cli.command {
        Commands::Capture {
            url,
            output,
            fallback_bitrate,
        } => {
            run_capture(&config, url, output, fallback_bitrate).await?;
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                println!("Edit the config file directly:");
                let path = dirs::config_dir()
                    .map(|dir| dir.join("universal-capturer").join("config.yaml"))
                    .unwrap_or_else(|| "config.yaml".into());
                println!("  {}", path.display());
            }
        }
        Commands::Platforms => {
            println!("Supported platforms:");
            let registry = ResolverRegistry::new(&config.engines.yt_dlp_path);
            for platform in registry.list_platforms() {
                println!("  • {}", platform);
            }
        }
    }

    Ok(())
}

async fn run_capture(
    config: &Config,
    url: String,
    output: Option<std::path::PathBuf>,
    fallback_bitrate: Option<String>,
) -> Result<()> {
    let registry = ResolverRegistry::new(&config.engines.yt_dlp_path);

    let domain = utils::extract_domain(&url).unwrap_or_else(|| "source".to_string());
    println!("Resolving audio stream from {}...", domain);

    let stream = match registry.resolve(&url).await {
        Ok(stream) => stream,
        Err(err) => {
            tracing::debug!("Resolution failed: {:#}", err);
            eprintln!("Failed to resolve the audio stream. The link might be private or unsupported.");
            std::process::exit(1);
        }
    };
    if let Some(title) = &stream.title {
        println!("Resolved: {}", title);
    }

    let staging_dir = config.capture_dir()?;
    let output_path = staging_dir.join(utils::capture_filename_from_url(&url, "m4a"));
    let destination = match output {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let mut settings = config.capture_settings();
    if let Some(bitrate) = fallback_bitrate {
        settings.fallback_bitrate = bitrate;
    }

    let sink: Arc<dyn EventSink> = Arc::new(ConsoleSink::new(destination));
    let orchestrator = CaptureOrchestrator::new(sink, settings);
    let request = CaptureRequest {
        stream_url: stream.playable_url,
        output_path,
    };

    println!("Capturing audio (this can take a while); progress updates will follow. Press Ctrl-C to stop and keep what was captured so far.");

    let tasks = TaskRegistry::new();
    let handle = tasks.spawn("console", move |cancel| async move {
        orchestrator.capture(&request, &cancel).await
    });

    let cancel = handle.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupt received; stopping the capture and salvaging partial output...");
            cancel.cancel();
        }
    });

    match handle.wait().await {
        CaptureOutcome::Success { size_bytes, .. } => {
            tracing::info!("Capture finished ({})", utils::format_file_size(size_bytes));
        }
        CaptureOutcome::Partial { size_bytes, reason, .. } => {
            tracing::warn!(
                "Capture ended early ({}): {} delivered",
                reason,
                utils::format_file_size(size_bytes)
            );
        }
        CaptureOutcome::Failure { reason } => {
            eprintln!("Capture failed: {}", reason);
            std::process::exit(1);
        }
    }

    Ok(())
}
