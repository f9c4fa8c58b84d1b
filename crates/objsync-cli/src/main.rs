//! objsync CLI - concurrent bucket-to-bucket object transfers.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use objsync::{DestStore, Engine, FsStore, SourceStore, SyncConfig, SyncError};
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "objsync")]
#[command(about = "Concurrent bucket-to-bucket object transfers")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "objsync.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a transfer run
    Run {
        /// Override number of concurrent workers
        #[arg(long)]
        workers: Option<usize>,

        /// Override the key prefix filter
        #[arg(long)]
        prefix: Option<String>,

        /// Delete source objects after a confirmed upload (move)
        #[arg(long)]
        delete_source: bool,

        /// List what would be transferred without moving any bytes
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate the configuration file and print the effective options
    Validate,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), SyncError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let mut config = SyncConfig::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Run {
            workers,
            prefix,
            delete_source,
            dry_run,
        } => {
            // Apply overrides
            if let Some(w) = workers {
                config.transfer.max_workers = Some(w);
            }
            if let Some(p) = prefix {
                config.transfer.prefix = p;
            }
            if delete_source {
                config.transfer.delete_source = true;
            }
            config.validate()?;

            let (source, dest) = build_stores(&config);
            let engine = Engine::new(source, dest, config)?;

            if dry_run {
                let plan = engine.plan().await?;
                let total_bytes: u64 = plan.iter().map(|d| d.size).sum();
                if cli.output_json {
                    println!("{}", serde_json::to_string_pretty(&plan)?);
                } else {
                    println!("Dry run: {} objects, {} bytes", plan.len(), total_bytes);
                    for descriptor in &plan {
                        println!("  {} ({} bytes)", descriptor.key, descriptor.size);
                    }
                }
                return Ok(());
            }

            let cancel_token = setup_signal_handler();
            let summary = engine.run(cancel_token).await?;

            if cli.output_json {
                println!("{}", summary.to_json()?);
            } else {
                println!("\nTransfer completed!");
                println!("  Run ID: {}", summary.run_id);
                println!("  Duration: {:.2}s", summary.duration_seconds);
                println!(
                    "  Objects: {} transferred, {} skipped, {} failed",
                    summary.transferred, summary.skipped, summary.failed
                );
                println!("  Bytes: {}", summary.bytes_transferred);
                if summary.not_attempted > 0 {
                    println!("  Not attempted (cancelled): {}", summary.not_attempted);
                }
                for failed in &summary.failed_keys {
                    println!("  Failed: {} ({})", failed.key, failed.error);
                }
            }
        }

        Commands::Validate => {
            println!("Configuration is valid:");
            println!(
                "  Source: {} ({}: {:?})",
                config.source.bucket, config.source.backend, config.source.root
            );
            println!(
                "  Destination: {} ({}: {:?})",
                config.destination.bucket, config.destination.backend, config.destination.root
            );
            println!("  Prefix: {:?}", config.transfer.prefix);
            println!("  Max workers: {}", config.transfer.get_max_workers());
            println!("  Verify checksums: {}", config.transfer.verify_checksums);
            println!("  Skip existing: {}", config.transfer.skip_existing);
            println!("  Delete source: {}", config.transfer.delete_source);
        }
    }

    Ok(())
}

/// Build the store pair from config. Only the "fs" backend is wired up
/// here; validation has already rejected anything else.
fn build_stores(config: &SyncConfig) -> (Arc<dyn SourceStore>, Arc<dyn DestStore>) {
    let source = Arc::new(FsStore::new(&config.source.root));
    let dest = Arc::new(FsStore::new(&config.destination.root));
    (source, dest)
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Setup signal handlers for graceful shutdown: on SIGINT/SIGTERM the
/// engine stops dispatching and lets in-flight objects finish.
#[cfg(unix)]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();

    let token_int = cancel_token.clone();
    tokio::spawn(async move {
        let mut sigint = signal(SignalKind::interrupt()).expect("Failed to setup SIGINT handler");
        sigint.recv().await;
        eprintln!("\nReceived SIGINT. Finishing in-flight objects...");
        token_int.cancel();
    });

    let token_term = cancel_token.clone();
    tokio::spawn(async move {
        let mut sigterm = signal(SignalKind::terminate()).expect("Failed to setup SIGTERM handler");
        sigterm.recv().await;
        eprintln!("\nReceived SIGTERM. Finishing in-flight objects...");
        token_term.cancel();
    });

    cancel_token
}

#[cfg(not(unix))]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to setup Ctrl-C handler");
        eprintln!("\nReceived Ctrl-C. Finishing in-flight objects...");
        token.cancel();
    });

    cancel_token
}
