//! camfleet CLI: control every configured camera at once.
//!
//! Reads the camera list from CAMFLEET_DEVICES_FILE (or --devices) and the
//! archive and notification settings from the environment (.env is loaded).

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use camfleet_cli::{
    format_size_mb, media_line, outcome_line, report_footer, report_json, status_json,
    transfer_line,
};
use camfleet_core::Config;
use camfleet_infra::{init_telemetry, LogFormat};
use camfleet_services::{
    build_alert_sink, create_storage, load_devices, ArchiveUploader, FleetCoordinator,
    FleetError, FleetReport, TransferPipeline,
};
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "camfleet", about = "Multi-camera fleet control")]
struct Cli {
    /// Camera list (overrides CAMFLEET_DEVICES_FILE)
    #[arg(long, global = true)]
    devices: Option<PathBuf>,
    /// Local download root (overrides CAMFLEET_DOWNLOAD_DIR)
    #[arg(long, global = true)]
    download_dir: Option<PathBuf>,
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    /// Log line format: text or json
    #[arg(long, global = true, default_value = "text")]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start capture on every camera
    Start,
    /// Stop capture on every camera
    Stop,
    /// Show state and settings of every camera
    Status,
    /// List media stored on every camera
    List,
    /// Download all media into the local download directory
    Download,
    /// Delete ALL media on every camera
    Delete {
        /// Required; without it nothing is deleted
        #[arg(long)]
        confirm: bool,
    },
    /// Archive already downloaded media
    Upload,
    /// Remove the local download directory of every camera
    CleanupLocal,
    /// Download, archive and optionally clean up, per camera
    Transfer {
        /// Remove local copies once archived (overrides CAMFLEET_CLEANUP_AFTER_UPLOAD)
        #[arg(long)]
        cleanup: bool,
    },
    /// Keep cameras awake
    KeepAlive {
        /// Repeat every N seconds until interrupted
        #[arg(long)]
        every: Option<u64>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// Print a fan-out report and map it to the process exit code.
fn finish<T>(
    report: &FleetReport<T>,
    json: bool,
    detail: impl Fn(&T) -> String,
    value: impl Fn(&T) -> serde_json::Value,
) -> anyhow::Result<ExitCode> {
    if json {
        print_json(&report_json(report, value))?;
    } else {
        for outcome in &report.outcomes {
            println!("{}", outcome_line(outcome, &detail));
        }
        println!("{}", report_footer(report));
    }
    Ok(exit_code(report.succeeded()))
}

fn exit_code(succeeded: bool) -> ExitCode {
    if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn archive_pipeline(config: &Config, cleanup: bool) -> anyhow::Result<TransferPipeline> {
    config
        .archive
        .validate()
        .context("Remote archive is not configured")?;
    let storage = create_storage(&config.archive)
        .await
        .context("Failed to initialize remote archive")?;
    let archive = ArchiveUploader::new(storage, config.archive.prefix.clone());
    Ok(TransferPipeline::new(
        archive,
        &config.download_dir,
        cleanup,
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry("warn,camfleet=info", cli.log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let mut config = Config::from_env().context("Invalid configuration")?;
    if let Some(devices) = cli.devices {
        config.devices_file = devices;
    }
    if let Some(download_dir) = cli.download_dir {
        config.download_dir = download_dir;
    }

    let endpoints = load_devices(&config.devices_file).with_context(|| {
        format!(
            "Failed to load camera list from {}",
            config.devices_file.display()
        )
    })?;
    let alerts = build_alert_sink(&config.notifications).context("Invalid notification settings")?;
    let fleet = FleetCoordinator::from_endpoints(endpoints, alerts)
        .context("Failed to create camera clients")?;
    let json = cli.json;

    match cli.command {
        Commands::Start => {
            let report = fleet.start_capture().await;
            finish(&report, json, |_| "capture started".to_string(), |_| serde_json::Value::Null)
        }
        Commands::Stop => {
            let report = fleet.stop_capture().await;
            finish(&report, json, |_| "capture stopped".to_string(), |_| serde_json::Value::Null)
        }
        Commands::Status => {
            let report = fleet
                .run("status", |device| async move {
                    Ok::<_, FleetError>(status_json(device.get_status().await?))
                })
                .await;
            if json {
                print_json(&report_json(&report, |v| v.clone()))?;
                return Ok(exit_code(report.succeeded()));
            }
            for outcome in &report.outcomes {
                match outcome.value() {
                    Some(value) => {
                        println!("✓ {}", outcome.device_id);
                        println!("{}", serde_json::to_string_pretty(value).context("Serialize status")?);
                    }
                    None => println!("{}", outcome_line(outcome, |_| String::new())),
                }
            }
            println!("{}", report_footer(&report));
            Ok(exit_code(report.succeeded()))
        }
        Commands::List => {
            let report = fleet.list_media().await;
            if json {
                print_json(&report_json(&report, |files| serde_json::json!(files)))?;
                return Ok(exit_code(report.succeeded()));
            }
            for outcome in &report.outcomes {
                println!(
                    "{}",
                    outcome_line(outcome, |files: &Vec<_>| format!("{} files", files.len()))
                );
                for file in outcome.value().into_iter().flatten() {
                    println!("{}", media_line(file));
                }
            }
            println!("{}", report_footer(&report));
            Ok(exit_code(report.succeeded()))
        }
        Commands::Download => {
            let pipeline = TransferPipeline::without_archive(&config.download_dir);
            let report = pipeline.download_all(&fleet).await;
            finish(
                &report,
                json,
                |batch| {
                    let bytes: u64 = batch.files.iter().map(|f| f.bytes_written).sum();
                    format!("{} files, {}", batch.files.len(), format_size_mb(bytes))
                },
                |batch| {
                    serde_json::json!({
                        "files": batch.files.iter().map(|f| f.path.display().to_string()).collect::<Vec<_>>(),
                        "size_mismatches": batch.size_mismatches,
                    })
                },
            )
        }
        Commands::Delete { confirm } => {
            if !confirm {
                eprintln!("WARNING: this deletes ALL media on every camera:");
                for device in fleet.devices() {
                    eprintln!("  {}", device.id());
                }
                eprintln!("Re-run with --confirm to proceed.");
                return Ok(ExitCode::SUCCESS);
            }
            let report = fleet.delete_all().await;
            finish(&report, json, |_| "all media deleted".to_string(), |_| serde_json::Value::Null)
        }
        Commands::Upload => {
            let pipeline = archive_pipeline(&config, false).await?;
            let report = pipeline.upload_local(&fleet).await;
            finish(
                &report,
                json,
                |objects| {
                    let bytes: u64 = objects.iter().map(|o| o.size_bytes).sum();
                    format!("{} files archived, {}", objects.len(), format_size_mb(bytes))
                },
                |objects| {
                    serde_json::json!(objects.iter().map(|o| &o.url).collect::<Vec<_>>())
                },
            )
        }
        Commands::CleanupLocal => {
            let pipeline = TransferPipeline::without_archive(&config.download_dir);
            let report = pipeline.cleanup_local(&fleet).await;
            finish(&report, json, |_| "local copies removed".to_string(), |_| serde_json::Value::Null)
        }
        Commands::Transfer { cleanup } => {
            let pipeline = archive_pipeline(&config, cleanup || config.cleanup_after_upload).await?;
            let summary = pipeline.run(&fleet).await;
            if json {
                print_json(&report_json(&summary.report, |n| serde_json::json!(n)))?;
            } else {
                for record in &summary.records {
                    println!("{}", transfer_line(record));
                }
                println!(
                    "transfer: {}/{} cameras succeeded, {} files archived",
                    summary.devices_succeeded(),
                    summary.records.len(),
                    summary.files_uploaded()
                );
            }
            Ok(exit_code(summary.succeeded()))
        }
        Commands::KeepAlive { every } => {
            let Some(secs) = every else {
                fleet.keep_alive().await;
                return Ok(ExitCode::SUCCESS);
            };
            let mut ticker = tokio::time::interval(Duration::from_secs(secs.max(1)));
            loop {
                tokio::select! {
                    _ = ticker.tick() => fleet.keep_alive().await,
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Keep-alive stopped");
                        return Ok(ExitCode::SUCCESS);
                    }
                }
            }
        }
    }
}
