//! Brainwave Monitor: entry point.
//!
//! Reads the byte stream of a brainwave headset, decodes it frame by frame,
//! and prints one line per fresh reading on stdout.  Rejected frames are
//! logged (and, unless disabled, echoed to stderr as `Error: <message>`).
//!
//! # Usage
//!
//! ```text
//! brainwave-monitor [OPTIONS]
//!
//! Options:
//!   --config <PATH>          Config file [default: platform config dir]
//!   --device <PATH>          Read from a serial/RFCOMM device node
//!   --file <PATH>            Replay a captured stream
//!   --stdin                  Read the stream from standard input
//!   --tcp <HOST:PORT>        Read from a serial-to-TCP bridge
//!   --baud <RATE>            Serial baud rate for --device [default: 9600]
//!   --format <FORMAT>        csv | json | debug
//!   --count <N>              Stop after N printed readings
//!   --only-with-power        Print only readings that carry EEG power
//!   --hide-errors            Do not echo rejected frames to stderr
//!   --write-default-config   Write the default config file and exit
//! ```
//!
//! Command-line options override the config file.  The source options are
//! mutually exclusive.
//!
//! # Environment variables
//!
//! | Variable            | Description                              |
//! |---------------------|------------------------------------------|
//! | `BRAINWAVE_CONFIG`  | Same as `--config`                       |
//! | `RUST_LOG`          | Log filter; overrides `monitor.log_level` |
//!
//! # Threads
//!
//! ```text
//! main (tokio)
//!  ├─ Ctrl-C task        → clears `running`
//!  └─ "monitor" thread   → open_source → Headset → run_monitor
//! ```
//!
//! File and stdin reads block, so the monitor runs on a plain OS
//! thread.  If it is still blocked in a read when Ctrl-C arrives, `main`
//! waits a short grace period and then exits without it.

use std::io;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use brainwave_core::Headset;
use brainwave_monitor::application::monitor::{run_monitor, MonitorReport, MonitorSettings};
use brainwave_monitor::application::output::OutputFormat;
use brainwave_monitor::infrastructure::byte_source::open_source;
use brainwave_monitor::infrastructure::storage::config::{
    config_file_path, load_config, load_config_from, save_config_to, AppConfig, SourceConfig,
    SourceKind,
};

/// How long `main` waits for a blocked monitor thread after Ctrl-C.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

// ── CLI ───────────────────────────────────────────────────────────────────────

/// Command-line arguments.
///
/// Every option is optional: anything left out falls back to the config
/// file, and the config file falls back to built-in defaults.
#[derive(Debug, Parser)]
#[command(
    name = "brainwave-monitor",
    about = "Decodes a brainwave headset stream and prints each reading",
    version
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, env = "BRAINWAVE_CONFIG")]
    config: Option<PathBuf>,

    /// Serial or Bluetooth RFCOMM device node (e.g. /dev/rfcomm0, COM3).
    #[arg(long, group = "source")]
    device: Option<PathBuf>,

    /// Captured stream to replay.
    #[arg(long, group = "source")]
    file: Option<PathBuf>,

    /// Read the stream from standard input.
    #[arg(long, group = "source")]
    stdin: bool,

    /// Address of a serial-to-TCP bridge.
    #[arg(long, value_name = "HOST:PORT", group = "source")]
    tcp: Option<String>,

    /// Baud rate used when opening a device.
    #[arg(long, value_name = "RATE")]
    baud: Option<u32>,

    /// Output format for readings.
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Stop after this many printed readings.
    #[arg(long)]
    count: Option<u64>,

    /// Print only readings whose frame carried EEG power values.
    #[arg(long)]
    only_with_power: bool,

    /// Do not echo rejected frames to stderr (they are still logged).
    #[arg(long)]
    hide_errors: bool,

    /// Write the default config to the config path and exit.
    #[arg(long)]
    write_default_config: bool,
}

impl Cli {
    /// Layers the command-line options on top of `config`.
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(path) = &self.device {
            config.source.kind = SourceKind::Device;
            config.source.path = path.clone();
        }
        if let Some(path) = &self.file {
            config.source.kind = SourceKind::File;
            config.source.path = path.clone();
        }
        if self.stdin {
            config.source.kind = SourceKind::Stdin;
        }
        if let Some(address) = &self.tcp {
            config.source.kind = SourceKind::Tcp;
            config.source.address = address.clone();
        }
        if let Some(baud_rate) = self.baud {
            config.source.baud_rate = baud_rate;
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if self.count.is_some() {
            config.monitor.max_readings = self.count;
        }
        if self.only_with_power {
            config.output.only_with_power = true;
        }
        if self.hide_errors {
            config.output.print_errors = false;
        }
    }

    /// Loads the config named by `--config`, or the platform config file.
    fn load_config(&self) -> anyhow::Result<AppConfig> {
        let config = match &self.config {
            Some(path) => load_config_from(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => load_config().context("failed to load config")?,
        };
        Ok(config)
    }

    fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => config_file_path().context("no --config given and no platform config dir"),
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.write_default_config {
        let path = cli.config_path()?;
        save_config_to(&path, &AppConfig::default())
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("wrote default config to {}", path.display());
        return Ok(());
    }

    let mut config = cli.load_config()?;
    cli.apply_overrides(&mut config);

    // ── Logging setup ─────────────────────────────────────────────────────────
    //
    // `RUST_LOG` wins over the config file.  Logs go to stderr so stdout
    // carries nothing but readings.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.monitor.log_level)),
        )
        .with_writer(io::stderr)
        .init();

    info!(kind = ?config.source.kind, format = ?config.output.format, "Brainwave Monitor starting");

    // ── Graceful shutdown flag ────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                running_clone.store(false, Ordering::SeqCst);
            }
            Err(e) => tracing::error!("failed to listen for Ctrl-C: {e}"),
        }
    });

    // ── Monitor thread ────────────────────────────────────────────────────────
    let settings = config.monitor_settings();
    let source_config = config.source.clone();
    let (done_tx, done_rx) = oneshot::channel();
    let worker_running = Arc::clone(&running);
    std::thread::Builder::new()
        .name("monitor".to_string())
        .spawn(move || {
            let result = monitor(&source_config, &settings, &worker_running);
            // The receiver is gone only if main already gave up on us.
            let _ = done_tx.send(result);
        })
        .context("failed to spawn monitor thread")?;

    let report = tokio::select! {
        result = done_rx => result.context("monitor thread exited without a report")??,
        () = shutdown_grace(Arc::clone(&running)) => {
            warn!("byte source still blocked after shutdown; exiting without it");
            return Ok(());
        }
    };

    log_report(&report);
    info!("Brainwave Monitor stopped");
    Ok(())
}

/// Opens the source and runs the monitor loop on the current thread.
fn monitor(
    source_config: &SourceConfig,
    settings: &MonitorSettings,
    running: &AtomicBool,
) -> anyhow::Result<MonitorReport> {
    let source = open_source(source_config, settings.idle_interval)?;
    let mut headset = Headset::new(source);

    let stdout = io::stdout();
    let stderr = io::stderr();
    let report = run_monitor(
        &mut headset,
        settings,
        &mut stdout.lock(),
        &mut stderr.lock(),
        running,
    )?;
    Ok(report)
}

/// Resolves once `running` has been cleared for [`SHUTDOWN_GRACE`].
async fn shutdown_grace(running: Arc<AtomicBool>) {
    while running.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    tokio::time::sleep(SHUTDOWN_GRACE).await;
}

fn log_report(report: &MonitorReport) {
    let stats = &report.stats;
    info!(
        stop = ?report.stop,
        bytes = stats.bytes_consumed,
        readings = stats.readings,
        printed = stats.printed,
        rejected = stats.total_rejected(),
        "monitor finished"
    );
    for (kind, count) in &stats.rejected {
        info!(kind = kind.as_str(), count, "rejected frames");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
