use std::time::Duration;

use receipt_printer::{DryRunPrinter, NetworkPrinter, PrinterHandle, SerialPrinter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, PrinterTransport};
use crate::services::print_queue::{self, Pipeline, QUEUE_CAPACITY};
use crate::services::watcher::{self, IngestionWatcher, SharedWatchState};

/// Install the global subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Load environment variables from a `.env` file, if one is found.
fn load_dotenv() {
    let candidates = [".env", "../.env", "../../.env"];
    for path in &candidates {
        if dotenvy::from_filename(path).is_ok() {
            tracing::info!("Loaded .env from: {path}");
            return;
        }
    }
    tracing::info!("No .env file found, using system environment variables");
}

/// Load config and make sure both working directories exist (fatal on error).
pub fn init_foundation() -> Result<AppConfig, anyhow::Error> {
    load_dotenv();
    let config = AppConfig::from_env()?;

    std::fs::create_dir_all(&config.watch_dir)?;
    std::fs::create_dir_all(&config.output_dir)?;
    config.ensure_separate_dirs()?;

    tracing::info!(
        watch_dir = %config.watch_dir.display(),
        output_dir = %config.output_dir.display(),
        transport = ?config.printer_transport,
        dry_run = config.dry_run_mode,
        target_width = config.target_width,
        "Settings loaded"
    );
    Ok(config)
}

/// Pick the printer transport. An unreachable printer is not fatal: both
/// the network and serial printers reconnect on the next job.
pub async fn build_printer(config: &AppConfig) -> PrinterHandle {
    if config.dry_run_mode {
        tracing::info!("Dry-run mode: printer output is only logged");
        return PrinterHandle::DryRun(DryRunPrinter::new());
    }

    match config.printer_transport {
        PrinterTransport::Network => {
            let mut printer =
                NetworkPrinter::new(&config.printer_address, config.printer_connect_timeout());
            if let Err(e) = printer.connect().await {
                tracing::warn!(
                    address = %printer.address(),
                    error = %e,
                    "Printer not reachable at startup, will retry on first job"
                );
            }
            PrinterHandle::Network(printer)
        }
        PrinterTransport::Serial => {
            let mut printer =
                SerialPrinter::new(&config.printer_serial_port, config.printer_baud_rate);
            if let Err(e) = printer.connect().await {
                tracing::warn!(
                    path = %printer.path(),
                    error = %e,
                    "Serial printer not available at startup, will retry on first job"
                );
            }
            PrinterHandle::Serial(printer)
        }
    }
}

/// Handles to the running background tasks.
pub struct Services {
    pub shutdown_token: CancellationToken,
    pub state: SharedWatchState,
    fs_watcher: notify::RecommendedWatcher,
    ingest: JoinHandle<()>,
    worker: JoinHandle<Pipeline<PrinterHandle>>,
}

impl Services {
    /// Unsubscribe from the directory and hand back the task handles.
    pub(crate) fn into_tasks(self) -> (JoinHandle<()>, JoinHandle<Pipeline<PrinterHandle>>) {
        drop(self.fs_watcher);
        (self.ingest, self.worker)
    }
}

/// Subscribe to the watch directory and spawn the ingestion loop and the
/// print queue worker.
pub fn start_services(config: &AppConfig, printer: PrinterHandle) -> Result<Services, anyhow::Error> {
    config.ensure_separate_dirs()?;
    let shutdown_token = CancellationToken::new();
    let state = SharedWatchState::new();

    let (fs_watcher, events) = watcher::subscribe(&config.watch_dir)?;
    let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);

    let ingestion = IngestionWatcher::new(state.clone(), tx);
    let ingest = tokio::spawn(ingestion.run(events, shutdown_token.clone()));

    let pipeline = Pipeline::from_config(printer, config, state.clone());
    let worker = tokio::spawn(print_queue::worker_loop(pipeline, rx, shutdown_token.clone()));

    tracing::info!(
        settle_delay = ?Duration::from_millis(config.settle_delay_ms),
        "Kiosk services started"
    );
    Ok(Services {
        shutdown_token,
        state,
        fs_watcher,
        ingest,
        worker,
    })
}
