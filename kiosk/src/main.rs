//! Watch daemon: prints every new photo dropped into the watch directory.

use kiosk_lib::shutdown::graceful_shutdown;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    kiosk_lib::init_tracing();
    tracing::info!("Starting photo kiosk");

    let config = kiosk_lib::init_foundation()?;
    let printer = kiosk_lib::build_printer(&config).await;
    tracing::info!(printer = printer.kind(), "Printer ready");

    let services = kiosk_lib::start_services(&config, printer)?;
    tracing::info!("Kiosk running. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    graceful_shutdown(services).await;
    Ok(())
}
