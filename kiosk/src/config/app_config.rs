//! Runtime application configuration loaded from defaults + environment.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use image_processor::{Halftone, NormalizeOptions};

use super::defaults;
use super::validation::validate_setting;
use crate::services::settle::SettlePolicy;

/// Threshold used when `HALFTONE=threshold`.
const HALFTONE_THRESHOLD: u8 = 128;

/// How the printer is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrinterTransport {
    Network,
    Serial,
}

/// Runtime configuration, fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub watch_dir: PathBuf,
    pub output_dir: PathBuf,
    pub printer_transport: PrinterTransport,
    pub printer_address: String,
    pub printer_serial_port: String,
    pub printer_baud_rate: u32,
    pub printer_connect_timeout: u64,
    pub dry_run_mode: bool,
    pub target_width: u32,
    pub halftone: Halftone,
    pub settle_delay_ms: u64,
    pub settle_poll_ms: u64,
    pub settle_max_polls: u32,
    pub footer_text: String,
}

impl AppConfig {
    /// Load from process environment variables (after any `.env` was applied).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` for overrides; unset or empty keys take their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, anyhow::Error> {
        let g = |key: &str| -> Result<String, anyhow::Error> {
            let value = match lookup(key).filter(|v| !v.trim().is_empty()) {
                Some(v) => v,
                None => defaults::get_default(key)
                    .with_context(|| format!("no default for setting {key}"))?
                    .to_string(),
            };
            validate_setting(key, &value)
                .map_err(|e| anyhow::anyhow!("invalid value for {key} ({value:?}): {e}"))?;
            Ok(value)
        };

        Ok(Self {
            watch_dir: PathBuf::from(g("WATCH_DIR")?),
            output_dir: PathBuf::from(g("OUTPUT_DIR")?),
            printer_transport: match g("PRINTER_TRANSPORT")?.as_str() {
                "serial" => PrinterTransport::Serial,
                _ => PrinterTransport::Network,
            },
            printer_address: g("PRINTER_ADDRESS")?,
            printer_serial_port: g("PRINTER_SERIAL_PORT")?,
            printer_baud_rate: g("PRINTER_BAUD_RATE")?.parse()?,
            printer_connect_timeout: g("PRINTER_CONNECT_TIMEOUT")?.parse()?,
            dry_run_mode: g("DRY_RUN_MODE")? == "true",
            target_width: g("TARGET_WIDTH")?.parse()?,
            halftone: match g("HALFTONE")?.as_str() {
                "threshold" => Halftone::Threshold(HALFTONE_THRESHOLD),
                _ => Halftone::FloydSteinberg,
            },
            settle_delay_ms: g("SETTLE_DELAY_MS")?.parse()?,
            settle_poll_ms: g("SETTLE_POLL_MS")?.parse()?,
            settle_max_polls: g("SETTLE_MAX_POLLS")?.parse()?,
            // The footer may legitimately be blank, so it bypasses the empty->default rule.
            footer_text: match lookup("FOOTER_TEXT") {
                Some(v) => {
                    validate_setting("FOOTER_TEXT", &v).map_err(|e| anyhow::anyhow!(e))?;
                    v
                }
                None => g("FOOTER_TEXT")?,
            },
        })
    }

    /// Fail when both directories resolve to the same place.
    ///
    /// Both must exist. Artifacts written into the watched directory would be
    /// picked up as new photos and printed again without end.
    pub fn ensure_separate_dirs(&self) -> Result<(), anyhow::Error> {
        let watch = self
            .watch_dir
            .canonicalize()
            .with_context(|| format!("cannot resolve WATCH_DIR {}", self.watch_dir.display()))?;
        let output = self
            .output_dir
            .canonicalize()
            .with_context(|| format!("cannot resolve OUTPUT_DIR {}", self.output_dir.display()))?;
        if watch == output {
            anyhow::bail!(
                "OUTPUT_DIR must differ from WATCH_DIR (both resolve to {})",
                watch.display()
            );
        }
        Ok(())
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions::new(&self.output_dir)
            .with_target_width(self.target_width)
            .with_halftone(self.halftone)
    }

    pub fn settle_policy(&self) -> SettlePolicy {
        SettlePolicy {
            initial_delay: Duration::from_millis(self.settle_delay_ms),
            poll_interval: Duration::from_millis(self.settle_poll_ms),
            max_polls: self.settle_max_polls,
        }
    }

    pub fn printer_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.printer_connect_timeout)
    }
}
