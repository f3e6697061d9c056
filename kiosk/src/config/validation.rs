//! Setting value validation.

use receipt_printer::serial::SUPPORTED_BAUD_RATES;
use regex::Regex;
use std::sync::LazyLock;

static RE_HOST_PORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9.\-]*[A-Za-z0-9])?(?::(\d{1,5}))?$")
        .expect("host:port pattern is valid")
});

/// Validate a setting value. Returns `Ok(())` if valid, or an error message.
pub fn validate_setting(key: &str, value: &str) -> Result<(), String> {
    match key {
        "WATCH_DIR" | "OUTPUT_DIR" => {
            if value.trim().is_empty() {
                return Err("path must not be empty".into());
            }
        }
        "PRINTER_TRANSPORT" => {
            if value != "network" && value != "serial" {
                return Err("must be 'network' or 'serial'".into());
            }
        }
        "PRINTER_ADDRESS" => validate_host_port(value)?,
        "PRINTER_SERIAL_PORT" => {
            if value.trim().is_empty() || value.chars().any(char::is_whitespace) {
                return Err("must be a device path without spaces".into());
            }
        }
        "PRINTER_BAUD_RATE" => {
            let rate: u32 = value.parse().map_err(|_| "must be an integer")?;
            if !SUPPORTED_BAUD_RATES.contains(&rate) {
                return Err(format!("must be one of {SUPPORTED_BAUD_RATES:?}"));
            }
        }
        "PRINTER_CONNECT_TIMEOUT" => validate_int_range(value, 1, 120)?,
        "TARGET_WIDTH" => validate_int_range(value, 8, 4096)?,
        "HALFTONE" => {
            if value != "dither" && value != "threshold" {
                return Err("must be 'dither' or 'threshold'".into());
            }
        }
        "SETTLE_DELAY_MS" => validate_int_range(value, 0, 60_000)?,
        "SETTLE_POLL_MS" => validate_int_range(value, 10, 10_000)?,
        "SETTLE_MAX_POLLS" => validate_int_range(value, 0, 1000)?,
        "FOOTER_TEXT" => {
            if value.chars().count() > 256 {
                return Err("must be at most 256 characters".into());
            }
        }
        // Boolean settings
        "DRY_RUN_MODE" => {
            if value != "true" && value != "false" {
                return Err("must be 'true' or 'false'".into());
            }
        }
        _ => {}
    }
    Ok(())
}

fn validate_host_port(value: &str) -> Result<(), String> {
    let caps = RE_HOST_PORT
        .captures(value)
        .ok_or("invalid address format (expected host or host:port)")?;
    if let Some(port) = caps.get(1) {
        match port.as_str().parse::<u16>() {
            Ok(p) if p > 0 => {}
            _ => return Err("port must be between 1 and 65535".into()),
        }
    }
    Ok(())
}

fn validate_int_range(value: &str, min: i64, max: i64) -> Result<(), String> {
    let v: i64 = value.parse().map_err(|_| "must be an integer")?;
    if v < min || v > max {
        return Err(format!("must be between {min} and {max}"));
    }
    Ok(())
}
