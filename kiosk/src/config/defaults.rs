//! All setting definitions with their default values.

use std::collections::HashMap;
use std::sync::LazyLock;

type DefTuple = (&'static str, &'static str, &'static str);

#[rustfmt::skip]
const SETTING_DEFS: &[DefTuple] = &[
    ("WATCH_DIR",               "./img",                "Directory watched for new photos"),
    ("OUTPUT_DIR",              "./dist",               "Directory receiving processed artifacts"),
    ("PRINTER_TRANSPORT",       "network",              "network (ESC/POS over TCP) or serial"),
    ("PRINTER_ADDRESS",         "192.168.0.237:9100",   "Network printer host[:port]"),
    ("PRINTER_SERIAL_PORT",     "/dev/ttyUSB0",         "Serial printer device path"),
    ("PRINTER_BAUD_RATE",       "115200",               "Serial printer line speed"),
    ("PRINTER_CONNECT_TIMEOUT", "5",                    "Printer TCP connect timeout in seconds"),
    ("DRY_RUN_MODE",            "false",                "Log printer commands instead of printing"),
    ("TARGET_WIDTH",            "512",                  "Print width in pixels"),
    ("HALFTONE",                "dither",               "dither (Floyd-Steinberg) or threshold"),
    ("SETTLE_DELAY_MS",         "500",                  "Grace period before reading a new file"),
    ("SETTLE_POLL_MS",          "250",                  "Interval between file-size checks"),
    ("SETTLE_MAX_POLLS",        "20",                   "File-size checks before giving up waiting"),
    ("FOOTER_TEXT",             "Fagdagen 25.10.2025",  "Text printed under each photo"),
];

/// A single setting definition.
#[derive(Debug, Clone)]
pub struct SettingDef {
    pub key: &'static str,
    pub default: &'static str,
    pub description: &'static str,
}

/// Global setting definitions indexed by key.
pub static DEFAULT_SETTINGS: LazyLock<HashMap<&'static str, SettingDef>> = LazyLock::new(|| {
    SETTING_DEFS
        .iter()
        .map(|&(key, default, description)| {
            (
                key,
                SettingDef {
                    key,
                    default,
                    description,
                },
            )
        })
        .collect()
});

/// Get the default value for a setting key, or `None` if not defined.
pub fn get_default(key: &str) -> Option<&'static str> {
    DEFAULT_SETTINGS.get(key).map(|d| d.default)
}
