//! Photo kiosk: watches a directory for new photos, converts each one to a
//! 1-bit receipt-width image and prints it with a footer.

pub mod bootstrap;
pub mod config;
pub mod services;
pub mod shutdown;

pub use bootstrap::{Services, build_printer, init_foundation, init_tracing, start_services};
pub use config::AppConfig;
