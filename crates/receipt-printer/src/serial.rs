//! ESC/POS over a serial line (USB-serial receipt printers).
//!
//! Same lifecycle as the network printer: the port is opened on first use
//! and closed after a write failure so an unplugged printer is reopened by
//! the next job.

use image_processor::RasterImage;
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};

use crate::escpos::EscPosWriter;
use crate::{Printer, PrinterError, Result, TextStyle};

/// Line speed used by most thermal receipt printers.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Baud rates accepted by [`SerialPrinter`].
pub const SUPPORTED_BAUD_RATES: &[u32] = &[9_600, 19_200, 38_400, 57_600, 115_200];

/// A receipt printer on a serial device, 8N1 without flow control.
pub struct SerialPrinter {
    path: String,
    baud_rate: u32,
    conn: Option<EscPosWriter<SerialStream>>,
}

impl std::fmt::Debug for SerialPrinter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPrinter")
            .field("path", &self.path)
            .field("baud_rate", &self.baud_rate)
            .field("connected", &self.conn.is_some())
            .finish()
    }
}

impl SerialPrinter {
    /// Create a printer handle. The device is not opened yet.
    pub fn new(path: &str, baud_rate: u32) -> Self {
        Self {
            path: path.trim().to_string(),
            baud_rate,
            conn: None,
        }
    }

    /// Device path, e.g. `/dev/ttyUSB0` or `COM4`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Open the device now if it is not open already.
    pub async fn connect(&mut self) -> Result<()> {
        self.connection().await.map(|_| ())
    }

    /// Close the device; the next operation reopens it.
    pub fn disconnect(&mut self) {
        if self.conn.take().is_some() {
            tracing::info!(path = %self.path, "Serial printer closed");
        }
    }

    async fn connection(&mut self) -> Result<&mut EscPosWriter<SerialStream>> {
        if self.conn.is_none() {
            tracing::info!(path = %self.path, baud = self.baud_rate, "Opening serial printer");
            let stream = tokio_serial::new(&self.path, self.baud_rate)
                .data_bits(DataBits::Eight)
                .parity(Parity::None)
                .stop_bits(StopBits::One)
                .flow_control(FlowControl::None)
                .open_native_async()
                .map_err(|e| PrinterError::Connection(format!("{}: {e}", self.path)))?;

            let mut writer = EscPosWriter::new(stream);
            writer.initialize().await?;
            tracing::info!(path = %self.path, "Serial printer ready");
            self.conn = Some(writer);
        }
        self.conn
            .as_mut()
            .ok_or_else(|| PrinterError::Connection("serial port unavailable".into()))
    }

    /// Close the device when `result` is a transport failure.
    fn track_failure<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(PrinterError::Write(e)) = &result {
            tracing::warn!(path = %self.path, error = %e, "Serial write failed, closing port");
            self.conn = None;
        }
        result
    }
}

impl Printer for SerialPrinter {
    async fn send_raster(&mut self, image: &RasterImage) -> Result<()> {
        let result = self.connection().await?.send_raster(image).await;
        self.track_failure(result)
    }

    async fn write_text(&mut self, text: &str, style: &TextStyle) -> Result<()> {
        let result = self.connection().await?.write_text(text, style).await;
        self.track_failure(result)
    }

    async fn line_feed(&mut self, lines: u8) -> Result<()> {
        let result = self.connection().await?.line_feed(lines).await;
        self.track_failure(result)
    }

    async fn cut_paper(&mut self) -> Result<()> {
        let result = self.connection().await?.cut_paper().await;
        self.track_failure(result)
    }
}
