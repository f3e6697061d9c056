//! ESC/POS over a raw TCP socket (port 9100 on most receipt printers).
//!
//! The connection is opened lazily and dropped after any write failure, so
//! a printer that was off or rebooted is picked up again by the next job.

use std::time::Duration;

use image_processor::RasterImage;
use tokio::net::TcpStream;

use crate::escpos::EscPosWriter;
use crate::{DEFAULT_PORT, Printer, PrinterError, Result, TextStyle};

/// Default TCP connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A network receipt printer addressed as `host` or `host:port`.
#[derive(Debug)]
pub struct NetworkPrinter {
    address: String,
    connect_timeout: Duration,
    conn: Option<EscPosWriter<TcpStream>>,
}

impl NetworkPrinter {
    /// Create a printer handle. No connection is made yet.
    pub fn new(address: &str, connect_timeout: Duration) -> Self {
        Self {
            address: with_default_port(address),
            connect_timeout,
            conn: None,
        }
    }

    /// Resolved `host:port` this printer connects to.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Connect now if not already connected.
    pub async fn connect(&mut self) -> Result<()> {
        self.connection().await.map(|_| ())
    }

    /// Close the connection; the next operation reconnects.
    pub fn disconnect(&mut self) {
        if self.conn.take().is_some() {
            tracing::info!(address = %self.address, "Printer disconnected");
        }
    }

    async fn connection(&mut self) -> Result<&mut EscPosWriter<TcpStream>> {
        if self.conn.is_none() {
            tracing::info!(address = %self.address, "Connecting to printer");
            let stream = tokio::time::timeout(
                self.connect_timeout,
                TcpStream::connect(self.address.as_str()),
            )
            .await
            .map_err(|_| PrinterError::ConnectionTimeout(self.connect_timeout.as_secs()))?
            .map_err(|e| PrinterError::Connection(format!("{}: {e}", self.address)))?;
            stream.set_nodelay(true)?;

            let mut writer = EscPosWriter::new(stream);
            writer.initialize().await?;
            tracing::info!(address = %self.address, "Printer connected");
            self.conn = Some(writer);
        }
        self.conn
            .as_mut()
            .ok_or_else(|| PrinterError::Connection("connection unavailable".into()))
    }

    /// Drop the connection when `result` is a transport failure.
    fn track_failure<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(PrinterError::Write(e)) = &result {
            tracing::warn!(address = %self.address, error = %e, "Printer write failed, dropping connection");
            self.conn = None;
        }
        result
    }
}

impl Printer for NetworkPrinter {
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

/// Append the default raw-print port unless one is given.
fn with_default_port(address: &str) -> String {
    let address = address.trim();
    match address.rsplit_once(':') {
        Some((_, port)) if port.parse::<u16>().is_ok() => address.to_string(),
        _ => format!("{address}:{DEFAULT_PORT}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_default_port_is_appended() {
        assert_eq!(with_default_port("192.168.0.237"), "192.168.0.237:9100");
        assert_eq!(with_default_port(" printer.local "), "printer.local:9100");
        assert_eq!(with_default_port("10.0.0.5:9101"), "10.0.0.5:9101");
    }

    #[tokio::test]
    async fn test_connect_refused_is_connection_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut printer = NetworkPrinter::new(&addr.to_string(), DEFAULT_CONNECT_TIMEOUT);
        let err = printer.line_feed(1).await.unwrap_err();
        assert!(matches!(err, PrinterError::Connection(_)), "{err}");
        assert!(!printer.is_connected());
    }

    #[tokio::test]
    async fn test_commands_reach_the_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        });

        let mut printer = NetworkPrinter::new(&addr.to_string(), DEFAULT_CONNECT_TIMEOUT);
        printer.line_feed(2).await.unwrap();
        printer.cut_paper().await.unwrap();
        assert!(printer.is_connected());
        printer.disconnect();

        let received = server.await.unwrap();
        let mut expected = crate::escpos::INIT.to_vec();
        expected.extend_from_slice(&crate::escpos::feed_command(2));
        expected.extend_from_slice(&crate::escpos::cut_command());
        assert_eq!(received, expected);
    }
}
