//! Minimal ESC/POS encoding for the four printer operations.
//!
//! Only what the kiosk prints is covered: a raster image (`GS v 0`),
//! styled text, line feeds and a cut. Text is sent in code page PC865
//! (Nordic) so æ, ø and å print; characters it lacks become `?`.

use image_processor::RasterImage;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::style::{Align, Font, TextStyle};
use crate::{Printer, Result, ensure_printable};

const ESC: u8 = 0x1b;
const GS: u8 = 0x1d;

/// Reset printer state (`ESC @`).
pub const INIT: [u8; 2] = [ESC, b'@'];

/// Rows per `GS v 0` block, so small receive buffers are never overrun.
pub const RASTER_BAND_ROWS: u32 = 256;

/// Lines fed before the cutter engages (`GS V 65 n`).
const CUT_FEED_LINES: u8 = 3;

/// `ESC t 5`: select character code table PC865 (Nordic).
pub const CODE_PAGE_PC865: [u8; 3] = [ESC, b't', 5];

/// PC865 bytes 0x80..=0xAF.
#[rustfmt::skip]
const PC865_HIGH: [char; 48] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å',
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', 'ø', '£', 'Ø', '₧', 'ƒ',
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '¤',
];

/// Byte for `c` in PC865, or `?` if the code page has no such character.
pub fn pc865_byte(c: char) -> u8 {
    if c == ' ' || c.is_ascii_graphic() {
        return c as u8;
    }
    PC865_HIGH
        .iter()
        .position(|&h| h == c)
        .map_or(b'?', |i| 0x80 + i as u8)
}

/// `ESC a n`
pub fn align_command(align: Align) -> [u8; 3] {
    let n = match align {
        Align::Left => 0,
        Align::Center => 1,
        Align::Right => 2,
    };
    [ESC, b'a', n]
}

/// `ESC M n`
pub fn font_command(font: Font) -> [u8; 3] {
    let n = match font {
        Font::A => 0,
        Font::B => 1,
    };
    [ESC, b'M', n]
}

/// `GS ! n`: high nibble is width - 1, low nibble height - 1.
pub fn size_command(width: u8, height: u8) -> [u8; 3] {
    let w = width.clamp(1, 8) - 1;
    let h = height.clamp(1, 8) - 1;
    [GS, b'!', (w << 4) | h]
}

/// `ESC d n`: print the line buffer and feed `lines`.
pub fn feed_command(lines: u8) -> [u8; 3] {
    [ESC, b'd', lines]
}

/// `GS V 65 n`: feed to the cutter and full cut.
pub fn cut_command() -> [u8; 4] {
    [GS, b'V', 65, CUT_FEED_LINES]
}

/// Code page and style prefix followed by the encoded text.
pub fn encode_text(text: &str, style: &TextStyle) -> Vec<u8> {
    let mut buf = Vec::with_capacity(12 + text.len());
    buf.extend_from_slice(&CODE_PAGE_PC865);
    buf.extend_from_slice(&align_command(style.align));
    buf.extend_from_slice(&font_command(style.font));
    buf.extend_from_slice(&size_command(style.width, style.height));
    buf.extend(text.chars().map(pc865_byte));
    buf
}

/// Encode a monochrome raster as `GS v 0` blocks of at most `band_rows` rows.
///
/// Each row is packed MSB-first, one bit per pixel, set for black.
/// The last byte of a row is zero-padded.
pub fn encode_raster_bands(image: &RasterImage, band_rows: u32) -> Vec<Vec<u8>> {
    let (width, height) = image.dimensions();
    let bytes_per_row = width.div_ceil(8) as usize;
    let band_rows = band_rows.max(1);

    let mut bands = Vec::new();
    let mut top = 0;
    while top < height {
        let rows = band_rows.min(height - top);
        let mut buf = Vec::with_capacity(8 + bytes_per_row * rows as usize);
        buf.extend_from_slice(&[GS, b'v', b'0', 0]);
        buf.extend_from_slice(&(bytes_per_row as u16).to_le_bytes());
        buf.extend_from_slice(&(rows as u16).to_le_bytes());

        for y in top..top + rows {
            let mut row = vec![0u8; bytes_per_row];
            for x in 0..width {
                if image.is_black(x, y) {
                    row[(x / 8) as usize] |= 0x80 >> (x % 8);
                }
            }
            buf.extend_from_slice(&row);
        }

        bands.push(buf);
        top += rows;
    }
    bands
}

/// Writes ESC/POS commands to any async byte sink.
#[derive(Debug)]
pub struct EscPosWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin + Send> EscPosWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Send `ESC @` so styles from an earlier session do not leak.
    pub async fn initialize(&mut self) -> Result<()> {
        self.send(&INIT).await
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes).await?;
        self.inner.flush().await?;
        Ok(())
    }
}

impl<W: AsyncWrite + Unpin + Send> Printer for EscPosWriter<W> {
    async fn send_raster(&mut self, image: &RasterImage) -> Result<()> {
        ensure_printable(image)?;
        let bands = encode_raster_bands(image, RASTER_BAND_ROWS);
        debug!(
            width = image.width(),
            height = image.height(),
            bands = bands.len(),
            "Sending raster"
        );

        self.send(&align_command(Align::Center)).await?;
        for band in bands {
            self.send(&band).await?;
        }
        Ok(())
    }

    async fn write_text(&mut self, text: &str, style: &TextStyle) -> Result<()> {
        self.send(&encode_text(text, style)).await
    }

    async fn line_feed(&mut self, lines: u8) -> Result<()> {
        self.send(&feed_command(lines)).await
    }

    async fn cut_paper(&mut self) -> Result<()> {
        self.send(&cut_command()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn mono(width: u32, height: u32, black: &[(u32, u32)]) -> RasterImage {
        let mut img = GrayImage::from_pixel(width, height, Luma([255]));
        for &(x, y) in black {
            img.put_pixel(x, y, Luma([0]));
        }
        RasterImage::monochrome(img).unwrap()
    }

    #[test]
    fn test_size_command_nibbles() {
        assert_eq!(size_command(1, 1), [GS, b'!', 0x00]);
        assert_eq!(size_command(2, 2), [GS, b'!', 0x11]);
        assert_eq!(size_command(8, 3), [GS, b'!', 0x72]);
    }

    #[test]
    fn test_encode_text_prefix_and_fallback() {
        let style = TextStyle::new()
            .with_align(Align::Center)
            .with_size(2, 2);
        let bytes = encode_text("Hi ø€!", &style);
        assert_eq!(
            bytes,
            vec![
                ESC, b't', 5, ESC, b'a', 1, ESC, b'M', 0, GS, b'!', 0x11, b'H', b'i', b' ', 0x9B,
                b'?', b'!'
            ]
        );
    }

    #[test]
    fn test_norwegian_letters_use_pc865() {
        let bytes: Vec<u8> = "æøåÆØÅ".chars().map(pc865_byte).collect();
        assert_eq!(bytes, vec![0x91, 0x9B, 0x86, 0x92, 0x9D, 0x8F]);
        assert_eq!(pc865_byte('A'), b'A');
        assert_eq!(pc865_byte('\n'), b'?');
        assert_eq!(pc865_byte('漢'), b'?');
    }

    #[test]
    fn test_raster_row_packing() {
        // 10 px wide: two bytes per row, MSB first, padding bits clear.
        let img = mono(10, 1, &[(0, 0), (7, 0), (8, 0)]);
        let bands = encode_raster_bands(&img, RASTER_BAND_ROWS);
        assert_eq!(bands.len(), 1);
        assert_eq!(
            bands[0],
            vec![GS, b'v', b'0', 0, 2, 0, 1, 0, 0b1000_0001, 0b1000_0000]
        );
    }

    #[test]
    fn test_raster_is_split_into_bands() {
        let img = mono(8, 5, &[(0, 4)]);
        let bands = encode_raster_bands(&img, 2);
        assert_eq!(bands.len(), 3);
        // Header rows: 2, 2, then the 1-row remainder.
        assert_eq!(&bands[0][4..8], &[1, 0, 2, 0]);
        assert_eq!(&bands[2][4..8], &[1, 0, 1, 0]);
        assert_eq!(bands[2][8], 0x80);
    }

    #[tokio::test]
    async fn test_writer_emits_commands_in_order() {
        let mut printer = EscPosWriter::new(Vec::new());
        printer.initialize().await.unwrap();
        printer.send_raster(&mono(8, 1, &[(1, 0)])).await.unwrap();
        printer.line_feed(2).await.unwrap();
        printer.cut_paper().await.unwrap();

        let bytes = printer.into_inner();
        let mut expected = INIT.to_vec();
        expected.extend_from_slice(&align_command(Align::Center));
        expected.extend_from_slice(&[GS, b'v', b'0', 0, 1, 0, 1, 0, 0x40]);
        expected.extend_from_slice(&feed_command(2));
        expected.extend_from_slice(&cut_command());
        assert_eq!(bytes, expected);
    }

    #[tokio::test]
    async fn test_writer_rejects_grayscale_raster() {
        let mut printer = EscPosWriter::new(Vec::new());
        let gray = RasterImage::grayscale(GrayImage::from_pixel(4, 4, Luma([90])));
        let err = printer.send_raster(&gray).await.unwrap_err();
        assert!(matches!(err, crate::PrinterError::NotBlackWhite));
        assert!(printer.get_ref().is_empty());
    }
}
