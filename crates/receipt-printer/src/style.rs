//! Text styling for receipt output.
//!
//! Alignment, font and character magnification, mirroring the knobs common
//! ESC/POS printers expose.

/// Maximum character magnification per axis.
pub const MAX_MAGNIFICATION: u8 = 8;

/// Horizontal justification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Built-in printer font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Font {
    /// Font A, the larger default face.
    #[default]
    A,
    /// Font B, the condensed face.
    B,
}

/// Style applied to a line of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextStyle {
    pub align: Align,
    pub font: Font,
    /// Horizontal magnification, 1..=8.
    pub width: u8,
    /// Vertical magnification, 1..=8.
    pub height: u8,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            align: Align::Left,
            font: Font::A,
            width: 1,
            height: 1,
        }
    }
}

impl TextStyle {
    /// Create a style with printer defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set alignment.
    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// Builder: set font.
    pub fn with_font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    /// Builder: set magnification. Values are clamped to 1..=8.
    pub fn with_size(mut self, width: u8, height: u8) -> Self {
        self.width = width.clamp(1, MAX_MAGNIFICATION);
        self.height = height.clamp(1, MAX_MAGNIFICATION);
        self
    }
}
