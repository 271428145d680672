//! ESC/POS command builder
//!
//! Accumulates UTF-8 text and command bytes; [`EscPosBuilder::build`]
//! converts the text to WPC1252 in one pass.

use crate::encoding::{encode_wpc1252, text_width};

const ESC: u8 = 0x1B;
const GS: u8 = 0x1D;

/// Horizontal alignment (ESC a n)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left = 0,
    Center = 1,
    Right = 2,
}

/// ESC/POS command builder
///
/// Common widths:
/// - 58mm paper: 32 characters
/// - 80mm paper: 48 characters
pub struct EscPosBuilder {
    buf: Vec<u8>,
    width: usize,
}

impl EscPosBuilder {
    /// Create a new builder; starts with INIT (ESC @)
    pub fn new(width: usize) -> Self {
        let mut buf = Vec::with_capacity(2048);
        buf.extend_from_slice(&[ESC, 0x40]);
        Self { buf, width }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    // === Text ===

    pub fn text(&mut self, s: &str) -> &mut Self {
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    pub fn line(&mut self, s: &str) -> &mut Self {
        self.text(s);
        self.buf.push(b'\n');
        self
    }

    pub fn newline(&mut self) -> &mut Self {
        self.buf.push(b'\n');
        self
    }

    // === Style ===

    pub fn align(&mut self, align: Align) -> &mut Self {
        self.buf.extend_from_slice(&[ESC, 0x61, align as u8]);
        self
    }

    pub fn bold(&mut self, on: bool) -> &mut Self {
        self.buf.extend_from_slice(&[ESC, 0x45, on as u8]);
        self
    }

    /// Double width and height (GS ! 0x11)
    pub fn double_size(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[GS, 0x21, 0x11]);
        self
    }

    /// Double height only, keeps the column count (GS ! 0x01)
    pub fn double_height(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[GS, 0x21, 0x01]);
        self
    }

    pub fn reset_size(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[GS, 0x21, 0x00]);
        self
    }

    // === Layout ===

    /// Full-width separator made of `c`
    pub fn sep(&mut self, c: char) -> &mut Self {
        let line: String = std::iter::repeat_n(c, self.width).collect();
        self.line(&line)
    }

    /// Left and right text on one line, gap filled with spaces
    ///
    /// Falls back to a single space when both do not fit.
    pub fn line_lr(&mut self, left: &str, right: &str) -> &mut Self {
        let lw = text_width(left);
        let rw = text_width(right);
        let gap = if lw + rw >= self.width {
            1
        } else {
            self.width - lw - rw
        };
        self.text(left);
        self.text(&" ".repeat(gap));
        self.line(right)
    }

    // === Paper ===

    /// Feed `lines` then full cut (GS V 66 n)
    pub fn cut_feed(&mut self, lines: u8) -> &mut Self {
        self.buf.extend_from_slice(&[GS, 0x56, 0x42, lines]);
        self
    }

    // === Build ===

    /// Final byte buffer, text converted to WPC1252
    pub fn build(self) -> Vec<u8> {
        encode_wpc1252(&self.buf)
    }

    /// Raw UTF-8 buffer without conversion (debugging and tests)
    pub fn build_raw(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for EscPosBuilder {
    fn default() -> Self {
        Self::new(48)
    }
}
