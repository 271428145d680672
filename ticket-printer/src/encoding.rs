//! WPC1252 encoding and column helpers
//!
//! Receipts are composed as UTF-8 with embedded ESC/POS commands and
//! converted right before they reach the printer. Every printable
//! character occupies one column on a Latin code page, so widths are
//! counted in chars, not bytes.

use tracing::instrument;

/// ESC t 16 - select character code table WPC1252
const SELECT_WPC1252: [u8; 3] = [0x1B, 0x74, 16];

/// ESC @ - initialize printer
const INIT: [u8; 2] = [0x1B, 0x40];

/// Column width of a string on a single-byte code page
pub fn text_width(s: &str) -> usize {
    s.chars().count()
}

/// Truncate a string to at most `max_width` columns
pub fn truncate_text(s: &str, max_width: usize) -> String {
    s.chars().take(max_width).collect()
}

/// Pad a string to exactly `width` columns, truncating when longer
pub fn pad_text(s: &str, width: usize, align_right: bool) -> String {
    let current = text_width(s);
    if current >= width {
        return truncate_text(s, width);
    }
    let spaces = " ".repeat(width - current);
    if align_right {
        format!("{}{}", spaces, s)
    } else {
        format!("{}{}", s, spaces)
    }
}

/// Word-wrap `s` into lines of at most `width` columns
///
/// Words longer than a full line are hard-split.
pub fn wrap_text(s: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }

    let mut lines = Vec::new();
    let mut current = String::new();

    for word in s.split_whitespace() {
        let mut word = word.to_string();
        loop {
            let cw = text_width(&current);
            let ww = text_width(&word);
            let needed = if cw == 0 { ww } else { cw + 1 + ww };

            if needed <= width {
                if cw > 0 {
                    current.push(' ');
                }
                current.push_str(&word);
                break;
            }
            if cw > 0 {
                lines.push(std::mem::take(&mut current));
                continue;
            }
            // Word alone does not fit: hard split
            let head = truncate_text(&word, width);
            word = word.chars().skip(width).collect();
            lines.push(head);
            if word.is_empty() {
                break;
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Convert UTF-8 content (with ESC/POS commands) to WPC1252
///
/// ASCII bytes (0x00-0x7F) pass through untouched so commands survive.
/// Non-ASCII characters are mapped to WPC1252; anything the code page
/// cannot represent becomes `?`. The code table is selected after every
/// INIT (ESC @), which resets it, and at the start unless the content
/// opens with an INIT.
#[instrument(skip(bytes), fields(len = bytes.len()))]
pub fn encode_wpc1252(bytes: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(bytes.len() + SELECT_WPC1252.len());
    if !bytes.starts_with(&INIT) {
        result.extend_from_slice(&SELECT_WPC1252);
    }

    let text = String::from_utf8_lossy(bytes);
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\u{1B}' && chars.peek() == Some(&'@') {
            chars.next();
            result.extend_from_slice(&INIT);
            result.extend_from_slice(&SELECT_WPC1252);
            continue;
        }

        if c.is_ascii() {
            result.push(c as u8);
            continue;
        }

        let mut buf = [0u8; 4];
        let (encoded, _, had_errors) = encoding_rs::WINDOWS_1252.encode(c.encode_utf8(&mut buf));
        if had_errors || encoded.len() != 1 {
            result.push(b'?');
        } else {
            result.extend_from_slice(&encoded);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_width() {
        assert_eq!(text_width("hello"), 5);
        assert_eq!(text_width("Feijão"), 6);
        assert_eq!(text_width(""), 0);
    }

    #[test]
    fn test_pad_and_truncate() {
        assert_eq!(pad_text("hi", 5, false), "hi   ");
        assert_eq!(pad_text("hi", 5, true), "   hi");
        assert_eq!(pad_text("Açaí grande", 4, false), "Açaí");
        assert_eq!(truncate_text("coração", 3), "cor");
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(
            wrap_text("sem cebola e sem tomate", 10),
            vec!["sem cebola", "e sem", "tomate"]
        );
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert!(wrap_text("   ", 10).is_empty());
    }

    #[test]
    fn test_encode_accents() {
        let out = encode_wpc1252("ção".as_bytes());
        assert_eq!(&out[..3], &SELECT_WPC1252);
        assert_eq!(&out[3..], &[0xE7, 0xE3, b'o']);
    }

    #[test]
    fn test_encode_preserves_commands_and_reselects_after_init() {
        let out = encode_wpc1252(b"\x1B\x45\x01A\x1B@B");
        assert_eq!(
            out,
            vec![0x1B, 0x74, 16, 0x1B, 0x45, 0x01, b'A', 0x1B, 0x40, 0x1B, 0x74, 16, b'B']
        );
    }

    #[test]
    fn test_encode_leading_init_selects_once() {
        let out = encode_wpc1252("\x1B@Olá".as_bytes());
        assert_eq!(out, vec![0x1B, 0x40, 0x1B, 0x74, 16, b'O', b'l', 0xE1]);
    }

    #[test]
    fn test_encode_unmappable() {
        let out = encode_wpc1252("你".as_bytes());
        assert_eq!(&out[3..], b"?");
    }
}
