//! # ticket-printer
//!
//! ESC/POS thermal printer library for Latin-script receipts.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - ESC/POS command building
//! - WPC1252 encoding (Portuguese accents: ç, ã, é, ...)
//! - Column width helpers for 58mm/80mm paper
//! - Network printing (TCP port 9100) and raw device/spool files
//!
//! WHAT to print (receipt layout) stays in the dispatch board.
//!
//! ## Example
//!
//! ```ignore
//! use ticket_printer::{Align, EscPosBuilder, NetworkPrinter, Printer};
//!
//! let mut builder = EscPosBuilder::new(48);
//! builder.align(Align::Center).double_size().line("Pizzaria Bella");
//! builder.reset_size().align(Align::Left).sep('=');
//! builder.line_lr("Pedido #AB12CD", "18/10/2026 19:42");
//! builder.cut_feed(4);
//!
//! let printer = NetworkPrinter::new("192.168.1.100", 9100)?;
//! printer.print(&builder.build()).await?;
//! ```

mod encoding;
mod error;
mod escpos;
mod printer;

// Re-exports
pub use encoding::{encode_wpc1252, pad_text, text_width, truncate_text, wrap_text};
pub use error::{PrintError, PrintResult};
pub use escpos::{Align, EscPosBuilder};
pub use printer::{FilePrinter, NetworkPrinter, Printer};
