//! Customer receipts
//!
//! - [`ReceiptRenderer`]: order + establishment -> [`ReceiptDocument`]
//! - [`ReceiptLayout`]: document -> ESC/POS bytes or plain text
//! - [`PrintService`]: sends the bytes with a fallback timeout

mod layout;
mod receipt;
mod service;

pub use layout::ReceiptLayout;
pub use receipt::{
    CustomerBlock, ItemBlock, ReceiptDocument, ReceiptHeader, ReceiptLine, ReceiptRenderer,
    TotalLine,
};
pub use service::{PrintOutcome, PrintService, ReceiptPrintError, ReceiptPrinter};
