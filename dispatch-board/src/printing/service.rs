//! Receipt printing with a bounded wait
//!
//! The printer gets the job and a fixed amount of time to take it. After
//! that the job is dropped and reported as timed out; it is never retried
//! automatically. Immediate failures go back to the caller so the UI can
//! offer a manual retry.

use std::time::Duration;

use serde::Serialize;
use shared::Establishment;
use shared::error::{AppError, ErrorCode};
use shared::order::Order;
use thiserror::Error;
use ticket_printer::{FilePrinter, NetworkPrinter, PrintError, PrintResult, Printer};
use tracing::{info, instrument, warn};

use super::layout::ReceiptLayout;
use super::receipt::ReceiptRenderer;
use crate::core::Config;

#[derive(Debug, Error)]
pub enum ReceiptPrintError {
    #[error("No printer configured")]
    NoPrinter,

    #[error(transparent)]
    Printer(#[from] PrintError),
}

impl From<ReceiptPrintError> for AppError {
    fn from(err: ReceiptPrintError) -> Self {
        AppError::with_message(ErrorCode::PrintFailed, err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintOutcome {
    Completed,
    /// No confirmation before the timeout; the job was discarded
    TimedOut,
}

/// Printer chosen from configuration
#[derive(Debug, Clone)]
pub enum ReceiptPrinter {
    Network(NetworkPrinter),
    File(FilePrinter),
}

impl ReceiptPrinter {
    /// `PRINTER_ADDR` wins over `PRINTER_DEVICE`; `None` when neither is set
    pub fn from_config(config: &Config) -> PrintResult<Option<Self>> {
        if let Some(addr) = &config.printer_addr {
            return NetworkPrinter::from_addr(addr).map(|p| Some(ReceiptPrinter::Network(p)));
        }
        Ok(config
            .printer_device
            .as_ref()
            .map(|path| ReceiptPrinter::File(FilePrinter::new(path))))
    }
}

impl Printer for ReceiptPrinter {
    async fn print(&self, data: &[u8]) -> PrintResult<()> {
        match self {
            ReceiptPrinter::Network(p) => p.print(data).await,
            ReceiptPrinter::File(p) => p.print(data).await,
        }
    }

    async fn is_online(&self) -> bool {
        match self {
            ReceiptPrinter::Network(p) => p.is_online().await,
            ReceiptPrinter::File(p) => p.is_online().await,
        }
    }
}

pub struct PrintService<P> {
    printer: Option<P>,
    renderer: ReceiptRenderer,
    layout: ReceiptLayout,
    timeout: Duration,
}

impl<P: Printer> PrintService<P> {
    pub fn new(
        printer: Option<P>,
        renderer: ReceiptRenderer,
        layout: ReceiptLayout,
        timeout: Duration,
    ) -> Self {
        Self {
            printer,
            renderer,
            layout,
            timeout,
        }
    }

    pub fn renderer(&self) -> &ReceiptRenderer {
        &self.renderer
    }

    pub fn layout(&self) -> &ReceiptLayout {
        &self.layout
    }

    /// Plain-text preview of the receipt
    pub fn preview(&self, order: &Order, establishment: &Establishment) -> String {
        self.layout
            .to_text(&self.renderer.render(order, establishment))
    }

    #[instrument(skip(self, order, establishment), fields(order_id = %order.id))]
    pub async fn print_receipt(
        &self,
        order: &Order,
        establishment: &Establishment,
    ) -> Result<PrintOutcome, ReceiptPrintError> {
        let printer = self.printer.as_ref().ok_or(ReceiptPrintError::NoPrinter)?;
        let document = self.renderer.render(order, establishment);
        let data = self.layout.to_escpos(&document);

        match tokio::time::timeout(self.timeout, printer.print(&data)).await {
            Ok(Ok(())) => {
                info!(bytes = data.len(), "Receipt printed");
                Ok(PrintOutcome::Completed)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Receipt print failed");
                Err(e.into())
            }
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Receipt print timed out, job discarded");
                Ok(PrintOutcome::TimedOut)
            }
        }
    }
}
