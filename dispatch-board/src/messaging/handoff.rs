//! Delivery side of the messaging hand-off
//!
//! Opening the link is the only effect; nothing is awaited from the
//! messaging app and the staff member sends the message by hand.

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use super::MessageDraft;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum HandOffError {
    #[error("Could not open hand-off link: {0}")]
    Open(String),
}

impl From<HandOffError> for AppError {
    fn from(err: HandOffError) -> Self {
        AppError::with_message(ErrorCode::HandOffFailed, err.to_string())
    }
}

pub trait HandOff: Send + Sync {
    fn open(&self, draft: &MessageDraft) -> Result<(), HandOffError>;
}

/// Hand-off that only logs the link
#[derive(Debug, Default)]
pub struct LogHandOff;

impl HandOff for LogHandOff {
    fn open(&self, draft: &MessageDraft) -> Result<(), HandOffError> {
        tracing::info!(
            order_id = %draft.order_id,
            status = %draft.status,
            uri = %draft.uri,
            "Message ready to send"
        );
        Ok(())
    }
}
