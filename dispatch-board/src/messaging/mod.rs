//! Customer messaging
//!
//! Composing a message and handing it off are separate steps:
//! [`OutboundMessageComposer`] is pure and produces a [`MessageDraft`];
//! a [`HandOff`] opens the draft's link for a person to send.

mod composer;
mod handoff;
mod phone;
pub mod templates;

pub use composer::{MessageDraft, OutboundMessageComposer};
pub use handoff::{HandOff, HandOffError, LogHandOff};
pub use phone::normalize_phone;

use shared::error::{AppError, ErrorCode};
use shared::order::OrderStatus;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ComposeError {
    #[error("Customer has no phone")]
    MissingPhone,

    #[error("Invalid phone: {0:?}")]
    InvalidPhone(String),

    #[error("No message template for status {0}")]
    NoTemplate(OrderStatus),

    #[error("Order {0} has an amount out of range")]
    AmountOutOfRange(String),
}

impl From<ComposeError> for AppError {
    fn from(err: ComposeError) -> Self {
        let code = match err {
            ComposeError::MissingPhone | ComposeError::InvalidPhone(_) => ErrorCode::InvalidPhone,
            ComposeError::NoTemplate(_) => ErrorCode::NoMessageTemplate,
            ComposeError::AmountOutOfRange(_) => ErrorCode::ValidationFailed,
        };
        AppError::with_message(code, err.to_string())
    }
}
