//! Error codes surfaced to the board UI
//!
//! Codes are `u16` on the wire so the frontend can map them without
//! parsing messages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,

    // ==================== 4xxx: Order ====================
    /// Order not found in the store
    OrderNotFound = 4001,
    /// Order is already finalized, nothing further is allowed
    OrderTerminal = 4002,
    /// Order cannot be removed in its current status
    OrderNotRemovable = 4003,
    /// Status does not belong to the order type's graph
    InvalidTransition = 4004,
    /// Remote update was rejected or timed out
    OrderWriteFailed = 4005,

    // ==================== 6xxx: Hand-off ====================
    /// Customer phone missing or malformed
    InvalidPhone = 6001,
    /// No message template for the status
    NoMessageTemplate = 6002,
    /// Messaging link could not be opened
    HandOffFailed = 6003,
    /// Print dialog blocked or render failed
    PrintFailed = 6101,
    /// Printer did not confirm before the fallback timeout
    PrintTimeout = 6102,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Every live bucket of the active tab failed
    SubscriptionUnavailable = 9002,
    /// Configuration error
    ConfigError = 9003,
}

impl ErrorCode {
    /// Numeric value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Whether a manual retry by the user makes sense
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::OrderWriteFailed
                | ErrorCode::HandOffFailed
                | ErrorCode::PrintFailed
                | ErrorCode::PrintTimeout
                | ErrorCode::SubscriptionUnavailable
        )
    }

    /// Default message
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "Success",
            ErrorCode::Unknown => "Unknown error",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderTerminal => "Order is already finalized",
            ErrorCode::OrderNotRemovable => "Order cannot be removed in its current status",
            ErrorCode::InvalidTransition => "Invalid status transition",
            ErrorCode::OrderWriteFailed => "Failed to update order",
            ErrorCode::InvalidPhone => "Customer phone is missing or invalid",
            ErrorCode::NoMessageTemplate => "No message template for this status",
            ErrorCode::HandOffFailed => "Could not open the messaging app",
            ErrorCode::PrintFailed => "Print failed",
            ErrorCode::PrintTimeout => "Printer did not respond in time",
            ErrorCode::InternalError => "Internal error",
            ErrorCode::SubscriptionUnavailable => "Live order feed unavailable",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown `u16`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),

            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderTerminal),
            4003 => Ok(ErrorCode::OrderNotRemovable),
            4004 => Ok(ErrorCode::InvalidTransition),
            4005 => Ok(ErrorCode::OrderWriteFailed),

            6001 => Ok(ErrorCode::InvalidPhone),
            6002 => Ok(ErrorCode::NoMessageTemplate),
            6003 => Ok(ErrorCode::HandOffFailed),
            6101 => Ok(ErrorCode::PrintFailed),
            6102 => Ok(ErrorCode::PrintTimeout),

            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::SubscriptionUnavailable),
            9003 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}
