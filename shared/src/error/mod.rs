//! Unified error system for the dispatch board
//!
//! - [`ErrorCode`]: stable numeric codes (the UI owns localisation)
//! - [`AppError`]: code + message + optional structured details
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 4xxx: Order errors (transition policy, store writes)
//! - 6xxx: Messaging / printing hand-off errors
//! - 9xxx: System errors

mod codes;
mod types;

pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult};
