//! Shared types for the dispatch board
//!
//! Order records as they come out of the document store, the status
//! graphs they move through, establishment context used for receipts,
//! money helpers and the unified error codes surfaced to the UI.

pub mod error;
pub mod models;
pub mod money;
pub mod order;

// Re-exports
pub use error::{AppError, AppResult, ErrorCode};
pub use models::Establishment;
pub use order::{Address, AddOn, Customer, Order, OrderItem, OrderStatus, OrderType};
pub use serde::{Deserialize, Serialize};
