//! Order data model
//!
//! - [`Order`]: the record flowing through the board
//! - [`OrderType`] / [`OrderStatus`]: the two status graphs

pub mod payment;
pub mod status;
pub mod types;

// Re-exports
pub use payment::payment_label;
pub use status::{OrderStatus, OrderType};
pub use types::{Address, AddOn, Customer, Order, OrderItem, SHARED_RECIPIENT};
