//! Order status transitions

mod engine;
mod error;

pub use engine::{StatusTransitionEngine, TransitionOutcome};
pub use error::{PolicyViolation, TransitionError};
