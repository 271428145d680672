//! Read-only context records consumed by the board

pub mod establishment;

pub use establishment::Establishment;
