//! Utilities - logging and business-timezone helpers

pub mod logger;
pub mod time;
