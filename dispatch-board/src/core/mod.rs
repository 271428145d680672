pub mod config;
pub mod tasks;

pub use config::{Config, ConfigError};
pub use tasks::{BackgroundTasks, TaskKind};
