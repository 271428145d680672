use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use thiserror::Error;

use crate::board::arrivals::MAX_HIGHLIGHT_WINDOW;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Board configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | BOARD_TIMEZONE | America/Sao_Paulo | Establishment timezone (day boundary, receipt times) |
/// | HIGHLIGHT_WINDOW_SECS | 15 | How long a new arrival stays highlighted (at most 3600) |
/// | PRINT_TIMEOUT_MS | 5000 | Fallback timeout before a print surface is discarded |
/// | PAPER_WIDTH | 48 | Receipt columns (80mm = 48, 58mm = 32) |
/// | MESSAGING_HOST | wa.me | Host of the messaging hand-off link |
/// | PHONE_COUNTRY_CODE | 55 | Country code prepended to customer phones |
/// | ALLOW_REMOVE_AWAITING_PAYMENT | true | Whether `aguardando_pagamento` orders can be deleted |
/// | EVENT_CHANNEL_CAPACITY | 256 | Board event broadcast capacity |
/// | PRINTER_ADDR | - | Network printer `host:port` |
/// | PRINTER_DEVICE | - | Raw printer device or spool file, used when no address is set |
/// | LOG_LEVEL | info | Default log filter when RUST_LOG is unset |
/// | LOG_DIR | - | Directory for daily rolling log files |
///
/// # Example
///
/// ```ignore
/// BOARD_TIMEZONE=America/Manaus PRINTER_ADDR=192.168.0.50:9100 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub timezone: Tz,
    pub highlight_window: Duration,
    pub print_timeout: Duration,
    pub paper_width: usize,
    pub messaging_host: String,
    pub phone_country_code: String,
    pub allow_remove_awaiting_payment: bool,
    pub event_channel_capacity: usize,
    pub printer_addr: Option<String>,
    pub printer_device: Option<String>,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl Config {
    /// Load from the process environment (after `.env`, if present)
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    ///
    /// Unset or unparsable numeric values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let timezone = match lookup("BOARD_TIMEZONE") {
            Some(name) => name
                .trim()
                .parse::<Tz>()
                .map_err(|_| ConfigError::InvalidTimezone(name.clone()))?,
            None => chrono_tz::America::Sao_Paulo,
        };

        let paper_width: usize = parsed(&lookup, "PAPER_WIDTH").unwrap_or(48);
        if paper_width < 24 {
            return Err(ConfigError::InvalidValue {
                key: "PAPER_WIDTH",
                value: paper_width.to_string(),
            });
        }

        let highlight_window = Duration::from_secs(parsed(&lookup, "HIGHLIGHT_WINDOW_SECS").unwrap_or(15));
        if highlight_window > MAX_HIGHLIGHT_WINDOW {
            return Err(ConfigError::InvalidValue {
                key: "HIGHLIGHT_WINDOW_SECS",
                value: highlight_window.as_secs().to_string(),
            });
        }

        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            timezone,
            highlight_window,
            print_timeout: Duration::from_millis(parsed(&lookup, "PRINT_TIMEOUT_MS").unwrap_or(5000)),
            paper_width,
            messaging_host: non_empty("MESSAGING_HOST").unwrap_or_else(|| "wa.me".into()),
            phone_country_code: non_empty("PHONE_COUNTRY_CODE").unwrap_or_else(|| "55".into()),
            allow_remove_awaiting_payment: parsed(&lookup, "ALLOW_REMOVE_AWAITING_PAYMENT").unwrap_or(true),
            event_channel_capacity: parsed(&lookup, "EVENT_CHANNEL_CAPACITY").unwrap_or(256),
            printer_addr: non_empty("PRINTER_ADDR"),
            printer_device: non_empty("PRINTER_DEVICE"),
            log_level: non_empty("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_dir: non_empty("LOG_DIR"),
        })
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::America::Sao_Paulo,
            highlight_window: Duration::from_secs(15),
            print_timeout: Duration::from_millis(5000),
            paper_width: 48,
            messaging_host: "wa.me".into(),
            phone_country_code: "55".into(),
            allow_remove_awaiting_payment: true,
            event_channel_capacity: 256,
            printer_addr: None,
            printer_device: None,
            log_level: "info".into(),
            log_dir: None,
        }
    }
}
