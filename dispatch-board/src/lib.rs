//! Dispatch Board - live order board for the kitchen and counter
//!
//! # Overview
//!
//! - **Buckets** (`board`): one live store subscription per status column,
//!   merged into a single view per tab (delivery or table)
//! - **Transitions** (`orders`): advance along the status graph, remove
//! - **Messaging** (`messaging`): customer message drafts and hand-off links
//! - **Receipts** (`printing`): ESC/POS receipts with a bounded print wait
//! - **Alerts** (`board::alerts`): notification and sound on new arrivals
//!
//! # Module layout
//!
//! ```text
//! dispatch-board/src/
//! ├── core/          # config, background tasks
//! ├── board/         # aggregator, arrivals, alerts, facade
//! ├── store/         # document store boundary + in-memory store
//! ├── message/       # board event bus
//! ├── orders/        # status transition engine
//! ├── messaging/     # phone normalisation, templates, hand-off
//! ├── printing/      # receipt document, layout, print service
//! └── utils/         # logging, business-timezone helpers
//! ```

pub mod board;
pub mod core;
pub mod message;
pub mod messaging;
pub mod orders;
pub mod printing;
pub mod store;
pub mod utils;

// Re-export public types
pub use board::{BoardView, DispatchBoard};
pub use core::{Config, ConfigError};
pub use message::{BoardEvent, EventBus, TabKey};
pub use orders::{StatusTransitionEngine, TransitionOutcome};
pub use printing::{PrintOutcome, ReceiptPrinter};
pub use store::{MemoryOrderStore, OrderStore, StoreError};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
    ____  _                  __       __
   / __ \(_)________  ____ _/ /______/ /_
  / / / / / ___/ __ \/ __ `/ __/ ___/ __ \
 / /_/ / (__  ) /_/ / /_/ / /_/ /__/ / / /
/_____/_/____/ .___/\__,_/\__/\___/_/ /_/
            /_/        board
    "#
    );
}
