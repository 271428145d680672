//! Board event bus
//!
//! ```text
//! StreamAggregator ──▶ NewArrival ──┐
//! TransitionEngine ──▶ StatusAdvanced / MessageDrafted ──┤
//!                                   ▼
//!                      broadcast::Sender<BoardEvent>
//!                                   │
//!                  ┌────────────────┼────────────────┐
//!                  ▼                ▼                ▼
//!           AlertDispatcher      UI views        tests
//! ```

mod bus;

pub use bus::EventBus;

use serde::Serialize;
use shared::order::{Order, OrderStatus, OrderType};

/// Active board tab
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TabKey {
    pub establishment_id: String,
    pub order_type: OrderType,
}

impl TabKey {
    pub fn new(establishment_id: impl Into<String>, order_type: OrderType) -> Self {
        Self {
            establishment_id: establishment_id.into(),
            order_type,
        }
    }
}

impl std::fmt::Display for TabKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.establishment_id, self.order_type)
    }
}

/// Events published by the board
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoardEvent {
    /// A fresh set of subscriptions is live for this tab
    TabOpened { tab: TabKey },
    /// A bucket got a new snapshot
    BucketUpdated {
        status: OrderStatus,
        count: usize,
    },
    /// A bucket's subscription reported an error; it keeps its last data
    BucketFailed {
        status: OrderStatus,
        message: String,
    },
    /// Every bucket of the active tab is failing
    AllBucketsFailed { tab: TabKey },
    /// Order entered `recebido` and was not highlighted yet
    NewArrival { order: Box<Order> },
    /// Highlight window for an order elapsed
    HighlightExpired { order_id: String },
    StatusAdvanced {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },
    OrderRemoved { order_id: String },
    /// Customer message ready for manual sending
    MessageDrafted {
        order_id: String,
        status: OrderStatus,
        uri: String,
    },
}

impl BoardEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BoardEvent::TabOpened { .. } => "tab_opened",
            BoardEvent::BucketUpdated { .. } => "bucket_updated",
            BoardEvent::BucketFailed { .. } => "bucket_failed",
            BoardEvent::AllBucketsFailed { .. } => "all_buckets_failed",
            BoardEvent::NewArrival { .. } => "new_arrival",
            BoardEvent::HighlightExpired { .. } => "highlight_expired",
            BoardEvent::StatusAdvanced { .. } => "status_advanced",
            BoardEvent::OrderRemoved { .. } => "order_removed",
            BoardEvent::MessageDrafted { .. } => "message_drafted",
        }
    }
}
