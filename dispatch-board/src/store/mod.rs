//! Document store boundary
//!
//! The board only needs three primitives from the store:
//!
//! - a live query with equality/range filters and ordering that pushes
//!   full snapshots to a callback ([`OrderStore::subscribe`])
//! - a partial update of the `status` field ([`OrderStore::update_status`])
//! - a delete by id ([`OrderStore::delete`])
//!
//! [`MemoryOrderStore`] implements all of them in-process.

mod memory;

pub use memory::MemoryOrderStore;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::order::{Order, OrderStatus, OrderType};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Store errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Write rejected: {0}")]
    WriteRejected(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Subscription failed: {0}")]
    Subscription(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// `created_at` ordering within a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Live query for one status bucket
#[derive(Debug, Clone, PartialEq)]
pub struct OrderQuery {
    pub establishment_id: String,
    pub order_type: OrderType,
    pub status: OrderStatus,
    /// Range filter `created_at >= created_since`
    pub created_since: Option<DateTime<Utc>>,
    pub direction: SortDirection,
}

impl OrderQuery {
    /// Query for one board bucket
    ///
    /// `finalizado` is newest-first and bounded to `day_start`; every
    /// other bucket is oldest-first and unbounded.
    pub fn bucket(
        establishment_id: &str,
        order_type: OrderType,
        status: OrderStatus,
        day_start: DateTime<Utc>,
    ) -> Self {
        let finalized = status == OrderStatus::Finalizado;
        Self {
            establishment_id: establishment_id.to_string(),
            order_type,
            status,
            created_since: finalized.then_some(day_start),
            direction: if finalized {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            },
        }
    }

    pub fn matches(&self, order: &Order) -> bool {
        order.establishment_id == self.establishment_id
            && order.order_type == self.order_type
            && order.status == self.status
            && self.created_since.is_none_or(|since| order.created_at >= since)
    }

    /// Sort a snapshot in this query's direction (stable)
    pub fn sort(&self, orders: &mut [Order]) {
        match self.direction {
            SortDirection::Ascending => orders.sort_by_key(|o| o.created_at),
            SortDirection::Descending => orders.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
    }
}

/// One full snapshot, or the error the subscription reported
pub type SnapshotResult = StoreResult<Vec<Order>>;

/// Callback receiving snapshots for one subscription
pub type SnapshotCallback = Arc<dyn Fn(SnapshotResult) + Send + Sync>;

/// Handle to a live subscription
///
/// Cancelling is idempotent. Once cancelled the store never invokes the
/// callback again.
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    token: CancellationToken,
}

impl SubscriptionHandle {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Document store operations consumed by the board
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Open a live query; the current snapshot is delivered right away
    fn subscribe(
        &self,
        query: OrderQuery,
        callback: SnapshotCallback,
    ) -> StoreResult<SubscriptionHandle>;

    /// Partial update of the `status` field only
    async fn update_status(&self, order_id: &str, status: OrderStatus) -> StoreResult<()>;

    async fn delete(&self, order_id: &str) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn order_at(id: &str, created_at: DateTime<Utc>) -> Order {
        Order {
            id: id.to_string(),
            establishment_id: "est-1".into(),
            order_type: OrderType::Delivery,
            status: OrderStatus::Finalizado,
            items: vec![],
            customer: Default::default(),
            payment_method: "pix".into(),
            change_for: None,
            table_number: None,
            pickup: false,
            delivery_fee: 0.0,
            coupon_discount: 0.0,
            coupon_code: None,
            subtotal: 0.0,
            total: 0.0,
            created_at,
        }
    }

    #[test]
    fn test_finalized_bucket_is_bounded_and_descending() {
        let day_start = Utc.with_ymd_and_hms(2026, 10, 18, 3, 0, 0).unwrap();
        let q = OrderQuery::bucket("est-1", OrderType::Delivery, OrderStatus::Finalizado, day_start);
        assert_eq!(q.direction, SortDirection::Descending);
        assert!(q.matches(&order_at("a", day_start)));
        assert!(!q.matches(&order_at("b", day_start - Duration::seconds(1))));

        let mut orders = vec![
            order_at("old", day_start + Duration::minutes(1)),
            order_at("new", day_start + Duration::minutes(5)),
        ];
        q.sort(&mut orders);
        assert_eq!(orders[0].id, "new");
    }

    #[test]
    fn test_live_bucket_is_unbounded_and_ascending() {
        let day_start = Utc.with_ymd_and_hms(2026, 10, 18, 3, 0, 0).unwrap();
        let q = OrderQuery::bucket("est-1", OrderType::Delivery, OrderStatus::Recebido, day_start);
        assert_eq!(q.direction, SortDirection::Ascending);
        assert!(q.created_since.is_none());

        let mut yesterday = order_at("y", day_start - Duration::days(1));
        yesterday.status = OrderStatus::Recebido;
        assert!(q.matches(&yesterday));
    }

    #[test]
    fn test_handle_cancel_is_idempotent() {
        let handle = SubscriptionHandle::new(CancellationToken::new());
        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
    }
}
