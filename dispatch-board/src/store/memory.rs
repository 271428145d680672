//! In-process document store
//!
//! Behaves like the remote store as far as the board can observe:
//! live queries get an initial snapshot on subscribe and a fresh full
//! snapshot whenever a document entering or leaving their result set
//! changes. Fault injection hooks let tests break individual buckets
//! and writes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared::order::{Order, OrderStatus};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::{
    OrderQuery, OrderStore, SnapshotCallback, SnapshotResult, StoreError, StoreResult,
    SubscriptionHandle,
};

struct Listener {
    query: OrderQuery,
    callback: SnapshotCallback,
    token: CancellationToken,
}

#[derive(Default)]
struct Inner {
    orders: HashMap<String, Order>,
    listeners: Vec<Listener>,
    failing: HashMap<OrderStatus, String>,
    next_write_error: Option<StoreError>,
}

impl Inner {
    fn snapshot(&self, query: &OrderQuery) -> SnapshotResult {
        if let Some(message) = self.failing.get(&query.status) {
            return Err(StoreError::Subscription(message.clone()));
        }
        let mut orders: Vec<Order> = self
            .orders
            .values()
            .filter(|o| query.matches(o))
            .cloned()
            .collect();
        query.sort(&mut orders);
        Ok(orders)
    }

    /// Snapshots for every live listener whose result set is touched by the change
    fn pending_for(&mut self, before: Option<&Order>, after: Option<&Order>) -> Vec<Delivery> {
        self.listeners.retain(|l| !l.token.is_cancelled());
        self.listeners
            .iter()
            .filter(|l| {
                before.is_some_and(|o| l.query.matches(o))
                    || after.is_some_and(|o| l.query.matches(o))
            })
            .map(|l| Delivery {
                callback: l.callback.clone(),
                token: l.token.clone(),
                result: self.snapshot(&l.query),
            })
            .collect()
    }

    fn pending_for_status(&mut self, status: OrderStatus) -> Vec<Delivery> {
        self.listeners.retain(|l| !l.token.is_cancelled());
        self.listeners
            .iter()
            .filter(|l| l.query.status == status)
            .map(|l| Delivery {
                callback: l.callback.clone(),
                token: l.token.clone(),
                result: self.snapshot(&l.query),
            })
            .collect()
    }
}

struct Delivery {
    callback: SnapshotCallback,
    token: CancellationToken,
    result: SnapshotResult,
}

/// Callbacks run outside the store lock so they may call back into the store
fn deliver(deliveries: Vec<Delivery>) {
    for d in deliveries {
        if d.token.is_cancelled() {
            continue;
        }
        (d.callback)(d.result);
    }
}

/// In-memory [`OrderStore`]
#[derive(Clone, Default)]
pub struct MemoryOrderStore {
    inner: Arc<Mutex<Inner>>,
    writes: Arc<AtomicU64>,
    write_delay: Arc<Mutex<Option<Duration>>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an order as the ordering flow would; the store assigns the id
    pub fn create(&self, mut order: Order) -> String {
        order.id = uuid::Uuid::new_v4().simple().to_string();
        let id = order.id.clone();
        self.insert(order);
        id
    }

    /// Insert or replace a document as-is
    pub fn insert(&self, order: Order) {
        let deliveries = {
            let mut inner = self.inner.lock();
            let before = inner.orders.insert(order.id.clone(), order.clone());
            inner.pending_for(before.as_ref(), Some(&order))
        };
        deliver(deliveries);
    }

    /// Mutate arbitrary fields of a stored document
    pub fn modify(&self, order_id: &str, f: impl FnOnce(&mut Order)) -> StoreResult<()> {
        let deliveries = {
            let mut inner = self.inner.lock();
            let Some(current) = inner.orders.get(order_id).cloned() else {
                return Err(StoreError::NotFound(order_id.to_string()));
            };
            let mut updated = current.clone();
            f(&mut updated);
            inner.orders.insert(order_id.to_string(), updated.clone());
            inner.pending_for(Some(&current), Some(&updated))
        };
        deliver(deliveries);
        Ok(())
    }

    pub fn get(&self, order_id: &str) -> Option<Order> {
        self.inner.lock().orders.get(order_id).cloned()
    }

    /// Make every subscription on `status` report an error until recovered
    pub fn fail_subscription(&self, status: OrderStatus, message: &str) {
        let deliveries = {
            let mut inner = self.inner.lock();
            inner.failing.insert(status, message.to_string());
            inner.pending_for_status(status)
        };
        deliver(deliveries);
    }

    pub fn recover_subscription(&self, status: OrderStatus) {
        let deliveries = {
            let mut inner = self.inner.lock();
            inner.failing.remove(&status);
            inner.pending_for_status(status)
        };
        deliver(deliveries);
    }

    /// The next write (update or delete) fails with `error`
    pub fn fail_next_write(&self, error: StoreError) {
        self.inner.lock().next_write_error = Some(error);
    }

    /// Simulated round-trip latency applied to writes
    pub fn set_write_delay(&self, delay: Option<Duration>) {
        *self.write_delay.lock() = delay;
    }

    /// Successful writes so far
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Subscriptions that have not been cancelled
    pub fn active_listeners(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.listeners.retain(|l| !l.token.is_cancelled());
        inner.listeners.len()
    }

    /// Statuses with at least one live subscription
    pub fn subscribed_statuses(&self) -> HashSet<OrderStatus> {
        let mut inner = self.inner.lock();
        inner.listeners.retain(|l| !l.token.is_cancelled());
        inner.listeners.iter().map(|l| l.query.status).collect()
    }

    async fn simulate_latency(&self) {
        let delay = *self.write_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    #[instrument(skip(self, callback), fields(status = %query.status, order_type = %query.order_type))]
    fn subscribe(
        &self,
        query: OrderQuery,
        callback: SnapshotCallback,
    ) -> StoreResult<SubscriptionHandle> {
        let token = CancellationToken::new();
        let initial = {
            let mut inner = self.inner.lock();
            let result = inner.snapshot(&query);
            inner.listeners.push(Listener {
                query,
                callback: callback.clone(),
                token: token.clone(),
            });
            result
        };
        debug!("Subscription opened");
        deliver(vec![Delivery {
            callback,
            token: token.clone(),
            result: initial,
        }]);
        Ok(SubscriptionHandle::new(token))
    }

    #[instrument(skip(self))]
    async fn update_status(&self, order_id: &str, status: OrderStatus) -> StoreResult<()> {
        self.simulate_latency().await;
        let deliveries = {
            let mut inner = self.inner.lock();
            if let Some(err) = inner.next_write_error.take() {
                return Err(err);
            }
            let Some(current) = inner.orders.get(order_id).cloned() else {
                return Err(StoreError::NotFound(order_id.to_string()));
            };
            let mut updated = current.clone();
            updated.status = status;
            inner.orders.insert(order_id.to_string(), updated.clone());
            self.writes.fetch_add(1, Ordering::SeqCst);
            inner.pending_for(Some(&current), Some(&updated))
        };
        deliver(deliveries);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, order_id: &str) -> StoreResult<()> {
        self.simulate_latency().await;
        let deliveries = {
            let mut inner = self.inner.lock();
            if let Some(err) = inner.next_write_error.take() {
                return Err(err);
            }
            let Some(removed) = inner.orders.remove(order_id) else {
                return Err(StoreError::NotFound(order_id.to_string()));
            };
            self.writes.fetch_add(1, Ordering::SeqCst);
            inner.pending_for(Some(&removed), None)
        };
        deliver(deliveries);
        Ok(())
    }
}
