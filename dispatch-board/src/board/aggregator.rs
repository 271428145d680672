//! Per-status live subscriptions merged into one board view
//!
//! The aggregator is a small supervisor: it owns one
//! [`SubscriptionHandle`] per status bucket of the active tab. Opening a
//! tab always tears the previous set down first.
//!
//! Every callback carries the generation it was opened under and is
//! checked against the current generation while holding the state lock,
//! so nothing a torn-down subscription delivers is ever applied.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use shared::order::{Order, OrderStatus, OrderType};
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, trace, warn};

use super::arrivals::NewArrivalDetector;
use crate::message::{BoardEvent, EventBus, TabKey};
use crate::store::{OrderQuery, OrderStore, SnapshotCallback, SnapshotResult, SubscriptionHandle};

#[derive(Debug, Default)]
struct BucketState {
    orders: Vec<Order>,
    error: Option<String>,
}

struct AggregatorState {
    generation: u64,
    tab: Option<TabKey>,
    buckets: HashMap<OrderStatus, BucketState>,
    handles: HashMap<OrderStatus, SubscriptionHandle>,
    detector: NewArrivalDetector,
}

impl AggregatorState {
    /// Cancel every handle and forget the tab; safe to call repeatedly
    fn teardown(&mut self) -> usize {
        self.generation += 1;
        let cancelled = self.handles.len();
        for (_, handle) in self.handles.drain() {
            handle.cancel();
        }
        self.tab = None;
        self.buckets.clear();
        self.detector.reset();
        cancelled
    }
}

/// One status column of the board
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketView {
    pub status: OrderStatus,
    pub orders: Vec<Order>,
    /// Last subscription error; `orders` is then the last good snapshot
    pub error: Option<String>,
}

/// Snapshot of the merged board
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    pub tab: Option<TabKey>,
    /// In display order of the tab's order type
    pub buckets: Vec<BucketView>,
}

impl BoardView {
    pub fn bucket(&self, status: OrderStatus) -> Option<&BucketView> {
        self.buckets.iter().find(|b| b.status == status)
    }

    pub fn orders(&self, status: OrderStatus) -> &[Order] {
        self.bucket(status).map(|b| b.orders.as_slice()).unwrap_or(&[])
    }

    pub fn find(&self, order_id: &str) -> Option<&Order> {
        self.buckets
            .iter()
            .flat_map(|b| b.orders.iter())
            .find(|o| o.id == order_id)
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.orders.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn all_failed(&self) -> bool {
        !self.buckets.is_empty() && self.buckets.iter().all(|b| b.error.is_some())
    }
}

/// Later in the graph means further along
fn progress(order_type: OrderType, status: OrderStatus) -> usize {
    order_type.rank(status).unwrap_or(0)
}

/// Live status buckets for the active tab
#[derive(Clone)]
pub struct StreamAggregator {
    store: Arc<dyn OrderStore>,
    bus: EventBus,
    state: Arc<Mutex<AggregatorState>>,
}

impl StreamAggregator {
    pub fn new(store: Arc<dyn OrderStore>, bus: EventBus, detector: NewArrivalDetector) -> Self {
        Self {
            store,
            bus,
            state: Arc::new(Mutex::new(AggregatorState {
                generation: 0,
                tab: None,
                buckets: HashMap::new(),
                handles: HashMap::new(),
                detector,
            })),
        }
    }

    pub fn active_tab(&self) -> Option<TabKey> {
        self.state.lock().tab.clone()
    }

    /// Open `tab`, replacing whatever was open before
    ///
    /// `day_start` bounds the `finalizado` bucket.
    #[instrument(skip(self), fields(tab = %tab))]
    pub fn open(&self, tab: TabKey, day_start: DateTime<Utc>) {
        let statuses = tab.order_type.board_statuses();
        let generation = {
            let mut state = self.state.lock();
            let cancelled = state.teardown();
            if cancelled > 0 {
                debug!(cancelled, "Previous tab subscriptions cancelled");
            }
            state.tab = Some(tab.clone());
            for status in statuses {
                state.buckets.insert(status, BucketState::default());
            }
            state.generation
        };

        self.bus.publish(BoardEvent::TabOpened { tab: tab.clone() });

        // The store may deliver the first snapshot from inside subscribe(),
        // so the state lock must not be held here.
        for status in statuses {
            let query = OrderQuery::bucket(&tab.establishment_id, tab.order_type, status, day_start);
            match self.store.subscribe(query, self.callback(generation, status)) {
                Ok(handle) => {
                    let mut state = self.state.lock();
                    if state.generation == generation {
                        state.handles.insert(status, handle);
                    } else {
                        handle.cancel();
                    }
                }
                Err(e) => self.apply(generation, status, Err(e)),
            }
        }

        info!(buckets = statuses.len(), "Board tab opened");
    }

    /// Cancel every live subscription of the active tab
    pub fn close(&self) {
        let mut state = self.state.lock();
        let tab = state.tab.clone();
        let cancelled = state.teardown();
        if let Some(tab) = tab {
            info!(tab = %tab, cancelled, "Board tab closed");
        }
    }

    fn callback(&self, generation: u64, status: OrderStatus) -> SnapshotCallback {
        let this = self.clone();
        Arc::new(move |result| this.apply(generation, status, result))
    }

    fn apply(&self, generation: u64, status: OrderStatus, result: SnapshotResult) {
        let mut state = self.state.lock();
        if state.generation != generation {
            trace!(%status, "Discarding snapshot for a torn-down tab");
            return;
        }
        let Some(tab) = state.tab.clone() else {
            return;
        };

        match result {
            Ok(mut orders) => {
                let query = OrderQuery::bucket(&tab.establishment_id, tab.order_type, status, Utc::now());
                query.sort(&mut orders);

                let arrivals = if status == OrderStatus::Recebido {
                    state.detector.observe(&orders, Instant::now())
                } else {
                    Vec::new()
                };

                let count = orders.len();
                let bucket = state.buckets.entry(status).or_default();
                if bucket.error.take().is_some() {
                    info!(%status, "Bucket subscription recovered");
                }
                bucket.orders = orders;

                self.bus.publish(BoardEvent::BucketUpdated { status, count });
                for order in arrivals {
                    info!(order_id = %order.id, "New order arrived");
                    self.bus.publish(BoardEvent::NewArrival {
                        order: Box::new(order),
                    });
                }
            }
            Err(e) => {
                warn!(%status, error = %e, "Bucket subscription failed, keeping last snapshot");
                let message = e.to_string();
                state.buckets.entry(status).or_default().error = Some(message.clone());
                self.bus.publish(BoardEvent::BucketFailed { status, message });

                if state.buckets.values().all(|b| b.error.is_some()) {
                    error!(tab = %tab, "Every bucket of the active tab is failing");
                    self.bus.publish(BoardEvent::AllBucketsFailed { tab });
                }
            }
        }
    }

    /// Evict elapsed highlights; returns the ids that expired
    pub fn expire_highlights(&self, now: Instant) -> Vec<String> {
        let mut state = self.state.lock();
        let expired = state.detector.evict_expired(now);
        for order_id in &expired {
            self.bus.publish(BoardEvent::HighlightExpired {
                order_id: order_id.clone(),
            });
        }
        expired
    }

    pub fn highlighted(&self) -> Vec<String> {
        self.state.lock().detector.highlighted()
    }

    pub fn highlight_window(&self) -> std::time::Duration {
        self.state.lock().detector.window()
    }

    /// Merged view of the active tab
    ///
    /// While a status change propagates an order can briefly sit in two
    /// buckets; it is shown only in the one furthest along its graph.
    pub fn view(&self) -> BoardView {
        let state = self.state.lock();
        let Some(tab) = state.tab.clone() else {
            return BoardView::default();
        };

        let mut furthest: HashMap<&str, usize> = HashMap::new();
        for (status, bucket) in &state.buckets {
            let rank = progress(tab.order_type, *status);
            for order in &bucket.orders {
                let entry = furthest.entry(order.id.as_str()).or_insert(rank);
                *entry = (*entry).max(rank);
            }
        }

        let buckets = tab
            .order_type
            .board_statuses()
            .into_iter()
            .map(|status| {
                let rank = progress(tab.order_type, status);
                let bucket = state.buckets.get(&status);
                BucketView {
                    status,
                    orders: bucket
                        .map(|b| {
                            b.orders
                                .iter()
                                .filter(|o| furthest.get(o.id.as_str()).is_none_or(|r| *r == rank))
                                .cloned()
                                .collect()
                        })
                        .unwrap_or_default(),
                    error: bucket.and_then(|b| b.error.clone()),
                }
            })
            .collect();

        BoardView {
            tab: Some(tab),
            buckets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryOrderStore;
    use chrono::Duration as ChronoDuration;
    use std::time::Duration;
    use tokio::sync::broadcast;

    fn order(order_type: OrderType, status: OrderStatus, age_mins: i64) -> Order {
        Order {
            id: String::new(),
            establishment_id: "est-1".into(),
            order_type,
            status,
            items: vec![],
            customer: Default::default(),
            payment_method: "pix".into(),
            change_for: None,
            table_number: None,
            pickup: false,
            delivery_fee: 0.0,
            coupon_discount: 0.0,
            coupon_code: None,
            subtotal: 10.0,
            total: 10.0,
            created_at: Utc::now() - ChronoDuration::minutes(age_mins),
        }
    }

    fn setup() -> (MemoryOrderStore, StreamAggregator, broadcast::Receiver<BoardEvent>) {
        let store = MemoryOrderStore::new();
        let bus = EventBus::new();
        let rx = bus.subscribe();
        let agg = StreamAggregator::new(
            Arc::new(store.clone()),
            bus,
            NewArrivalDetector::new(Duration::from_secs(15)),
        );
        (store, agg, rx)
    }

    fn day_start() -> DateTime<Utc> {
        Utc::now() - ChronoDuration::hours(6)
    }

    fn drain(rx: &mut broadcast::Receiver<BoardEvent>) -> Vec<BoardEvent> {
        let mut events = Vec::new();
        while let Ok(e) = rx.try_recv() {
            events.push(e);
        }
        events
    }

    fn arrivals(events: &[BoardEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                BoardEvent::NewArrival { order } => Some(order.id.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_open_subscribes_one_per_status() {
        let (store, agg, _rx) = setup();
        agg.open(TabKey::new("est-1", OrderType::Table), day_start());
        assert_eq!(store.active_listeners(), 4);
        assert!(store.subscribed_statuses().contains(&OrderStatus::ProntoParaServir));
        assert!(!store.subscribed_statuses().contains(&OrderStatus::EmEntrega));
    }

    #[tokio::test]
    async fn test_buckets_are_ordered() {
        let (store, agg, _rx) = setup();
        let old = store.create(order(OrderType::Delivery, OrderStatus::Recebido, 30));
        let new = store.create(order(OrderType::Delivery, OrderStatus::Recebido, 5));
        let done_old = store.create(order(OrderType::Delivery, OrderStatus::Finalizado, 60));
        let done_new = store.create(order(OrderType::Delivery, OrderStatus::Finalizado, 10));
        store.create(order(OrderType::Delivery, OrderStatus::Finalizado, 60 * 24 * 2));

        agg.open(TabKey::new("est-1", OrderType::Delivery), day_start());
        let view = agg.view();
        let ids = |s| view.orders(s).iter().map(|o| o.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(OrderStatus::Recebido), vec![old, new]);
        assert_eq!(ids(OrderStatus::Finalizado), vec![done_new, done_old]);
    }

    #[tokio::test]
    async fn test_cold_start_then_single_arrival() {
        let (store, agg, mut rx) = setup();
        store.create(order(OrderType::Delivery, OrderStatus::Recebido, 10));
        store.create(order(OrderType::Delivery, OrderStatus::Recebido, 9));

        agg.open(TabKey::new("est-1", OrderType::Delivery), day_start());
        assert!(arrivals(&drain(&mut rx)).is_empty());

        let c = store.create(order(OrderType::Delivery, OrderStatus::Recebido, 0));
        assert_eq!(arrivals(&drain(&mut rx)), vec![c.clone()]);

        // unrelated field update replays the same bucket
        store.modify(&c, |o| o.total = 42.0).unwrap();
        assert!(arrivals(&drain(&mut rx)).is_empty());
        assert_eq!(agg.highlighted(), vec![c]);
    }

    #[tokio::test]
    async fn test_failed_bucket_keeps_last_snapshot() {
        let (store, agg, mut rx) = setup();
        let id = store.create(order(OrderType::Table, OrderStatus::Preparo, 3));
        agg.open(TabKey::new("est-1", OrderType::Table), day_start());
        drain(&mut rx);

        store.fail_subscription(OrderStatus::Preparo, "permission denied");
        let view = agg.view();
        let bucket = view.bucket(OrderStatus::Preparo).unwrap();
        assert_eq!(bucket.orders[0].id, id);
        assert!(bucket.error.is_some());
        assert!(!view.all_failed());

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(e, BoardEvent::BucketFailed { .. })));
        assert!(!events.iter().any(|e| matches!(e, BoardEvent::AllBucketsFailed { .. })));

        store.recover_subscription(OrderStatus::Preparo);
        assert!(agg.view().bucket(OrderStatus::Preparo).unwrap().error.is_none());
    }

    #[tokio::test]
    async fn test_all_buckets_failed() {
        let (store, agg, mut rx) = setup();
        agg.open(TabKey::new("est-1", OrderType::Table), day_start());
        for status in OrderType::Table.board_statuses() {
            store.fail_subscription(status, "offline");
        }
        assert!(agg.view().all_failed());
        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(e, BoardEvent::AllBucketsFailed { .. })));
    }

    #[tokio::test]
    async fn test_tab_switch_has_no_leakage() {
        let (store, agg, mut rx) = setup();
        agg.open(TabKey::new("est-1", OrderType::Delivery), day_start());
        agg.open(TabKey::new("est-1", OrderType::Table), day_start());
        assert_eq!(store.active_listeners(), 4);
        drain(&mut rx);

        let id = store.create(order(OrderType::Delivery, OrderStatus::Recebido, 0));
        assert!(drain(&mut rx).is_empty());
        assert!(agg.view().find(&id).is_none());
        assert!(!store.subscribed_statuses().contains(&OrderStatus::EmEntrega));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (store, agg, mut rx) = setup();
        agg.open(TabKey::new("est-1", OrderType::Table), day_start());
        agg.close();
        agg.close();
        assert_eq!(store.active_listeners(), 0);
        assert!(agg.view().tab.is_none());
        drain(&mut rx);

        store.create(order(OrderType::Table, OrderStatus::Recebido, 0));
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_order_moves_between_buckets() {
        let (store, agg, _rx) = setup();
        let id = store.create(order(OrderType::Table, OrderStatus::Recebido, 1));
        agg.open(TabKey::new("est-1", OrderType::Table), day_start());

        store.update_status(&id, OrderStatus::Preparo).await.unwrap();
        let view = agg.view();
        assert!(view.orders(OrderStatus::Recebido).is_empty());
        assert_eq!(view.orders(OrderStatus::Preparo)[0].id, id);
    }

    #[tokio::test]
    async fn test_view_hides_stale_duplicate() {
        let (store, agg, _rx) = setup();
        let mut o = order(OrderType::Table, OrderStatus::Recebido, 1);
        o.id = "dup".into();
        store.insert(o.clone());
        agg.open(TabKey::new("est-1", OrderType::Table), day_start());

        // preparo delivers first; recebido has not caught up yet
        let generation = agg.state.lock().generation;
        let mut moved = o.clone();
        moved.status = OrderStatus::Preparo;
        agg.apply(generation, OrderStatus::Preparo, Ok(vec![moved]));

        let view = agg.view();
        assert!(view.orders(OrderStatus::Recebido).is_empty());
        assert_eq!(view.orders(OrderStatus::Preparo).len(), 1);
        assert_eq!(view.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_highlight_expiry() {
        let (store, agg, mut rx) = setup();
        agg.open(TabKey::new("est-1", OrderType::Delivery), day_start());
        let id = store.create(order(OrderType::Delivery, OrderStatus::Recebido, 0));
        drain(&mut rx);

        tokio::time::advance(Duration::from_secs(16)).await;
        assert_eq!(agg.expire_highlights(Instant::now()), vec![id.clone()]);
        assert!(agg.highlighted().is_empty());
        let events = drain(&mut rx);
        assert!(matches!(&events[..], [BoardEvent::HighlightExpired { order_id }] if *order_id == id));
    }
}
