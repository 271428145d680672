//! New arrival detection for the `recebido` bucket

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use shared::order::Order;
use tokio::time::Instant;

/// Longest highlight window accepted
pub const MAX_HIGHLIGHT_WINDOW: Duration = Duration::from_secs(3600);

/// Turns successive `recebido` snapshots into one-shot arrival alerts
///
/// Keeps the previous snapshot's ids and diffs each new snapshot against
/// them. The first snapshot after [`reset`](Self::reset) only sets the
/// baseline. Alerted ids stay highlighted for `window` and are not alerted
/// again while highlighted.
#[derive(Debug)]
pub struct NewArrivalDetector {
    previous: Option<HashSet<String>>,
    /// id -> highlight expiry
    highlighted: HashMap<String, Instant>,
    window: Duration,
}

impl NewArrivalDetector {
    /// `window` is capped at [`MAX_HIGHLIGHT_WINDOW`]
    pub fn new(window: Duration) -> Self {
        Self {
            previous: None,
            highlighted: HashMap::new(),
            window: window.min(MAX_HIGHLIGHT_WINDOW),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Feed one full `recebido` snapshot, returning the orders to alert on
    pub fn observe(&mut self, snapshot: &[Order], now: Instant) -> Vec<Order> {
        let current: HashSet<String> = snapshot.iter().map(|o| o.id.clone()).collect();

        let Some(previous) = self.previous.replace(current) else {
            tracing::debug!(baseline = snapshot.len(), "Arrival baseline captured");
            return Vec::new();
        };

        let mut arrived = Vec::new();
        for order in snapshot {
            if previous.contains(&order.id) || self.highlighted.contains_key(&order.id) {
                continue;
            }
            self.highlighted.insert(order.id.clone(), now + self.window);
            arrived.push(order.clone());
        }
        arrived
    }

    /// Drop highlights whose window has elapsed; returns the evicted ids
    pub fn evict_expired(&mut self, now: Instant) -> Vec<String> {
        let mut expired: Vec<String> = self
            .highlighted
            .iter()
            .filter(|(_, until)| **until <= now)
            .map(|(id, _)| id.clone())
            .collect();
        expired.sort();
        for id in &expired {
            self.highlighted.remove(id);
        }
        expired
    }

    pub fn is_highlighted(&self, order_id: &str) -> bool {
        self.highlighted.contains_key(order_id)
    }

    /// Currently highlighted ids, sorted
    pub fn highlighted(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.highlighted.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Forget the baseline and all highlights (tab switch)
    pub fn reset(&mut self) {
        self.previous = None;
        self.highlighted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::order::{OrderStatus, OrderType};

    fn order(id: &str) -> Order {
        Order {
            id: id.to_string(),
            establishment_id: "est-1".into(),
            order_type: OrderType::Delivery,
            status: OrderStatus::Recebido,
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
            created_at: Utc::now(),
        }
    }

    fn ids(orders: &[Order]) -> Vec<&str> {
        orders.iter().map(|o| o.id.as_str()).collect()
    }

    #[test]
    fn test_cold_start_is_baseline() {
        let mut detector = NewArrivalDetector::new(Duration::from_secs(15));
        let arrived = detector.observe(&[order("a"), order("b")], Instant::now());
        assert!(arrived.is_empty());
        assert!(detector.highlighted().is_empty());
    }

    #[test]
    fn test_single_new_order() {
        let mut detector = NewArrivalDetector::new(Duration::from_secs(15));
        let now = Instant::now();
        detector.observe(&[order("a"), order("b")], now);
        let arrived = detector.observe(&[order("a"), order("b"), order("c")], now);
        assert_eq!(ids(&arrived), vec!["c"]);
        assert!(detector.is_highlighted("c"));
    }

    #[test]
    fn test_identical_replay_emits_nothing() {
        let mut detector = NewArrivalDetector::new(Duration::from_secs(15));
        let now = Instant::now();
        detector.observe(&[order("a")], now);
        detector.observe(&[order("a"), order("b")], now);

        let mut touched = order("b");
        touched.total = 99.0;
        let arrived = detector.observe(&[order("a"), touched], now);
        assert!(arrived.is_empty());
    }

    #[test]
    fn test_flicker_during_highlight_does_not_realert() {
        let mut detector = NewArrivalDetector::new(Duration::from_secs(15));
        let now = Instant::now();
        detector.observe(&[], now);
        assert_eq!(detector.observe(&[order("a")], now).len(), 1);
        detector.observe(&[], now);
        assert!(detector.observe(&[order("a")], now).is_empty());
    }

    #[test]
    fn test_eviction_after_window() {
        let mut detector = NewArrivalDetector::new(Duration::from_secs(15));
        let now = Instant::now();
        detector.observe(&[], now);
        detector.observe(&[order("a")], now);

        assert!(detector.evict_expired(now + Duration::from_secs(14)).is_empty());
        assert_eq!(detector.evict_expired(now + Duration::from_secs(15)), vec!["a".to_string()]);
        assert!(!detector.is_highlighted("a"));

        // still in the baseline, so a replay after eviction is silent
        assert!(detector.observe(&[order("a")], now + Duration::from_secs(16)).is_empty());
    }

    #[test]
    fn test_reset_restores_cold_start() {
        let mut detector = NewArrivalDetector::new(Duration::from_secs(15));
        let now = Instant::now();
        detector.observe(&[], now);
        detector.observe(&[order("a")], now);
        detector.reset();
        assert!(detector.highlighted().is_empty());
        assert!(detector.observe(&[order("a"), order("b")], now).is_empty());
    }

    #[test]
    fn test_oversized_window_is_capped() {
        let mut detector = NewArrivalDetector::new(Duration::from_secs(u64::MAX));
        assert_eq!(detector.window(), MAX_HIGHLIGHT_WINDOW);

        let now = Instant::now();
        detector.observe(&[], now);
        assert_eq!(detector.observe(&[order("a")], now).len(), 1);
        assert_eq!(
            detector.evict_expired(now + MAX_HIGHLIGHT_WINDOW),
            vec!["a".to_string()]
        );
    }
}
