//! Status transitions and deletes
//!
//! Calls for the same order are serialised by a per-order async lock.
//! The engine also remembers the last status it committed for each order,
//! so a double-click that still carries the old status sees the committed
//! one and becomes a no-op instead of skipping a step. Terminal statuses
//! are kept only while calls for the order are queued.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use shared::order::{Order, OrderStatus, OrderType};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};

use super::error::{PolicyViolation, TransitionError};
use crate::message::{BoardEvent, EventBus};
use crate::messaging::{MessageDraft, OutboundMessageComposer};
use crate::store::OrderStore;

/// Result of a successful `advance`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransitionOutcome {
    Advanced {
        from: OrderStatus,
        to: OrderStatus,
        /// Customer message, delivery orders with a usable phone only
        message: Option<MessageDraft>,
    },
    /// Another call already moved the order past the caller's copy
    AlreadyAdvanced { current: OrderStatus },
}

pub struct StatusTransitionEngine {
    store: Arc<dyn OrderStore>,
    composer: OutboundMessageComposer,
    bus: EventBus,
    allow_remove_awaiting_payment: bool,
    locks: DashMap<String, Arc<Mutex<()>>>,
    committed: DashMap<String, OrderStatus>,
}

impl StatusTransitionEngine {
    pub fn new(
        store: Arc<dyn OrderStore>,
        composer: OutboundMessageComposer,
        bus: EventBus,
        allow_remove_awaiting_payment: bool,
    ) -> Self {
        Self {
            store,
            composer,
            bus,
            allow_remove_awaiting_payment,
            locks: DashMap::new(),
            committed: DashMap::new(),
        }
    }

    /// The status `advance` would write, without touching the store
    pub fn next_status(order: &Order) -> Result<OrderStatus, PolicyViolation> {
        match order.status.next_for(order.order_type) {
            Some(next) => Ok(next),
            None if order.status.is_terminal() => Err(PolicyViolation::Terminal {
                order_id: order.id.clone(),
                status: order.status,
            }),
            None => Err(PolicyViolation::OutsideGraph {
                status: order.status,
                order_type: order.order_type,
            }),
        }
    }

    fn order_lock(&self, order_id: &str) -> Arc<Mutex<()>> {
        self.locks.entry(order_id.to_string()).or_default().clone()
    }

    /// Drop the order's lock once no call holds it
    ///
    /// A terminal committed status is forgotten at the same point: queued
    /// calls for the order have all seen it, and `next_status` rejects
    /// terminal copies on its own.
    fn release_lock(&self, order_id: &str) {
        let released = self
            .locks
            .remove_if(order_id, |_, lock| Arc::strong_count(lock) == 1)
            .is_some();
        if released {
            self.committed
                .remove_if(order_id, |_, status| status.is_terminal());
        }
    }

    /// Status this engine last committed, when further along than `order`
    fn committed_ahead(&self, order: &Order) -> Option<OrderStatus> {
        let committed = *self.committed.get(&order.id)?;
        let ahead = rank(order.order_type, committed) > rank(order.order_type, order.status);
        ahead.then_some(committed)
    }

    /// Move `order` to the single next status of its graph
    #[instrument(skip(self, order), fields(order_id = %order.id, status = %order.status))]
    pub async fn advance(&self, order: &Order) -> Result<TransitionOutcome, TransitionError> {
        let lock = self.order_lock(&order.id);
        let result = {
            let _guard = lock.lock().await;
            self.advance_locked(order).await
        };
        drop(lock);
        self.release_lock(&order.id);
        result
    }

    async fn advance_locked(&self, order: &Order) -> Result<TransitionOutcome, TransitionError> {
        if let Some(current) = self.committed_ahead(order) {
            debug!(%current, "Order already advanced, ignoring stale request");
            return Ok(TransitionOutcome::AlreadyAdvanced { current });
        }

        let next = Self::next_status(order).inspect_err(|violation| {
            info!(reason = %violation, "Advance refused");
        })?;

        self.store
            .update_status(&order.id, next)
            .await
            .inspect_err(|e| error!(error = %e, to = %next, "Status update failed"))?;

        self.committed.insert(order.id.clone(), next);
        info!(from = %order.status, to = %next, "Order advanced");
        self.bus.publish(BoardEvent::StatusAdvanced {
            order_id: order.id.clone(),
            from: order.status,
            to: next,
        });

        let message = self.draft_message(order, next);
        Ok(TransitionOutcome::Advanced {
            from: order.status,
            to: next,
            message,
        })
    }

    /// Best-effort customer message after a committed transition
    fn draft_message(&self, order: &Order, status: OrderStatus) -> Option<MessageDraft> {
        if order.order_type != OrderType::Delivery || order.customer.phone().is_none() {
            return None;
        }
        match self.composer.compose(order, status) {
            Ok(draft) => {
                self.bus.publish(BoardEvent::MessageDrafted {
                    order_id: draft.order_id.clone(),
                    status,
                    uri: draft.uri.clone(),
                });
                Some(draft)
            }
            Err(e) => {
                debug!(order_id = %order.id, %status, reason = %e, "Customer message skipped");
                None
            }
        }
    }

    /// Delete `order`; only allowed before preparation starts
    #[instrument(skip(self, order), fields(order_id = %order.id, status = %order.status))]
    pub async fn remove(&self, order: &Order) -> Result<(), TransitionError> {
        let lock = self.order_lock(&order.id);
        let result = {
            let _guard = lock.lock().await;
            self.remove_locked(order).await
        };
        drop(lock);
        self.release_lock(&order.id);
        result
    }

    async fn remove_locked(&self, order: &Order) -> Result<(), TransitionError> {
        let status = self.committed_ahead(order).unwrap_or(order.status);
        if !status.is_removable(self.allow_remove_awaiting_payment) {
            info!(%status, "Remove refused");
            return Err(PolicyViolation::NotRemovable {
                order_id: order.id.clone(),
                status,
            }
            .into());
        }

        self.store
            .delete(&order.id)
            .await
            .inspect_err(|e| error!(error = %e, "Delete failed"))?;

        self.committed.remove(&order.id);
        info!("Order removed");
        self.bus.publish(BoardEvent::OrderRemoved {
            order_id: order.id.clone(),
        });
        Ok(())
    }

    /// Forget committed statuses (new business day)
    pub fn clear_committed(&self) {
        self.committed.clear();
    }
}

fn rank(order_type: OrderType, status: OrderStatus) -> usize {
    order_type.rank(status).unwrap_or(0)
}
