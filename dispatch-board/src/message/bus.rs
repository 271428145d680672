//! Broadcast channel carrying [`BoardEvent`]s

use tokio::sync::broadcast;
use tracing::trace;

use super::BoardEvent;

/// Default capacity of the broadcast channel
const DEFAULT_CAPACITY: usize = 256;

/// Event bus - fan-out of board events to any number of listeners
///
/// Publishing never fails: with no subscriber the event is dropped, and a
/// slow subscriber sees `Lagged` instead of blocking the board.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BoardEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: BoardEvent) {
        let name = event.name();
        let delivered = self.tx.send(event).unwrap_or(0);
        trace!(event = name, delivered, "Board event published");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
