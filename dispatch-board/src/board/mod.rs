//! Dispatch board
//!
//! [`DispatchBoard`] is the entry point the UI talks to. It owns:
//!
//! - the [`StreamAggregator`] with the live buckets of the active tab
//! - the [`StatusTransitionEngine`] for advance/remove
//! - the receipt [`PrintService`]
//! - the alert gates and the messaging hand-off
//! - background tasks that live as long as a tab is open
//!
//! # Background tasks
//!
//! | Task | Kind | Job |
//! |------|------|-----|
//! | `alert_listener` | Listener | New arrival -> notification + sound |
//! | `highlight_sweeper` | Listener | Expire highlights when their window ends |
//! | `day_rollover` | Watcher | Re-open the tab at local midnight |

pub mod aggregator;
pub mod alerts;
pub mod arrivals;
pub mod rollover;

pub use aggregator::{BoardView, BucketView, StreamAggregator};
pub use alerts::{
    AlertDispatcher, AlertError, AlertGates, AlertOutcome, AudioCue, LogNotifier, Notifier,
    TerminalBell,
};
pub use arrivals::NewArrivalDetector;
pub use rollover::DayWatcher;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use shared::Establishment;
use shared::error::AppResult;
use shared::order::{Order, OrderStatus, OrderType};
use ticket_printer::Printer;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::core::{BackgroundTasks, Config, TaskKind};
use crate::message::{BoardEvent, EventBus, TabKey};
use crate::messaging::{HandOff, LogHandOff, MessageDraft, OutboundMessageComposer};
use crate::orders::{StatusTransitionEngine, TransitionOutcome};
use crate::printing::{
    PrintOutcome, PrintService, ReceiptLayout, ReceiptPrinter, ReceiptRenderer,
};
use crate::store::OrderStore;
use crate::utils::time::start_of_day;

/// How often the rollover watcher looks at the clock
const ROLLOVER_CHECK_INTERVAL: Duration = Duration::from_secs(30);

pub struct DispatchBoard<P: Printer = ReceiptPrinter> {
    config: Config,
    bus: EventBus,
    aggregator: StreamAggregator,
    engine: Arc<StatusTransitionEngine>,
    composer: OutboundMessageComposer,
    printing: PrintService<P>,
    gates: AlertGates,
    audio: Arc<dyn AudioCue>,
    notifier: Arc<dyn Notifier>,
    hand_off: Arc<dyn HandOff>,
    tasks: Mutex<Option<BackgroundTasks>>,
}

impl<P: Printer> DispatchBoard<P> {
    /// Board with log-only alerts and hand-off
    pub fn new(config: Config, store: Arc<dyn OrderStore>, printer: Option<P>) -> Self {
        let bus = EventBus::with_capacity(config.event_channel_capacity);
        let composer = OutboundMessageComposer::from_config(&config);
        let aggregator = StreamAggregator::new(
            store.clone(),
            bus.clone(),
            NewArrivalDetector::new(config.highlight_window),
        );
        let engine = StatusTransitionEngine::new(
            store,
            composer.clone(),
            bus.clone(),
            config.allow_remove_awaiting_payment,
        );
        let printing = PrintService::new(
            printer,
            ReceiptRenderer::new(config.timezone),
            ReceiptLayout::new(config.paper_width),
            config.print_timeout,
        );

        Self {
            config,
            bus,
            aggregator,
            engine: Arc::new(engine),
            composer,
            printing,
            gates: AlertGates::new(),
            audio: Arc::new(TerminalBell),
            notifier: Arc::new(LogNotifier),
            hand_off: Arc::new(LogHandOff),
            tasks: Mutex::new(None),
        }
    }

    pub fn with_alerts(mut self, audio: Arc<dyn AudioCue>, notifier: Arc<dyn Notifier>) -> Self {
        self.audio = audio;
        self.notifier = notifier;
        self
    }

    pub fn with_hand_off(mut self, hand_off: Arc<dyn HandOff>) -> Self {
        self.hand_off = hand_off;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn events(&self) -> broadcast::Receiver<BoardEvent> {
        self.bus.subscribe()
    }

    pub fn alerts(&self) -> &AlertGates {
        &self.gates
    }

    pub fn active_tab(&self) -> Option<TabKey> {
        self.aggregator.active_tab()
    }

    // ========== Tabs ==========

    /// Open a tab, closing the previous one first
    ///
    /// Must be called from inside a Tokio runtime.
    #[instrument(skip(self))]
    pub async fn open(&self, establishment_id: &str, order_type: OrderType) {
        self.stop_tasks().await;

        let tab = TabKey::new(establishment_id, order_type);
        let mut tasks = BackgroundTasks::new();
        let token = tasks.shutdown_token();

        // Subscribe before the first snapshot so no arrival is missed
        let dispatcher = AlertDispatcher::new(
            self.gates.clone(),
            self.audio.clone(),
            self.notifier.clone(),
        );
        tasks.spawn(
            "alert_listener",
            TaskKind::Listener,
            dispatcher.run(self.bus.subscribe(), token.clone()),
        );
        tasks.spawn(
            "highlight_sweeper",
            TaskKind::Listener,
            sweep_highlights(
                self.aggregator.clone(),
                self.bus.subscribe(),
                self.aggregator.highlight_window(),
                token.clone(),
            ),
        );
        tasks.spawn(
            "day_rollover",
            TaskKind::Watcher,
            watch_day_rollover(
                self.aggregator.clone(),
                self.engine.clone(),
                tab.clone(),
                self.config.timezone,
                token,
            ),
        );

        let now = Utc::now();
        self.aggregator
            .open(tab, start_of_day(now, self.config.timezone));
        *self.tasks.lock() = Some(tasks);
    }

    /// Close the active tab; no-op when nothing is open
    pub async fn close(&self) {
        self.aggregator.close();
        self.stop_tasks().await;
    }

    async fn stop_tasks(&self) {
        let tasks = self.tasks.lock().take();
        if let Some(tasks) = tasks {
            tasks.shutdown().await;
        }
    }

    pub fn view(&self) -> BoardView {
        self.aggregator.view()
    }

    /// Order ids currently highlighted as new
    pub fn highlighted(&self) -> Vec<String> {
        self.aggregator.highlighted()
    }

    // ========== Orders ==========

    pub async fn advance(&self, order: &Order) -> AppResult<TransitionOutcome> {
        Ok(self.engine.advance(order).await?)
    }

    pub async fn remove(&self, order: &Order) -> AppResult<()> {
        Ok(self.engine.remove(order).await?)
    }

    // ========== Messaging ==========

    /// Compose the customer message for `status` (manual resend)
    pub fn compose_message(&self, order: &Order, status: OrderStatus) -> AppResult<MessageDraft> {
        Ok(self.composer.compose(order, status)?)
    }

    pub fn open_message(&self, draft: &MessageDraft) -> AppResult<()> {
        Ok(self.hand_off.open(draft)?)
    }

    // ========== Receipts ==========

    /// Print a receipt; `TimedOut` is a normal outcome, not an error
    pub async fn print_receipt(
        &self,
        order: &Order,
        establishment: &Establishment,
    ) -> AppResult<PrintOutcome> {
        Ok(self.printing.print_receipt(order, establishment).await?)
    }

    pub fn receipt_preview(&self, order: &Order, establishment: &Establishment) -> String {
        self.printing.preview(order, establishment)
    }
}

/// Expire each highlight once its window has passed
///
/// Deadlines are queued in arrival order, which is also expiry order.
async fn sweep_highlights(
    aggregator: StreamAggregator,
    mut rx: broadcast::Receiver<BoardEvent>,
    window: Duration,
    shutdown: CancellationToken,
) {
    let mut deadlines: VecDeque<Instant> = VecDeque::new();
    loop {
        let next = deadlines.front().copied();
        tokio::select! {
            _ = shutdown.cancelled() => break,
            received = rx.recv() => match received {
                Ok(BoardEvent::NewArrival { .. }) => deadlines.push_back(Instant::now() + window),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // A missed arrival still needs a sweep
                    warn!(skipped, "Highlight sweeper lagged behind board events");
                    deadlines.push_back(Instant::now() + window);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::time::sleep_until(next.unwrap_or_else(Instant::now)), if next.is_some() => {
                deadlines.pop_front();
                let expired = aggregator.expire_highlights(Instant::now());
                if !expired.is_empty() {
                    debug!(count = expired.len(), "Highlights expired");
                }
            }
        }
    }
}

/// Re-open `tab` with a new day bound when the local date changes
async fn watch_day_rollover(
    aggregator: StreamAggregator,
    engine: Arc<StatusTransitionEngine>,
    tab: TabKey,
    tz: chrono_tz::Tz,
    shutdown: CancellationToken,
) {
    let mut watcher = DayWatcher::new(tz, Utc::now());
    let mut interval = tokio::time::interval(ROLLOVER_CHECK_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {
                let Some(day_start) = watcher.check(Utc::now()) else {
                    continue;
                };
                if aggregator.active_tab().as_ref() != Some(&tab) {
                    break;
                }
                info!(date = %watcher.current(), "Local day changed, re-opening tab");
                engine.clear_committed();
                aggregator.open(tab.clone(), day_start);
            }
        }
    }
}
