//! Audible and visual alerts for new arrivals
//!
//! Two independent gates guard playback: `alerts_enabled` (staff toggle)
//! and `user_has_interacted` (armed by the first click or keypress, since
//! the platform refuses audio before a user gesture). Notifications only
//! need the first gate; audio needs both.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use shared::order::Order;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::message::BoardEvent;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AlertError {
    #[error("Audio playback failed: {0}")]
    Playback(String),

    #[error("Notification failed: {0}")]
    Notification(String),
}

/// Short fixed sound played on a new arrival
pub trait AudioCue: Send + Sync {
    fn play(&self) -> Result<(), AlertError>;
}

/// In-app or system notification surface
pub trait Notifier: Send + Sync {
    fn notify(&self, order: &Order) -> Result<(), AlertError>;
}

#[derive(Debug)]
struct GateState {
    enabled: AtomicBool,
    interacted: AtomicBool,
}

/// Shared handle to the two alert gates
///
/// Cloning shares the same flags.
#[derive(Debug, Clone)]
pub struct AlertGates {
    state: Arc<GateState>,
}

impl AlertGates {
    /// Alerts enabled, audio not yet armed
    pub fn new() -> Self {
        Self {
            state: Arc::new(GateState {
                enabled: AtomicBool::new(true),
                interacted: AtomicBool::new(false),
            }),
        }
    }

    /// Record the first user gesture; arming is one-way
    pub fn arm_user_interaction(&self) {
        if !self.state.interacted.swap(true, Ordering::SeqCst) {
            tracing::info!("Audio alerts armed by user interaction");
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.state.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn alerts_enabled(&self) -> bool {
        self.state.enabled.load(Ordering::SeqCst)
    }

    pub fn user_has_interacted(&self) -> bool {
        self.state.interacted.load(Ordering::SeqCst)
    }

    pub fn can_notify(&self) -> bool {
        self.alerts_enabled()
    }

    pub fn can_play(&self) -> bool {
        self.alerts_enabled() && self.user_has_interacted()
    }
}

impl Default for AlertGates {
    fn default() -> Self {
        Self::new()
    }
}

/// What happened for one arrival
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertOutcome {
    pub notified: bool,
    pub played: bool,
}

/// Reacts to [`BoardEvent::NewArrival`] with a notification and a sound
pub struct AlertDispatcher {
    gates: AlertGates,
    audio: Arc<dyn AudioCue>,
    notifier: Arc<dyn Notifier>,
}

impl AlertDispatcher {
    pub fn new(gates: AlertGates, audio: Arc<dyn AudioCue>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            gates,
            audio,
            notifier,
        }
    }

    pub fn gates(&self) -> &AlertGates {
        &self.gates
    }

    /// Handle one board event; anything but a new arrival is ignored
    pub fn handle(&self, event: &BoardEvent) -> AlertOutcome {
        let BoardEvent::NewArrival { order } = event else {
            return AlertOutcome::default();
        };

        let mut outcome = AlertOutcome::default();
        if self.gates.can_notify() {
            match self.notifier.notify(order) {
                Ok(()) => outcome.notified = true,
                Err(e) => tracing::warn!(order_id = %order.id, error = %e, "Notification failed"),
            }
        }
        if self.gates.can_play() {
            match self.audio.play() {
                Ok(()) => outcome.played = true,
                Err(e) => tracing::warn!(order_id = %order.id, error = %e, "Audio cue failed"),
            }
        } else if self.gates.alerts_enabled() {
            tracing::debug!(order_id = %order.id, "Audio not armed yet, skipping cue");
        }
        outcome
    }

    /// Consume board events until cancelled or the bus closes
    pub async fn run(self, mut rx: broadcast::Receiver<BoardEvent>, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                received = rx.recv() => match received {
                    Ok(event) => {
                        self.handle(&event);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Alert listener lagged behind board events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
        tracing::debug!("Alert listener stopped");
    }
}

/// Notifier that writes to the log
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, order: &Order) -> Result<(), AlertError> {
        tracing::info!(
            order_id = %order.id,
            reference = %order.short_ref(),
            customer = %order.customer.first_name(),
            "Novo pedido recebido"
        );
        Ok(())
    }
}

/// Audio cue that rings the terminal bell
#[derive(Debug, Default)]
pub struct TerminalBell;

impl AudioCue for TerminalBell {
    fn play(&self) -> Result<(), AlertError> {
        use std::io::Write;
        let mut out = std::io::stdout();
        out.write_all(b"\x07")
            .and_then(|_| out.flush())
            .map_err(|e| AlertError::Playback(e.to_string()))
    }
}
