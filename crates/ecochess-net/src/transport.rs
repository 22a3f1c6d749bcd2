//! Transport Manager: owns the choice between the push channel and the poll
//! loop.
//!
//! The manager is a pure state machine. It consumes [`TransportEvent`]s and
//! returns the [`TransportAction`]s the session must carry out, in order.
//! Teardown actions always precede setup actions, so the push channel and
//! the poll loop are never live at the same time. Every push connection is
//! tagged with an epoch; events from a superseded connection are ignored.
//!
//! ```text
//! Disconnected ──start──▶ Connecting ──opened──▶ Connected
//!                            ▲   │                   │
//!          reconnect due ────┘   └──closed──┬────────┘
//!                                           │ backoff ≥ threshold
//!                                           ▼
//!                                        Polling
//! ```

use std::time::Duration;

use ecochess_model::GameSnapshot;

use crate::messages::PushMessage;
use crate::reconnection::{Backoff, BackoffConfig, BackoffStep};

/// Default fixed poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1200);

/// Default idle keep-alive probe interval on the push channel.
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(20);

/// Transport tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportConfig {
    /// Reconnect backoff and fallback threshold.
    pub backoff: BackoffConfig,
    /// Interval between state fetches while polling.
    pub poll_interval: Duration,
    /// Interval between keep-alive probes while the push channel is open.
    pub keepalive_interval: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            backoff: BackoffConfig::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
        }
    }
}

/// Lifecycle state of the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// No session, nothing running.
    Disconnected,
    /// A push connection is being opened or a reconnect is scheduled.
    Connecting,
    /// The push channel is open.
    Connected,
    /// Push was abandoned; the poll loop is running.
    Polling,
}

/// Events delivered to the session by the push channel, the poll loop, and
/// reconnect timers.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The push connection with this epoch completed its handshake.
    PushOpened { epoch: u64 },
    /// A decoded message arrived on the push connection with this epoch.
    PushMessage { epoch: u64, message: PushMessage },
    /// The push connection with this epoch closed or failed.
    PushClosed { epoch: u64 },
    /// The backoff delay scheduled after a closure of `epoch` elapsed.
    ReconnectDue { epoch: u64 },
    /// A poll request returned a snapshot.
    Polled(GameSnapshot),
}

/// Side effects requested by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportAction {
    /// Open a push connection tagged with `epoch`.
    OpenPush { epoch: u64 },
    /// Close the current push connection, if any.
    ClosePush,
    /// Deliver [`TransportEvent::ReconnectDue`] for `epoch` after `delay`.
    ScheduleReconnect { epoch: u64, delay: Duration },
    /// Drop the pending reconnect timer, if any.
    CancelReconnect,
    /// Start the poll loop.
    StartPolling,
    /// Stop the poll loop, if running.
    StopPolling,
}

/// The transport state machine.
#[derive(Debug)]
pub struct TransportManager {
    state: TransportState,
    backoff: Backoff,
    epoch: u64,
    push_live: bool,
    poll_live: bool,
    reconnect_pending: bool,
}

impl TransportManager {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            state: TransportState::Disconnected,
            backoff: Backoff::new(config),
            epoch: 0,
            push_live: false,
            poll_live: false,
            reconnect_pending: false,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Epoch of the most recent push connection.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// `true` while a push connection is open or being opened.
    pub fn is_push_live(&self) -> bool {
        self.push_live
    }

    /// `true` while the poll loop runs.
    pub fn is_poll_live(&self) -> bool {
        self.poll_live
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Begin a session on the push channel.
    pub fn start(&mut self) -> Vec<TransportAction> {
        let mut actions = self.teardown();
        actions.push(self.open_push());
        self.state = TransportState::Connecting;
        actions
    }

    /// Begin (or switch to) polling.
    pub fn start_polling(&mut self) -> Vec<TransportAction> {
        let mut actions = self.teardown();
        actions.push(TransportAction::StartPolling);
        self.poll_live = true;
        self.state = TransportState::Polling;
        actions
    }

    /// Tear everything down; the session is over.
    pub fn stop(&mut self) -> Vec<TransportAction> {
        let actions = self.teardown();
        self.state = TransportState::Disconnected;
        actions
    }

    /// The push URL could not be built; there is no point retrying push.
    pub fn push_unavailable(&mut self) -> Vec<TransportAction> {
        tracing::warn!("push channel unavailable, falling back to polling");
        self.start_polling()
    }

    /// Feed an event. Returns the actions to perform, possibly none.
    pub fn handle(&mut self, event: &TransportEvent) -> Vec<TransportAction> {
        match *event {
            TransportEvent::PushOpened { epoch } => self.on_opened(epoch),
            TransportEvent::PushClosed { epoch } => self.on_closed(epoch),
            TransportEvent::ReconnectDue { epoch } => self.on_reconnect_due(epoch),
            TransportEvent::PushMessage { .. } | TransportEvent::Polled(_) => Vec::new(),
        }
    }

    /// `true` if a push message with this epoch should be routed onward.
    pub fn accepts_push_from(&self, epoch: u64) -> bool {
        epoch == self.epoch && self.state == TransportState::Connected
    }

    /// `true` if a poll result should be routed onward.
    pub fn accepts_poll(&self) -> bool {
        self.poll_live
    }

    fn on_opened(&mut self, epoch: u64) -> Vec<TransportAction> {
        if epoch != self.epoch || self.state != TransportState::Connecting || !self.push_live {
            return Vec::new();
        }
        tracing::info!(epoch, "push channel open");
        self.backoff.reset();
        self.state = TransportState::Connected;
        Vec::new()
    }

    fn on_closed(&mut self, epoch: u64) -> Vec<TransportAction> {
        if epoch != self.epoch || !self.push_live {
            return Vec::new();
        }
        self.push_live = false;

        match self.backoff.on_closed() {
            BackoffStep::Retry(delay) => {
                tracing::info!(epoch, ?delay, "push channel closed, reconnecting");
                self.state = TransportState::Connecting;
                self.reconnect_pending = true;
                vec![
                    TransportAction::ClosePush,
                    TransportAction::ScheduleReconnect { epoch, delay },
                ]
            }
            BackoffStep::Fallback => {
                tracing::warn!(
                    closures = self.backoff.closures(),
                    "push channel keeps closing, falling back to polling"
                );
                self.start_polling()
            }
        }
    }

    fn on_reconnect_due(&mut self, epoch: u64) -> Vec<TransportAction> {
        if epoch != self.epoch || self.state != TransportState::Connecting || self.push_live {
            return Vec::new();
        }
        self.reconnect_pending = false;
        vec![self.open_push()]
    }

    fn open_push(&mut self) -> TransportAction {
        self.epoch += 1;
        self.push_live = true;
        TransportAction::OpenPush { epoch: self.epoch }
    }

    fn teardown(&mut self) -> Vec<TransportAction> {
        let mut actions = Vec::new();
        if self.push_live {
            actions.push(TransportAction::ClosePush);
            self.push_live = false;
        }
        if self.poll_live {
            actions.push(TransportAction::StopPolling);
            self.poll_live = false;
        }
        if self.reconnect_pending {
            actions.push(TransportAction::CancelReconnect);
            self.reconnect_pending = false;
        }
        // Invalidate any outstanding reconnect timer.
        self.epoch += 1;
        actions
    }
}

impl Default for TransportManager {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}
