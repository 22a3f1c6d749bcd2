//! Session controller: one task that owns the whole game context.
//!
//! The loop multiplexes user commands, transport events, remote-call replies
//! and the clock tick. Remote calls run on spawned tasks (blocking API calls
//! on tokio's blocking pool) and come back as [`Reply`] values; only the loop
//! mutates state, so ordering is decided in one place.

use std::sync::Arc;
use std::time::Duration;

use ecochess_model::{GameId, GameResult, GameSnapshot, PieceKind, Square};
use ecochess_net::{
    ApiError, Endpoint, GameApi, MutationOutcome, PollLoop, PushChannel, PushMessage,
    TransportAction, TransportConfig, TransportEvent, TransportManager, TransportState, push_url,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use url::Url;

use crate::clock::{DEFAULT_CLOCK_TICK, unix_now};
use crate::context::{RemoteCall, SessionContext};
use crate::view::Presenter;

/// Terminal session failures. Everything else degrades to a status message.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("cannot reach the game service: {0}")]
    Unreachable(ApiError),

    #[error("game service refused the session: {0}")]
    Backend(String),

    #[error("no active game for this player")]
    NoActiveGame,

    #[error("malformed game data: {0}")]
    Malformed(String),
}

impl From<ApiError> for SessionError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Transport(_) | ApiError::Status(_) => SessionError::Unreachable(e),
            ApiError::NotOk(reason) => SessionError::Backend(reason),
            ApiError::Decode(detail) => SessionError::Malformed(detail),
            ApiError::MissingGame => SessionError::Malformed(e.to_string()),
        }
    }
}

/// Input from the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    Click(Square),
    Shop(PieceKind),
    Quit,
}

/// Session tuning.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub transport: TransportConfig,
    /// Clock redraw interval.
    pub clock_tick: Duration,
    /// Skip the push channel and poll from the start.
    pub poll_only: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            clock_tick: DEFAULT_CLOCK_TICK,
            poll_only: false,
        }
    }
}

/// Answer to a [`RemoteCall`].
#[derive(Debug)]
enum Reply {
    MoveTargets {
        generation: u64,
        result: Result<Vec<Square>, ApiError>,
    },
    DropTargets {
        generation: u64,
        result: Result<Vec<Square>, ApiError>,
    },
    Moved(Result<MutationOutcome, ApiError>),
    Dropped {
        kind: PieceKind,
        result: Result<MutationOutcome, ApiError>,
    },
}

/// A live game session.
pub struct Session<A: GameApi, P: Presenter> {
    api: Arc<A>,
    presenter: P,
    config: SessionConfig,
    game: GameId,
    context: SessionContext,
    transport: TransportManager,
    push_url: Option<Url>,
    push: Option<PushChannel>,
    poll: Option<PollLoop>,
    reconnect: Option<JoinHandle<()>>,
    events_tx: mpsc::UnboundedSender<TransportEvent>,
    events_rx: mpsc::UnboundedReceiver<TransportEvent>,
    replies_tx: mpsc::UnboundedSender<Reply>,
    replies_rx: mpsc::UnboundedReceiver<Reply>,
}

impl<A: GameApi, P: Presenter> Session<A, P> {
    /// Fetch the player's game and build the session around it.
    ///
    /// No transport is started until [`Self::run`].
    pub async fn bootstrap(
        api: Arc<A>,
        endpoint: &Endpoint,
        presenter: P,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let snapshot = blocking(Arc::clone(&api), |api| api.fetch_my_game())
            .await?
            .ok_or(SessionError::NoActiveGame)?;
        let game = snapshot.game_id().clone();
        tracing::info!(game = %game, viewer = ?snapshot.viewer_side(), "session bootstrapped");

        let push_url = if config.poll_only {
            None
        } else {
            match push_url(endpoint, &game) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!("push channel unavailable: {e}");
                    None
                }
            }
        };

        let mut context = SessionContext::new();
        context.apply_snapshot(snapshot, unix_now());

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();
        Ok(Self {
            transport: TransportManager::new(config.transport.backoff.clone()),
            api,
            presenter,
            config,
            game,
            context,
            push_url,
            push: None,
            poll: None,
            reconnect: None,
            events_tx,
            events_rx,
            replies_tx,
            replies_rx,
        })
    }

    pub fn game_id(&self) -> &GameId {
        &self.game
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn transport_state(&self) -> TransportState {
        self.transport.state()
    }

    /// Run until [`UserCommand::Quit`] or until `commands` closes. All
    /// channels are torn down on return.
    pub async fn run(mut self, mut commands: mpsc::Receiver<UserCommand>) {
        let actions = if self.push_url.is_none() {
            self.transport.start_polling()
        } else if self.context.model().viewer_side().is_none() {
            tracing::warn!("viewer side unknown, polling only");
            self.transport.start_polling()
        } else {
            self.transport.start()
        };
        self.perform(actions);
        self.render();
        self.notify_finished();

        let mut tick = tokio::time::interval(self.config.clock_tick);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(UserCommand::Quit) | None => break,
                    Some(command) => self.on_command(command),
                },
                Some(event) = self.events_rx.recv() => self.on_transport_event(event),
                Some(reply) = self.replies_rx.recv() => self.on_reply(reply),
                _ = tick.tick() => {
                    let clocks = self.context.clock_view(unix_now());
                    self.presenter.clocks(clocks);
                }
            }
        }

        let actions = self.transport.stop();
        self.perform(actions);
        tracing::info!(game = %self.game, "session ended");
    }

    // -----------------------------------------------------------------------
    // Event handlers
    // -----------------------------------------------------------------------

    fn on_command(&mut self, command: UserCommand) {
        let call = match command {
            UserCommand::Click(square) => self.context.click(square),
            UserCommand::Shop(kind) => self.context.shop(kind),
            UserCommand::Quit => None,
        };
        if let Some(call) = call {
            self.dispatch(call);
        }
        self.render();
    }

    fn on_transport_event(&mut self, event: TransportEvent) {
        let actions = self.transport.handle(&event);
        match event {
            TransportEvent::PushMessage { epoch, message } => {
                if !self.transport.accepts_push_from(epoch) {
                    tracing::debug!(epoch, "ignoring message from superseded push channel");
                } else {
                    match message {
                        PushMessage::State(snapshot) => self.accept(snapshot),
                        PushMessage::Finished(result) => self.finish(result),
                    }
                }
            }
            TransportEvent::Polled(snapshot) => {
                if self.transport.accepts_poll() {
                    self.accept(snapshot);
                }
            }
            TransportEvent::PushOpened { .. } => self.render(),
            TransportEvent::PushClosed { .. } | TransportEvent::ReconnectDue { .. } => {}
        }
        if !actions.is_empty() {
            self.perform(actions);
            self.render();
        }
    }

    fn on_reply(&mut self, reply: Reply) {
        let now = unix_now();
        let follow_up = match reply {
            Reply::MoveTargets { generation, result } => {
                self.context.move_targets(generation, result);
                None
            }
            Reply::DropTargets { generation, result } => {
                self.context.drop_targets(generation, result);
                None
            }
            Reply::Moved(result) => {
                self.context.move_finished(result, now);
                None
            }
            Reply::Dropped { kind, result } => self.context.drop_finished(kind, result, now),
        };
        if let Some(call) = follow_up {
            self.dispatch(call);
        }
        self.render();
        self.notify_finished();
    }

    fn accept(&mut self, snapshot: GameSnapshot) {
        if snapshot.game_id() != &self.game {
            tracing::debug!(game = %snapshot.game_id(), "ignoring snapshot of another game");
            return;
        }
        if self.context.apply_snapshot(snapshot, unix_now()).is_accepted() {
            self.render();
            self.notify_finished();
        }
    }

    fn finish(&mut self, result: GameResult) {
        tracing::info!(reason = %result.reason, "game finished");
        self.context.apply_finished(result);
        self.render();
        self.notify_finished();
    }

    fn render(&mut self) {
        let frame = self.context.frame(unix_now(), self.transport.state());
        self.presenter.render(&frame);
    }

    fn notify_finished(&mut self) {
        if let Some(notice) = self.context.take_notice() {
            self.presenter.game_finished(&notice);
        }
    }

    // -----------------------------------------------------------------------
    // Side effects
    // -----------------------------------------------------------------------

    fn perform(&mut self, actions: Vec<TransportAction>) {
        for action in actions {
            match action {
                TransportAction::OpenPush { epoch } => match &self.push_url {
                    Some(url) => {
                        self.push = Some(PushChannel::open(
                            url.clone(),
                            epoch,
                            self.config.transport.keepalive_interval,
                            self.events_tx.clone(),
                        ));
                    }
                    None => {
                        let fallback = self.transport.push_unavailable();
                        self.perform(fallback);
                    }
                },
                TransportAction::ClosePush => {
                    if let Some(push) = self.push.take() {
                        push.close();
                    }
                }
                TransportAction::ScheduleReconnect { epoch, delay } => {
                    let events = self.events_tx.clone();
                    let timer = tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = events.send(TransportEvent::ReconnectDue { epoch });
                    });
                    if let Some(stale) = self.reconnect.replace(timer) {
                        stale.abort();
                    }
                }
                TransportAction::CancelReconnect => {
                    if let Some(timer) = self.reconnect.take() {
                        timer.abort();
                    }
                }
                TransportAction::StartPolling => {
                    self.poll = Some(PollLoop::start(
                        Arc::clone(&self.api),
                        self.game.clone(),
                        self.config.transport.poll_interval,
                        self.events_tx.clone(),
                    ));
                }
                TransportAction::StopPolling => {
                    if let Some(poll) = self.poll.take() {
                        poll.stop();
                    }
                }
            }
        }
    }

    fn dispatch(&self, call: RemoteCall) {
        let api = Arc::clone(&self.api);
        let game = self.game.clone();
        let replies = self.replies_tx.clone();
        tokio::spawn(async move {
            let reply = match call {
                RemoteCall::MoveTargets { generation, from } => Reply::MoveTargets {
                    generation,
                    result: blocking(api, move |api| api.legal_move_targets(&game, from)).await,
                },
                RemoteCall::DropTargets { generation, kind } => Reply::DropTargets {
                    generation,
                    result: blocking(api, move |api| api.legal_drop_targets(&game, kind)).await,
                },
                RemoteCall::SubmitMove { from, to } => Reply::Moved(
                    blocking(api, move |api| api.submit_move(&game, from, to)).await,
                ),
                RemoteCall::SubmitDrop { kind, square } => Reply::Dropped {
                    kind,
                    result: blocking(api, move |api| api.submit_drop(&game, kind, square)).await,
                },
            };
            let _ = replies.send(reply);
        });
    }
}

/// Run a blocking API call on the blocking pool.
async fn blocking<A, T, F>(api: Arc<A>, call: F) -> Result<T, ApiError>
where
    A: GameApi,
    T: Send + 'static,
    F: FnOnce(&A) -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || call(&api))
        .await
        .unwrap_or_else(|e| Err(ApiError::Transport(e.to_string())))
}
