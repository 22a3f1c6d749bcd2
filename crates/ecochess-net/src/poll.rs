//! Fallback poll loop: fetches the full game state on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use ecochess_model::GameId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::api::GameApi;
use crate::transport::TransportEvent;

/// Handle to a running poll loop. Dropping it stops the loop.
///
/// Failed polls are logged and skipped; the next tick simply tries again.
/// A request still in flight when the loop stops is abandoned and its result
/// discarded.
pub struct PollLoop {
    task: JoinHandle<()>,
}

impl PollLoop {
    /// Start polling `game`. The first request goes out after one interval.
    /// Must be called inside a tokio runtime.
    pub fn start<A: GameApi>(
        api: Arc<A>,
        game: GameId,
        interval: Duration,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Self {
        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let api = Arc::clone(&api);
                let id = game.clone();
                match tokio::task::spawn_blocking(move || api.poll_state(&id)).await {
                    Ok(Ok(snapshot)) => {
                        if events.send(TransportEvent::Polled(snapshot)).is_err() {
                            break;
                        }
                    }
                    Ok(Err(e)) => tracing::debug!(game = %game, "poll failed: {e}"),
                    Err(e) => tracing::warn!("poll task failed: {e}"),
                }
            }
        });
        tracing::info!(?interval, "polling started");
        Self { task }
    }

    /// Stop the loop.
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PollLoop {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, MutationOutcome};
    use ecochess_model::{GameSnapshot, PieceKind, Square};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers polls with a fixed snapshot, failing every other call.
    struct FlakyApi {
        calls: AtomicUsize,
        snapshot: GameSnapshot,
    }

    impl GameApi for FlakyApi {
        fn fetch_my_game(&self) -> Result<Option<GameSnapshot>, ApiError> {
            Ok(None)
        }

        fn legal_move_targets(&self, _: &GameId, _: Square) -> Result<Vec<Square>, ApiError> {
            Ok(Vec::new())
        }

        fn legal_drop_targets(&self, _: &GameId, _: PieceKind) -> Result<Vec<Square>, ApiError> {
            Ok(Vec::new())
        }

        fn submit_move(
            &self,
            _: &GameId,
            _: Square,
            _: Square,
        ) -> Result<MutationOutcome, ApiError> {
            Err(ApiError::MissingGame)
        }

        fn submit_drop(
            &self,
            _: &GameId,
            _: PieceKind,
            _: Square,
        ) -> Result<MutationOutcome, ApiError> {
            Err(ApiError::MissingGame)
        }

        fn poll_state(&self, _: &GameId) -> Result<GameSnapshot, ApiError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n % 2 == 0 {
                Err(ApiError::Transport("connection refused".into()))
            } else {
                Ok(self.snapshot.clone())
            }
        }
    }

    fn snapshot() -> GameSnapshot {
        serde_json::from_value(serde_json::json!({
            "game_id": "g1", "status": "active", "turn": "w",
            "fen": "4k3/8/8/8/8/8/8/4K3 w - - 0 1",
            "coins_w": 0, "coins_b": 0, "clock_w_rem": 60, "clock_b_rem": 60,
            "global_end_ts": 1000, "server_ts": 900
        }))
        .unwrap()
    }

    fn flaky() -> Arc<FlakyApi> {
        Arc::new(FlakyApi {
            calls: AtomicUsize::new(0),
            snapshot: snapshot(),
        })
    }

    #[tokio::test]
    async fn test_failures_are_skipped() {
        let api = flaky();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _poll = PollLoop::start(
            Arc::clone(&api),
            GameId::new("g1").unwrap(),
            Duration::from_millis(10),
            tx,
        );

        for _ in 0..2 {
            let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert!(matches!(event, TransportEvent::Polled(_)));
        }
        assert!(api.calls.load(Ordering::SeqCst) >= 4);
    }

    #[tokio::test]
    async fn test_stop_ends_loop() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let poll = PollLoop::start(
            flaky(),
            GameId::new("g1").unwrap(),
            Duration::from_millis(10),
            tx,
        );
        assert!(poll.is_running());
        poll.stop();

        // Aborting the task drops its sender.
        let drained = tokio::time::timeout(Duration::from_secs(5), async {
            while rx.recv().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok());
    }
}
