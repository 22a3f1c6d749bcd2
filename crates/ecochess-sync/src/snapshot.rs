//! Snapshot Model: the local mirror of server-authoritative game state.
//!
//! Snapshots are replaced wholesale. Push and poll may race, so a candidate
//! whose server timestamp is older than the newest one ever accepted is
//! discarded, even when an untimestamped snapshot came in between. Once the
//! game is finished only a strictly newer snapshot may replace it. The
//! viewer side is carried forward across payloads that omit it, and the
//! server clock offset is resampled on every accepted timestamped snapshot.

use ecochess_model::{GameResult, GameSnapshot, Side};

/// Outcome of [`SnapshotModel::accept`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// The candidate replaced the current snapshot.
    Accepted,
    /// The candidate was older than what is already known and was dropped.
    Stale,
}

impl AcceptOutcome {
    pub fn is_accepted(self) -> bool {
        self == Self::Accepted
    }
}

/// Holder of the latest accepted [`GameSnapshot`].
#[derive(Debug, Default)]
pub struct SnapshotModel {
    current: Option<GameSnapshot>,
    viewer_side: Option<Side>,
    /// Highest server timestamp accepted so far, in milliseconds.
    newest_ms: Option<i64>,
    /// `server_timestamp - local_now`, in whole seconds.
    server_offset: i64,
}

impl SnapshotModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a candidate snapshot received at `local_now` (unix seconds).
    pub fn accept(&mut self, candidate: GameSnapshot, local_now: i64) -> AcceptOutcome {
        let got = candidate.server_timestamp_ms();
        if let (Some(have), Some(got)) = (self.newest_ms, got) {
            if got < have {
                tracing::debug!(have, got, "discarding stale snapshot");
                return AcceptOutcome::Stale;
            }
        }
        if self.is_finished() && candidate.is_active() {
            let newer = match (self.newest_ms, got) {
                (Some(have), Some(got)) => got > have,
                (None, Some(_)) => true,
                (_, None) => false,
            };
            if !newer {
                tracing::debug!(?got, "discarding active snapshot of a finished game");
                return AcceptOutcome::Stale;
            }
        }

        let candidate = match (candidate.viewer_side(), self.viewer_side) {
            (Some(side), _) => {
                self.viewer_side = Some(side);
                candidate
            }
            (None, Some(known)) => candidate.with_viewer_side(known),
            (None, None) => candidate,
        };

        if let Some(ts) = candidate.server_timestamp() {
            self.server_offset = ts - local_now;
        }
        if let Some(got) = got {
            self.newest_ms = Some(self.newest_ms.map_or(got, |have| have.max(got)));
        }
        self.current = Some(candidate);
        AcceptOutcome::Accepted
    }

    /// Apply a terminal result to the last known snapshot.
    ///
    /// Returns `false` when there is no snapshot to annotate.
    pub fn annotate_finished(&mut self, result: GameResult) -> bool {
        match &mut self.current {
            Some(snapshot) => {
                snapshot.mark_finished(result);
                true
            }
            None => false,
        }
    }

    pub fn current(&self) -> Option<&GameSnapshot> {
        self.current.as_ref()
    }

    fn is_finished(&self) -> bool {
        self.current.as_ref().is_some_and(|s| !s.is_active())
    }

    /// The viewer side, once any snapshot has reported it.
    pub fn viewer_side(&self) -> Option<Side> {
        self.viewer_side
    }

    pub fn server_offset(&self) -> i64 {
        self.server_offset
    }

    /// `true` when a snapshot exists, the game is active and the viewer is
    /// to move.
    pub fn is_viewer_turn(&self) -> bool {
        match (&self.current, self.viewer_side) {
            (Some(snapshot), Some(side)) => snapshot.is_turn_of(side),
            _ => false,
        }
    }

    /// Coins held by the viewer, zero while the side is unknown.
    pub fn viewer_coins(&self) -> u64 {
        match (&self.current, self.viewer_side) {
            (Some(snapshot), Some(side)) => snapshot.coins().get(side),
            _ => 0,
        }
    }

    /// Purchases are blocked off-turn and while the check-buy-lock flag is
    /// set.
    pub fn buy_blocked(&self) -> bool {
        !self.is_viewer_turn() || self.current.as_ref().is_some_and(|s| s.check_buy_lock())
    }
}
