//! Clock Reconciler: live countdown values projected from the latest
//! snapshot and the sampled server offset.
//!
//! Runs on its own fixed-rate tick and never touches the network. Server
//! "now" is `local_now + offset`; only the side to move loses time between
//! snapshots.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use ecochess_model::{GameSnapshot, Side};

/// Default display tick.
pub const DEFAULT_CLOCK_TICK: Duration = Duration::from_millis(250);

/// Text shown for a clock whose value is unknown.
pub const UNKNOWN_CLOCK: &str = "--:--";

/// Remaining seconds, recomputed every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockView {
    pub global: u64,
    pub white: u64,
    pub black: u64,
}

impl ClockView {
    pub fn side(&self, side: Side) -> u64 {
        match side {
            Side::White => self.white,
            Side::Black => self.black,
        }
    }
}

/// Project the clocks of `snapshot` to `local_now` (unix seconds).
///
/// Returns `None` (the unknown sentinel) when there is no snapshot.
pub fn reconcile(
    snapshot: Option<&GameSnapshot>,
    offset: i64,
    local_now: i64,
) -> Option<ClockView> {
    let snapshot = snapshot?;
    let server_now = local_now.saturating_add(offset);
    let global = remaining(snapshot.global_deadline().saturating_sub(server_now));

    let elapsed = snapshot
        .server_timestamp()
        .map_or(0, |ts| remaining(server_now.saturating_sub(ts)));

    let clocks = snapshot.clocks();
    let (mut white, mut black) = (clocks.white, clocks.black);
    if snapshot.is_active() {
        match snapshot.turn() {
            Side::White => white = white.saturating_sub(elapsed),
            Side::Black => black = black.saturating_sub(elapsed),
        }
    }

    Some(ClockView {
        global,
        white,
        black,
    })
}

/// Format seconds as `MM:SS`. Minutes are not wrapped into hours.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Format an optional clock value, using [`UNKNOWN_CLOCK`] for `None`.
pub fn format_optional(seconds: Option<u64>) -> String {
    seconds.map_or_else(|| UNKNOWN_CLOCK.to_string(), format_clock)
}

/// Local wall clock in whole unix seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

fn remaining(seconds: i64) -> u64 {
    u64::try_from(seconds).unwrap_or(0)
}
