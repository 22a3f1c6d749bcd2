//! The server-authoritative game snapshot.
//!
//! A [`GameSnapshot`] is immutable once decoded: status, turn, coins and
//! clocks always come from the same server instant and are only ever read
//! together through one snapshot value. The single sanctioned in-place
//! change is [`GameSnapshot::mark_finished`], used when a terminal push
//! event arrives without a fresh snapshot.

use std::fmt;

use serde::Deserialize;

use crate::board::{Board, BoardError, PieceType, Side};
use crate::wire::{WireGame, WireResult};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a game payload is rejected during decoding.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SnapshotError {
    /// The payload carries no (or an empty) game identifier.
    #[error("game payload has no game_id")]
    MissingGameId,
    /// An active game without a side to move.
    #[error("active game payload has no turn")]
    MissingTurn,
    /// A numeric field that must be non-negative is negative.
    #[error("field {0} is negative")]
    Negative(&'static str),
    /// A time field is NaN or infinite.
    #[error("field {0} is not a finite number")]
    NotFinite(&'static str),
    /// The board encoding could not be decoded.
    #[error("invalid board encoding: {0}")]
    Board(#[from] BoardError),
}

// ---------------------------------------------------------------------------
// Small value types
// ---------------------------------------------------------------------------

/// Opaque game identifier, stable for the lifetime of one game.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GameId(String);

impl GameId {
    /// Wrap a non-empty identifier.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        (!id.trim().is_empty()).then_some(Self(id))
    }

    /// Identifier as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of the game on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Active,
    Finished,
}

/// A pair of values, one per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PerSide<T> {
    /// White's value.
    pub white: T,
    /// Black's value.
    pub black: T,
}

impl<T: Copy> PerSide<T> {
    /// Value belonging to `side`.
    pub fn get(&self, side: Side) -> T {
        match side {
            Side::White => self.white,
            Side::Black => self.black,
        }
    }
}

/// A piece that can be bought with coins and dropped on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
}

impl PieceKind {
    /// Every purchasable kind, cheapest first.
    pub const ALL: [PieceKind; 5] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
    ];

    /// Price in coins. The schedule is fixed and mirrors the server's.
    pub fn cost(self) -> u64 {
        match self {
            PieceKind::Pawn => 1,
            PieceKind::Knight | PieceKind::Bishop => 3,
            PieceKind::Rook => 5,
            PieceKind::Queen => 9,
        }
    }

    /// Lowercase wire letter.
    pub fn letter(self) -> char {
        self.piece_type().letter()
    }

    /// The board piece this purchase becomes.
    pub fn piece_type(self) -> PieceType {
        match self {
            PieceKind::Pawn => PieceType::Pawn,
            PieceKind::Knight => PieceType::Knight,
            PieceKind::Bishop => PieceType::Bishop,
            PieceKind::Rook => PieceType::Rook,
            PieceKind::Queen => PieceType::Queen,
        }
    }

    /// Parse a wire letter (case-insensitive).
    pub fn from_letter(letter: char) -> Option<Self> {
        PieceKind::ALL
            .into_iter()
            .find(|kind| kind.letter() == letter.to_ascii_lowercase())
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PieceKind::Pawn => "pawn",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Rook => "rook",
            PieceKind::Queen => "queen",
        };
        f.write_str(name)
    }
}

/// Outcome of a finished game.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "WireResult")]
pub struct GameResult {
    /// Server reason code, e.g. `checkmate` or `timeout`.
    pub reason: String,
    /// Winner as reported by the server, if any.
    pub winner: Option<String>,
    /// Final capital of each side, when the server reports both figures.
    pub final_capital: Option<PerSide<i64>>,
}

impl Default for GameResult {
    fn default() -> Self {
        Self {
            reason: "finished".to_string(),
            winner: None,
            final_capital: None,
        }
    }
}

impl From<WireResult> for GameResult {
    fn from(wire: WireResult) -> Self {
        let final_capital = match (wire.cap_w, wire.cap_b) {
            (Some(white), Some(black)) if white.is_finite() && black.is_finite() => {
                Some(PerSide {
                    white: white.floor() as i64,
                    black: black.floor() as i64,
                })
            }
            _ => None,
        };
        Self {
            reason: wire
                .reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| "finished".to_string()),
            winner: wire.winner.filter(|w| !w.trim().is_empty()),
            final_capital,
        }
    }
}

// ---------------------------------------------------------------------------
// GameSnapshot
// ---------------------------------------------------------------------------

/// Complete, timestamped description of the game at one server instant.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "WireGame")]
pub struct GameSnapshot {
    game_id: GameId,
    status: GameStatus,
    turn: Side,
    board: Board,
    coins: PerSide<u64>,
    clocks: PerSide<u64>,
    global_deadline: i64,
    /// Kept in milliseconds so snapshots within one second still order.
    server_timestamp_ms: Option<i64>,
    viewer_side: Option<Side>,
    check_buy_lock: bool,
    result: Option<GameResult>,
}

impl GameSnapshot {
    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Side to move. Only meaningful while the game is active.
    pub fn turn(&self) -> Side {
        self.turn
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Coins held by each side.
    pub fn coins(&self) -> PerSide<u64> {
        self.coins
    }

    /// Remaining clock seconds of each side at [`Self::server_timestamp`].
    pub fn clocks(&self) -> PerSide<u64> {
        self.clocks
    }

    /// Absolute server time (seconds) at which the whole game times out.
    pub fn global_deadline(&self) -> i64 {
        self.global_deadline
    }

    /// Server clock reading (whole seconds) when the snapshot was produced.
    pub fn server_timestamp(&self) -> Option<i64> {
        self.server_timestamp_ms.map(|ms| ms.div_euclid(1000))
    }

    /// Server clock reading in milliseconds. Use this to order snapshots.
    pub fn server_timestamp_ms(&self) -> Option<i64> {
        self.server_timestamp_ms
    }

    /// Side played by the requesting identity, when the server reported it.
    pub fn viewer_side(&self) -> Option<Side> {
        self.viewer_side
    }

    /// Server flag forbidding purchases this turn.
    pub fn check_buy_lock(&self) -> bool {
        self.check_buy_lock
    }

    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.status == GameStatus::Active
    }

    /// `true` while the game is active and `side` is to move.
    pub fn is_turn_of(&self, side: Side) -> bool {
        self.is_active() && self.turn == side
    }

    /// Fill in the viewer side when the payload omitted it.
    pub fn with_viewer_side(mut self, side: Side) -> Self {
        if self.viewer_side.is_none() {
            self.viewer_side = Some(side);
        }
        self
    }

    /// Annotate a terminal result onto this snapshot.
    pub fn mark_finished(&mut self, result: GameResult) {
        self.status = GameStatus::Finished;
        self.result = Some(result);
    }
}

impl TryFrom<WireGame> for GameSnapshot {
    type Error = SnapshotError;

    fn try_from(wire: WireGame) -> Result<Self, Self::Error> {
        let game_id = wire
            .game_id
            .and_then(GameId::new)
            .ok_or(SnapshotError::MissingGameId)?;

        // A finished game may omit the side to move.
        let turn = match (wire.turn, wire.status) {
            (Some(turn), _) => turn,
            (None, GameStatus::Finished) => Side::White,
            (None, GameStatus::Active) => return Err(SnapshotError::MissingTurn),
        };

        let board = Board::from_fen(&wire.fen)?;

        let coins = PerSide {
            white: non_negative_int(wire.coins_w, "coins_w")?,
            black: non_negative_int(wire.coins_b, "coins_b")?,
        };
        let clocks = PerSide {
            white: non_negative_secs(wire.clock_w_rem, "clock_w_rem")?,
            black: non_negative_secs(wire.clock_b_rem, "clock_b_rem")?,
        };
        let global_deadline = whole_secs(wire.global_end_ts, "global_end_ts")?;
        let server_timestamp_ms = wire
            .server_ts
            .map(|ts| whole_millis(ts, "server_ts"))
            .transpose()?;

        Ok(Self {
            game_id,
            status: wire.status,
            turn,
            board,
            coins,
            clocks,
            global_deadline,
            server_timestamp_ms,
            viewer_side: wire.you,
            check_buy_lock: wire.in_check_start.is_set() && wire.buy_locked.is_set(),
            result: wire.result.map(GameResult::from),
        })
    }
}

fn whole_secs(value: f64, field: &'static str) -> Result<i64, SnapshotError> {
    if !value.is_finite() {
        return Err(SnapshotError::NotFinite(field));
    }
    Ok(value.floor() as i64)
}

fn whole_millis(value: f64, field: &'static str) -> Result<i64, SnapshotError> {
    if !value.is_finite() {
        return Err(SnapshotError::NotFinite(field));
    }
    Ok((value * 1000.0).round() as i64)
}

fn non_negative_secs(value: f64, field: &'static str) -> Result<u64, SnapshotError> {
    let secs = whole_secs(value, field)?;
    u64::try_from(secs).map_err(|_| SnapshotError::Negative(field))
}

fn non_negative_int(value: i64, field: &'static str) -> Result<u64, SnapshotError> {
    u64::try_from(value).map_err(|_| SnapshotError::Negative(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Square;
    use serde_json::json;

    fn payload() -> serde_json::Value {
        json!({
            "game_id": "g-17",
            "status": "active",
            "turn": "w",
            "fen": "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "coins_w": 4,
            "coins_b": 7,
            "clock_w_rem": 299.7,
            "clock_b_rem": 300,
            "global_end_ts": 2000,
            "server_ts": 1000.4,
            "you": "b",
            "in_check_start": 0,
            "buy_locked": 0
        })
    }

    fn decode(value: serde_json::Value) -> Result<GameSnapshot, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn test_decode_full_payload() {
        let snap = decode(payload()).unwrap();
        assert_eq!(snap.game_id().as_str(), "g-17");
        assert_eq!(snap.status(), GameStatus::Active);
        assert_eq!(snap.turn(), Side::White);
        assert_eq!(snap.coins(), PerSide { white: 4, black: 7 });
        assert_eq!(snap.clocks(), PerSide { white: 299, black: 300 });
        assert_eq!(snap.global_deadline(), 2000);
        assert_eq!(snap.server_timestamp(), Some(1000));
        assert_eq!(snap.server_timestamp_ms(), Some(1_000_400));
        assert_eq!(snap.viewer_side(), Some(Side::Black));
        assert!(!snap.check_buy_lock());
        assert!(snap.result().is_none());
        assert!(snap.is_turn_of(Side::White));
        assert!(!snap.is_turn_of(Side::Black));
    }

    #[test]
    fn test_optional_fields_may_be_absent() {
        let mut value = payload();
        let obj = value.as_object_mut().unwrap();
        obj.remove("server_ts");
        obj.remove("in_check_start");
        obj.remove("buy_locked");
        obj.insert("you".into(), serde_json::Value::Null);
        obj.insert("future_field".into(), json!([1, 2, 3]));

        let snap = decode(value).unwrap();
        assert_eq!(snap.server_timestamp(), None);
        assert_eq!(snap.viewer_side(), None);
        assert!(!snap.check_buy_lock());
    }

    #[test]
    fn test_buy_lock_requires_both_flags() {
        let mut value = payload();
        value["in_check_start"] = json!(1);
        assert!(!decode(value.clone()).unwrap().check_buy_lock());
        value["buy_locked"] = json!(true);
        assert!(decode(value).unwrap().check_buy_lock());
    }

    #[test]
    fn test_unknown_status_rejected() {
        let mut value = payload();
        value["status"] = json!("paused");
        assert!(decode(value).is_err());
    }

    #[test]
    fn test_missing_game_id_rejected() {
        let mut value = payload();
        value["game_id"] = json!("");
        let err = decode(value).unwrap_err();
        assert!(err.to_string().contains("game_id"), "{err}");
    }

    #[test]
    fn test_negative_coins_rejected() {
        let mut value = payload();
        value["coins_b"] = json!(-1);
        let err = decode(value).unwrap_err();
        assert!(err.to_string().contains("coins_b"), "{err}");
    }

    #[test]
    fn test_bad_board_rejected() {
        let mut value = payload();
        value["fen"] = json!("not a board");
        assert!(decode(value).is_err());
    }

    #[test]
    fn test_finished_payload_carries_result() {
        let mut value = payload();
        value["status"] = json!("finished");
        value["result"] = json!({"reason": "timeout", "winner": "@alice", "cap_w": 12, "cap_b": 9});
        let snap = decode(value).unwrap();
        let result = snap.result().unwrap();
        assert_eq!(result.reason, "timeout");
        assert_eq!(result.winner.as_deref(), Some("@alice"));
        assert_eq!(result.final_capital, Some(PerSide { white: 12, black: 9 }));
        assert!(!snap.is_turn_of(Side::White));
    }

    #[test]
    fn test_result_defaults() {
        let result: GameResult = serde_json::from_value(json!({"winner": ""})).unwrap();
        assert_eq!(result.reason, "finished");
        assert_eq!(result.winner, None);
        let partial: GameResult =
            serde_json::from_value(json!({"reason": "resign", "cap_w": 3})).unwrap();
        assert_eq!(partial.final_capital, None);
    }

    #[test]
    fn test_with_viewer_side_does_not_override() {
        let snap = decode(payload()).unwrap().with_viewer_side(Side::White);
        assert_eq!(snap.viewer_side(), Some(Side::Black));
    }

    #[test]
    fn test_mark_finished_keeps_board() {
        let mut snap = decode(payload()).unwrap();
        let before = snap.board().clone();
        snap.mark_finished(GameResult::default());
        assert_eq!(snap.status(), GameStatus::Finished);
        assert_eq!(snap.board(), &before);
        assert!(snap.board().piece_at("e2".parse::<Square>().unwrap()).is_some());
    }

    #[test]
    fn test_piece_kind_costs_and_letters() {
        let costs: Vec<u64> = PieceKind::ALL.iter().map(|k| k.cost()).collect();
        assert_eq!(costs, vec![1, 3, 3, 5, 9]);
        assert_eq!(PieceKind::from_letter('N'), Some(PieceKind::Knight));
        assert_eq!(PieceKind::from_letter('k'), None);
        assert_eq!(PieceKind::Queen.letter(), 'q');
    }
}
