//! Session context: Snapshot Model and Selection State Machine glued
//! together with the interaction rules.
//!
//! The context never performs I/O. User input returns the [`RemoteCall`] to
//! issue, and each remote answer is fed back through the matching
//! `*_finished` / `*_targets` method. This keeps every ordering rule
//! testable without a runtime.

use ecochess_model::{GameResult, GameSnapshot, PieceKind, Side, Square};
use ecochess_net::{ApiError, MutationOutcome, TransportState};

use crate::clock::{self, ClockView};
use crate::selection::{Selection, SelectionMode};
use crate::snapshot::{AcceptOutcome, SnapshotModel};
use crate::view::{BoardView, FinishNotice, Frame, ShopView};

pub const STATUS_YOUR_MOVE: &str = "Your move";
pub const STATUS_OPPONENT_MOVE: &str = "Opponent's move";
pub const STATUS_FINISHED: &str = "Game finished";
pub const STATUS_SIDE_UNKNOWN: &str = "Player side unknown, watching only";
pub const STATUS_BUSY: &str = "Waiting for the server";
pub const STATUS_BUY_LOCKED: &str = "Purchases are locked until check is resolved";

/// A remote request the session must issue on the context's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCall {
    /// Advisory: legal destinations of the piece on `from`.
    MoveTargets { generation: u64, from: Square },
    /// Advisory: legal drop squares for `kind`.
    DropTargets { generation: u64, kind: PieceKind },
    /// Mutating: play a move.
    SubmitMove { from: Square, to: Square },
    /// Mutating: buy and drop a piece.
    SubmitDrop { kind: PieceKind, square: Square },
}

/// Mutable state of one game session.
#[derive(Debug, Default)]
pub struct SessionContext {
    model: SnapshotModel,
    selection: Selection,
    status: String,
    /// A move or drop is awaiting its answer.
    in_flight: bool,
    notice: Option<FinishNotice>,
    notified: bool,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(&self) -> &SnapshotModel {
        &self.model
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    // -----------------------------------------------------------------------
    // Server updates
    // -----------------------------------------------------------------------

    /// Offer a snapshot from any source. An accepted snapshot clears the
    /// selection.
    pub fn apply_snapshot(&mut self, snapshot: GameSnapshot, local_now: i64) -> AcceptOutcome {
        let outcome = self.model.accept(snapshot, local_now);
        if outcome.is_accepted() {
            self.selection.clear();
            self.status = self.turn_status().to_string();
            self.check_finished();
        }
        outcome
    }

    /// Apply a terminal push result to the last known snapshot.
    pub fn apply_finished(&mut self, result: GameResult) {
        if !self.model.annotate_finished(result.clone()) {
            tracing::debug!("finished message before any snapshot");
        }
        self.selection.clear();
        self.status = STATUS_FINISHED.to_string();
        if !self.notified {
            self.notified = true;
            self.notice = Some(FinishNotice { result });
        }
    }

    /// The terminal notification, once per game.
    pub fn take_notice(&mut self) -> Option<FinishNotice> {
        self.notice.take()
    }

    fn check_finished(&mut self) {
        if self.notified {
            return;
        }
        let result = self
            .model
            .current()
            .filter(|s| !s.is_active())
            .and_then(|s| s.result())
            .cloned();
        if let Some(result) = result {
            self.notified = true;
            self.notice = Some(FinishNotice { result });
        }
    }

    fn turn_status(&self) -> &'static str {
        let Some(snapshot) = self.model.current() else {
            return "";
        };
        if !snapshot.is_active() {
            return STATUS_FINISHED;
        }
        match self.model.viewer_side() {
            None => STATUS_SIDE_UNKNOWN,
            Some(side) if snapshot.is_turn_of(side) => STATUS_YOUR_MOVE,
            Some(_) => STATUS_OPPONENT_MOVE,
        }
    }

    // -----------------------------------------------------------------------
    // User input
    // -----------------------------------------------------------------------

    /// The viewer's side if interaction is allowed at all right now.
    fn interactive_side(&mut self) -> Option<Side> {
        if self.in_flight {
            self.status = STATUS_BUSY.to_string();
            return None;
        }
        let side = self.model.viewer_side()?;
        self.model.is_viewer_turn().then_some(side)
    }

    /// A click on `square`.
    pub fn click(&mut self, square: Square) -> Option<RemoteCall> {
        let side = self.interactive_side()?;
        let board = self.model.current()?.board();

        if let Some(kind) = self.selection.selected_kind() {
            if self.selection.is_drop_target(square) {
                self.in_flight = true;
                return Some(RemoteCall::SubmitDrop { kind, square });
            }
            self.selection.clear();
            return None;
        }

        if let Some(from) = self.selection.selected_square() {
            if self.selection.is_move_target(square) {
                self.in_flight = true;
                return Some(RemoteCall::SubmitMove { from, to: square });
            }
            if from == square {
                self.selection.clear();
                return None;
            }
        }

        if board.is_owned_by(square, side) {
            let generation = self.selection.select_square(square);
            return Some(RemoteCall::MoveTargets {
                generation,
                from: square,
            });
        }
        if !self.selection.is_none() {
            self.selection.clear();
        }
        None
    }

    /// A shop button for `kind`.
    pub fn shop(&mut self, kind: PieceKind) -> Option<RemoteCall> {
        self.interactive_side()?;

        if self.selection.selected_kind() == Some(kind) {
            self.selection.clear();
            return None;
        }
        if self.model.current().is_some_and(|s| s.check_buy_lock()) {
            self.status = STATUS_BUY_LOCKED.to_string();
            return None;
        }
        if self.model.viewer_coins() < kind.cost() {
            self.status = format!("Not enough coins for a {kind}");
            return None;
        }

        let generation = self.selection.select_kind(kind);
        Some(RemoteCall::DropTargets { generation, kind })
    }

    // -----------------------------------------------------------------------
    // Remote answers
    // -----------------------------------------------------------------------

    /// Destinations for a MOVE selection. Returns whether they were used.
    pub fn move_targets(&mut self, generation: u64, result: Result<Vec<Square>, ApiError>) -> bool {
        let dests = match result {
            Ok(dests) => dests,
            Err(e) => {
                tracing::warn!("legal move query failed: {e}");
                Vec::new()
            }
        };
        let Some(snapshot) = self.model.current() else {
            return false;
        };
        let applied = self
            .selection
            .set_move_targets(generation, snapshot.board(), &dests);
        if !applied {
            tracing::debug!(generation, "discarding stale move targets");
        }
        applied
    }

    /// Drop squares for a BUY selection. Returns whether they were used.
    pub fn drop_targets(&mut self, generation: u64, result: Result<Vec<Square>, ApiError>) -> bool {
        let targets = match result {
            Ok(targets) => targets,
            Err(e) => {
                tracing::warn!("drop target query failed: {e}");
                Vec::new()
            }
        };
        let applied = self.selection.set_drop_targets(generation, &targets);
        if !applied {
            tracing::debug!(generation, "discarding stale drop targets");
        }
        applied
    }

    /// Answer to a [`RemoteCall::SubmitMove`].
    pub fn move_finished(&mut self, result: Result<MutationOutcome, ApiError>, local_now: i64) {
        self.in_flight = false;
        match result {
            Ok(MutationOutcome::Applied(snapshot)) => {
                self.apply_snapshot(snapshot, local_now);
            }
            Ok(MutationOutcome::Rejected(reason)) => {
                self.status = format!("Move rejected: {reason}");
            }
            Err(e) => {
                tracing::warn!("move request failed: {e}");
                self.status = format!("Move failed: {e}");
            }
        }
    }

    /// Answer to a [`RemoteCall::SubmitDrop`] of `kind`.
    ///
    /// After a successful purchase BUY is re-entered for the same kind when
    /// the viewer may and can buy again; the returned call re-queries its
    /// drop squares.
    pub fn drop_finished(
        &mut self,
        kind: PieceKind,
        result: Result<MutationOutcome, ApiError>,
        local_now: i64,
    ) -> Option<RemoteCall> {
        self.in_flight = false;
        match result {
            Ok(MutationOutcome::Applied(snapshot)) => {
                if !self.apply_snapshot(snapshot, local_now).is_accepted() {
                    return None;
                }
                let locked = self.model.current().is_some_and(|s| s.check_buy_lock());
                if locked {
                    if self.model.is_viewer_turn() {
                        self.status = STATUS_BUY_LOCKED.to_string();
                    }
                    return None;
                }
                if self.model.buy_blocked() || self.model.viewer_coins() < kind.cost() {
                    return None;
                }
                let generation = self.selection.select_kind(kind);
                Some(RemoteCall::DropTargets { generation, kind })
            }
            Ok(MutationOutcome::Rejected(reason)) => {
                self.status = format!("Purchase rejected: {reason}");
                None
            }
            Err(e) => {
                tracing::warn!("drop request failed: {e}");
                self.status = format!("Purchase failed: {e}");
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    pub fn clock_view(&self, local_now: i64) -> Option<ClockView> {
        clock::reconcile(self.model.current(), self.model.server_offset(), local_now)
    }

    pub fn board_view(&self) -> BoardView {
        let mut view = BoardView {
            orientation: self.model.viewer_side().unwrap_or(Side::White),
            ..BoardView::default()
        };
        if let Some(snapshot) = self.model.current() {
            view.board = snapshot.board().clone();
            view.turn = snapshot.is_active().then(|| snapshot.turn());
        }
        match self.selection.mode() {
            SelectionMode::None => {}
            SelectionMode::Move {
                from,
                moves,
                captures,
            } => {
                view.selected = Some(*from);
                view.moves = moves.clone();
                view.captures = captures.clone();
            }
            SelectionMode::Buy { targets, .. } => {
                view.drops = targets.clone();
            }
        }
        view
    }

    pub fn shop_view(&self) -> ShopView {
        let snapshot = self.model.current();
        ShopView::build(
            snapshot.map(|s| s.coins()).unwrap_or_default(),
            self.model.viewer_coins(),
            self.model.buy_blocked(),
            snapshot.is_some_and(|s| s.check_buy_lock()),
            self.selection.selected_kind(),
        )
    }

    pub fn frame(&self, local_now: i64, transport: TransportState) -> Frame {
        Frame {
            board: self.board_view(),
            shop: self.shop_view(),
            clocks: self.clock_view(local_now),
            status: self.status.clone(),
            transport,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecochess_model::GameStatus;
    use serde_json::{Value, json};
    use std::collections::BTreeSet;

    const START_FEN: &str = "4k3/8/8/8/8/2p5/4P3/1N2K3 w - - 0 1";

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn payload(ts: i64) -> Value {
        json!({
            "game_id": "g1", "status": "active", "turn": "w",
            "fen": START_FEN,
            "coins_w": 7, "coins_b": 3,
            "clock_w_rem": 300, "clock_b_rem": 300,
            "global_end_ts": 2000, "server_ts": ts, "you": "w"
        })
    }

    fn snap(value: Value) -> GameSnapshot {
        serde_json::from_value(value).unwrap()
    }

    fn context() -> SessionContext {
        let mut ctx = SessionContext::new();
        ctx.apply_snapshot(snap(payload(1000)), 1000);
        ctx
    }

    fn select_knight(ctx: &mut SessionContext) -> u64 {
        match ctx.click(sq("b1")) {
            Some(RemoteCall::MoveTargets { generation, from }) => {
                assert_eq!(from, sq("b1"));
                generation
            }
            other => panic!("expected move target query, got {other:?}"),
        }
    }

    fn enter_buy(ctx: &mut SessionContext, kind: PieceKind, targets: &[Square]) -> u64 {
        let Some(RemoteCall::DropTargets { generation, .. }) = ctx.shop(kind) else {
            panic!("expected drop target query");
        };
        assert!(ctx.drop_targets(generation, Ok(targets.to_vec())));
        generation
    }

    #[test]
    fn test_select_own_piece_and_classify() {
        let mut ctx = context();
        let generation = select_knight(&mut ctx);
        assert!(ctx.move_targets(generation, Ok(vec![sq("c3"), sq("a3")])));

        let view = ctx.board_view();
        assert_eq!(view.selected, Some(sq("b1")));
        assert_eq!(view.captures, BTreeSet::from([sq("c3")]));
        assert_eq!(view.moves, BTreeSet::from([sq("a3")]));
    }

    #[test]
    fn test_clicking_opponent_or_empty_in_none_does_nothing() {
        let mut ctx = context();
        assert_eq!(ctx.click(sq("c3")), None);
        assert_eq!(ctx.click(sq("a5")), None);
        assert!(ctx.selection().is_none());
    }

    #[test]
    fn test_click_outside_targets_clears_move() {
        let mut ctx = context();
        let generation = select_knight(&mut ctx);
        ctx.move_targets(generation, Ok(vec![sq("a3")]));
        assert_eq!(ctx.click(sq("h5")), None);
        assert!(ctx.selection().is_none());
    }

    #[test]
    fn test_clicking_selected_square_toggles_off() {
        let mut ctx = context();
        select_knight(&mut ctx);
        assert_eq!(ctx.click(sq("b1")), None);
        assert!(ctx.selection().is_none());
    }

    #[test]
    fn test_reselect_other_piece_discards_old_answer() {
        let mut ctx = context();
        let old = select_knight(&mut ctx);
        let Some(RemoteCall::MoveTargets { generation, .. }) = ctx.click(sq("e2")) else {
            panic!("expected query for e2");
        };
        assert!(!ctx.move_targets(old, Ok(vec![sq("a3")])));
        assert!(ctx.move_targets(generation, Ok(vec![sq("e3"), sq("e4")])));
        assert_eq!(ctx.selection().selected_square(), Some(sq("e2")));
        assert!(ctx.selection().is_move_target(sq("e4")));
        assert!(!ctx.selection().is_move_target(sq("a3")));
    }

    #[test]
    fn test_move_success_applies_snapshot_and_clears() {
        let mut ctx = context();
        let generation = select_knight(&mut ctx);
        ctx.move_targets(generation, Ok(vec![sq("c3")]));
        assert_eq!(
            ctx.click(sq("c3")),
            Some(RemoteCall::SubmitMove {
                from: sq("b1"),
                to: sq("c3")
            })
        );
        assert!(ctx.is_in_flight());

        let mut next = payload(1001);
        next["turn"] = json!("b");
        ctx.move_finished(Ok(MutationOutcome::Applied(snap(next))), 1001);
        assert!(!ctx.is_in_flight());
        assert!(ctx.selection().is_none());
        assert_eq!(ctx.status(), STATUS_OPPONENT_MOVE);
    }

    #[test]
    fn test_move_rejection_keeps_selection() {
        let mut ctx = context();
        let generation = select_knight(&mut ctx);
        ctx.move_targets(generation, Ok(vec![sq("c3")]));
        ctx.click(sq("c3"));
        let before = ctx.selection().mode().clone();

        ctx.move_finished(Ok(MutationOutcome::Rejected("illegal".into())), 1001);
        assert_eq!(ctx.selection().mode(), &before);
        assert_eq!(ctx.status(), "Move rejected: illegal");

        ctx.click(sq("c3"));
        ctx.move_finished(Err(ApiError::Status(502)), 1001);
        assert_eq!(ctx.selection().mode(), &before);
        assert!(ctx.status().starts_with("Move failed"));
    }

    #[test]
    fn test_clicks_ignored_while_in_flight() {
        let mut ctx = context();
        let generation = select_knight(&mut ctx);
        ctx.move_targets(generation, Ok(vec![sq("c3")]));
        ctx.click(sq("c3"));

        assert_eq!(ctx.click(sq("e2")), None);
        assert_eq!(ctx.shop(PieceKind::Pawn), None);
        assert_eq!(ctx.status(), STATUS_BUSY);
        assert_eq!(ctx.selection().selected_square(), Some(sq("b1")));
    }

    #[test]
    fn test_snapshot_clears_any_selection() {
        let mut ctx = context();
        select_knight(&mut ctx);
        ctx.apply_snapshot(snap(payload(1001)), 1001);
        assert!(ctx.selection().is_none());

        enter_buy(&mut ctx, PieceKind::Knight, &[sq("c4")]);
        ctx.apply_snapshot(snap(payload(1002)), 1002);
        assert!(ctx.selection().is_none());
    }

    #[test]
    fn test_stale_snapshot_keeps_selection() {
        let mut ctx = context();
        select_knight(&mut ctx);
        assert_eq!(ctx.apply_snapshot(snap(payload(900)), 1001), AcceptOutcome::Stale);
        assert_eq!(ctx.selection().selected_square(), Some(sq("b1")));
    }

    #[test]
    fn test_buy_toggle_and_switch() {
        let mut ctx = context();
        select_knight(&mut ctx);
        enter_buy(&mut ctx, PieceKind::Pawn, &[sq("a3")]);
        assert_eq!(ctx.selection().selected_square(), None);

        enter_buy(&mut ctx, PieceKind::Knight, &[sq("c4")]);
        assert_eq!(ctx.selection().selected_kind(), Some(PieceKind::Knight));
        assert!(!ctx.selection().is_drop_target(sq("a3")));

        assert_eq!(ctx.shop(PieceKind::Knight), None);
        assert!(ctx.selection().is_none());
    }

    #[test]
    fn test_buy_refused_when_unaffordable_or_locked() {
        let mut ctx = context();
        assert_eq!(ctx.shop(PieceKind::Queen), None);
        assert_eq!(ctx.status(), "Not enough coins for a queen");

        let mut locked = payload(1001);
        locked["in_check_start"] = json!(1);
        locked["buy_locked"] = json!(1);
        ctx.apply_snapshot(snap(locked), 1001);
        assert_eq!(ctx.shop(PieceKind::Pawn), None);
        assert_eq!(ctx.status(), STATUS_BUY_LOCKED);
        assert!(ctx.shop_view().items.iter().all(|i| i.dimmed));
    }

    #[test]
    fn test_buy_off_turn_is_ignored() {
        let mut ctx = SessionContext::new();
        let mut theirs = payload(1000);
        theirs["turn"] = json!("b");
        ctx.apply_snapshot(snap(theirs), 1000);
        assert_eq!(ctx.shop(PieceKind::Pawn), None);
        assert_eq!(ctx.click(sq("b1")), None);
        assert_eq!(ctx.status(), STATUS_OPPONENT_MOVE);
    }

    #[test]
    fn test_drop_rejection_keeps_buy_state() {
        let mut ctx = context();
        enter_buy(&mut ctx, PieceKind::Knight, &[sq("c4"), sq("d4")]);
        let before = ctx.selection().mode().clone();
        let snapshot_before = ctx.model().current().cloned();

        assert_eq!(
            ctx.click(sq("c4")),
            Some(RemoteCall::SubmitDrop {
                kind: PieceKind::Knight,
                square: sq("c4")
            })
        );
        let follow_up = ctx.drop_finished(
            PieceKind::Knight,
            Ok(MutationOutcome::Rejected("insufficient funds".into())),
            1001,
        );
        assert_eq!(follow_up, None);
        assert_eq!(ctx.selection().mode(), &before);
        assert_eq!(ctx.model().current().cloned(), snapshot_before);
        assert_eq!(ctx.status(), "Purchase rejected: insufficient funds");
    }

    #[test]
    fn test_click_outside_drop_targets_clears_buy() {
        let mut ctx = context();
        enter_buy(&mut ctx, PieceKind::Pawn, &[sq("a3")]);
        assert_eq!(ctx.click(sq("h6")), None);
        assert!(ctx.selection().is_none());
    }

    #[test]
    fn test_successful_drop_reenters_buy() {
        let mut ctx = context();
        enter_buy(&mut ctx, PieceKind::Knight, &[sq("c4")]);
        ctx.click(sq("c4"));

        let mut after = payload(1001);
        after["coins_w"] = json!(4);
        let follow_up = ctx.drop_finished(
            PieceKind::Knight,
            Ok(MutationOutcome::Applied(snap(after))),
            1001,
        );
        let Some(RemoteCall::DropTargets { generation, kind }) = follow_up else {
            panic!("expected re-query, got {follow_up:?}");
        };
        assert_eq!(kind, PieceKind::Knight);
        assert_eq!(generation, ctx.selection().generation());
        assert_eq!(ctx.selection().selected_kind(), Some(PieceKind::Knight));
    }

    #[test]
    fn test_drop_into_lock_does_not_reenter_buy() {
        let mut ctx = context();
        enter_buy(&mut ctx, PieceKind::Pawn, &[sq("a3")]);
        ctx.click(sq("a3"));

        let mut after = payload(1001);
        after["in_check_start"] = json!(1);
        after["buy_locked"] = json!(1);
        let follow_up = ctx.drop_finished(
            PieceKind::Pawn,
            Ok(MutationOutcome::Applied(snap(after))),
            1001,
        );
        assert_eq!(follow_up, None);
        assert!(ctx.selection().is_none());
        assert_eq!(ctx.status(), STATUS_BUY_LOCKED);
    }

    #[test]
    fn test_drop_ending_turn_does_not_reenter_buy() {
        let mut ctx = context();
        enter_buy(&mut ctx, PieceKind::Pawn, &[sq("a3")]);
        ctx.click(sq("a3"));

        let mut after = payload(1001);
        after["turn"] = json!("b");
        let follow_up = ctx.drop_finished(
            PieceKind::Pawn,
            Ok(MutationOutcome::Applied(snap(after))),
            1001,
        );
        assert_eq!(follow_up, None);
        assert_eq!(ctx.status(), STATUS_OPPONENT_MOVE);
    }

    #[test]
    fn test_finished_push_annotates_and_notifies_once() {
        let mut ctx = context();
        select_knight(&mut ctx);
        let result = GameResult {
            reason: "timeout".into(),
            winner: Some("@bob".into()),
            final_capital: None,
        };
        ctx.apply_finished(result.clone());

        assert!(ctx.selection().is_none());
        assert_eq!(ctx.model().current().unwrap().status(), GameStatus::Finished);
        assert_eq!(ctx.take_notice(), Some(FinishNotice { result }));
        assert_eq!(ctx.click(sq("b1")), None);

        // A later finished snapshot does not notify again.
        let mut last = payload(1005);
        last["status"] = json!("finished");
        last["result"] = json!({"reason": "timeout"});
        ctx.apply_snapshot(snap(last), 1005);
        assert_eq!(ctx.take_notice(), None);
        assert_eq!(ctx.status(), STATUS_FINISHED);
    }

    #[test]
    fn test_racing_active_snapshot_cannot_revive_finished_game() {
        let mut ctx = context();
        ctx.apply_finished(GameResult::default());

        let outcome = ctx.apply_snapshot(snap(payload(1000)), 1000);
        assert_eq!(outcome, AcceptOutcome::Stale);
        assert_eq!(ctx.model().current().unwrap().status(), GameStatus::Finished);
        assert_eq!(ctx.status(), STATUS_FINISHED);
        assert_eq!(ctx.click(sq("b1")), None);
    }

    #[test]
    fn test_finished_snapshot_notifies() {
        let mut ctx = context();
        let mut last = payload(1005);
        last["status"] = json!("finished");
        last["result"] = json!({"reason": "checkmate", "cap_w": 3, "cap_b": 9});
        ctx.apply_snapshot(snap(last), 1005);
        let notice = ctx.take_notice().unwrap();
        assert_eq!(notice.to_string(), "Game finished: checkmate (capital W=3, B=9)");
    }

    #[test]
    fn test_unknown_viewer_side_blocks_interaction() {
        let mut ctx = SessionContext::new();
        let mut anonymous = payload(1000);
        anonymous["you"] = Value::Null;
        ctx.apply_snapshot(snap(anonymous), 1000);
        assert_eq!(ctx.status(), STATUS_SIDE_UNKNOWN);
        assert_eq!(ctx.click(sq("b1")), None);
        assert_eq!(ctx.shop(PieceKind::Pawn), None);
    }

    #[test]
    fn test_black_viewer_board_is_flipped() {
        let mut ctx = SessionContext::new();
        let mut black = payload(1000);
        black["you"] = json!("b");
        ctx.apply_snapshot(snap(black), 1000);
        assert_eq!(ctx.board_view().orientation, Side::Black);
        assert_eq!(ctx.shop_view().viewer_coins, 3);
    }

    #[test]
    fn test_clock_view_follows_offset() {
        let ctx = context();
        let view = ctx.clock_view(1010).unwrap();
        assert_eq!((view.global, view.white, view.black), (990, 290, 300));
        assert_eq!(SessionContext::new().clock_view(1010), None);
    }
}
