//! Selection State Machine: the client-only tentative move or purchase.
//!
//! Exactly one of three modes is active. Every transition bumps a
//! generation counter; advisory target queries are tagged with the
//! generation that issued them and their answers are dropped once the
//! selection has moved on.

use std::collections::BTreeSet;

use ecochess_model::{Board, PieceKind, PieceType, Side, Square};

/// The current selection mode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    None,
    /// A piece on `from` is selected.
    Move {
        from: Square,
        moves: BTreeSet<Square>,
        captures: BTreeSet<Square>,
    },
    /// A purchasable kind is selected for placement.
    Buy {
        kind: PieceKind,
        targets: BTreeSet<Square>,
    },
}

/// Selection mode plus the generation counter that tags remote queries.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    mode: SelectionMode,
    generation: u64,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &SelectionMode {
        &self.mode
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_none(&self) -> bool {
        self.mode == SelectionMode::None
    }

    /// Selected source square, in MOVE mode.
    pub fn selected_square(&self) -> Option<Square> {
        match self.mode {
            SelectionMode::Move { from, .. } => Some(from),
            _ => None,
        }
    }

    /// Selected kind, in BUY mode.
    pub fn selected_kind(&self) -> Option<PieceKind> {
        match self.mode {
            SelectionMode::Buy { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// Drop to NONE. Any outstanding query becomes stale.
    pub fn clear(&mut self) {
        self.mode = SelectionMode::None;
        self.generation += 1;
    }

    /// Enter MOVE for `from` with empty target sets. Returns the generation
    /// to tag the destination query with.
    pub fn select_square(&mut self, from: Square) -> u64 {
        self.mode = SelectionMode::Move {
            from,
            moves: BTreeSet::new(),
            captures: BTreeSet::new(),
        };
        self.generation += 1;
        self.generation
    }

    /// Enter BUY for `kind` with an empty target set. Returns the generation
    /// to tag the drop-target query with.
    pub fn select_kind(&mut self, kind: PieceKind) -> u64 {
        self.mode = SelectionMode::Buy {
            kind,
            targets: BTreeSet::new(),
        };
        self.generation += 1;
        self.generation
    }

    /// Install server-supplied move destinations.
    ///
    /// Returns `false`, leaving the selection untouched, when `generation`
    /// is stale or the selection is no longer in MOVE.
    pub fn set_move_targets(&mut self, generation: u64, board: &Board, dests: &[Square]) -> bool {
        if generation != self.generation {
            return false;
        }
        let SelectionMode::Move {
            from,
            moves,
            captures,
        } = &mut self.mode
        else {
            return false;
        };
        let Some(mover) = board.piece_at(*from) else {
            return false;
        };
        let classified = classify_destinations(board, *from, mover.side, mover.kind, dests);
        *moves = classified.moves;
        *captures = classified.captures;
        true
    }

    /// Install server-supplied drop squares. Same staleness rule as
    /// [`Self::set_move_targets`].
    pub fn set_drop_targets(&mut self, generation: u64, squares: &[Square]) -> bool {
        if generation != self.generation {
            return false;
        }
        match &mut self.mode {
            SelectionMode::Buy { targets, .. } => {
                *targets = squares.iter().copied().collect();
                true
            }
            _ => false,
        }
    }

    /// `true` if `square` is a plain-move or capture destination.
    pub fn is_move_target(&self, square: Square) -> bool {
        match &self.mode {
            SelectionMode::Move {
                moves, captures, ..
            } => moves.contains(&square) || captures.contains(&square),
            _ => false,
        }
    }

    /// `true` if `square` is a legal drop square.
    pub fn is_drop_target(&self, square: Square) -> bool {
        match &self.mode {
            SelectionMode::Buy { targets, .. } => targets.contains(&square),
            _ => false,
        }
    }
}

/// Destinations split for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Destinations {
    pub moves: BTreeSet<Square>,
    pub captures: BTreeSet<Square>,
}

/// Partition server-declared destinations of the piece on `from`.
///
/// A destination occupied by the opponent is a capture. So is the
/// en-passant square when a pawn reaches it from an adjacent file.
/// Everything else is a plain move.
pub fn classify_destinations(
    board: &Board,
    from: Square,
    mover: Side,
    kind: PieceType,
    dests: &[Square],
) -> Destinations {
    let mut out = Destinations::default();
    for &dest in dests {
        let occupied_by_opponent = board.is_owned_by(dest, mover.opponent());
        let en_passant = kind == PieceType::Pawn
            && board.en_passant() == Some(dest)
            && from.file_distance(dest) == 1;
        if occupied_by_opponent || en_passant {
            out.captures.insert(dest);
        } else {
            out.moves.insert(dest);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn board(fen: &str) -> Board {
        Board::from_fen(fen).unwrap()
    }

    #[test]
    fn test_capture_and_plain_move_split() {
        // White knight on b1, black pawn on c3.
        let b = board("4k3/8/8/8/8/2p5/8/1N2K3 w - - 0 1");
        let dests = [sq("c3"), sq("a3")];
        let d = classify_destinations(&b, sq("b1"), Side::White, PieceType::Knight, &dests);
        assert_eq!(d.captures, BTreeSet::from([sq("c3")]));
        assert_eq!(d.moves, BTreeSet::from([sq("a3")]));
    }

    #[test]
    fn test_en_passant_is_capture() {
        let b = board("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1");
        let dests = [sq("d6"), sq("e6")];
        let d = classify_destinations(&b, sq("e5"), Side::White, PieceType::Pawn, &dests);
        assert_eq!(d.captures, BTreeSet::from([sq("d6")]));
        assert_eq!(d.moves, BTreeSet::from([sq("e6")]));
    }

    #[test]
    fn test_en_passant_square_reached_by_other_piece_is_plain() {
        let b = board("4k3/8/8/3pP3/8/8/8/3QK3 w - d6 0 1");
        let dests = [sq("d6")];
        let d = classify_destinations(&b, sq("d1"), Side::White, PieceType::Queen, &dests);
        assert!(d.captures.is_empty());
        assert_eq!(d.moves, BTreeSet::from([sq("d6")]));
    }

    #[test]
    fn test_modes_are_exclusive() {
        let mut sel = Selection::new();
        sel.select_square(sq("e2"));
        assert_eq!(sel.selected_square(), Some(sq("e2")));
        sel.select_kind(PieceKind::Knight);
        assert_eq!(sel.selected_square(), None);
        assert_eq!(sel.selected_kind(), Some(PieceKind::Knight));
        sel.select_square(sq("e2"));
        assert_eq!(sel.selected_kind(), None);
    }

    #[test]
    fn test_stale_generation_discarded() {
        let b = board("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1");
        let mut sel = Selection::new();
        let first = sel.select_square(sq("e2"));
        let second = sel.select_square(sq("e1"));
        assert_ne!(first, second);

        assert!(!sel.set_move_targets(first, &b, &[sq("e3"), sq("e4")]));
        assert!(!sel.is_move_target(sq("e3")));

        assert!(sel.set_move_targets(second, &b, &[sq("d1")]));
        assert!(sel.is_move_target(sq("d1")));
    }

    #[test]
    fn test_clear_invalidates_queries() {
        let mut sel = Selection::new();
        let generation = sel.select_kind(PieceKind::Pawn);
        sel.clear();
        assert!(sel.is_none());
        assert!(!sel.set_drop_targets(generation, &[sq("a3")]));
    }

    #[test]
    fn test_drop_targets_installed() {
        let mut sel = Selection::new();
        let generation = sel.select_kind(PieceKind::Rook);
        assert!(sel.set_drop_targets(generation, &[sq("a3"), sq("h3")]));
        assert!(sel.is_drop_target(sq("h3")));
        assert!(!sel.is_drop_target(sq("b3")));
        assert!(!sel.is_move_target(sq("h3")));
    }

    #[test]
    fn test_move_targets_rejected_outside_move_mode() {
        let b = board("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1");
        let mut sel = Selection::new();
        let generation = sel.select_kind(PieceKind::Pawn);
        assert!(!sel.set_move_targets(generation, &b, &[sq("e3")]));
    }
}
