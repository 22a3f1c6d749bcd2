//! Presentation-facing views and the render trigger.
//!
//! The session hands a [`Frame`] to its [`Presenter`] whenever the snapshot
//! or the selection changes, and a [`ClockView`] on every clock tick. What
//! the presenter draws with them is its own business.

use std::collections::BTreeSet;
use std::fmt;

use ecochess_model::{Board, GameResult, PerSide, Piece, PieceKind, Side, Square};
use ecochess_net::TransportState;

use crate::clock::ClockView;

/// Receiver of render requests.
pub trait Presenter {
    /// Redraw everything.
    fn render(&mut self, frame: &Frame);

    /// Redraw the clocks only. `None` means unknown.
    fn clocks(&mut self, clocks: Option<ClockView>);

    /// Show the terminal notification for a finished game. Called once.
    fn game_finished(&mut self, notice: &FinishNotice);
}

/// Everything needed to draw the client.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub board: BoardView,
    pub shop: ShopView,
    pub clocks: Option<ClockView>,
    pub status: String,
    pub transport: TransportState,
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Occupancy plus selection highlights.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardView {
    /// Decoded board, empty before the first snapshot.
    pub board: Board,
    /// Side at the bottom of the board. White unless the viewer plays Black.
    pub orientation: Side,
    /// Side to move, when a snapshot exists.
    pub turn: Option<Side>,
    pub selected: Option<Square>,
    pub moves: BTreeSet<Square>,
    pub captures: BTreeSet<Square>,
    pub drops: BTreeSet<Square>,
}

/// How a square should be highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    None,
    Selected,
    Move,
    Capture,
    Drop,
}

impl Default for BoardView {
    fn default() -> Self {
        Self {
            board: Board::default(),
            orientation: Side::White,
            turn: None,
            selected: None,
            moves: BTreeSet::new(),
            captures: BTreeSet::new(),
            drops: BTreeSet::new(),
        }
    }
}

impl BoardView {
    /// Squares in screen order: top row first, each row left to right.
    pub fn rows(&self) -> Vec<Vec<Square>> {
        (0..8u8)
            .rev()
            .map(|rank| {
                (0..8u8)
                    .filter_map(|file| Square::new(file, rank))
                    .map(|square| match self.orientation {
                        Side::White => square,
                        Side::Black => square.flipped(),
                    })
                    .collect()
            })
            .collect()
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board.piece_at(square)
    }

    pub fn highlight(&self, square: Square) -> Highlight {
        if self.selected == Some(square) {
            Highlight::Selected
        } else if self.captures.contains(&square) {
            Highlight::Capture
        } else if self.moves.contains(&square) {
            Highlight::Move
        } else if self.drops.contains(&square) {
            Highlight::Drop
        } else {
            Highlight::None
        }
    }
}

// ---------------------------------------------------------------------------
// Shop
// ---------------------------------------------------------------------------

/// One shop button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopItem {
    pub kind: PieceKind,
    pub cost: u64,
    /// How many the viewer could buy right now: `floor(coins / cost)`.
    pub quantity: u64,
    /// Buying is blocked or unaffordable.
    pub dimmed: bool,
    /// This kind is selected in BUY mode.
    pub selected: bool,
}

/// Economy panel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShopView {
    pub coins: PerSide<u64>,
    pub viewer_coins: u64,
    pub blocked: bool,
    /// The check-buy-lock flag is set.
    pub locked: bool,
    pub items: Vec<ShopItem>,
}

impl ShopView {
    pub fn build(
        coins: PerSide<u64>,
        viewer_coins: u64,
        blocked: bool,
        locked: bool,
        selected: Option<PieceKind>,
    ) -> Self {
        let items = PieceKind::ALL
            .into_iter()
            .map(|kind| {
                let quantity = viewer_coins / kind.cost();
                ShopItem {
                    kind,
                    cost: kind.cost(),
                    quantity,
                    dimmed: blocked || quantity == 0,
                    selected: selected == Some(kind),
                }
            })
            .collect();
        Self {
            coins,
            viewer_coins,
            blocked,
            locked,
            items,
        }
    }
}

// ---------------------------------------------------------------------------
// Finish notice
// ---------------------------------------------------------------------------

/// Terminal notification, shown once per game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishNotice {
    pub result: GameResult,
}

impl fmt::Display for FinishNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Game finished: {}", self.result.reason)?;
        if let Some(winner) = &self.result.winner {
            write!(f, ", winner: {winner}")?;
        }
        if let Some(capital) = &self.result.final_capital {
            write!(f, " (capital W={}, B={})", capital.white, capital.black)?;
        }
        Ok(())
    }
}
