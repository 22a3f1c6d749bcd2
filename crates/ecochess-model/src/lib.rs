//! Game-state model for the economy chess client.
//!
//! Squares, pieces and the decoded board encoding live in [`board`]; the
//! server-authoritative [`GameSnapshot`] and its strict wire decoding live in
//! [`game`].

pub mod board;
pub mod game;
mod wire;

pub use board::{Board, BoardError, Piece, PieceType, Side, Square};
pub use game::{GameId, GameResult, GameSnapshot, GameStatus, PerSide, PieceKind, SnapshotError};
