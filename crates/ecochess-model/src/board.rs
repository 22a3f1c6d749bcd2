//! Board coordinates, pieces, and decoding of the compact board encoding.
//!
//! The server describes the position with the board field of a FEN string
//! (rank 8 first, piece letters, digit runs for empty squares) followed by
//! optional fields. Only the occupancy map and the en-passant target are
//! needed client-side; castling rights and move counters are ignored.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of files (and ranks) on the board.
pub const BOARD_SIZE: u8 = 8;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced while parsing squares or decoding a board encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// The text is not a square name such as `e4`.
    #[error("invalid square: {0:?}")]
    InvalidSquare(String),
    /// The encoding is empty.
    #[error("empty board encoding")]
    Empty,
    /// The placement field does not have eight ranks.
    #[error("expected 8 ranks, found {0}")]
    RankCount(usize),
    /// A rank does not describe exactly eight files.
    #[error("rank {rank} describes {files} files")]
    RankWidth {
        /// Rank number (1-8) as printed on the board.
        rank: u8,
        /// Number of files the rank text adds up to.
        files: u32,
    },
    /// An unknown piece letter was encountered.
    #[error("unknown piece letter {0:?}")]
    UnknownPiece(char),
}

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// One of the two players. White moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Wire form `"w"`.
    #[serde(rename = "w")]
    White,
    /// Wire form `"b"`.
    #[serde(rename = "b")]
    Black,
}

impl Side {
    /// The other side.
    pub fn opponent(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// Single-letter wire form.
    pub fn letter(self) -> char {
        match self {
            Side::White => 'w',
            Side::Black => 'b',
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => f.write_str("white"),
            Side::Black => f.write_str("black"),
        }
    }
}

// ---------------------------------------------------------------------------
// Square
// ---------------------------------------------------------------------------

/// A board square, `a1` through `h8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square {
    index: u8,
}

impl Square {
    /// Build a square from zero-based file (`a` = 0) and rank (`1` = 0).
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        (file < BOARD_SIZE && rank < BOARD_SIZE).then_some(Self {
            index: rank * BOARD_SIZE + file,
        })
    }

    /// Zero-based file index.
    pub fn file(self) -> u8 {
        self.index % BOARD_SIZE
    }

    /// Zero-based rank index.
    pub fn rank(self) -> u8 {
        self.index / BOARD_SIZE
    }

    /// Index into a rank-major `[_; 64]` array, `a1` = 0.
    pub fn index(self) -> usize {
        usize::from(self.index)
    }

    /// The square seen from the opposite side of the board.
    pub fn flipped(self) -> Self {
        Self {
            index: 63 - self.index,
        }
    }

    /// Absolute file distance between two squares.
    pub fn file_distance(self, other: Square) -> u8 {
        self.file().abs_diff(other.file())
    }

    /// All 64 squares, `a1` first.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..64u8).map(|index| Square { index })
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = char::from(b'a' + self.file());
        write!(f, "{file}{}", self.rank() + 1)
    }
}

impl FromStr for Square {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.trim().as_bytes();
        let [file, rank] = bytes else {
            return Err(BoardError::InvalidSquare(s.to_string()));
        };
        let file = file.to_ascii_lowercase();
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(rank) {
            return Err(BoardError::InvalidSquare(s.to_string()));
        }
        Square::new(file - b'a', rank - b'1').ok_or_else(|| BoardError::InvalidSquare(s.to_string()))
    }
}

impl TryFrom<String> for Square {
    type Error = BoardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Square> for String {
    fn from(square: Square) -> Self {
        square.to_string()
    }
}

// ---------------------------------------------------------------------------
// Pieces
// ---------------------------------------------------------------------------

/// Kind of a piece standing on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_lowercase() {
            'p' => Some(PieceType::Pawn),
            'n' => Some(PieceType::Knight),
            'b' => Some(PieceType::Bishop),
            'r' => Some(PieceType::Rook),
            'q' => Some(PieceType::Queen),
            'k' => Some(PieceType::King),
            _ => None,
        }
    }

    /// Lowercase letter used in the board encoding.
    pub fn letter(self) -> char {
        match self {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        }
    }
}

/// A piece of a given side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    /// Owner of the piece.
    pub side: Side,
    /// What the piece is.
    pub kind: PieceType,
}

impl Piece {
    /// Decode a board letter: uppercase is White, lowercase is Black.
    pub fn from_letter(letter: char) -> Option<Self> {
        let kind = PieceType::from_letter(letter)?;
        let side = if letter.is_ascii_uppercase() {
            Side::White
        } else {
            Side::Black
        };
        Some(Self { side, kind })
    }

    /// Board letter for this piece.
    pub fn letter(self) -> char {
        match self.side {
            Side::White => self.kind.letter().to_ascii_uppercase(),
            Side::Black => self.kind.letter(),
        }
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Occupancy map plus en-passant target, decoded from the board encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    squares: [Option<Piece>; 64],
    en_passant: Option<Square>,
}

impl Default for Board {
    fn default() -> Self {
        Self {
            squares: [None; 64],
            en_passant: None,
        }
    }
}

impl Board {
    /// Decode `placement [turn [castling [en-passant ...]]]`.
    pub fn from_fen(fen: &str) -> Result<Self, BoardError> {
        let mut fields = fen.split_whitespace();
        let placement = fields.next().ok_or(BoardError::Empty)?;

        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != usize::from(BOARD_SIZE) {
            return Err(BoardError::RankCount(ranks.len()));
        }

        let mut board = Board::default();
        for (row, text) in ranks.iter().enumerate() {
            // First rank in the text is rank 8.
            let rank = BOARD_SIZE - 1 - row as u8;
            let mut file: u32 = 0;
            for ch in text.chars() {
                if let Some(run) = ch.to_digit(10) {
                    file += run;
                    continue;
                }
                let piece = Piece::from_letter(ch).ok_or(BoardError::UnknownPiece(ch))?;
                if let Some(square) = u8::try_from(file).ok().and_then(|f| Square::new(f, rank)) {
                    board.squares[square.index()] = Some(piece);
                }
                file += 1;
            }
            if file != u32::from(BOARD_SIZE) {
                return Err(BoardError::RankWidth {
                    rank: rank + 1,
                    files: file,
                });
            }
        }

        // Skip side-to-move and castling rights.
        board.en_passant = match fields.nth(2) {
            None | Some("-") => None,
            Some(text) => Some(text.parse()?),
        };

        Ok(board)
    }

    /// Piece standing on `square`, if any.
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square.index()]
    }

    /// En-passant target square announced by the encoding.
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    /// Iterate over occupied squares.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(|sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    /// `true` if `square` holds a piece belonging to `side`.
    pub fn is_owned_by(&self, square: Square, side: Side) -> bool {
        self.piece_at(square).is_some_and(|p| p.side == side)
    }
}

impl FromStr for Board {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Board::from_fen(s)
    }
}
