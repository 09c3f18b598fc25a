use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Board dimensions: ten ranks of nine files.
pub const ROWS: usize = 10;
pub const COLS: usize = 9;

/// Last rank on Red's side of the river. Black's side starts one rank above.
pub const RIVER_RED_EDGE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,   // home rank 0, uppercase markers
    Black, // home rank 9, lowercase markers
}

impl Color {
    pub fn opponent(&self) -> Color {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }

    /// Row delta of a forward step.
    pub fn forward(&self) -> i32 {
        match self {
            Color::Red => 1,
            Color::Black => -1,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Color::Red => "Red",
            Color::Black => "Black",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Color::Red => 0,
            Color::Black => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    King,
    Advisor,
    Elephant,
    Knight,
    Rook,
    Cannon,
    Pawn,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::King,
        PieceKind::Advisor,
        PieceKind::Elephant,
        PieceKind::Knight,
        PieceKind::Rook,
        PieceKind::Cannon,
        PieceKind::Pawn,
    ];

    /// Uppercase notation letter.
    pub fn letter(&self) -> char {
        match self {
            PieceKind::King => 'K',
            PieceKind::Advisor => 'A',
            PieceKind::Elephant => 'B',
            PieceKind::Knight => 'N',
            PieceKind::Rook => 'R',
            PieceKind::Cannon => 'C',
            PieceKind::Pawn => 'P',
        }
    }

    pub fn from_letter(letter: char) -> Option<PieceKind> {
        PieceKind::ALL
            .into_iter()
            .find(|kind| kind.letter() == letter.to_ascii_uppercase())
    }

    pub fn name(&self) -> &str {
        match self {
            PieceKind::King => "King",
            PieceKind::Advisor => "Advisor",
            PieceKind::Elephant => "Elephant",
            PieceKind::Knight => "Knight",
            PieceKind::Rook => "Rook",
            PieceKind::Cannon => "Cannon",
            PieceKind::Pawn => "Pawn",
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub fn new(color: Color, kind: PieceKind) -> Self {
        Piece { color, kind }
    }

    /// Parse a notation marker. Only ASCII letters naming a piece kind are accepted;
    /// the case decides the color.
    pub fn from_marker(marker: char) -> Option<Piece> {
        if !marker.is_ascii_alphabetic() {
            return None;
        }
        let kind = PieceKind::from_letter(marker)?;
        let color = if marker.is_ascii_uppercase() {
            Color::Red
        } else {
            Color::Black
        };
        Some(Piece::new(color, kind))
    }

    pub fn marker(&self) -> char {
        match self.color {
            Color::Red => self.kind.letter(),
            Color::Black => self.kind.letter().to_ascii_lowercase(),
        }
    }
}

/// A single intersection: empty or holding one piece.
pub type Cell = Option<Piece>;

pub fn color_of(cell: Cell) -> Option<Color> {
    cell.map(|piece| piece.color)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }

    pub fn is_on_board(&self) -> bool {
        self.row < ROWS && self.col < COLS
    }

    /// Neighbouring position, or `None` when the step leaves the board.
    pub fn offset(&self, dr: i32, dc: i32) -> Option<Position> {
        let row = self.row as i32 + dr;
        let col = self.col as i32 + dc;
        if row < 0 || row >= ROWS as i32 || col < 0 || col >= COLS as i32 {
            return None;
        }
        Some(Position::new(row as usize, col as usize))
    }

    /// Rank reflection across the river.
    pub fn mirrored(&self) -> Position {
        Position::new(ROWS - 1 - self.row, self.col)
    }

    pub fn all() -> impl Iterator<Item = Position> {
        (0..ROWS).flat_map(|row| (0..COLS).map(move |col| Position::new(row, col)))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Position,
    pub to: Position,
}

impl Move {
    pub fn new(from: Position, to: Position) -> Self {
        Move { from, to }
    }

    pub fn from_coords(from_row: usize, from_col: usize, to_row: usize, to_col: usize) -> Self {
        Move::new(Position::new(from_row, from_col), Position::new(to_row, to_col))
    }

    pub fn mirrored(&self) -> Move {
        Move::new(self.from.mirrored(), self.to.mirrored())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Whether `pos` lies inside `color`'s 3x3 palace.
pub fn in_palace(pos: Position, color: Color) -> bool {
    let rows = match color {
        Color::Red => 0..=2,
        Color::Black => 7..=9,
    };
    rows.contains(&pos.row) && (3..=5).contains(&pos.col)
}

/// Whether `row` is on the far side of the river for `color`.
pub fn has_crossed_river(row: usize, color: Color) -> bool {
    match color {
        Color::Red => row > RIVER_RED_EDGE,
        Color::Black => row <= RIVER_RED_EDGE,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("Square {0} is off the board")]
    OutOfBounds(Position),
    #[error("Expected 10 ranks, found {0}")]
    WrongRankCount(usize),
    #[error("Rank {rank} has {found} files, expected 9")]
    WrongFileCount { rank: usize, found: usize },
    #[error("Unrecognized piece marker {marker:?} at {at}")]
    UnknownMarker { marker: char, at: Position },
}

/// Canonical placement encoding used to count repetitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionKey(String);

impl PositionKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

const EMPTY_MARKER: char = '.';

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    cells: [[Cell; COLS]; ROWS],
}

impl Board {
    pub fn empty() -> Self {
        Board {
            cells: [[None; COLS]; ROWS],
        }
    }

    /// The standard opening position.
    pub fn standard() -> Self {
        let mut board = Board::empty();
        let back_rank = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Elephant,
            PieceKind::Advisor,
            PieceKind::King,
            PieceKind::Advisor,
            PieceKind::Elephant,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        for color in [Color::Red, Color::Black] {
            // Ranks counted from this color's home rank
            let rank = |n: usize| match color {
                Color::Red => n,
                Color::Black => ROWS - 1 - n,
            };

            for (col, &kind) in back_rank.iter().enumerate() {
                board.cells[rank(0)][col] = Some(Piece::new(color, kind));
            }
            for col in [1, 7] {
                board.cells[rank(2)][col] = Some(Piece::new(color, PieceKind::Cannon));
            }
            for col in (0..COLS).step_by(2) {
                board.cells[rank(3)][col] = Some(Piece::new(color, PieceKind::Pawn));
            }
        }

        board
    }

    /// Build a board from ten rank strings of nine markers each, rank 0 first.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Board, BoardError> {
        if rows.len() != ROWS {
            return Err(BoardError::WrongRankCount(rows.len()));
        }

        let mut board = Board::empty();
        for (row, rank) in rows.iter().enumerate() {
            let markers: Vec<char> = rank.as_ref().chars().collect();
            if markers.len() != COLS {
                return Err(BoardError::WrongFileCount {
                    rank: row,
                    found: markers.len(),
                });
            }

            for (col, &marker) in markers.iter().enumerate() {
                board.cells[row][col] = match marker {
                    EMPTY_MARKER | ' ' => None,
                    _ => Some(Piece::from_marker(marker).ok_or(BoardError::UnknownMarker {
                        marker,
                        at: Position::new(row, col),
                    })?),
                };
            }
        }

        Ok(board)
    }

    pub fn to_rows(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|rank| {
                rank.iter()
                    .map(|cell| cell.map_or(EMPTY_MARKER, |piece| piece.marker()))
                    .collect()
            })
            .collect()
    }

    /// Checked lookup.
    pub fn piece_at(&self, pos: Position) -> Result<Cell, BoardError> {
        if !pos.is_on_board() {
            return Err(BoardError::OutOfBounds(pos));
        }
        Ok(self.cells[pos.row][pos.col])
    }

    /// Lookup that treats off-board squares as empty.
    pub fn get(&self, pos: Position) -> Cell {
        self.piece_at(pos).ok().flatten()
    }

    pub fn is_empty_at(&self, pos: Position) -> bool {
        self.get(pos).is_none()
    }

    pub fn set(&mut self, pos: Position, cell: Cell) -> Result<(), BoardError> {
        if !pos.is_on_board() {
            return Err(BoardError::OutOfBounds(pos));
        }
        self.cells[pos.row][pos.col] = cell;
        Ok(())
    }

    /// Builder-style placement for fixtures; off-board positions are ignored.
    pub fn with_piece(mut self, pos: Position, piece: Piece) -> Board {
        let _ = self.set(pos, Some(piece));
        self
    }

    pub fn pieces(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        Position::all().filter_map(|pos| self.get(pos).map(|piece| (pos, piece)))
    }

    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Position, Piece)> + '_ {
        self.pieces().filter(move |(_, piece)| piece.color == color)
    }

    pub fn find_king(&self, color: Color) -> Option<Position> {
        self.pieces_of(color)
            .find(|(_, piece)| piece.kind == PieceKind::King)
            .map(|(pos, _)| pos)
    }

    /// Number of occupied squares strictly between two squares on one rank or file.
    /// `None` when the squares are not aligned.
    pub fn count_between(&self, from: Position, to: Position) -> Option<usize> {
        if from.row == to.row {
            let (lo, hi) = (from.col.min(to.col), from.col.max(to.col));
            Some(
                (lo + 1..hi)
                    .filter(|&col| !self.is_empty_at(Position::new(from.row, col)))
                    .count(),
            )
        } else if from.col == to.col {
            let (lo, hi) = (from.row.min(to.row), from.row.max(to.row));
            Some(
                (lo + 1..hi)
                    .filter(|&row| !self.is_empty_at(Position::new(row, from.col)))
                    .count(),
            )
        } else {
            None
        }
    }

    /// A copy of this board with `mv` played on it. `self` is never touched.
    pub fn with_move(&self, mv: Move) -> Board {
        let mut next = self.clone();
        if mv.from == mv.to {
            return next;
        }
        if let Some(piece) = self.get(mv.from) {
            if next.set(mv.to, Some(piece)).is_ok() {
                let _ = next.set(mv.from, None);
            }
        }
        next
    }

    /// Ranks reflected and colors swapped: the same position seen from the other side.
    pub fn flipped(&self) -> Board {
        let mut flipped = Board::empty();
        for (pos, piece) in self.pieces() {
            flipped.cells[pos.mirrored().row][pos.col] =
                Some(Piece::new(piece.color.opponent(), piece.kind));
        }
        flipped
    }

    pub fn position_key(&self) -> PositionKey {
        let mut key = String::with_capacity(ROWS * (COLS + 1));
        for rank in self.to_rows() {
            key.push_str(&rank);
            key.push('/');
        }
        PositionKey(key)
    }

    /// Get a string representation of the board, Black's home rank on top.
    pub fn display_board(&self) -> String {
        let mut result = String::from("   ");
        for col in 0..COLS {
            result.push_str(&format!("{:2} ", col));
        }
        result.push('\n');

        for (row, rank) in self.to_rows().iter().enumerate().rev() {
            result.push_str(&format!("{:2} ", row));
            for marker in rank.chars() {
                result.push_str(&format!(" {} ", marker));
            }
            result.push('\n');
        }

        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

impl FromStr for Board {
    type Err = BoardError;

    /// Ranks separated by `/` or newlines, rank 0 first. A trailing separator is allowed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows: Vec<&str> = s
            .split(['/', '\n'])
            .map(|rank| rank.trim_end_matches('\r'))
            .filter(|rank| !rank.is_empty())
            .collect();
        Board::from_rows(&rows)
    }
}
