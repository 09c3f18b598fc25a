use crate::attack::is_king_in_check;
use crate::board::{Board, Color, Move, Piece, PieceKind, Position};
use crate::rules::{follows_movement_rule, kings_facing};
use thiserror::Error;

/// Why a proposed move was turned down.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("Square {0} is off the board")]
    OutOfBounds(Position),
    #[error("No piece on {0}")]
    NoPiece(Position),
    #[error("Piece on {at} belongs to {owner}, not {side}")]
    NotOwnPiece {
        at: Position,
        owner: Color,
        side: Color,
    },
    #[error("Source and destination are both {0}")]
    SameSquare(Position),
    #[error("Cannot capture own piece on {0}")]
    OwnCapture(Position),
    #[error("{kind} cannot move {mv}")]
    IllegalPattern { kind: PieceKind, mv: Move },
    #[error("Move {0} leaves the kings facing each other")]
    KingsFacing(Move),
    #[error("Move {0} leaves own king in check")]
    SelfCheck(Move),
}

impl MoveError {
    /// Stable reason code for collaborators.
    pub fn code(&self) -> &'static str {
        match self {
            MoveError::OutOfBounds(_) => "OUT_OF_BOUNDS",
            MoveError::NoPiece(_) => "NO_PIECE",
            MoveError::NotOwnPiece { .. } => "NO_OWN_PIECE",
            MoveError::SameSquare(_) => "SAME_SQUARE",
            MoveError::OwnCapture(_) => "OWN_CAPTURE",
            MoveError::IllegalPattern { .. } => "ILLEGAL_MOVE",
            MoveError::KingsFacing(_) => "KINGS_FACING",
            MoveError::SelfCheck(_) => "SELF_CHECK",
        }
    }
}

/// Full legality test for one move by `side`, returning the moving piece.
///
/// The movement rule is checked first, then the move is simulated on a copy
/// of the board to make sure the kings do not face each other and `side`'s
/// king is not left in check.
pub fn validate_move(board: &Board, mv: Move, side: Color) -> Result<Piece, MoveError> {
    for square in [mv.from, mv.to] {
        if !square.is_on_board() {
            return Err(MoveError::OutOfBounds(square));
        }
    }

    let piece = board.get(mv.from).ok_or(MoveError::NoPiece(mv.from))?;
    if piece.color != side {
        return Err(MoveError::NotOwnPiece {
            at: mv.from,
            owner: piece.color,
            side,
        });
    }
    if mv.from == mv.to {
        return Err(MoveError::SameSquare(mv.from));
    }
    if board.get(mv.to).is_some_and(|target| target.color == side) {
        return Err(MoveError::OwnCapture(mv.to));
    }
    if !follows_movement_rule(board, mv.from, mv.to) {
        return Err(MoveError::IllegalPattern {
            kind: piece.kind,
            mv,
        });
    }

    let after = board.with_move(mv);
    if kings_facing(&after) {
        return Err(MoveError::KingsFacing(mv));
    }
    if is_king_in_check(&after, side) {
        return Err(MoveError::SelfCheck(mv));
    }

    Ok(piece)
}

pub fn is_legal_move(board: &Board, from: Position, to: Position, side: Color) -> bool {
    validate_move(board, Move::new(from, to), side).is_ok()
}

/// Every legal move for `color`, in board order of source then destination.
pub fn legal_moves(board: &Board, color: Color) -> Vec<Move> {
    board
        .pieces_of(color)
        .flat_map(|(from, _)| {
            Position::all()
                .map(move |to| Move::new(from, to))
                .filter(move |&mv| validate_move(board, mv, color).is_ok())
        })
        .collect()
}

/// Legal destinations for the piece on `from`, whichever side owns it.
/// Empty for an empty or off-board square.
pub fn legal_destinations(board: &Board, from: Position) -> Vec<Position> {
    let Some(piece) = board.get(from) else {
        return Vec::new();
    };

    Position::all()
        .filter(|&to| validate_move(board, Move::new(from, to), piece.color).is_ok())
        .collect()
}

pub fn has_legal_move(board: &Board, color: Color) -> bool {
    board.pieces_of(color).any(|(from, _)| {
        Position::all().any(|to| validate_move(board, Move::new(from, to), color).is_ok())
    })
}
