//! Per-piece movement rules.
//!
//! Every rule answers one question: may a piece of `color` standing on `from`
//! travel to `to` on this board, judged only by its movement pattern and
//! blocking? Own-piece captures, facing kings and check safety are decided
//! by the legality layer on top of these.

use crate::board::{Board, Color, PieceKind, Position, has_crossed_river, in_palace};

/// Signature shared by all movement rules.
pub type MoveRule = fn(&Board, Position, Position, Color) -> bool;

/// The movement rule for a piece kind.
pub fn rule_for(kind: PieceKind) -> MoveRule {
    match kind {
        PieceKind::King => king_move,
        PieceKind::Advisor => advisor_move,
        PieceKind::Elephant => elephant_move,
        PieceKind::Knight => knight_move,
        PieceKind::Rook => rook_move,
        PieceKind::Cannon => cannon_move,
        PieceKind::Pawn => pawn_move,
    }
}

/// Whether the piece on `from` may reach `to` under its movement rule.
/// `false` when `from` is empty or either square is off the board.
pub fn follows_movement_rule(board: &Board, from: Position, to: Position) -> bool {
    if !from.is_on_board() || !to.is_on_board() || from == to {
        return false;
    }
    match board.get(from) {
        Some(piece) => rule_for(piece.kind)(board, from, to, piece.color),
        None => false,
    }
}

fn deltas(from: Position, to: Position) -> (i32, i32) {
    (
        to.row as i32 - from.row as i32,
        to.col as i32 - from.col as i32,
    )
}

pub fn king_move(_board: &Board, from: Position, to: Position, color: Color) -> bool {
    if !in_palace(to, color) {
        return false;
    }
    let (dr, dc) = deltas(from, to);
    dr.abs() + dc.abs() == 1
}

pub fn advisor_move(_board: &Board, from: Position, to: Position, color: Color) -> bool {
    if !in_palace(to, color) {
        return false;
    }
    let (dr, dc) = deltas(from, to);
    dr.abs() == 1 && dc.abs() == 1
}

pub fn elephant_move(board: &Board, from: Position, to: Position, color: Color) -> bool {
    if has_crossed_river(to.row, color) {
        return false;
    }
    let (dr, dc) = deltas(from, to);
    if dr.abs() != 2 || dc.abs() != 2 {
        return false;
    }
    // The elephant's eye must be open
    match from.offset(dr / 2, dc / 2) {
        Some(eye) => board.is_empty_at(eye),
        None => false,
    }
}

pub fn knight_move(board: &Board, from: Position, to: Position, _color: Color) -> bool {
    let (dr, dc) = deltas(from, to);
    let leg = match (dr.abs(), dc.abs()) {
        (2, 1) => from.offset(dr.signum(), 0),
        (1, 2) => from.offset(0, dc.signum()),
        _ => return false,
    };
    match leg {
        Some(leg) => board.is_empty_at(leg),
        None => false,
    }
}

pub fn rook_move(board: &Board, from: Position, to: Position, _color: Color) -> bool {
    board.count_between(from, to) == Some(0)
}

pub fn cannon_move(board: &Board, from: Position, to: Position, _color: Color) -> bool {
    let screens = board.count_between(from, to);
    if board.is_empty_at(to) {
        screens == Some(0)
    } else {
        screens == Some(1)
    }
}

pub fn pawn_move(_board: &Board, from: Position, to: Position, color: Color) -> bool {
    let (dr, dc) = deltas(from, to);
    if dr == color.forward() && dc == 0 {
        return true;
    }
    // Sideways steps open up once the pawn is over the river
    dr == 0 && dc.abs() == 1 && has_crossed_river(from.row, color)
}

/// Flying generals: both kings on one file with nothing between them.
pub fn kings_facing(board: &Board) -> bool {
    match (board.find_king(Color::Red), board.find_king(Color::Black)) {
        (Some(red), Some(black)) => {
            red.col == black.col && board.count_between(red, black) == Some(0)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Piece;

    fn red(kind: PieceKind) -> Piece {
        Piece::new(Color::Red, kind)
    }

    fn black(kind: PieceKind) -> Piece {
        Piece::new(Color::Black, kind)
    }

    fn pos(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    fn lone(at: Position, piece: Piece) -> Board {
        Board::empty().with_piece(at, piece)
    }

    #[test]
    fn test_king_orthogonal_step_inside_palace() {
        let board = lone(pos(1, 4), red(PieceKind::King));

        assert!(follows_movement_rule(&board, pos(1, 4), pos(0, 4)));
        assert!(follows_movement_rule(&board, pos(1, 4), pos(2, 4)));
        assert!(follows_movement_rule(&board, pos(1, 4), pos(1, 3)));
        assert!(!follows_movement_rule(&board, pos(1, 4), pos(2, 5)));
        assert!(!follows_movement_rule(&board, pos(1, 4), pos(3, 4)));
    }

    #[test]
    fn test_king_cannot_leave_palace() {
        let board = lone(pos(2, 3), red(PieceKind::King));

        assert!(!follows_movement_rule(&board, pos(2, 3), pos(3, 3)));
        assert!(!follows_movement_rule(&board, pos(2, 3), pos(2, 2)));
    }

    #[test]
    fn test_king_confined_to_own_palace() {
        // Same shape, wrong palace for the color
        let board = Board::empty();
        assert!(!king_move(&board, pos(7, 4), pos(8, 4), Color::Red));
        assert!(king_move(&board, pos(7, 4), pos(8, 4), Color::Black));
    }

    #[test]
    fn test_advisor_diagonal_inside_palace() {
        let board = lone(pos(0, 3), red(PieceKind::Advisor));

        assert!(follows_movement_rule(&board, pos(0, 3), pos(1, 4)));
        assert!(!follows_movement_rule(&board, pos(0, 3), pos(1, 3)));
        assert!(!follows_movement_rule(&board, pos(0, 3), pos(2, 5)));

        let board = lone(pos(9, 5), black(PieceKind::Advisor));
        assert!(follows_movement_rule(&board, pos(9, 5), pos(8, 4)));
        assert!(!advisor_move(&board, pos(8, 5), pos(7, 6), Color::Black));
    }

    #[test]
    fn test_elephant_blocking_eye() {
        let open = lone(pos(0, 2), red(PieceKind::Elephant));
        assert!(follows_movement_rule(&open, pos(0, 2), pos(2, 4)));
        assert!(follows_movement_rule(&open, pos(0, 2), pos(2, 0)));

        let blocked = open.with_piece(pos(1, 3), black(PieceKind::Pawn));
        assert!(!follows_movement_rule(&blocked, pos(0, 2), pos(2, 4)));
        assert!(follows_movement_rule(&blocked, pos(0, 2), pos(2, 0)));
    }

    #[test]
    fn test_elephant_cannot_cross_river() {
        let board = lone(pos(4, 2), red(PieceKind::Elephant));
        assert!(!follows_movement_rule(&board, pos(4, 2), pos(6, 4)));
        assert!(follows_movement_rule(&board, pos(4, 2), pos(2, 4)));

        let board = lone(pos(5, 6), black(PieceKind::Elephant));
        assert!(!follows_movement_rule(&board, pos(5, 6), pos(3, 4)));
        assert!(follows_movement_rule(&board, pos(5, 6), pos(7, 8)));
    }

    #[test]
    fn test_elephant_needs_exact_diagonal() {
        let board = lone(pos(0, 2), red(PieceKind::Elephant));
        assert!(!follows_movement_rule(&board, pos(0, 2), pos(1, 3)));
        assert!(!follows_movement_rule(&board, pos(0, 2), pos(2, 3)));
    }

    #[test]
    fn test_knight_leg_blocking() {
        let open = lone(pos(0, 1), red(PieceKind::Knight));
        assert!(follows_movement_rule(&open, pos(0, 1), pos(2, 0)));
        assert!(follows_movement_rule(&open, pos(0, 1), pos(2, 2)));
        assert!(follows_movement_rule(&open, pos(0, 1), pos(1, 3)));

        // Leg on the long axis blocks only the moves through it
        let blocked = open.clone().with_piece(pos(1, 1), red(PieceKind::Pawn));
        assert!(!follows_movement_rule(&blocked, pos(0, 1), pos(2, 0)));
        assert!(!follows_movement_rule(&blocked, pos(0, 1), pos(2, 2)));
        assert!(follows_movement_rule(&blocked, pos(0, 1), pos(1, 3)));

        let side_blocked = open.with_piece(pos(0, 2), red(PieceKind::Elephant));
        assert!(!follows_movement_rule(&side_blocked, pos(0, 1), pos(1, 3)));
        assert!(follows_movement_rule(&side_blocked, pos(0, 1), pos(2, 2)));
    }

    #[test]
    fn test_knight_shape_only() {
        let board = lone(pos(4, 4), black(PieceKind::Knight));
        assert!(!follows_movement_rule(&board, pos(4, 4), pos(6, 6)));
        assert!(!follows_movement_rule(&board, pos(4, 4), pos(4, 6)));
        assert!(follows_movement_rule(&board, pos(4, 4), pos(2, 3)));
    }

    #[test]
    fn test_rook_path_must_be_clear() {
        let board = lone(pos(0, 0), red(PieceKind::Rook)).with_piece(pos(5, 0), black(PieceKind::Pawn));

        assert!(follows_movement_rule(&board, pos(0, 0), pos(4, 0)));
        assert!(follows_movement_rule(&board, pos(0, 0), pos(5, 0)));
        assert!(!follows_movement_rule(&board, pos(0, 0), pos(6, 0)));
        assert!(follows_movement_rule(&board, pos(0, 0), pos(0, 8)));
        assert!(!follows_movement_rule(&board, pos(0, 0), pos(1, 1)));
    }

    #[test]
    fn test_cannon_screen_count() {
        let cannon = pos(4, 0);
        let target = pos(4, 8);
        let base = lone(cannon, red(PieceKind::Cannon)).with_piece(target, black(PieceKind::Rook));

        // No screen
        assert!(!follows_movement_rule(&base, cannon, target));

        // Exactly one screen, of either color
        let one_black = base.clone().with_piece(pos(4, 3), black(PieceKind::Pawn));
        assert!(follows_movement_rule(&one_black, cannon, target));
        let one_red = base.clone().with_piece(pos(4, 5), red(PieceKind::Pawn));
        assert!(follows_movement_rule(&one_red, cannon, target));

        // Two screens
        let two = one_black.with_piece(pos(4, 6), red(PieceKind::Pawn));
        assert!(!follows_movement_rule(&two, cannon, target));
    }

    #[test]
    fn test_cannon_quiet_move_needs_clear_path() {
        let board = lone(pos(2, 1), red(PieceKind::Cannon)).with_piece(pos(2, 4), black(PieceKind::Pawn));

        assert!(follows_movement_rule(&board, pos(2, 1), pos(2, 3)));
        assert!(!follows_movement_rule(&board, pos(2, 1), pos(2, 6)));
        assert!(!follows_movement_rule(&board, pos(2, 1), pos(2, 4)));
    }

    #[test]
    fn test_pawn_before_river_moves_forward_only() {
        let board = lone(pos(3, 4), red(PieceKind::Pawn));
        assert!(follows_movement_rule(&board, pos(3, 4), pos(4, 4)));
        assert!(!follows_movement_rule(&board, pos(3, 4), pos(3, 5)));
        assert!(!follows_movement_rule(&board, pos(3, 4), pos(2, 4)));
        assert!(!follows_movement_rule(&board, pos(3, 4), pos(5, 4)));

        let board = lone(pos(6, 2), black(PieceKind::Pawn));
        assert!(follows_movement_rule(&board, pos(6, 2), pos(5, 2)));
        assert!(!follows_movement_rule(&board, pos(6, 2), pos(6, 3)));
        assert!(!follows_movement_rule(&board, pos(6, 2), pos(7, 2)));
    }

    #[test]
    fn test_pawn_after_river_moves_sideways_never_back() {
        let board = lone(pos(5, 4), red(PieceKind::Pawn));
        assert!(follows_movement_rule(&board, pos(5, 4), pos(6, 4)));
        assert!(follows_movement_rule(&board, pos(5, 4), pos(5, 3)));
        assert!(follows_movement_rule(&board, pos(5, 4), pos(5, 5)));
        assert!(!follows_movement_rule(&board, pos(5, 4), pos(4, 4)));
        assert!(!follows_movement_rule(&board, pos(5, 4), pos(5, 6)));
        assert!(!follows_movement_rule(&board, pos(5, 4), pos(6, 5)));

        let board = lone(pos(4, 4), black(PieceKind::Pawn));
        assert!(follows_movement_rule(&board, pos(4, 4), pos(3, 4)));
        assert!(follows_movement_rule(&board, pos(4, 4), pos(4, 3)));
        assert!(!follows_movement_rule(&board, pos(4, 4), pos(5, 4)));
    }

    #[test]
    fn test_rule_requires_piece_and_board_squares() {
        let board = Board::standard();
        assert!(!follows_movement_rule(&board, pos(4, 4), pos(5, 4)));
        assert!(!follows_movement_rule(&board, pos(0, 0), pos(10, 0)));
        assert!(!follows_movement_rule(&board, pos(0, 0), pos(0, 0)));
    }

    #[test]
    fn test_kings_facing() {
        let open = Board::empty()
            .with_piece(pos(0, 4), red(PieceKind::King))
            .with_piece(pos(9, 4), black(PieceKind::King));
        assert!(kings_facing(&open));

        let blocked = open.clone().with_piece(pos(5, 4), red(PieceKind::Pawn));
        assert!(!kings_facing(&blocked));

        let offset = Board::empty()
            .with_piece(pos(0, 4), red(PieceKind::King))
            .with_piece(pos(9, 3), black(PieceKind::King));
        assert!(!kings_facing(&offset));

        let one_king = Board::empty().with_piece(pos(0, 4), red(PieceKind::King));
        assert!(!kings_facing(&one_king));
    }
}
