use crate::board::{Board, Color, Piece, PieceKind, Position};
use crate::rules::{cannon_move, kings_facing, rule_for};

/// Whether any piece of `by` could move onto `target` under its movement rule.
///
/// Non-cannon pieces are probed against a copy of the board with `target`
/// cleared, so attacks on friendly, enemy and empty squares all count. A cannon
/// only attacks by capturing over a screen, so it is probed against the real
/// board and only when `target` is occupied.
pub fn is_square_attacked(board: &Board, target: Position, by: Color) -> bool {
    !attackers_of(board, target, by).is_empty()
}

/// Squares holding pieces of `by` that attack `target`, in board order.
pub fn attackers_of(board: &Board, target: Position, by: Color) -> Vec<Position> {
    if !target.is_on_board() {
        return Vec::new();
    }

    let mut cleared = board.clone();
    let _ = cleared.set(target, None);

    board
        .pieces_of(by)
        .filter(|&(from, piece)| attacks(board, &cleared, from, piece, target))
        .map(|(from, _)| from)
        .collect()
}

fn attacks(board: &Board, cleared: &Board, from: Position, piece: Piece, target: Position) -> bool {
    if from == target {
        return false;
    }
    match piece.kind {
        PieceKind::Cannon => {
            !board.is_empty_at(target) && cannon_move(board, from, target, piece.color)
        }
        kind => rule_for(kind)(cleared, from, target, piece.color),
    }
}

/// Whether `color`'s king is attacked, or stands on an open file facing the other king.
///
/// A missing king is reported as not in check; king capture is judged by the
/// end-of-game evaluator before check is ever consulted.
pub fn is_king_in_check(board: &Board, color: Color) -> bool {
    let Some(king) = board.find_king(color) else {
        return false;
    };

    is_square_attacked(board, king, color.opponent()) || kings_facing(board)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red(kind: PieceKind) -> Piece {
        Piece::new(Color::Red, kind)
    }

    fn black(kind: PieceKind) -> Piece {
        Piece::new(Color::Black, kind)
    }

    fn pos(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    /// Red king tucked in a corner of its palace, Black king off its file.
    fn kings() -> Board {
        Board::empty()
            .with_piece(pos(0, 3), red(PieceKind::King))
            .with_piece(pos(9, 5), black(PieceKind::King))
    }

    #[test]
    fn test_starting_position_has_no_check() {
        let board = Board::standard();
        assert!(!is_king_in_check(&board, Color::Red));
        assert!(!is_king_in_check(&board, Color::Black));
    }

    #[test]
    fn test_rook_check_and_block() {
        let board = kings().with_piece(pos(4, 5), red(PieceKind::Rook));
        assert!(is_king_in_check(&board, Color::Black));
        assert!(!is_king_in_check(&board, Color::Red));
        assert_eq!(attackers_of(&board, pos(9, 5), Color::Red), vec![pos(4, 5)]);

        let blocked = board.with_piece(pos(7, 5), black(PieceKind::Advisor));
        assert!(!is_king_in_check(&blocked, Color::Black));
    }

    #[test]
    fn test_cannon_needs_exactly_one_screen_to_check() {
        let bare = kings().with_piece(pos(5, 5), red(PieceKind::Cannon));
        assert!(!is_king_in_check(&bare, Color::Black));

        let screened = bare.clone().with_piece(pos(7, 5), black(PieceKind::Pawn));
        assert!(is_king_in_check(&screened, Color::Black));

        let double = screened.with_piece(pos(6, 5), red(PieceKind::Pawn));
        assert!(!is_king_in_check(&double, Color::Black));
    }

    #[test]
    fn test_cannon_does_not_attack_empty_squares() {
        let board = kings().with_piece(pos(5, 0), red(PieceKind::Cannon));
        assert!(!is_square_attacked(&board, pos(5, 3), Color::Red));

        // With a screen the empty square beyond is still not attacked
        let screened = board.with_piece(pos(5, 2), black(PieceKind::Pawn));
        assert!(!is_square_attacked(&screened, pos(5, 3), Color::Red));
    }

    #[test]
    fn test_knight_check_respects_leg() {
        let board = kings().with_piece(pos(7, 4), red(PieceKind::Knight));
        assert!(is_king_in_check(&board, Color::Black));

        let hobbled = board.with_piece(pos(8, 4), black(PieceKind::Advisor));
        assert!(!is_king_in_check(&hobbled, Color::Black));
    }

    #[test]
    fn test_pawn_attacks_forward_and_sideways_after_river() {
        let board = kings().with_piece(pos(8, 5), red(PieceKind::Pawn));
        assert!(is_king_in_check(&board, Color::Black));

        let beside = kings().with_piece(pos(9, 4), red(PieceKind::Pawn));
        assert!(is_king_in_check(&beside, Color::Black));

        // A pawn never attacks backwards
        let behind = Board::empty()
            .with_piece(pos(0, 3), red(PieceKind::King))
            .with_piece(pos(8, 5), black(PieceKind::King))
            .with_piece(pos(9, 5), red(PieceKind::Pawn));
        assert!(!is_king_in_check(&behind, Color::Black));
    }

    #[test]
    fn test_attacks_on_occupied_friendly_square_count() {
        // Defended piece: a Red rook guards the Red pawn
        let board = kings()
            .with_piece(pos(5, 0), red(PieceKind::Rook))
            .with_piece(pos(5, 4), red(PieceKind::Pawn));
        assert!(is_square_attacked(&board, pos(5, 4), Color::Red));
    }

    #[test]
    fn test_flying_generals_counts_as_check() {
        let facing = Board::empty()
            .with_piece(pos(0, 4), red(PieceKind::King))
            .with_piece(pos(9, 4), black(PieceKind::King));
        assert!(is_king_in_check(&facing, Color::Red));
        assert!(is_king_in_check(&facing, Color::Black));

        let one_blocker = facing.with_piece(pos(4, 4), red(PieceKind::Pawn));
        assert!(!is_king_in_check(&one_blocker, Color::Red));
        assert!(!is_king_in_check(&one_blocker, Color::Black));
    }

    #[test]
    fn test_missing_king_is_not_in_check() {
        let board = Board::empty()
            .with_piece(pos(0, 4), red(PieceKind::King))
            .with_piece(pos(5, 4), red(PieceKind::Rook));
        assert!(!is_king_in_check(&board, Color::Black));
    }

    #[test]
    fn test_off_board_target_is_never_attacked() {
        let board = Board::standard();
        assert!(!is_square_attacked(&board, pos(10, 4), Color::Red));
        assert!(attackers_of(&board, pos(3, 9), Color::Black).is_empty());
    }

    #[test]
    fn test_check_detection_leaves_board_untouched() {
        let board = kings().with_piece(pos(4, 5), red(PieceKind::Rook));
        let before = board.clone();
        let _ = is_king_in_check(&board, Color::Black);
        assert_eq!(board, before);
    }
}
