use crate::attack::is_king_in_check;
use crate::board::{Board, Color, PieceKind};
use crate::config::{PerpetualCheckPolicy, RulesConfig};
use crate::history::PositionHistory;
use crate::legality::has_legal_move;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Red,
    Black,
    Draw,
    None,
}

impl From<Color> for Winner {
    fn from(color: Color) -> Self {
        match color {
            Color::Red => Winner::Red,
            Color::Black => Winner::Black,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    KingCaptured,
    Checkmate,
    Stalemate,
    MoveLimit,
    Repetition,
    PerpetualCheck,
    InsufficientMaterial,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEndVerdict {
    pub is_over: bool,
    pub winner: Winner,
    pub reason: Option<EndReason>,
    pub message: String,
}

impl GameEndVerdict {
    pub fn ongoing() -> Self {
        GameEndVerdict {
            is_over: false,
            winner: Winner::None,
            reason: None,
            message: String::new(),
        }
    }

    fn over(winner: Winner, reason: EndReason, message: String) -> Self {
        GameEndVerdict {
            is_over: true,
            winner,
            reason: Some(reason),
            message,
        }
    }
}

impl Default for GameEndVerdict {
    fn default() -> Self {
        Self::ongoing()
    }
}

/// Judge whether the game is over with `side_to_move` to play on `board`.
///
/// Conditions are tested in a fixed order and the first one that holds wins:
/// king captured, checkmate, stalemate, move limit, repetition (or perpetual
/// check), insufficient material.
pub fn check_game_end(
    board: &Board,
    side_to_move: Color,
    history: &PositionHistory,
    rules: &RulesConfig,
) -> GameEndVerdict {
    for color in [Color::Red, Color::Black] {
        if board.find_king(color).is_none() {
            return GameEndVerdict::over(
                color.opponent().into(),
                EndReason::KingCaptured,
                format!("{color} King was captured"),
            );
        }
    }

    if !has_legal_move(board, side_to_move) {
        return if is_king_in_check(board, side_to_move) {
            GameEndVerdict::over(
                side_to_move.opponent().into(),
                EndReason::Checkmate,
                format!("{side_to_move} is checkmated"),
            )
        } else {
            GameEndVerdict::over(
                Winner::Draw,
                EndReason::Stalemate,
                format!("{side_to_move} has no legal moves"),
            )
        };
    }

    if history.plies_since_capture() >= rules.move_limit_plies {
        return GameEndVerdict::over(
            Winner::Draw,
            EndReason::MoveLimit,
            format!("{} moves without capture", rules.move_limit_plies / 2),
        );
    }

    let key = board.position_key();
    if history.occurrences(&key) >= rules.repetition_threshold {
        let loser = match rules.perpetual_check {
            PerpetualCheckPolicy::Precise => history.perpetual_checker(&key),
            PerpetualCheckPolicy::Simplified => Some(side_to_move),
        };
        return match loser {
            Some(loser) => GameEndVerdict::over(
                loser.opponent().into(),
                EndReason::PerpetualCheck,
                format!("{loser} loses by perpetual check"),
            ),
            None => GameEndVerdict::over(
                Winner::Draw,
                EndReason::Repetition,
                format!("Same position repeated {} times", rules.repetition_threshold),
            ),
        };
    }

    if is_insufficient_material(board) {
        return GameEndVerdict::over(
            Winner::Draw,
            EndReason::InsufficientMaterial,
            "Insufficient material to checkmate".to_string(),
        );
    }

    GameEndVerdict::ongoing()
}

/// Bare kings, or bare kings plus a single advisor.
pub fn is_insufficient_material(board: &Board) -> bool {
    let mut others = board.pieces().filter(|(_, piece)| piece.kind != PieceKind::King);
    match (others.next(), others.next()) {
        (None, _) => true,
        (Some((_, piece)), None) => piece.kind == PieceKind::Advisor,
        _ => false,
    }
}
