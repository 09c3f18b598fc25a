use crate::board::{Board, BoardError, Color, Move, Piece, Position};
use crate::config::RulesConfig;
use crate::history::PositionHistory;
use crate::legality::{MoveError, legal_destinations, validate_move};
use crate::verdict::{GameEndVerdict, check_game_end};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum GameError {
    #[error("Invalid move: {0}")]
    InvalidMove(#[from] MoveError),
    #[error("Invalid board: {0}")]
    Board(#[from] BoardError),
    #[error("Game already over")]
    GameOver,
    #[error("Not your turn")]
    NotYourTurn,
}

/// One game as seen by the local player.
///
/// The remote peer is authoritative: proposals are only pre-checked here,
/// while confirmed moves and snapshots are applied as given. The session owns
/// its position history, so every game needs its own session.
#[derive(Debug, Clone)]
pub struct GameSession {
    board: Board,
    side_to_move: Color,
    local_side: Color,
    history: PositionHistory,
    rules: RulesConfig,
    result: Option<GameEndVerdict>,
    move_count: usize,
}

impl GameSession {
    pub fn new(local_side: Color, rules: RulesConfig) -> Self {
        Self::from_position(Board::standard(), Color::Red, local_side, rules)
    }

    pub fn from_position(
        board: Board,
        side_to_move: Color,
        local_side: Color,
        rules: RulesConfig,
    ) -> Self {
        GameSession {
            board,
            side_to_move,
            local_side,
            history: PositionHistory::new(),
            rules,
            result: None,
            move_count: 0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn local_side(&self) -> Color {
        self.local_side
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    pub fn history(&self) -> &PositionHistory {
        &self.history
    }

    pub fn move_count(&self) -> usize {
        self.move_count
    }

    pub fn is_game_over(&self) -> bool {
        self.result.is_some()
    }

    pub fn is_local_turn(&self) -> bool {
        !self.is_game_over() && self.side_to_move == self.local_side
    }

    /// Destinations to highlight for the piece on `from`.
    pub fn destinations(&self, from: Position) -> Vec<Position> {
        legal_destinations(&self.board, from)
    }

    /// Pre-check a move the local player wants to send to the peer.
    pub fn check_proposal(&self, mv: Move) -> Result<Piece, GameError> {
        if self.is_game_over() {
            return Err(GameError::GameOver);
        }
        if self.side_to_move != self.local_side {
            return Err(GameError::NotYourTurn);
        }

        validate_move(&self.board, mv, self.side_to_move).map_err(|e| {
            debug!(%mv, reason = e.code(), "Rejected proposal");
            GameError::InvalidMove(e)
        })
    }

    /// Apply a move the peer has confirmed and return the verdict that follows.
    ///
    /// Only bounds and occupancy are checked. If the verdict is terminal it is
    /// latched and further moves are refused.
    pub fn apply_confirmed(&mut self, mv: Move) -> Result<GameEndVerdict, GameError> {
        if self.is_game_over() {
            return Err(GameError::GameOver);
        }

        let piece = self.board.piece_at(mv.from)?.ok_or(MoveError::NoPiece(mv.from))?;
        if mv.from == mv.to {
            return Err(MoveError::SameSquare(mv.from).into());
        }
        let captured = self.board.piece_at(mv.to)?.is_some();

        if piece.color != self.side_to_move {
            warn!(
                %mv,
                expected = %self.side_to_move,
                moved = %piece.color,
                "Confirmed move out of turn order"
            );
        }

        self.board = self.board.with_move(mv);
        self.history.record_move_by(&self.board, piece.color, captured);
        self.side_to_move = piece.color.opponent();
        self.move_count += 1;
        info!(%mv, piece = %piece.kind, captured, ply = self.move_count, "Move confirmed");

        let verdict = check_game_end(&self.board, self.side_to_move, &self.history, &self.rules);
        if verdict.is_over {
            info!(winner = ?verdict.winner, reason = ?verdict.reason, "{}", verdict.message);
            self.result = Some(verdict.clone());
        }
        Ok(verdict)
    }

    /// Replace the board with an authoritative snapshot. History is untouched.
    pub fn sync(&mut self, board: Board, side_to_move: Color) {
        debug!(%side_to_move, "Board synchronized");
        self.board = board;
        self.side_to_move = side_to_move;
    }

    /// Take the peer's verdict as final, replacing any local one.
    pub fn accept_authoritative_result(&mut self, verdict: GameEndVerdict) {
        let local = self.verdict();
        if local != verdict {
            warn!(
                local = ?local.reason,
                remote = ?verdict.reason,
                "Authoritative result differs from local verdict"
            );
        }
        self.result = verdict.is_over.then_some(verdict);
    }

    /// The latched result, or a fresh evaluation of the current position.
    pub fn verdict(&self) -> GameEndVerdict {
        match &self.result {
            Some(result) => result.clone(),
            None => check_game_end(&self.board, self.side_to_move, &self.history, &self.rules),
        }
    }

    /// Start a new game from the standard position.
    pub fn reset(&mut self) {
        self.board = Board::standard();
        self.side_to_move = Color::Red;
        self.history.reset();
        self.result = None;
        self.move_count = 0;
        info!(local_side = %self.local_side, "New game");
    }
}
