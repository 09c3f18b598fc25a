use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::attack::is_king_in_check;
use crate::board::{Board, BoardError, Color, Move, Position};
use crate::config::{RulesConfig, ServerConfig};
use crate::history::PositionHistory;
use crate::legality::{legal_destinations, validate_move};
use crate::session::{GameError, GameSession};
use crate::verdict::{GameEndVerdict, check_game_end};

#[derive(Clone)]
pub struct AppState {
    games: Arc<Mutex<HashMap<String, GameSession>>>,
    rules: RulesConfig,
}

impl AppState {
    pub fn new(rules: RulesConfig) -> Self {
        AppState {
            games: Arc::new(Mutex::new(HashMap::new())),
            rules,
        }
    }
}

/// A board in char-grid notation, either one `/`-separated string or a list of ranks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoardInput {
    Text(String),
    Rows(Vec<String>),
}

impl BoardInput {
    fn parse(&self) -> Result<Board, BoardError> {
        match self {
            BoardInput::Text(text) => text.parse(),
            BoardInput::Rows(rows) => Board::from_rows(rows.as_slice()),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct LegalRequest {
    board: BoardInput,
    side: Color,
    from_row: i64,
    from_col: i64,
    to_row: i64,
    to_col: i64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct LegalResponse {
    legal: bool,
    reason: Option<String>,
    message: Option<String>,
}

impl LegalResponse {
    fn accepted() -> Self {
        LegalResponse {
            legal: true,
            reason: None,
            message: None,
        }
    }

    fn rejected(reason: &str, message: String) -> Self {
        LegalResponse {
            legal: false,
            reason: Some(reason.to_string()),
            message: Some(message),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct DestinationsRequest {
    board: BoardInput,
    row: i64,
    col: i64,
}

#[derive(Serialize, Deserialize, Clone, Copy)]
pub struct SquareResponse {
    row: usize,
    col: usize,
}

impl From<Position> for SquareResponse {
    fn from(pos: Position) -> Self {
        SquareResponse {
            row: pos.row,
            col: pos.col,
        }
    }
}

#[derive(Serialize)]
pub struct DestinationsResponse {
    destinations: Vec<SquareResponse>,
}

#[derive(Serialize, Deserialize)]
pub struct CheckRequest {
    board: BoardInput,
    color: Color,
}

#[derive(Serialize, Deserialize)]
pub struct PositionRequest {
    board: BoardInput,
    side_to_move: Color,
}

#[derive(Serialize, Deserialize)]
pub struct NewGameRequest {
    game_id: String,
    local_side: Color,
}

#[derive(Serialize, Deserialize)]
pub struct MoveRequest {
    from_row: i64,
    from_col: i64,
    to_row: i64,
    to_col: i64,
}

impl MoveRequest {
    fn to_move(&self) -> Result<Move, LegalResponse> {
        coords_to_move(self.from_row, self.from_col, self.to_row, self.to_col)
    }
}

/// Coordinates arrive signed from clients; anything off the 10x9 grid is refused here.
fn square(row: i64, col: i64) -> Option<Position> {
    let pos = Position::new(usize::try_from(row).ok()?, usize::try_from(col).ok()?);
    pos.is_on_board().then_some(pos)
}

fn coords_to_move(from_row: i64, from_col: i64, to_row: i64, to_col: i64) -> Result<Move, LegalResponse> {
    let off_board = |row: i64, col: i64| {
        LegalResponse::rejected("OUT_OF_BOUNDS", format!("Square ({row}, {col}) is off the board"))
    };
    let from = square(from_row, from_col).ok_or_else(|| off_board(from_row, from_col))?;
    let to = square(to_row, to_col).ok_or_else(|| off_board(to_row, to_col))?;
    Ok(Move::new(from, to))
}

#[derive(Serialize)]
pub struct GameResponse {
    game_id: String,
    board: Vec<String>,
    side_to_move: Color,
    local_side: Color,
    move_count: usize,
    in_check: bool,
    verdict: GameEndVerdict,
}

impl GameResponse {
    fn from_session(game_id: &str, session: &GameSession) -> Self {
        GameResponse {
            game_id: game_id.to_string(),
            board: session.board().to_rows(),
            side_to_move: session.side_to_move(),
            local_side: session.local_side(),
            move_count: session.move_count(),
            in_check: is_king_in_check(session.board(), session.side_to_move()),
            verdict: session.verdict(),
        }
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

fn unknown_game(game_id: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, format!("Unknown game {game_id}"))
}

fn rejection(err: &GameError) -> LegalResponse {
    let reason = match err {
        GameError::InvalidMove(e) => e.code(),
        GameError::Board(_) => "INVALID_BOARD",
        GameError::GameOver => "GAME_OVER",
        GameError::NotYourTurn => "WRONG_TURN",
    };
    LegalResponse::rejected(reason, err.to_string())
}

#[axum::debug_handler]
async fn check_legal(Json(req): Json<LegalRequest>) -> Json<LegalResponse> {
    let board = match req.board.parse() {
        Ok(board) => board,
        Err(e) => return Json(rejection(&GameError::Board(e))),
    };

    let mv = match coords_to_move(req.from_row, req.from_col, req.to_row, req.to_col) {
        Ok(mv) => mv,
        Err(rejected) => return Json(rejected),
    };
    match validate_move(&board, mv, req.side) {
        Ok(_) => Json(LegalResponse::accepted()),
        Err(e) => Json(rejection(&GameError::InvalidMove(e))),
    }
}

#[axum::debug_handler]
async fn destinations(Json(req): Json<DestinationsRequest>) -> Json<DestinationsResponse> {
    let destinations = match (req.board.parse(), square(req.row, req.col)) {
        (Ok(board), Some(from)) => legal_destinations(&board, from)
            .into_iter()
            .map(SquareResponse::from)
            .collect(),
        _ => Vec::new(),
    };
    Json(DestinationsResponse { destinations })
}

#[axum::debug_handler]
async fn king_in_check(Json(req): Json<CheckRequest>) -> Json<serde_json::Value> {
    let in_check = req
        .board
        .parse()
        .is_ok_and(|board| is_king_in_check(&board, req.color));
    Json(serde_json::json!({ "in_check": in_check }))
}

#[axum::debug_handler]
async fn evaluate(State(app_state): State<AppState>, Json(req): Json<PositionRequest>) -> Json<GameEndVerdict> {
    let verdict = match req.board.parse() {
        Ok(board) => check_game_end(
            &board,
            req.side_to_move,
            &PositionHistory::new(),
            &app_state.rules,
        ),
        Err(_) => GameEndVerdict::ongoing(),
    };
    Json(verdict)
}

#[axum::debug_handler]
async fn new_game(State(app_state): State<AppState>, Json(req): Json<NewGameRequest>) -> Response {
    let session = GameSession::new(req.local_side, app_state.rules);
    let response = GameResponse::from_session(&req.game_id, &session);

    let mut games = app_state.games.lock().await;
    if games.insert(req.game_id.clone(), session).is_some() {
        info!(game_id = %req.game_id, "Replaced existing game");
    } else {
        info!(game_id = %req.game_id, local_side = %req.local_side, "Game created");
    }

    Json(response).into_response()
}

#[axum::debug_handler]
async fn get_game(State(app_state): State<AppState>, Path(game_id): Path<String>) -> Response {
    let games = app_state.games.lock().await;
    match games.get(&game_id) {
        Some(session) => Json(GameResponse::from_session(&game_id, session)).into_response(),
        None => unknown_game(&game_id),
    }
}

#[axum::debug_handler]
async fn propose(
    State(app_state): State<AppState>,
    Path(game_id): Path<String>,
    Json(req): Json<MoveRequest>,
) -> Response {
    let games = app_state.games.lock().await;
    let Some(session) = games.get(&game_id) else {
        return unknown_game(&game_id);
    };

    let response = match req.to_move() {
        Ok(mv) => match session.check_proposal(mv) {
            Ok(_) => LegalResponse::accepted(),
            Err(e) => rejection(&e),
        },
        Err(rejected) => rejected,
    };
    Json(response).into_response()
}

#[axum::debug_handler]
async fn confirm_move(
    State(app_state): State<AppState>,
    Path(game_id): Path<String>,
    Json(req): Json<MoveRequest>,
) -> Response {
    let mut games = app_state.games.lock().await;
    let Some(session) = games.get_mut(&game_id) else {
        return unknown_game(&game_id);
    };

    let mv = match req.to_move() {
        Ok(mv) => mv,
        Err(rejected) => {
            let message = rejected.message.unwrap_or_default();
            return error_response(StatusCode::BAD_REQUEST, message);
        }
    };
    if let Err(e) = session.apply_confirmed(mv) {
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }
    Json(GameResponse::from_session(&game_id, session)).into_response()
}

#[axum::debug_handler]
async fn sync_game(
    State(app_state): State<AppState>,
    Path(game_id): Path<String>,
    Json(req): Json<PositionRequest>,
) -> Response {
    let board = match req.board.parse() {
        Ok(board) => board,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, GameError::Board(e).to_string()),
    };

    let mut games = app_state.games.lock().await;
    let Some(session) = games.get_mut(&game_id) else {
        return unknown_game(&game_id);
    };
    session.sync(board, req.side_to_move);
    Json(GameResponse::from_session(&game_id, session)).into_response()
}

#[axum::debug_handler]
async fn accept_result(
    State(app_state): State<AppState>,
    Path(game_id): Path<String>,
    Json(result): Json<GameEndVerdict>,
) -> Response {
    let mut games = app_state.games.lock().await;
    let Some(session) = games.get_mut(&game_id) else {
        return unknown_game(&game_id);
    };
    session.accept_authoritative_result(result);
    Json(GameResponse::from_session(&game_id, session)).into_response()
}

#[axum::debug_handler]
async fn reset_game(State(app_state): State<AppState>, Path(game_id): Path<String>) -> Response {
    let mut games = app_state.games.lock().await;
    let Some(session) = games.get_mut(&game_id) else {
        return unknown_game(&game_id);
    };
    session.reset();
    Json(GameResponse::from_session(&game_id, session)).into_response()
}

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/legal", post(check_legal))
        .route("/api/destinations", post(destinations))
        .route("/api/check", post(king_in_check))
        .route("/api/verdict", post(evaluate))
        .route("/api/games", post(new_game))
        .route("/api/games/:id", get(get_game))
        .route("/api/games/:id/propose", post(propose))
        .route("/api/games/:id/moves", post(confirm_move))
        .route("/api/games/:id/sync", post(sync_game))
        .route("/api/games/:id/result", post(accept_result))
        .route("/api/games/:id/reset", post(reset_game))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state)
}

pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(AppState::new(config.rules));

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("Referee listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
