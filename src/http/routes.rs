//! HTTP route definitions

use axum::{
    extract::{Path, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{ArenaConfig, EngineError, MatchSession, PongState, TickInput};
use crate::store::StoreError;
use crate::tournament::{NextMatch, ReportOutcome, SchedulerError};
use crate::util::time::uptime_secs;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // CORS configuration - support multiple origins (comma-separated in CLIENT_ORIGIN)
    let allowed_origins: Vec<header::HeaderValue> = state
        .config
        .client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .route("/health", get(health_handler))
        .route("/matches", post(create_match_handler))
        .route("/matches/:session_id/tick", post(tick_handler))
        .route("/tournaments", post(create_tournament_handler))
        .route("/tournaments/next", post(next_match_handler))
        .route("/tournaments/report", post(report_result_handler))
        .route("/tournaments/current", delete(abandon_tournament_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_sessions: usize,
    tournament_active: bool,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        active_sessions: state.sessions.active_sessions(),
        tournament_active: state.scheduler.active().await,
    })
}

// ============================================================================
// Match endpoints
// ============================================================================

#[derive(Deserialize)]
struct CreateMatchRequest {
    player1_id: Uuid,
    player2_id: Uuid,
}

#[derive(Serialize)]
struct CreateMatchResponse {
    session_id: Uuid,
}

/// Create a standalone 1v1 match: a persisted record plus a live session
async fn create_match_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateMatchRequest>,
) -> Result<Json<CreateMatchResponse>, AppError> {
    if req.player1_id == req.player2_id {
        return Err(AppError::BadRequest(
            "players must be distinct".to_string(),
        ));
    }

    let session_id = state
        .match_store
        .create_match_record(req.player1_id, req.player2_id, None)
        .await?;

    state.sessions.insert(MatchSession::new(
        session_id,
        req.player1_id,
        req.player2_id,
        None,
        state.config.win_score,
    ));

    info!(session_id = %session_id, "1v1 match created");
    Ok(Json(CreateMatchResponse { session_id }))
}

#[derive(Deserialize)]
struct TickRequest {
    input: TickInput,
    arena: ArenaConfig,
    /// State the client last rendered; the server is authoritative and only
    /// uses this for drift diagnostics
    last_known_state: Option<PongState>,
}

#[derive(Serialize)]
struct TickResponse {
    state: PongState,
    /// 1 = left, 2 = right, once decided
    winner_index: Option<u8>,
}

async fn tick_handler(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<TickRequest>,
) -> Result<Json<TickResponse>, AppError> {
    let handle = state
        .sessions
        .get(&session_id)
        .ok_or_else(|| AppError::NotFound("unknown session".to_string()))?;

    let mut session = handle.lock().await;

    if !session.limiter.check_tick() {
        return Err(AppError::TooManyRequests);
    }

    let outcome = session.tick(&req.input, req.arena)?;

    if let Some(client_state) = req.last_known_state {
        let drift = (client_state.ball_x - outcome.state.ball_x).abs()
            + (client_state.ball_y - outcome.state.ball_y).abs();
        if drift > 100.0 {
            debug!(session_id = %session_id, drift = drift, "Client state drifted from authoritative");
        }
    }

    if outcome.just_decided {
        info!(session_id = %session_id, "Match decided");
    }

    // The orchestrating layer persists the final result exactly once. The
    // gate is "decided and not yet written", not "decided this tick": a
    // failed write leaves `finalized` unset so the next poll retries it.
    if outcome.state.winner.is_some() && !session.finalized() {
        let winner_id = session
            .winner_id()
            .ok_or_else(|| AppError::Internal("decided match has no winner".to_string()))?;

        match state
            .match_store
            .finalize_match_record(
                session_id,
                outcome.state.score_left,
                outcome.state.score_right,
                winner_id,
            )
            .await
        {
            Ok(()) => {
                session.mark_finalized();
                info!(session_id = %session_id, winner_id = %winner_id, "Match finalized");
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Failed to finalize match record");
            }
        }
    }

    Ok(Json(TickResponse {
        state: outcome.state,
        winner_index: outcome.state.winner.map(|side| side.index()),
    }))
}

// ============================================================================
// Tournament endpoints
// ============================================================================

#[derive(Deserialize)]
struct CreateTournamentRequest {
    name: String,
    player_ids: Vec<Uuid>,
}

#[derive(Serialize)]
struct CreateTournamentResponse {
    tournament_id: Uuid,
}

async fn create_tournament_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateTournamentRequest>,
) -> Result<Json<CreateTournamentResponse>, AppError> {
    let tournament_id = state
        .scheduler
        .create_tournament(&req.player_ids, &req.name)
        .await?;

    Ok(Json(CreateTournamentResponse { tournament_id }))
}

#[derive(Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum NextMatchResponse {
    MatchReady {
        session_id: Uuid,
        player1: Uuid,
        player2: Uuid,
        byes: Vec<Uuid>,
    },
    TournamentFinished {
        winner_id: Uuid,
        byes: Vec<Uuid>,
    },
}

async fn next_match_handler(
    State(state): State<AppState>,
) -> Result<Json<NextMatchResponse>, AppError> {
    match state.scheduler.next_playable_match().await? {
        NextMatch::MatchReady {
            session_id,
            tournament_id,
            player1,
            player2,
            byes,
        } => {
            // Tie the record to a live engine session
            state.sessions.insert(MatchSession::new(
                session_id,
                player1,
                player2,
                Some(tournament_id),
                state.config.win_score,
            ));

            Ok(Json(NextMatchResponse::MatchReady {
                session_id,
                player1,
                player2,
                byes,
            }))
        }
        NextMatch::Finished { winner_id, byes } => {
            Ok(Json(NextMatchResponse::TournamentFinished { winner_id, byes }))
        }
    }
}

#[derive(Deserialize)]
struct ReportResultRequest {
    session_id: Uuid,
    /// 1 = player1, 2 = player2
    winning_side: u8,
}

#[derive(Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum ReportResultResponse {
    TournamentFinished { winner_id: Uuid },
    NextRoundReady { remaining: usize },
    NextMatchReady,
}

async fn report_result_handler(
    State(state): State<AppState>,
    Json(req): Json<ReportResultRequest>,
) -> Result<Json<ReportResultResponse>, AppError> {
    let outcome = state
        .scheduler
        .report_match_result(req.session_id, req.winning_side)
        .await?;

    // The session has served its purpose once the result is consumed
    state.sessions.remove(&req.session_id);

    Ok(Json(match outcome {
        ReportOutcome::Finished { winner_id } => {
            ReportResultResponse::TournamentFinished { winner_id }
        }
        ReportOutcome::NextRoundReady { remaining } => {
            ReportResultResponse::NextRoundReady { remaining }
        }
        ReportOutcome::NextMatchReady => ReportResultResponse::NextMatchReady,
    }))
}

async fn abandon_tournament_handler(
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state.scheduler.abandon().await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Too many requests")]
    TooManyRequests,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Upstream store failed: {0}")]
    BadGateway(String),
}

impl From<SchedulerError> for AppError {
    fn from(e: SchedulerError) -> Self {
        match e {
            SchedulerError::InvalidArgument(msg) => AppError::BadRequest(msg.to_string()),
            SchedulerError::Conflict(msg) => AppError::Conflict(msg.to_string()),
            SchedulerError::InternalInconsistency(msg) => AppError::Internal(msg.to_string()),
            SchedulerError::Collaborator(e) => AppError::BadGateway(e.to_string()),
        }
    }
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::BadGateway(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::TooManyRequests => {
                (StatusCode::TOO_MANY_REQUESTS, "Too many requests".to_string())
            }
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
