use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracedrive_shared::{
    DetectionStatus, MessageResponse, PathRequest, ServerStatus, DETECTION_START_ENDPOINT,
    DETECTION_STATUS_ENDPOINT, DETECTION_STOP_ENDPOINT, PATH_ENDPOINT, STATUS_ENDPOINT,
};

use crate::drive::{execute_move, DriveError};
use crate::motion::{plan_moves, Move};
use crate::state::AppState;

/// Largest coordinate magnitude accepted on `/path`, far outside any drawing pad.
const MAX_COORDINATE: f64 = 1.0e6;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(MessageResponse::new(self.message))).into_response()
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(PATH_ENDPOINT, post(path_handler))
        .route(DETECTION_START_ENDPOINT, post(detection_start_handler))
        .route(DETECTION_STOP_ENDPOINT, post(detection_stop_handler))
        .route(DETECTION_STATUS_ENDPOINT, get(detection_status_handler))
        .route(STATUS_ENDPOINT, get(status_handler))
}

pub async fn path_handler(
    State(state): State<AppState>,
    body: Result<Json<PathRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        tracing::warn!("Rejected path body: {rejection}");
        ApiError::new(StatusCode::BAD_REQUEST, "No path data")
    })?;
    let coords = request.path_points;
    if coords.len() < 2 {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "Not enough coordinates",
        ));
    }
    if coords
        .iter()
        .flatten()
        .any(|value| !value.is_finite() || value.abs() > MAX_COORDINATE)
    {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "Coordinates out of range",
        ));
    }

    let moves = plan_moves(&coords, &state.planner).map_err(|error| {
        tracing::error!("Path planning error: {error}");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
    })?;
    tracing::info!("Executing {} moves", moves.len());

    // Runs to completion even when the request is dropped.
    let drive_task = tokio::spawn(run_moves(state, moves));
    drive_task
        .await
        .map_err(|error| {
            tracing::error!("Path task failed: {error}");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Path execution aborted")
        })?
        .map_err(|error| {
            tracing::error!("Path error: {error}");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
        })?;

    Ok(Json(MessageResponse::new("Path executed successfully")))
}

async fn run_moves(state: AppState, moves: Vec<Move>) -> Result<(), DriveError> {
    let _guard = state.drive_lock.lock().await;
    for (index, step) in moves.iter().enumerate() {
        tracing::info!(
            "Move {}/{}: {} ({:.2}s)",
            index + 1,
            moves.len(),
            step.direction,
            step.duration.as_secs_f64()
        );
        execute_move(state.drive.as_ref(), *step, state.speed).await?;
    }
    Ok(())
}

pub async fn detection_start_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.detector.start().await;
    Json(MessageResponse::new("Detection started"))
}

pub async fn detection_stop_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    if !state.detector.is_running().await {
        tracing::info!("Detection stop requested while not running");
    }
    state.detector.stop().await;
    Json(MessageResponse::new("Detection stopped"))
}

pub async fn detection_status_handler(State(state): State<AppState>) -> Json<DetectionStatus> {
    Json(DetectionStatus {
        object_detected: state.detector.object_detected(),
    })
}

pub async fn status_handler(State(state): State<AppState>) -> Json<ServerStatus> {
    Json(ServerStatus {
        status: "running".to_string(),
        motor_library: state.drive.name().to_string(),
        object_detected: state.detector.object_detected(),
    })
}
