use crate::app::{ApiError, ErrorResponse, authorize, error_response};
use crate::ports::PushTransport;
use crate::state;
use crate::types::push::LogEntry;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Deserialize)]
pub(crate) struct PasswordRequest {
    pub(crate) password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LogsRequest {
    pub(crate) password: String,
    #[serde(default)]
    pub(crate) count: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LimitRequest {
    pub(crate) password: String,
    pub(crate) limit: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlertDeviceRequest {
    pub(crate) password: String,
    pub(crate) endpoint: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ClearedResponse {
    pub(crate) cleared: usize,
}

pub(crate) async fn logs<P: PushTransport>(
    State(state): State<state::AppState<P>>,
    Json(request): Json<LogsRequest>,
) -> Result<Json<Vec<LogEntry>>, ApiError> {
    authorize(&state, &request.password, "read logs")?;
    let count = usize::try_from(request.count).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "invalid_count",
            }),
        )
    })?;
    Ok(Json(state.hub.recent_logs(count)))
}

pub(crate) async fn clear_logs<P: PushTransport>(
    State(state): State<state::AppState<P>>,
    Json(request): Json<PasswordRequest>,
) -> Result<Json<ClearedResponse>, ApiError> {
    authorize(&state, &request.password, "clear logs")?;
    let cleared = state.hub.clear_logs();
    Ok(Json(ClearedResponse { cleared }))
}

pub(crate) async fn clear_subscribers<P: PushTransport>(
    State(state): State<state::AppState<P>>,
    Json(request): Json<PasswordRequest>,
) -> Result<Json<ClearedResponse>, ApiError> {
    authorize(&state, &request.password, "clear subscribers")?;
    let cleared = state
        .hub
        .clear_subscribers()
        .map_err(|err| error_response(&err))?;
    Ok(Json(ClearedResponse { cleared }))
}

pub(crate) async fn set_limit<P: PushTransport>(
    State(state): State<state::AppState<P>>,
    Json(request): Json<LimitRequest>,
) -> Result<StatusCode, ApiError> {
    authorize(&state, &request.password, "change subscriber limit")?;
    state
        .hub
        .set_max_subscribers(request.limit)
        .map_err(|err| error_response(&err))?;
    Ok(StatusCode::OK)
}

pub(crate) async fn set_alert_device<P: PushTransport>(
    State(state): State<state::AppState<P>>,
    Json(request): Json<AlertDeviceRequest>,
) -> Result<StatusCode, ApiError> {
    authorize(&state, &request.password, "change alert device")?;
    state
        .hub
        .assign_alert_device(&request.endpoint)
        .await
        .map_err(|err| error_response(&err))?;
    Ok(StatusCode::OK)
}

pub(crate) async fn shutdown<P: PushTransport>(
    State(state): State<state::AppState<P>>,
    Json(request): Json<PasswordRequest>,
) -> Result<StatusCode, ApiError> {
    authorize(&state, &request.password, "shut down server")?;
    state.hub.record("Shutdown requested");
    state.shutdown.cancel();
    Ok(StatusCode::OK)
}
