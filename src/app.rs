use crate::error::HubError;
use crate::ports::PushTransport;
use crate::state;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use axum::routing::post;
use serde::Serialize;

mod admin;
mod push;

#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: &'static str,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn app<P: PushTransport>(state: state::AppState<P>) -> Router {
    Router::new()
        .route("/api/pulse", get(pulse))
        .route("/api/push/public-key", get(push::push_public_key::<P>))
        .route(
            "/api/notifications/subscribe",
            post(push::push_subscribe::<P>),
        )
        .route(
            "/api/notifications/unsubscribe",
            post(push::push_unsubscribe::<P>),
        )
        .route("/api/notifications/send", post(push::push_send::<P>))
        .route("/api/logs", post(admin::logs::<P>))
        .route("/api/clearlogs", post(admin::clear_logs::<P>))
        .route("/api/clearsubscribers", post(admin::clear_subscribers::<P>))
        .route("/api/setlimit", post(admin::set_limit::<P>))
        .route("/api/setalertdevice", post(admin::set_alert_device::<P>))
        .route("/api/shutdown", post(admin::shutdown::<P>))
        .with_state(state)
}

pub(crate) async fn pulse() -> Json<bool> {
    Json(true)
}

/// Checks the admin password carried by a privileged request. Failed attempts
/// are written to the hub log.
pub(crate) fn authorize<P: PushTransport>(
    state: &state::AppState<P>,
    password: &str,
    action: &str,
) -> Result<(), ApiError> {
    let verified = state
        .admin
        .as_ref()
        .is_some_and(|admin| admin.verify(password));
    if verified {
        return Ok(());
    }
    state
        .hub
        .record(&format!("Unauthorized attempt to {action}"));
    Err(error_response(&HubError::Unauthorized))
}

pub(crate) fn error_response(err: &HubError) -> ApiError {
    let status = match err {
        HubError::CapacityExceeded { .. } => StatusCode::INSUFFICIENT_STORAGE,
        HubError::InvalidSubscription | HubError::InvalidPayload | HubError::InvalidLimit(_) => {
            StatusCode::BAD_REQUEST
        }
        HubError::Unauthorized => StatusCode::UNAUTHORIZED,
        HubError::NotSubscribed => StatusCode::CONFLICT,
        HubError::Store(store_err) => {
            tracing::error!("store failure while serving request: {store_err}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: err.as_label(),
        }),
    )
}
