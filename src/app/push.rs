use crate::app::{ApiError, ErrorResponse, authorize, error_response};
use crate::error::HubError;
use crate::ports::PushTransport;
use crate::push::Admission;
use crate::state;
use crate::types::push::{NotificationPayload, Subscription};

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Deserialize)]
pub(crate) struct SubscriptionRequest {
    pub(crate) endpoint: String,
    #[serde(default)]
    pub(crate) p256dh: String,
    #[serde(default)]
    pub(crate) auth: String,
}

impl SubscriptionRequest {
    fn into_subscription(self) -> Result<Subscription, ApiError> {
        let subscription = Subscription {
            endpoint: self.endpoint,
            p256dh: self.p256dh,
            auth: self.auth,
            last_active: OffsetDateTime::now_utc(),
        };
        if !subscription.is_valid() {
            return Err(error_response(&HubError::InvalidSubscription));
        }
        Ok(subscription)
    }
}

pub(crate) async fn push_subscribe<P: PushTransport>(
    State(state): State<state::AppState<P>>,
    Json(request): Json<SubscriptionRequest>,
) -> Result<StatusCode, ApiError> {
    let subscription = request.into_subscription()?;
    match state.hub.subscribe(subscription).await {
        Ok(Admission::Accepted) => Ok(StatusCode::CREATED),
        Ok(Admission::Updated) => Ok(StatusCode::NO_CONTENT),
        Err(err) => Err(error_response(&err)),
    }
}

pub(crate) async fn push_unsubscribe<P: PushTransport>(
    State(state): State<state::AppState<P>>,
    Json(request): Json<SubscriptionRequest>,
) -> Result<StatusCode, ApiError> {
    let subscription = request.into_subscription()?;
    match state.hub.unsubscribe(&subscription.endpoint) {
        Ok(true) => Ok(StatusCode::OK),
        Ok(false) => Ok(StatusCode::NO_CONTENT),
        Err(err) => Err(error_response(&err)),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SendRequest {
    pub(crate) content: NotificationPayload,
    pub(crate) password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SendResponse {
    pub(crate) sent: usize,
    pub(crate) aborted: bool,
}

pub(crate) async fn push_send<P: PushTransport>(
    State(state): State<state::AppState<P>>,
    Json(request): Json<SendRequest>,
) -> Result<(StatusCode, Json<SendResponse>), ApiError> {
    authorize(&state, &request.password, "send notification")?;
    let report = state
        .hub
        .send(&request.content)
        .await
        .map_err(|err| error_response(&err))?;
    let status = if report.aborted {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(SendResponse {
            sent: report.sent,
            aborted: report.aborted,
        }),
    ))
}

#[derive(Serialize)]
pub(crate) struct PublicKeyResponse {
    #[serde(rename = "publicKey")]
    pub(crate) public_key: String,
}

pub(crate) async fn push_public_key<P: PushTransport>(
    State(state): State<state::AppState<P>>,
) -> Result<Json<PublicKeyResponse>, ApiError> {
    let public_key = state.vapid_public_key.clone().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "push_not_configured",
            }),
        )
    })?;
    Ok(Json(PublicKeyResponse { public_key }))
}
