use thiserror::Error;

/// Failures reported by the subscriber, log and settings stores.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("failed to persist state: {0}")]
    Persist(String),
    #[error("invalid stored value for '{key}': {value}")]
    InvalidValue { key: String, value: String },
}

/// Errors surfaced by hub operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HubError {
    #[error("subscriber limit of {limit} reached")]
    CapacityExceeded { limit: u32 },
    #[error("subscription is missing endpoint or key material")]
    InvalidSubscription,
    #[error("notification needs a title and a body")]
    InvalidPayload,
    #[error("subscriber limit must not be negative (got {0})")]
    InvalidLimit(i64),
    #[error("unauthorized")]
    Unauthorized,
    #[error("endpoint is not a subscriber")]
    NotSubscribed,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl HubError {
    /// Stable snake_case label for logs and API responses.
    pub fn as_label(&self) -> &'static str {
        match self {
            HubError::CapacityExceeded { .. } => "capacity_exceeded",
            HubError::InvalidSubscription => "invalid_subscription",
            HubError::InvalidPayload => "invalid_payload",
            HubError::InvalidLimit(_) => "invalid_limit",
            HubError::Unauthorized => "unauthorized",
            HubError::NotSubscribed => "not_subscribed",
            HubError::Store(_) => "store_error",
        }
    }
}

/// Reasons the service cannot start.
#[derive(Error, Debug)]
pub enum ServeError {
    #[error("push delivery is not configured: {0}")]
    Vapid(&'static str),
    #[error("failed to init web-push: {0}")]
    Transport(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Auth(#[from] crate::auth::AuthError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
