use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone)]
pub struct VapidConfig {
    pub private_key: String,
    pub public_key: String,
    pub subject: String,
}

/// A browser push registration. The endpoint is the subscriber's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    #[serde(with = "time::serde::rfc3339")]
    pub last_active: OffsetDateTime,
}

impl Subscription {
    /// Both key halves must be present for the push service to encrypt to it.
    pub fn is_valid(&self) -> bool {
        !self.endpoint.trim().is_empty()
            && !self.p256dh.trim().is_empty()
            && !self.auth.trim().is_empty()
    }

    /// Short, log-safe form of the endpoint.
    pub fn short_endpoint(&self) -> &str {
        short_endpoint(&self.endpoint)
    }
}

pub(crate) fn short_endpoint(endpoint: &str) -> &str {
    let chars = endpoint.chars().count();
    if chars <= 10 {
        return endpoint;
    }
    let skip = endpoint
        .char_indices()
        .nth(chars - 10)
        .map(|(index, _)| index)
        .unwrap_or(0);
    &endpoint[skip..]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
}

impl NotificationPayload {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && !self.body.trim().is_empty()
    }
}

/// Result of handing one payload to the push service for one subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    PayloadTooLarge,
    SubscriptionGone,
    TransientError(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}
