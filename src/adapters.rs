use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use web_push::WebPushError;

use crate::ports;
use crate::types::push::{DeliveryOutcome, Subscription, VapidConfig};

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimeProvider;

impl ports::TimeProvider for TokioTimeProvider {
    type Sleep<'a>
        = tokio::time::Sleep
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        tokio::time::sleep(duration)
    }
}

#[derive(Clone)]
pub struct WebPushTransport {
    vapid: VapidConfig,
    client: Arc<web_push::WebPushClient>,
}

impl WebPushTransport {
    pub fn new(vapid: VapidConfig) -> Result<Self, WebPushError> {
        let client = web_push::WebPushClient::new()?;
        Ok(Self {
            vapid,
            client: Arc::new(client),
        })
    }

    async fn send(&self, subscription: &Subscription, payload: &str) -> Result<(), WebPushError> {
        let subscription_info = web_push::SubscriptionInfo::new(
            subscription.endpoint.clone(),
            subscription.p256dh.clone(),
            subscription.auth.clone(),
        );
        let mut builder = web_push::WebPushMessageBuilder::new(&subscription_info)?;
        builder.set_payload(web_push::ContentEncoding::Aes128Gcm, payload.as_bytes());
        let mut signature_builder = web_push::VapidSignatureBuilder::from_base64(
            &self.vapid.private_key,
            web_push::URL_SAFE_NO_PAD,
            &subscription_info,
        )?;
        signature_builder.add_claim("sub", self.vapid.subject.as_str());
        builder.set_vapid_signature(signature_builder.build()?);
        self.client.send(builder.build()?).await
    }
}

impl ports::PushTransport for WebPushTransport {
    type Fut<'a>
        = Pin<Box<dyn Future<Output = DeliveryOutcome> + Send + 'a>>
    where
        Self: 'a;

    fn deliver<'a>(&'a self, subscription: &'a Subscription, payload: &'a str) -> Self::Fut<'a> {
        Box::pin(async move {
            match self.send(subscription, payload).await {
                Ok(()) => DeliveryOutcome::Delivered,
                Err(err) => classify(&err),
            }
        })
    }
}

/// 404 and 410 from the push service mean the browser dropped the
/// registration; 413 means the payload itself is the problem.
pub(crate) fn classify(err: &WebPushError) -> DeliveryOutcome {
    match err {
        WebPushError::EndpointNotValid | WebPushError::EndpointNotFound => {
            DeliveryOutcome::SubscriptionGone
        }
        WebPushError::PayloadTooLarge => DeliveryOutcome::PayloadTooLarge,
        other => DeliveryOutcome::TransientError(other.to_string()),
    }
}
