use std::time::Duration;

use crate::ports::{LogSink, PushTransport, SubscriberStore, TimeProvider};
use crate::types::push::{DeliveryOutcome, NotificationPayload, Subscription};

pub const DEFAULT_DELIVERY_DEADLINE: Duration = Duration::from_secs(30);

/// Whether a successful delivery counts as subscriber activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Refresh,
    Preserve,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: usize,
    pub aborted: bool,
}

/// Sends payloads to subscriptions one at a time and applies the side
/// effect of every delivery outcome.
#[derive(Debug, Clone)]
pub struct Dispatcher<S, L, P, T> {
    store: S,
    logs: L,
    transport: P,
    time: T,
    deadline: Duration,
}

impl<S, L, P, T> Dispatcher<S, L, P, T>
where
    S: SubscriberStore,
    L: LogSink,
    P: PushTransport,
    T: TimeProvider,
{
    pub fn new(store: S, logs: L, transport: P, time: T) -> Self {
        Self {
            store,
            logs,
            transport,
            time,
            deadline: DEFAULT_DELIVERY_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// One transport call bounded by the delivery deadline. A call that does
    /// not finish in time is reported as a transient error.
    pub(crate) async fn deliver(&self, subscription: &Subscription, payload: &str) -> DeliveryOutcome {
        tokio::select! {
            biased;
            outcome = self.transport.deliver(subscription, payload) => outcome,
            _ = self.time.sleep(self.deadline) => DeliveryOutcome::TransientError(format!(
                "delivery timed out after {}s",
                self.deadline.as_secs()
            )),
        }
    }

    /// Delivers `payload` to each subscription in order.
    ///
    /// Gone subscriptions are removed and the batch carries on. A payload that
    /// is too large or any other failure stops the batch at that subscriber,
    /// since the same payload and transport serve every remaining recipient.
    pub async fn broadcast(
        &self,
        payload: &NotificationPayload,
        subscriptions: &[Subscription],
        activity: Activity,
    ) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let serialized = match serde_json::to_string(payload) {
            Ok(serialized) => serialized,
            Err(err) => {
                self.logs
                    .append(&format!("Failed to serialize notification: {err}"));
                report.aborted = true;
                return report;
            }
        };

        let mut delivered = Vec::new();
        for subscription in subscriptions {
            match self.deliver(subscription, &serialized).await {
                DeliveryOutcome::Delivered => {
                    report.sent += 1;
                    delivered.push(subscription.endpoint.as_str());
                }
                DeliveryOutcome::SubscriptionGone => {
                    self.logs.append(&format!(
                        "Subscription {} is gone, removing",
                        subscription.short_endpoint()
                    ));
                    if let Err(err) = self.store.remove(&subscription.endpoint) {
                        self.logs.append(&format!(
                            "Failed to remove subscription {}: {err}",
                            subscription.short_endpoint()
                        ));
                    }
                }
                DeliveryOutcome::PayloadTooLarge => {
                    self.logs
                        .append("Notification content too large for subscriber, aborting batch");
                    report.aborted = true;
                    break;
                }
                DeliveryOutcome::TransientError(reason) => {
                    self.logs
                        .append(&format!("Push delivery failed, aborting batch: {reason}"));
                    report.aborted = true;
                    break;
                }
            }
        }

        if activity == Activity::Refresh
            && !delivered.is_empty()
            && let Err(err) = self.store.touch_all(&delivered, self.time.now())
        {
            tracing::warn!(
                count = delivered.len(),
                "failed to refresh subscriber activity: {err}"
            );
        }
        report
    }
}
