use std::time::Duration;

use time::OffsetDateTime;

use crate::ports::{LogSink, PushTransport, SubscriberStore, TimeProvider};
use crate::push::dispatch::{Activity, BroadcastReport, Dispatcher};
use crate::push::scheduler::PeriodicTask;
use crate::types::push::{NotificationPayload, Subscription};

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_REMIND_THRESHOLD: Duration = Duration::from_secs(300 * 60);

pub const REMINDER_TITLE: &str = "We miss you!";
pub const REMINDER_BODY: &str = "Please come back!";

pub fn reminder_payload() -> NotificationPayload {
    NotificationPayload::new(REMINDER_TITLE, REMINDER_BODY)
}

/// Subscriptions idle for at least `threshold` as of `now`.
pub fn inactive_subscribers(
    subscriptions: Vec<Subscription>,
    now: OffsetDateTime,
    threshold: Duration,
) -> Vec<Subscription> {
    let threshold = time::Duration::try_from(threshold).unwrap_or(time::Duration::MAX);
    subscriptions
        .into_iter()
        .filter(|subscription| now - subscription.last_active >= threshold)
        .collect()
}

/// Re-engages idle subscribers. Delivery refreshes their activity, so each
/// subscriber is reminded at most once per threshold.
#[derive(Debug, Clone)]
pub struct ReminderTask<S, L, P, T> {
    store: S,
    logs: L,
    time: T,
    dispatcher: Dispatcher<S, L, P, T>,
    threshold: Duration,
}

impl<S, L, P, T> ReminderTask<S, L, P, T>
where
    S: SubscriberStore,
    L: LogSink,
    P: PushTransport,
    T: TimeProvider,
{
    pub fn new(
        store: S,
        logs: L,
        time: T,
        dispatcher: Dispatcher<S, L, P, T>,
        threshold: Duration,
    ) -> Self {
        Self {
            store,
            logs,
            time,
            dispatcher,
            threshold,
        }
    }

    /// Runs one reminder check. Returns `None` when nobody was reminded.
    pub async fn run_once(&self) -> Option<BroadcastReport> {
        self.logs.append("Checking for inactive subscribers");
        let subscriptions = match self.store.get_all() {
            Ok(subscriptions) => subscriptions,
            Err(err) => {
                self.logs
                    .append(&format!("Inactivity check skipped: {err}"));
                return None;
            }
        };

        let inactive = inactive_subscribers(subscriptions, self.time.now(), self.threshold);
        if inactive.is_empty() {
            self.logs.append("No inactive subscribers found");
            return None;
        }

        self.logs
            .append(&format!("Found {} inactive subscribers", inactive.len()));
        let report = self
            .dispatcher
            .broadcast(&reminder_payload(), &inactive, Activity::Refresh)
            .await;
        self.logs
            .append(&format!("Reminded {} subscribers", report.sent));
        Some(report)
    }
}

impl<S, L, P, T> PeriodicTask for ReminderTask<S, L, P, T>
where
    S: SubscriberStore,
    L: LogSink,
    P: PushTransport,
    T: TimeProvider,
{
    async fn tick(&self) {
        self.run_once().await;
    }
}
