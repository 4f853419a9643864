use tokio_util::sync::CancellationToken;

use crate::config::HubConfig;
use crate::error::HubError;
use crate::ports::{LogSink, PushTransport, SettingsStore, SubscriberStore, TimeProvider};
use crate::push::alert::{AlertNotifier, AlertOutcome};
use crate::push::capacity::{Admission, CapacityGate};
use crate::push::dispatch::{Activity, BroadcastReport, Dispatcher};
use crate::push::health::HealthReporter;
use crate::push::reminder::ReminderTask;
use crate::push::scheduler::{FirstTick, PeriodicHandle, spawn_periodic};
use crate::settings::Settings;
use crate::types::push::{LogEntry, NotificationPayload, Subscription, short_endpoint};

pub const CAPACITY_ALERT: &str = "Subscriber limit reached, cannot add new device";

/// The operations the HTTP layer and the process lifecycle drive.
///
/// Callers are responsible for authenticating admin actions before calling
/// in; nothing here checks credentials.
#[derive(Debug, Clone)]
pub struct Hub<S, L, C, P, T> {
    store: S,
    logs: L,
    settings: Settings<C, L>,
    time: T,
    config: HubConfig,
    dispatcher: Dispatcher<S, L, P, T>,
    gate: CapacityGate<S, L, C, T>,
    notifier: AlertNotifier<S, L, C, P, T>,
    reminder: ReminderTask<S, L, P, T>,
    health: HealthReporter<S, L, C, T>,
}

/// Background loops started by [`Hub::start`].
pub struct HubRuntime {
    token: CancellationToken,
    handles: Vec<PeriodicHandle>,
}

impl<S, L, C, P, T> Hub<S, L, C, P, T>
where
    S: SubscriberStore,
    L: LogSink,
    C: SettingsStore,
    P: PushTransport,
    T: TimeProvider,
{
    pub fn new(store: S, logs: L, settings: C, transport: P, time: T, config: HubConfig) -> Self {
        let settings = Settings::new(settings, logs.clone());
        let dispatcher = Dispatcher::new(store.clone(), logs.clone(), transport, time.clone())
            .with_deadline(config.delivery_deadline);
        let gate = CapacityGate::new(store.clone(), logs.clone(), settings.clone(), time.clone());
        let notifier = AlertNotifier::new(
            store.clone(),
            logs.clone(),
            settings.clone(),
            dispatcher.clone(),
        );
        let reminder = ReminderTask::new(
            store.clone(),
            logs.clone(),
            time.clone(),
            dispatcher.clone(),
            config.reminder_threshold,
        );
        let health = HealthReporter::new(store.clone(), logs.clone(), settings.clone(), time.clone());
        Self {
            store,
            logs,
            settings,
            time,
            config,
            dispatcher,
            gate,
            notifier,
            reminder,
            health,
        }
    }

    pub fn settings(&self) -> &Settings<C, L> {
        &self.settings
    }

    /// Appends an operator-visible entry to the hub log.
    pub fn record(&self, message: &str) {
        self.logs.append(message);
    }

    pub fn subscriber_count(&self) -> Result<usize, HubError> {
        Ok(self.store.count()?)
    }

    /// Registers a subscription. A rejection is mirrored to the alert device
    /// before [`HubError::CapacityExceeded`] is returned.
    pub async fn subscribe(&self, subscription: Subscription) -> Result<Admission, HubError> {
        let admission = self.gate.admit(subscription);
        if let Err(HubError::CapacityExceeded { .. }) = admission {
            self.notifier.notify(CAPACITY_ALERT).await;
        }
        admission
    }

    pub fn unsubscribe(&self, endpoint: &str) -> Result<bool, HubError> {
        if endpoint.trim().is_empty() {
            return Err(HubError::InvalidSubscription);
        }
        let removed = self.store.remove(endpoint)?;
        if removed {
            self.logs
                .append(&format!("Removed device: {}", short_endpoint(endpoint)));
        }
        Ok(removed)
    }

    /// Broadcasts a user-authored notification to every subscriber.
    pub async fn send(&self, payload: &NotificationPayload) -> Result<BroadcastReport, HubError> {
        if !payload.is_valid() {
            return Err(HubError::InvalidPayload);
        }
        let subscriptions = self.store.get_all()?;
        let report = self
            .dispatcher
            .broadcast(payload, &subscriptions, Activity::Preserve)
            .await;
        self.logs
            .append(&format!("Sent {} subscribers {}", report.sent, payload.title));
        Ok(report)
    }

    pub async fn notify(&self, message: &str) -> AlertOutcome {
        self.notifier.notify(message).await
    }

    /// Moves the alert role to `endpoint`, telling the outgoing device first
    /// and the incoming one after.
    pub async fn assign_alert_device(&self, endpoint: &str) -> Result<(), HubError> {
        if endpoint.trim().is_empty() {
            return Err(HubError::InvalidSubscription);
        }
        if !self.store.exists(endpoint)? {
            self.logs.append("Alert device is not a subscriber");
            return Err(HubError::NotSubscribed);
        }
        self.notifier.notify("Alert device status removed").await;
        self.settings.set_alert_device(endpoint)?;
        self.notifier.notify("Alert device status added").await;
        Ok(())
    }

    pub fn set_max_subscribers(&self, limit: i64) -> Result<(), HubError> {
        self.gate.set_max_subscribers(limit)
    }

    /// Newest first; `count == 0` returns every entry.
    pub fn recent_logs(&self, count: usize) -> Vec<LogEntry> {
        self.logs.recent(count)
    }

    pub fn clear_logs(&self) -> usize {
        let count = self.logs.clear();
        self.logs.append(&format!("{count} logs cleared"));
        count
    }

    pub fn clear_subscribers(&self) -> Result<usize, HubError> {
        self.settings.clear_alert_device()?;
        let count = self.store.clear()?;
        self.logs.append(&format!("{count} subscribers cleared"));
        Ok(count)
    }

    /// Announces startup and spawns the reminder and health loops.
    pub async fn start(&self) -> HubRuntime {
        self.logs.append("Reminder service running");
        self.logs.append(&format!(
            "Checking every {} minutes and reminding after {} minutes",
            self.config.reminder_interval.as_secs() / 60,
            self.config.reminder_threshold.as_secs() / 60
        ));
        self.logs.append(&format!(
            "Checking health every {} minutes",
            self.config.health_interval.as_secs() / 60
        ));
        self.health.report();
        self.notifier.notify("Server started").await;

        let token = CancellationToken::new();
        let handles = vec![
            spawn_periodic(
                "reminder",
                self.time.clone(),
                self.config.reminder_interval,
                FirstTick::Immediate,
                token.clone(),
                self.reminder.clone(),
            ),
            spawn_periodic(
                "health",
                self.time.clone(),
                self.config.health_interval,
                FirstTick::AfterInterval,
                token.clone(),
                self.health.clone(),
            ),
        ];
        HubRuntime { token, handles }
    }

    /// Stops the loops, waits for any in-flight tick, then reports health
    /// and tells the alert device before returning.
    pub async fn shutdown(&self, runtime: HubRuntime) {
        runtime.token.cancel();
        for handle in runtime.handles {
            let name = handle.name();
            if let Err(err) = handle.shutdown().await {
                tracing::warn!(task = name, "background task ended abnormally: {err}");
            }
        }
        self.health.report();
        self.notifier.notify("Server shutdown").await;
    }
}
