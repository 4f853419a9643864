use crate::ports::{LogSink, PushTransport, SettingsStore, SubscriberStore, TimeProvider};
use crate::push::dispatch::Dispatcher;
use crate::settings::Settings;
use crate::types::push::{DeliveryOutcome, NotificationPayload};

pub const ALERT_TITLE: &str = "Alert";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertOutcome {
    NoDevice,
    Delivered,
    /// The device is unreachable for good and the reference was cleared.
    DeviceGone,
    Failed,
}

/// Sends operational messages to the single designated alert device.
#[derive(Debug, Clone)]
pub struct AlertNotifier<S, L, C, P, T> {
    store: S,
    logs: L,
    settings: Settings<C, L>,
    dispatcher: Dispatcher<S, L, P, T>,
}

impl<S, L, C, P, T> AlertNotifier<S, L, C, P, T>
where
    S: SubscriberStore,
    L: LogSink,
    C: SettingsStore,
    P: PushTransport,
    T: TimeProvider,
{
    pub fn new(
        store: S,
        logs: L,
        settings: Settings<C, L>,
        dispatcher: Dispatcher<S, L, P, T>,
    ) -> Self {
        Self {
            store,
            logs,
            settings,
            dispatcher,
        }
    }

    /// Attempts a single delivery of `message` to the alert device. Completes
    /// only after the attempt has been made.
    pub async fn notify(&self, message: &str) -> AlertOutcome {
        let endpoint = match self.settings.alert_device() {
            Ok(Some(endpoint)) => endpoint,
            Ok(None) => {
                self.logs.append("No alert device set");
                return AlertOutcome::NoDevice;
            }
            Err(err) => {
                self.logs
                    .append(&format!("Failed to read alert device: {err}"));
                return AlertOutcome::Failed;
            }
        };

        let subscription = match self.store.get(&endpoint) {
            Ok(Some(subscription)) => subscription,
            Ok(None) => {
                self.logs
                    .append("Alert device is no longer a subscriber...removing");
                self.clear_reference();
                return AlertOutcome::DeviceGone;
            }
            Err(err) => {
                self.logs
                    .append(&format!("Failed to look up alert device: {err}"));
                return AlertOutcome::Failed;
            }
        };

        let payload = NotificationPayload::new(ALERT_TITLE, message);
        let serialized = match serde_json::to_string(&payload) {
            Ok(serialized) => serialized,
            Err(err) => {
                self.logs
                    .append(&format!("Failed to serialize alert: {err}"));
                return AlertOutcome::Failed;
            }
        };

        match self.dispatcher.deliver(&subscription, &serialized).await {
            DeliveryOutcome::Delivered => {
                self.logs.append("Alert device notified");
                AlertOutcome::Delivered
            }
            DeliveryOutcome::SubscriptionGone => {
                self.logs.append("Failed to notify alert device...removing");
                self.clear_reference();
                AlertOutcome::DeviceGone
            }
            DeliveryOutcome::PayloadTooLarge => {
                self.logs
                    .append("Notification content too large for alert device");
                AlertOutcome::Failed
            }
            DeliveryOutcome::TransientError(reason) => {
                self.logs
                    .append(&format!("Error notifying alert device: {reason}"));
                AlertOutcome::Failed
            }
        }
    }

    fn clear_reference(&self) {
        if let Err(err) = self.settings.clear_alert_device() {
            self.logs
                .append(&format!("Failed to clear alert device: {err}"));
        }
    }
}
