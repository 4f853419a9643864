use crate::error::HubError;
use crate::ports::{LogSink, SettingsStore, SubscriberStore, TimeProvider};
use crate::settings::Settings;
use crate::types::push::Subscription;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    /// The endpoint was already registered; only its activity was refreshed.
    Updated,
}

/// Admission control for new subscriptions.
///
/// The count check and the insert are separate store calls, so a burst of
/// concurrent subscribes can overshoot the limit by the number of requests
/// racing the check. That overshoot is accepted.
#[derive(Debug, Clone)]
pub struct CapacityGate<S, L, C, T> {
    store: S,
    logs: L,
    settings: Settings<C, L>,
    time: T,
}

impl<S, L, C, T> CapacityGate<S, L, C, T>
where
    S: SubscriberStore,
    L: LogSink,
    C: SettingsStore,
    T: TimeProvider,
{
    pub fn new(store: S, logs: L, settings: Settings<C, L>, time: T) -> Self {
        Self {
            store,
            logs,
            settings,
            time,
        }
    }

    pub fn admit(&self, mut subscription: Subscription) -> Result<Admission, HubError> {
        if !subscription.is_valid() {
            return Err(HubError::InvalidSubscription);
        }

        let now = self.time.now();
        if self.store.exists(&subscription.endpoint)? {
            self.store.touch(&subscription.endpoint, now)?;
            return Ok(Admission::Updated);
        }

        let limit = self.settings.max_subscribers()?;
        if self.store.count()? >= limit as usize {
            return Err(HubError::CapacityExceeded { limit });
        }

        subscription.last_active = now;
        let short = subscription.short_endpoint().to_string();
        self.store.insert(subscription)?;
        self.logs.append(&format!("New device: {short}"));
        Ok(Admission::Accepted)
    }

    pub fn set_max_subscribers(&self, limit: i64) -> Result<(), HubError> {
        self.settings.set_max_subscribers(limit)
    }
}
