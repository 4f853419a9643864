use crate::error::{HubError, StoreError};
use crate::ports::{LogSink, SettingsStore};
use crate::types::push::short_endpoint;

pub const MAX_SUBSCRIBERS_KEY: &str = "MaxSubscribers";
pub const ALERT_DEVICE_KEY: &str = "AlertDevice";
pub const DEFAULT_MAX_SUBSCRIBERS: u32 = 100;

/// Runtime-mutable hub configuration: the subscriber cap and the alert
/// device. Every change goes through a setter that records it in the log.
#[derive(Debug, Clone)]
pub struct Settings<C, L> {
    store: C,
    logs: L,
}

impl<C, L> Settings<C, L>
where
    C: SettingsStore,
    L: LogSink,
{
    pub fn new(store: C, logs: L) -> Self {
        Self { store, logs }
    }

    pub fn max_subscribers(&self) -> Result<u32, StoreError> {
        match self.store.get(MAX_SUBSCRIBERS_KEY)? {
            None => Ok(DEFAULT_MAX_SUBSCRIBERS),
            Some(raw) => raw.trim().parse().map_err(|_| StoreError::InvalidValue {
                key: MAX_SUBSCRIBERS_KEY.to_string(),
                value: raw,
            }),
        }
    }

    pub fn set_max_subscribers(&self, limit: i64) -> Result<(), HubError> {
        let new_limit = u32::try_from(limit).map_err(|_| HubError::InvalidLimit(limit))?;
        let old_limit = self.max_subscribers()?;
        self.store
            .set(MAX_SUBSCRIBERS_KEY, &new_limit.to_string())?;
        self.logs.append(&format!(
            "Max subscriber limit changed from {old_limit} to {new_limit}"
        ));
        Ok(())
    }

    pub fn alert_device(&self) -> Result<Option<String>, StoreError> {
        Ok(self
            .store
            .get(ALERT_DEVICE_KEY)?
            .filter(|endpoint| !endpoint.is_empty()))
    }

    pub fn set_alert_device(&self, endpoint: &str) -> Result<(), StoreError> {
        self.store.set(ALERT_DEVICE_KEY, endpoint)?;
        if endpoint.is_empty() {
            self.logs.append("Alert device cleared");
        } else {
            self.logs.append(&format!(
                "Alert device set to {}",
                short_endpoint(endpoint)
            ));
        }
        Ok(())
    }

    pub fn clear_alert_device(&self) -> Result<(), StoreError> {
        self.set_alert_device("")
    }
}
