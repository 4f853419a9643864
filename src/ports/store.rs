use time::OffsetDateTime;

use crate::error::StoreError;
use crate::types::push::{LogEntry, Subscription};

/// Push subscriptions keyed by endpoint. Each call is atomic on its own;
/// nothing spans two calls.
pub trait SubscriberStore: Clone + Send + Sync + 'static {
    fn exists(&self, endpoint: &str) -> Result<bool, StoreError>;
    fn get(&self, endpoint: &str) -> Result<Option<Subscription>, StoreError>;
    fn get_all(&self) -> Result<Vec<Subscription>, StoreError>;
    fn count(&self) -> Result<usize, StoreError>;
    fn insert(&self, subscription: Subscription) -> Result<(), StoreError>;
    fn remove(&self, endpoint: &str) -> Result<bool, StoreError>;
    /// Sets `last_active` for the endpoint. Unknown endpoints are ignored.
    fn touch(&self, endpoint: &str, at: OffsetDateTime) -> Result<(), StoreError>;
    /// Batch form of [`SubscriberStore::touch`]. Stores that persist should
    /// write once for the whole batch.
    fn touch_all(&self, endpoints: &[&str], at: OffsetDateTime) -> Result<(), StoreError> {
        endpoints
            .iter()
            .try_for_each(|endpoint| self.touch(endpoint, at))
    }
    fn clear(&self) -> Result<usize, StoreError>;
}

/// Append-only operational log.
pub trait LogSink: Clone + Send + Sync + 'static {
    fn append(&self, message: &str);
    /// Newest first. `count == 0` returns everything.
    fn recent(&self, count: usize) -> Vec<LogEntry>;
    fn len(&self) -> usize;
    fn clear(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Durable key/value pairs backing [`crate::settings::Settings`].
pub trait SettingsStore: Clone + Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}
