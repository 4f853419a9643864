use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use time::OffsetDateTime;

use crate::error::StoreError;
use crate::ports;
use crate::types::push::{LogEntry, Subscription};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
}

fn load_toml<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents)
            .map_err(|err| StoreError::Unavailable(format!("{}: {err}", path.display()))),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(err) => Err(StoreError::Unavailable(format!("{}: {err}", path.display()))),
    }
}

fn save_toml<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let contents = toml::to_string(value).map_err(|err| StoreError::Persist(err.to_string()))?;
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, contents)
        .and_then(|()| std::fs::rename(&tmp, path))
        .map_err(|err| StoreError::Persist(format!("{}: {err}", path.display())))
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SubscriberFile {
    #[serde(default)]
    subscribers: Vec<Subscription>,
}

/// Subscribers held in memory in insertion order, optionally written through
/// to a TOML file after every mutation.
#[derive(Debug, Clone, Default)]
pub struct MemorySubscriberStore {
    subscribers: Arc<Mutex<Vec<Subscription>>>,
    path: Option<PathBuf>,
}

impl MemorySubscriberStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let file: SubscriberFile = load_toml(&path)?;
        Ok(Self {
            subscribers: Arc::new(Mutex::new(file.subscribers)),
            path: Some(path),
        })
    }

    fn persist(&self, subscribers: &[Subscription]) -> Result<(), StoreError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        save_toml(
            path,
            &SubscriberFile {
                subscribers: subscribers.to_vec(),
            },
        )
    }
}

impl ports::SubscriberStore for MemorySubscriberStore {
    fn exists(&self, endpoint: &str) -> Result<bool, StoreError> {
        let subscribers = lock(&self.subscribers)?;
        Ok(subscribers.iter().any(|s| s.endpoint == endpoint))
    }

    fn get(&self, endpoint: &str) -> Result<Option<Subscription>, StoreError> {
        let subscribers = lock(&self.subscribers)?;
        Ok(subscribers.iter().find(|s| s.endpoint == endpoint).cloned())
    }

    fn get_all(&self) -> Result<Vec<Subscription>, StoreError> {
        Ok(lock(&self.subscribers)?.clone())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(lock(&self.subscribers)?.len())
    }

    fn insert(&self, subscription: Subscription) -> Result<(), StoreError> {
        let mut subscribers = lock(&self.subscribers)?;
        let mut updated = subscribers.clone();
        match updated
            .iter_mut()
            .find(|s| s.endpoint == subscription.endpoint)
        {
            Some(existing) => *existing = subscription,
            None => updated.push(subscription),
        }
        self.persist(&updated)?;
        *subscribers = updated;
        Ok(())
    }

    fn remove(&self, endpoint: &str) -> Result<bool, StoreError> {
        let mut subscribers = lock(&self.subscribers)?;
        if !subscribers.iter().any(|s| s.endpoint == endpoint) {
            return Ok(false);
        }
        let updated: Vec<_> = subscribers
            .iter()
            .filter(|s| s.endpoint != endpoint)
            .cloned()
            .collect();
        self.persist(&updated)?;
        *subscribers = updated;
        Ok(true)
    }

    fn touch(&self, endpoint: &str, at: OffsetDateTime) -> Result<(), StoreError> {
        self.touch_all(&[endpoint], at)
    }

    fn touch_all(&self, endpoints: &[&str], at: OffsetDateTime) -> Result<(), StoreError> {
        let mut subscribers = lock(&self.subscribers)?;
        let mut updated = subscribers.clone();
        let mut changed = false;
        for subscription in updated
            .iter_mut()
            .filter(|s| endpoints.contains(&s.endpoint.as_str()))
        {
            subscription.last_active = at;
            changed = true;
        }
        if !changed {
            return Ok(());
        }
        self.persist(&updated)?;
        *subscribers = updated;
        Ok(())
    }

    fn clear(&self) -> Result<usize, StoreError> {
        let mut subscribers = lock(&self.subscribers)?;
        let count = subscribers.len();
        self.persist(&[])?;
        subscribers.clear();
        Ok(count)
    }
}

#[derive(Debug, Default)]
struct LogState {
    next_id: u64,
    entries: Vec<LogEntry>,
}

/// In-process log sink. Every entry is mirrored to `tracing`.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogSink {
    state: Arc<Mutex<LogState>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ports::LogSink for MemoryLogSink {
    fn append(&self, message: &str) {
        tracing::info!(target: "pushhub::log", "{message}");
        let mut state = self.state();
        state.next_id += 1;
        let entry = LogEntry {
            id: state.next_id,
            message: message.to_string(),
            timestamp: OffsetDateTime::now_utc(),
        };
        state.entries.push(entry);
    }

    fn recent(&self, count: usize) -> Vec<LogEntry> {
        let state = self.state();
        let take = if count == 0 {
            state.entries.len()
        } else {
            count
        };
        state.entries.iter().rev().take(take).cloned().collect()
    }

    fn len(&self) -> usize {
        self.state().entries.len()
    }

    fn clear(&self) -> usize {
        let mut state = self.state();
        let count = state.entries.len();
        state.entries.clear();
        count
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    values: BTreeMap<String, String>,
}

/// Key/value settings, optionally persisted to a TOML file on every write.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    values: Arc<Mutex<BTreeMap<String, String>>>,
    path: Option<PathBuf>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let file: SettingsFile = load_toml(&path)?;
        Ok(Self {
            values: Arc::new(Mutex::new(file.values)),
            path: Some(path),
        })
    }
}

impl ports::SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(lock(&self.values)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = lock(&self.values)?;
        let mut updated = values.clone();
        updated.insert(key.to_string(), value.to_string());
        if let Some(path) = self.path.as_deref() {
            let file = SettingsFile { values: updated };
            save_toml(path, &file)?;
            updated = file.values;
        }
        *values = updated;
        Ok(())
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::ports::{LogSink, SettingsStore, SubscriberStore};

    fn subscription(endpoint: &str, last_active: OffsetDateTime) -> Subscription {
        Subscription {
            endpoint: endpoint.to_string(),
            p256dh: "p256".to_string(),
            auth: "auth".to_string(),
            last_active,
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "pushhub-store-{name}-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn insert__should_replace_existing_endpoint() {
        // Given
        let store = MemorySubscriberStore::new();
        store
            .insert(subscription("a", OffsetDateTime::UNIX_EPOCH))
            .expect("insert");

        // When
        let later = OffsetDateTime::UNIX_EPOCH + time::Duration::hours(1);
        store.insert(subscription("a", later)).expect("insert");

        // Then
        assert_eq!(store.count().expect("count"), 1);
        let stored = store.get("a").expect("get").expect("present");
        assert_eq!(stored.last_active, later);
    }

    #[test]
    fn remove__should_report_whether_anything_was_removed() {
        let store = MemorySubscriberStore::new();
        store
            .insert(subscription("a", OffsetDateTime::UNIX_EPOCH))
            .expect("insert");

        assert!(store.remove("a").expect("remove"));
        assert!(!store.remove("a").expect("remove"));
        assert!(!store.exists("a").expect("exists"));
    }

    #[test]
    fn touch__should_update_last_active_and_ignore_unknown() {
        // Given
        let store = MemorySubscriberStore::new();
        store
            .insert(subscription("a", OffsetDateTime::UNIX_EPOCH))
            .expect("insert");
        let now = OffsetDateTime::UNIX_EPOCH + time::Duration::days(2);

        // When
        store.touch("a", now).expect("touch");
        store.touch("missing", now).expect("touch unknown");

        // Then
        assert_eq!(store.get("a").expect("get").expect("a").last_active, now);
        assert_eq!(store.count().expect("count"), 1);
    }

    #[test]
    fn open__should_reload_persisted_subscribers() {
        // Given
        let dir = temp_dir("reload");
        let path = dir.join("subscribers.toml");
        let store = MemorySubscriberStore::open(&path).expect("open");
        store
            .insert(subscription("https://push.example/1", OffsetDateTime::UNIX_EPOCH))
            .expect("insert");
        store
            .insert(subscription("https://push.example/2", OffsetDateTime::UNIX_EPOCH))
            .expect("insert");
        store.remove("https://push.example/1").expect("remove");

        // When
        let reopened = MemorySubscriberStore::open(&path).expect("reopen");

        // Then
        let all = reopened.get_all().expect("all");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].endpoint, "https://push.example/2");

        std::fs::remove_dir_all(&dir).expect("cleanup");
    }

    #[test]
    fn touch_all__should_update_listed_endpoints_only() {
        // Given
        let store = MemorySubscriberStore::new();
        for endpoint in ["a", "b", "c"] {
            store
                .insert(subscription(endpoint, OffsetDateTime::UNIX_EPOCH))
                .expect("insert");
        }
        let now = OffsetDateTime::UNIX_EPOCH + time::Duration::days(1);

        // When
        store.touch_all(&["a", "c", "missing"], now).expect("touch all");

        // Then
        let active: Vec<_> = store
            .get_all()
            .expect("all")
            .into_iter()
            .map(|s| (s.endpoint, s.last_active == now))
            .collect();
        assert_eq!(
            active,
            vec![
                ("a".to_string(), true),
                ("b".to_string(), false),
                ("c".to_string(), true),
            ]
        );
    }

    #[test]
    fn insert__should_leave_memory_unchanged_when_persist_fails() {
        // Given
        let path = std::env::temp_dir()
            .join(format!("pushhub-store-missing-{}", std::process::id()))
            .join("subscribers.toml");
        let store = MemorySubscriberStore::open(&path).expect("open");

        // When
        let result = store.insert(subscription("a", OffsetDateTime::UNIX_EPOCH));

        // Then
        assert!(matches!(result, Err(StoreError::Persist(_))));
        assert_eq!(store.count().expect("count"), 0);
        assert!(!store.exists("a").expect("exists"));
    }

    #[test]
    fn remove_and_touch__should_leave_memory_unchanged_when_persist_fails() {
        // Given
        let dir = temp_dir("readonly");
        let path = dir.join("subscribers.toml");
        let store = MemorySubscriberStore::open(&path).expect("open");
        store
            .insert(subscription("a", OffsetDateTime::UNIX_EPOCH))
            .expect("insert");
        std::fs::remove_dir_all(&dir).expect("remove dir");

        // When
        let removed = store.remove("a");
        let touched = store.touch("a", OffsetDateTime::UNIX_EPOCH + time::Duration::days(1));
        let cleared = store.clear();

        // Then
        assert!(matches!(removed, Err(StoreError::Persist(_))));
        assert!(matches!(touched, Err(StoreError::Persist(_))));
        assert!(matches!(cleared, Err(StoreError::Persist(_))));
        let stored = store.get("a").expect("get").expect("still present");
        assert_eq!(stored.last_active, OffsetDateTime::UNIX_EPOCH);
    }

    #[test]
    fn settings_store__should_keep_old_value_when_persist_fails() {
        // Given
        let path = std::env::temp_dir()
            .join(format!("pushhub-settings-missing-{}", std::process::id()))
            .join("settings.toml");
        let settings = MemorySettingsStore::open(&path).expect("open");

        // When
        let result = settings.set("MaxSubscribers", "7");

        // Then
        assert!(matches!(result, Err(StoreError::Persist(_))));
        assert_eq!(settings.get("MaxSubscribers").expect("get"), None);
    }

    #[test]
    fn recent__should_return_newest_first() {
        // Given
        let logs = MemoryLogSink::new();
        logs.append("first");
        logs.append("second");
        logs.append("third");

        // When
        let two = logs.recent(2);
        let all = logs.recent(0);

        // Then
        assert_eq!(two.len(), 2);
        assert_eq!(two[0].message, "third");
        assert_eq!(two[1].message, "second");
        assert_eq!(all.len(), 3);
        assert!(all[0].id > all[2].id);
    }

    #[test]
    fn clear__should_return_removed_log_count() {
        let logs = MemoryLogSink::new();
        logs.append("one");
        logs.append("two");

        assert_eq!(logs.clear(), 2);
        assert!(logs.is_empty());
    }

    #[test]
    fn settings_store__should_survive_reopen() {
        // Given
        let dir = temp_dir("settings");
        let path = dir.join("settings.toml");
        let settings = MemorySettingsStore::open(&path).expect("open");

        // When
        settings.set("MaxSubscribers", "7").expect("set");
        let reopened = MemorySettingsStore::open(&path).expect("reopen");

        // Then
        assert_eq!(
            reopened.get("MaxSubscribers").expect("get"),
            Some("7".to_string())
        );
        assert_eq!(reopened.get("AlertDevice").expect("get"), None);

        std::fs::remove_dir_all(&dir).expect("cleanup");
    }
}
