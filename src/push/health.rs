use std::time::Duration;

use time::OffsetDateTime;

use crate::ports::{LogSink, SettingsStore, SubscriberStore, TimeProvider};
use crate::push::scheduler::PeriodicTask;
use crate::settings::Settings;

pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(120 * 60);

/// Periodically writes a short service status to the log.
#[derive(Debug, Clone)]
pub struct HealthReporter<S, L, C, T> {
    store: S,
    logs: L,
    settings: Settings<C, L>,
    time: T,
    started_at: OffsetDateTime,
}

impl<S, L, C, T> HealthReporter<S, L, C, T>
where
    S: SubscriberStore,
    L: LogSink,
    C: SettingsStore,
    T: TimeProvider,
{
    pub fn new(store: S, logs: L, settings: Settings<C, L>, time: T) -> Self {
        let started_at = time.now();
        Self {
            store,
            logs,
            settings,
            time,
            started_at,
        }
    }

    pub fn report(&self) {
        self.logs.append(&format!(
            "Host platform: {}/{}",
            std::env::consts::OS,
            std::env::consts::ARCH
        ));
        self.logs.append(&format!(
            "Server uptime: {}",
            format_uptime(self.time.now() - self.started_at)
        ));

        let subscribers = match self.store.count() {
            Ok(count) => count.to_string(),
            Err(err) => {
                tracing::warn!("health report: subscriber count unavailable: {err}");
                "unknown".to_string()
            }
        };
        let cap = match self.settings.max_subscribers() {
            Ok(cap) => cap.to_string(),
            Err(err) => {
                tracing::warn!("health report: subscriber cap unavailable: {err}");
                "unknown".to_string()
            }
        };
        self.logs.append(&format!(
            "{subscribers} subscribers, {cap} sub cap, {} log entries",
            self.logs.len()
        ));
    }
}

impl<S, L, C, T> PeriodicTask for HealthReporter<S, L, C, T>
where
    S: SubscriberStore,
    L: LogSink,
    C: SettingsStore,
    T: TimeProvider,
{
    async fn tick(&self) {
        self.report();
    }
}

fn format_uptime(uptime: time::Duration) -> String {
    let total = uptime.whole_seconds().max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    format!("{days} days {hours} hours {minutes} minutes {seconds} seconds")
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::push::testing::{TestTime, fixed_now, subscription};
    use crate::store::{MemoryLogSink, MemorySettingsStore, MemorySubscriberStore};

    #[test]
    fn format_uptime__should_split_into_units() {
        let uptime = time::Duration::days(1)
            + time::Duration::hours(2)
            + time::Duration::minutes(3)
            + time::Duration::seconds(4);

        assert_eq!(format_uptime(uptime), "1 days 2 hours 3 minutes 4 seconds");
    }

    #[test]
    fn report__should_log_counts_and_uptime() {
        // Given
        let store = MemorySubscriberStore::new();
        let logs = MemoryLogSink::new();
        let time = TestTime::new(fixed_now());
        let settings = Settings::new(MemorySettingsStore::new(), logs.clone());
        store
            .insert(subscription("a", fixed_now()))
            .expect("insert");
        let reporter = HealthReporter::new(store, logs.clone(), settings, time.clone());
        time.advance(time::Duration::minutes(90));

        // When
        reporter.report();

        // Then
        let messages: Vec<_> = logs.recent(3).into_iter().map(|e| e.message).collect();
        assert_eq!(messages[0], "1 subscribers, 100 sub cap, 2 log entries");
        assert_eq!(messages[1], "Server uptime: 0 days 1 hours 30 minutes 0 seconds");
        assert!(messages[2].starts_with("Host platform: "));
    }
}
