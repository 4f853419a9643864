use crate::ports;

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Work run on every tick of a periodic loop.
pub trait PeriodicTask: Send + Sync + 'static {
    fn tick(&self) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstTick {
    Immediate,
    AfterInterval,
}

/// A running periodic loop. The loop stops at its next wait once the token is
/// cancelled; a tick already in progress runs to completion.
pub struct PeriodicHandle {
    name: &'static str,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl PeriodicHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn shutdown(self) -> Result<(), tokio::task::JoinError> {
        self.token.cancel();
        self.handle.await
    }
}

pub fn spawn_periodic<T, K>(
    name: &'static str,
    time: T,
    interval: Duration,
    first: FirstTick,
    token: CancellationToken,
    task: K,
) -> PeriodicHandle
where
    T: ports::TimeProvider,
    K: PeriodicTask,
{
    let loop_token = token.clone();
    let handle = tokio::spawn(async move {
        run_periodic(name, time, interval, first, loop_token, task).await;
    });
    PeriodicHandle {
        name,
        token,
        handle,
    }
}

async fn run_periodic<T, K>(
    name: &'static str,
    time: T,
    interval: Duration,
    first: FirstTick,
    token: CancellationToken,
    task: K,
) where
    T: ports::TimeProvider,
    K: PeriodicTask,
{
    let mut wait = first == FirstTick::AfterInterval;
    loop {
        if wait {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = time.sleep(interval) => {}
            }
        }
        if token.is_cancelled() {
            break;
        }
        task.tick().await;
        wait = true;
    }
    tracing::debug!(task = name, "periodic task stopped");
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::push::testing::{TestTime, fixed_now};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Default)]
    struct CountingTask {
        ticks: Arc<AtomicUsize>,
    }

    impl PeriodicTask for CountingTask {
        async fn tick(&self) {
            self.ticks.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn spawn_periodic__should_tick_immediately_then_every_interval() {
        // Given
        let time = TestTime::new(fixed_now());
        let task = CountingTask::default();

        // When
        let handle = spawn_periodic(
            "counting",
            time.clone(),
            Duration::from_secs(60),
            FirstTick::Immediate,
            CancellationToken::new(),
            task.clone(),
        );
        settle().await;

        // Then
        assert_eq!(task.ticks.load(Ordering::SeqCst), 1);
        assert_eq!(time.sleep_durations(), vec![Duration::from_secs(60)]);

        time.trigger_all();
        settle().await;
        assert_eq!(task.ticks.load(Ordering::SeqCst), 2);

        handle.shutdown().await.expect("join handle");
        assert_eq!(task.ticks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn spawn_periodic__should_wait_one_interval_before_first_tick() {
        // Given
        let time = TestTime::new(fixed_now());
        let task = CountingTask::default();

        // When
        let handle = spawn_periodic(
            "counting",
            time.clone(),
            Duration::from_secs(120),
            FirstTick::AfterInterval,
            CancellationToken::new(),
            task.clone(),
        );
        settle().await;

        // Then
        assert_eq!(task.ticks.load(Ordering::SeqCst), 0);
        assert_eq!(handle.name(), "counting");
        assert_eq!(time.sleep_durations(), vec![Duration::from_secs(120)]);

        handle.shutdown().await.expect("join handle");
        assert_eq!(task.ticks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn spawn_periodic__should_stop_when_shared_token_is_cancelled() {
        // Given
        let time = TestTime::new(fixed_now());
        let token = CancellationToken::new();
        let task = CountingTask::default();
        let handle = spawn_periodic(
            "counting",
            time,
            Duration::from_secs(60),
            FirstTick::AfterInterval,
            token.clone(),
            task.clone(),
        );

        // When
        token.cancel();

        // Then
        handle.shutdown().await.expect("join handle");
        assert_eq!(task.ticks.load(Ordering::SeqCst), 0);
    }
}
