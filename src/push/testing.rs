use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::oneshot;

use crate::ports;
use crate::types::push::{DeliveryOutcome, Subscription};

pub(crate) fn fixed_now() -> OffsetDateTime {
    OffsetDateTime::parse("2025-01-12T09:30:00Z", &Rfc3339).expect("parse now")
}

pub(crate) fn subscription(endpoint: &str, last_active: OffsetDateTime) -> Subscription {
    Subscription {
        endpoint: endpoint.to_string(),
        p256dh: "p256".to_string(),
        auth: "auth".to_string(),
        last_active,
    }
}

#[derive(Clone)]
pub(crate) struct TestTime {
    now: Arc<Mutex<OffsetDateTime>>,
    sleeps: Arc<Mutex<Vec<oneshot::Sender<()>>>>,
    durations: Arc<Mutex<Vec<Duration>>>,
}

impl TestTime {
    pub(crate) fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
            sleeps: Arc::new(Mutex::new(Vec::new())),
            durations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn advance(&self, by: time::Duration) {
        let mut now = self.now.lock().expect("now lock");
        *now += by;
    }

    pub(crate) fn sleep_durations(&self) -> Vec<Duration> {
        self.durations.lock().expect("durations lock").clone()
    }

    pub(crate) fn trigger_all(&self) {
        let mut sends = self.sleeps.lock().expect("sleeps lock");
        for sender in sends.drain(..) {
            let _ = sender.send(());
        }
    }
}

pub(crate) struct ManualSleep {
    receiver: oneshot::Receiver<()>,
}

impl Future for ManualSleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(_) => Poll::Ready(()),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl ports::TimeProvider for TestTime {
    type Sleep<'a>
        = ManualSleep
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        *self.now.lock().expect("now lock")
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        let (sender, receiver) = oneshot::channel();
        self.durations
            .lock()
            .expect("durations lock")
            .push(duration);
        self.sleeps.lock().expect("sleeps lock").push(sender);
        ManualSleep { receiver }
    }
}

/// Records every attempt and answers with a scripted outcome per endpoint.
/// Unscripted endpoints are delivered; hanging endpoints never complete.
#[derive(Clone, Default)]
pub(crate) struct ScriptedTransport {
    outcomes: Arc<Mutex<HashMap<String, DeliveryOutcome>>>,
    hanging: Arc<Mutex<Vec<String>>>,
    pub(crate) attempts: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedTransport {
    pub(crate) fn with_outcome(self, endpoint: &str, outcome: DeliveryOutcome) -> Self {
        self.outcomes
            .lock()
            .expect("outcomes lock")
            .insert(endpoint.to_string(), outcome);
        self
    }

    pub(crate) fn hanging_on(self, endpoint: &str) -> Self {
        self.hanging
            .lock()
            .expect("hanging lock")
            .push(endpoint.to_string());
        self
    }

    pub(crate) fn attempted(&self) -> Vec<String> {
        self.attempts
            .lock()
            .expect("attempts lock")
            .iter()
            .map(|(endpoint, _)| endpoint.clone())
            .collect()
    }

    pub(crate) fn payloads(&self) -> Vec<String> {
        self.attempts
            .lock()
            .expect("attempts lock")
            .iter()
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

impl ports::PushTransport for ScriptedTransport {
    type Fut<'a>
        = Pin<Box<dyn Future<Output = DeliveryOutcome> + Send + 'a>>
    where
        Self: 'a;

    fn deliver<'a>(&'a self, subscription: &'a Subscription, payload: &'a str) -> Self::Fut<'a> {
        self.attempts
            .lock()
            .expect("attempts lock")
            .push((subscription.endpoint.clone(), payload.to_string()));
        let hangs = self
            .hanging
            .lock()
            .expect("hanging lock")
            .contains(&subscription.endpoint);
        if hangs {
            return Box::pin(std::future::pending());
        }
        let outcome = self
            .outcomes
            .lock()
            .expect("outcomes lock")
            .get(&subscription.endpoint)
            .cloned()
            .unwrap_or(DeliveryOutcome::Delivered);
        Box::pin(std::future::ready(outcome))
    }
}
