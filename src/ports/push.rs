use crate::types::push::{DeliveryOutcome, Subscription};

/// Delivers one serialized payload to one subscription.
///
/// Implementations classify every failure into a [`DeliveryOutcome`] before
/// returning; callers never inspect transport errors themselves.
pub trait PushTransport: Clone + Send + Sync + 'static {
    type Fut<'a>: Future<Output = DeliveryOutcome> + Send + 'a
    where
        Self: 'a;

    fn deliver<'a>(&'a self, subscription: &'a Subscription, payload: &'a str) -> Self::Fut<'a>;
}
