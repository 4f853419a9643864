use crate::adapters::TokioTimeProvider;
use crate::auth::AdminAuth;
use crate::hub::Hub;
use crate::store::{MemoryLogSink, MemorySettingsStore, MemorySubscriberStore};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub type ServiceHub<P> =
    Hub<MemorySubscriberStore, MemoryLogSink, MemorySettingsStore, P, TokioTimeProvider>;

#[derive(Clone)]
pub struct AppState<P> {
    pub hub: Arc<ServiceHub<P>>,
    pub admin: Option<AdminAuth>,
    pub vapid_public_key: Option<String>,
    /// Cancelled to stop the server gracefully.
    pub shutdown: CancellationToken,
}
