use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::push::dispatch::DEFAULT_DELIVERY_DEADLINE;
use crate::push::health::DEFAULT_HEALTH_INTERVAL;
use crate::push::reminder::{DEFAULT_CHECK_INTERVAL, DEFAULT_REMIND_THRESHOLD};

#[derive(Clone)]
pub struct AppConfig {
    pub addr: SocketAddr,
    /// Where subscribers and settings are persisted. Memory only when unset.
    pub data_dir: Option<PathBuf>,
    pub vapid_private_key: Option<String>,
    pub vapid_public_key: Option<String>,
    pub vapid_subject: Option<String>,
    /// Argon2 PHC string for the admin password. Admin routes reject every
    /// request when unset.
    pub admin_password_hash: Option<String>,
    pub hub: HubConfig,
}

/// Timings for the background loops and push delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubConfig {
    pub reminder_interval: Duration,
    pub reminder_threshold: Duration,
    pub health_interval: Duration,
    pub delivery_deadline: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            reminder_interval: DEFAULT_CHECK_INTERVAL,
            reminder_threshold: DEFAULT_REMIND_THRESHOLD,
            health_interval: DEFAULT_HEALTH_INTERVAL,
            delivery_deadline: DEFAULT_DELIVERY_DEADLINE,
        }
    }
}

#[cfg(test)]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 5109)),
            data_dir: None,
            vapid_private_key: None,
            vapid_public_key: None,
            vapid_subject: None,
            admin_password_hash: None,
            hub: HubConfig::default(),
        }
    }
}
