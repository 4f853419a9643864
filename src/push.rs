pub mod alert;
pub mod capacity;
pub mod dispatch;
pub mod health;
pub mod reminder;
pub mod scheduler;
pub mod vapid;

#[cfg(test)]
pub(crate) mod testing;

pub use alert::{AlertNotifier, AlertOutcome};
pub use capacity::{Admission, CapacityGate};
pub use dispatch::{Activity, BroadcastReport, Dispatcher};
pub use health::HealthReporter;
pub use reminder::ReminderTask;
pub use vapid::{VapidConfigStatus, VapidCredentials, generate_vapid_credentials, load_vapid_config};
