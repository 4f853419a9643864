pub mod push;
pub mod store;
pub mod time;

pub use push::PushTransport;
pub use store::{LogSink, SettingsStore, SubscriberStore};
pub use self::time::TimeProvider;
