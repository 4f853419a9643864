pub mod adapters;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod hub;
pub mod ports;
pub mod push;
pub mod settings;
pub mod shutdown;
pub mod state;
pub mod store;
pub mod types;

pub use push::generate_vapid_credentials;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::adapters::{TokioTimeProvider, WebPushTransport};
use crate::auth::AdminAuth;
use crate::config::AppConfig;
use crate::error::ServeError;
use crate::hub::Hub;
use crate::push::VapidConfigStatus;
use crate::store::{MemoryLogSink, MemorySettingsStore, MemorySubscriberStore};

const SUBSCRIBERS_FILE: &str = "subscribers.toml";
const SETTINGS_FILE: &str = "settings.toml";

/// Runs the hub until a termination signal or an authorized shutdown request.
pub async fn serve(config: AppConfig) -> Result<(), ServeError> {
    let vapid = match push::load_vapid_config(&config) {
        VapidConfigStatus::Ready(vapid) => vapid,
        VapidConfigStatus::Missing => {
            return Err(ServeError::Vapid(
                "VAPID keys are not set; generate them with `pushhub init`",
            ));
        }
        VapidConfigStatus::Incomplete => {
            return Err(ServeError::Vapid(
                "VAPID private key, public key and subject must all be set",
            ));
        }
    };
    let vapid_public_key = vapid.public_key.clone();
    let transport =
        WebPushTransport::new(vapid).map_err(|err| ServeError::Transport(err.to_string()))?;

    let (store, settings_store) = match config.data_dir.as_deref() {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            tracing::info!("persisting state under {}", dir.display());
            (
                MemorySubscriberStore::open(dir.join(SUBSCRIBERS_FILE))?,
                MemorySettingsStore::open(dir.join(SETTINGS_FILE))?,
            )
        }
        None => {
            tracing::warn!("no data directory configured; subscribers will not survive a restart");
            (MemorySubscriberStore::new(), MemorySettingsStore::new())
        }
    };

    let admin = AdminAuth::from_config(&config)?;
    if admin.is_none() {
        tracing::warn!("no admin password hash configured; admin routes are disabled");
    }

    let hub = Arc::new(Hub::new(
        store,
        MemoryLogSink::new(),
        settings_store,
        transport,
        TokioTimeProvider,
        config.hub,
    ));
    let shutdown = CancellationToken::new();
    let state = state::AppState {
        hub: Arc::clone(&hub),
        admin,
        vapid_public_key: Some(vapid_public_key),
        shutdown: shutdown.clone(),
    };

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!("listening on http://{}", config.addr);

    let runtime = hub.start().await;
    let served = axum::serve(listener, app::app(state))
        .with_graceful_shutdown(shutdown_requested(shutdown))
        .await;
    hub.shutdown(runtime).await;
    served?;
    Ok(())
}

async fn shutdown_requested(token: CancellationToken) {
    tokio::select! {
        result = shutdown::wait_for_shutdown_signal() => {
            match result {
                Ok(()) => tracing::info!("termination signal received"),
                Err(err) => {
                    tracing::error!("failed to listen for termination signals: {err}");
                    token.cancelled().await;
                }
            }
        }
        _ = token.cancelled() => tracing::info!("shutdown requested over the API"),
    }
}
