use std::future::Future;
use std::sync::Arc;

use crate::config::{Config, ServiceMode};
use crate::error::{AppError, Result, ServiceError};
use crate::managers::{CsrfManager, CsrfPolicy, SessionManager};
use crate::services::{
    auth::AuthService,
    event::EventService,
    geocoder::{DisabledGeocoder, Geocoder, HttpGeocoder},
    local::InMemoryDirectory,
    notifier::{LogNotifier, Notifier},
    remote::RemoteServices,
    user::UserService,
};
use crate::store::{KeyValueStore, MemoryStore, RedisStore};

/// The downstream services the gateway talks to.
#[derive(Clone)]
pub struct Services {
    pub users: Arc<dyn UserService>,
    pub events: Arc<dyn EventService>,
    pub auth: Arc<dyn AuthService>,
}

impl Services {
    /// All three capabilities served by one in-process directory.
    pub fn local(directory: Arc<InMemoryDirectory>) -> Self {
        Self {
            users: directory.clone(),
            events: directory.clone(),
            auth: directory,
        }
    }
}

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Arc<Config>,
    /// Session lifecycle on the session store.
    pub sessions: SessionManager,
    /// CSRF token lifecycle on the CSRF store.
    pub csrf: CsrfManager,
    pub users: Arc<dyn UserService>,
    pub events: Arc<dyn EventService>,
    pub auth: Arc<dyn AuthService>,
    /// Resolves event coordinates to a city and an address.
    pub geocoder: Arc<dyn Geocoder>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// Connects both Redis stores when configured and otherwise keeps sessions
    /// and tokens in memory. Services are in-process or remote depending on
    /// [`ServiceMode`].
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let (session_store, csrf_store): (Arc<dyn KeyValueStore>, Arc<dyn KeyValueStore>) =
            match (&config.session_redis_url, &config.csrf_redis_url) {
                (Some(session_url), Some(csrf_url)) => {
                    let sessions = RedisStore::connect(session_url).await?;
                    let csrf = RedisStore::connect(csrf_url).await?;
                    tracing::info!("✅ Session and CSRF stores connected to Redis");
                    (Arc::new(sessions), Arc::new(csrf))
                }
                _ => {
                    tracing::warn!("⚠️ No Redis configured, sessions and CSRF tokens live in memory");
                    (Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
                }
            };

        let services = match &config.service_mode {
            ServiceMode::Local => {
                tracing::info!("✅ Domain services running in-process");
                Services::local(Arc::new(InMemoryDirectory::new()))
            }
            ServiceMode::Remote {
                user_url,
                event_url,
                auth_url,
            } => {
                let remote = Arc::new(RemoteServices::new(
                    user_url,
                    event_url,
                    auth_url,
                    config.request_deadline,
                )?);
                tracing::info!("✅ Domain services reached over RPC");
                Services {
                    users: remote.clone(),
                    events: remote.clone(),
                    auth: remote,
                }
            }
        };

        let mut state = Self::assemble(config.clone(), session_store, csrf_store, services);
        if let Some(url) = &config.geocoder_url {
            state.geocoder = Arc::new(HttpGeocoder::new(
                url,
                config.geocoder_token.clone(),
                config.request_deadline,
            )?);
            tracing::info!("✅ Geocoder enabled");
        }

        Ok(state)
    }

    /// Wires managers and services together without touching the network.
    pub fn assemble(
        config: Config,
        session_store: Arc<dyn KeyValueStore>,
        csrf_store: Arc<dyn KeyValueStore>,
        services: Services,
    ) -> Self {
        let policy = if config.csrf_single_use {
            CsrfPolicy::SingleUse
        } else {
            CsrfPolicy::Reusable
        };

        Self {
            sessions: SessionManager::new(
                session_store,
                config.session_ttl,
                config.request_deadline,
            ),
            csrf: CsrfManager::new(csrf_store, config.csrf_ttl, config.request_deadline, policy),
            users: services.users,
            events: services.events,
            auth: services.auth,
            geocoder: Arc::new(DisabledGeocoder),
            notifier: Arc::new(LogNotifier),
            config: Arc::new(config),
        }
    }

    /// Awaits a downstream call within the request deadline.
    pub async fn call<T>(
        &self,
        call: impl Future<Output = std::result::Result<T, ServiceError>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.config.request_deadline, call).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => Err(AppError::Unavailable(format!(
                "downstream call exceeded {:?}",
                self.config.request_deadline
            ))),
        }
    }
}
