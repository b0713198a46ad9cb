use crate::{
    clock::LocalClock,
    config::Config,
    security::TokenIssuer,
    services::{IdentityService, LogMailer, Mailer, NotificationStore, Notifier, PgNotificationStore},
    websocket::ConnectionRegistry,
};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub registry: ConnectionRegistry,
    pub notifications: Arc<dyn NotificationStore>,
    pub notifier: Notifier,
    pub identity: IdentityService,
    pub mailer: Arc<dyn Mailer>,
    pub clock: LocalClock,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        let store: Arc<dyn NotificationStore> = Arc::new(PgNotificationStore::new(db.clone()));
        Self::with_store(db, config, store)
    }

    /// Builds the state around a given notification store
    pub fn with_store(db: PgPool, config: Config, store: Arc<dyn NotificationStore>) -> Self {
        let clock = LocalClock::new(config.app.utc_offset_hours);
        let tokens = TokenIssuer::new(&config.auth.jwt_secret, config.auth.token_ttl_minutes);
        let registry = ConnectionRegistry::new(store.clone());

        Self {
            notifier: Notifier::new(store.clone(), registry.clone(), clock),
            identity: IdentityService::new(db.clone(), tokens, clock),
            mailer: Arc::new(LogMailer),
            notifications: store,
            registry,
            clock,
            config: Arc::new(config),
            db,
        }
    }
}
