use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::broadcast;

use crate::auth::{IdentityResolver, PgIdentityResolver};
use crate::config::Config;
use crate::enrollment::{EnrollmentGate, PgNotifier, PgStore, SystemClock};
use crate::i18n::Localizer;
use crate::websocket::LiveEvent;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub env: Config,
    pub live_tx: broadcast::Sender<LiveEvent>,
    pub localizer: Arc<Localizer>,
    pub gate: Arc<EnrollmentGate>,
    pub identity: Arc<dyn IdentityResolver>,
}

impl AppState {
    /// Wires the Postgres-backed gate, notifier and identity resolver.
    pub fn new(db: PgPool, env: Config, localizer: Arc<Localizer>) -> Self {
        let (live_tx, _) = broadcast::channel(env.app.live_channel_capacity);
        let store = Arc::new(PgStore::new(db.clone()));
        let notifier = Arc::new(PgNotifier::new(db.clone(), live_tx.clone()));
        let gate = EnrollmentGate::new(
            store.clone(),
            store.clone(),
            store,
            notifier,
            localizer.clone(),
            Arc::new(SystemClock),
        );
        let identity = Arc::new(PgIdentityResolver::new(db.clone()));

        Self::from_parts(db, env, live_tx, localizer, Arc::new(gate), identity)
    }

    pub fn from_parts(
        db: PgPool,
        env: Config,
        live_tx: broadcast::Sender<LiveEvent>,
        localizer: Arc<Localizer>,
        gate: Arc<EnrollmentGate>,
        identity: Arc<dyn IdentityResolver>,
    ) -> Self {
        Self {
            db,
            env,
            live_tx,
            localizer,
            gate,
            identity,
        }
    }
}
