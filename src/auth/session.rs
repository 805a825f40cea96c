//! Server-side sessions on `tower-sessions`. The cookie carries a signed
//! session id only; the user id lives in the store record under [`USER_ID_KEY`].

use std::{collections::HashMap, sync::Arc, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use axum::Router;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::{sync::Mutex, task::JoinHandle};
use tower_sessions::{
    cookie::{Key, SameSite},
    session::{Id, Record},
    session_store::{self, ExpiredDeletion},
    Expiry, Session, SessionManagerLayer, SessionStore,
};
use tower_sessions_sqlx_store::PostgresStore;
use tracing::{debug, info, warn};

use crate::config::{SessionBackend, SessionConfig};

pub const SESSION_COOKIE: &str = "todosys.sid";
pub const USER_ID_KEY: &str = "user_id";

/// Binds `session` to `user_id` under a fresh id. Whatever record the
/// request arrived with is deleted from the store.
pub async fn establish(session: &Session, user_id: i64) -> anyhow::Result<()> {
    session.cycle_id().await.context("cycle session id")?;
    session
        .insert(USER_ID_KEY, user_id)
        .await
        .context("store session user")?;
    Ok(())
}

/// `None` for missing, expired or revoked sessions.
pub async fn resolve(session: &Session) -> anyhow::Result<Option<i64>> {
    session
        .get::<i64>(USER_ID_KEY)
        .await
        .context("read session user")
}

/// Idempotent.
pub async fn destroy(session: &Session) -> anyhow::Result<()> {
    session.flush().await.context("flush session")
}

/// Installs the session middleware on `router`.
pub fn install(router: Router, store: AppSessionStore, config: &SessionConfig, key: Key) -> Router {
    let layer = SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE)
        .with_path("/")
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_secure(config.cookie_secure)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            config.ttl_minutes,
        )))
        .with_signed(key);
    router.layer(layer)
}

/// Cookie signing key. The secret length is checked when the config loads.
pub fn signing_key(secret: &str) -> anyhow::Result<Key> {
    Key::try_from(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("SESSION_SECRET is not a usable signing key: {e:?}"))
}

/// In-process records. Expired entries are dropped on `load`, on every
/// `save`, and by the sweep.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    records: Arc<Mutex<HashMap<Id, Record>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn record_count(&self) -> usize {
        self.records.lock().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let now = OffsetDateTime::now_utc();
        let mut records = self.records.lock().await;
        records.retain(|_, r| r.expiry_date > now);
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn load(&self, id: &Id) -> session_store::Result<Option<Record>> {
        let mut records = self.records.lock().await;
        match records.get(id) {
            Some(r) if r.expiry_date > OffsetDateTime::now_utc() => Ok(Some(r.clone())),
            Some(_) => {
                records.remove(id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &Id) -> session_store::Result<()> {
        self.records.lock().await.remove(id);
        Ok(())
    }
}

#[async_trait]
impl ExpiredDeletion for MemorySessionStore {
    async fn delete_expired(&self) -> session_store::Result<()> {
        let now = OffsetDateTime::now_utc();
        self.records.lock().await.retain(|_, r| r.expiry_date > now);
        Ok(())
    }
}

/// The configured backend behind one concrete type the layer can hold.
#[derive(Debug, Clone)]
pub enum AppSessionStore {
    Postgres(PostgresStore),
    Memory(MemorySessionStore),
}

impl AppSessionStore {
    pub fn for_backend(backend: SessionBackend, db: &PgPool) -> Self {
        match backend {
            SessionBackend::Postgres => Self::Postgres(PostgresStore::new(db.clone())),
            SessionBackend::Memory => Self::Memory(MemorySessionStore::new()),
        }
    }

    /// Creates the session table for the Postgres backend.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        match self {
            Self::Postgres(store) => store.migrate().await.context("migrate session store"),
            Self::Memory(_) => Ok(()),
        }
    }

    /// Deletes expired records every `period` until the runtime shuts down.
    pub fn spawn_expiry_sweep(&self, period: Duration) -> JoinHandle<()> {
        let store = self.clone();
        info!(?period, "session expiry sweep started");
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            loop {
                tick.tick().await;
                match store.delete_expired().await {
                    Ok(()) => debug!("expired sessions swept"),
                    Err(e) => warn!(error = %e, "session sweep failed"),
                }
            }
        })
    }
}

#[async_trait]
impl SessionStore for AppSessionStore {
    async fn save(&self, record: &Record) -> session_store::Result<()> {
        match self {
            Self::Postgres(s) => s.save(record).await,
            Self::Memory(s) => s.save(record).await,
        }
    }

    async fn load(&self, id: &Id) -> session_store::Result<Option<Record>> {
        match self {
            Self::Postgres(s) => s.load(id).await,
            Self::Memory(s) => s.load(id).await,
        }
    }

    async fn delete(&self, id: &Id) -> session_store::Result<()> {
        match self {
            Self::Postgres(s) => s.delete(id).await,
            Self::Memory(s) => s.delete(id).await,
        }
    }
}

#[async_trait]
impl ExpiredDeletion for AppSessionStore {
    async fn delete_expired(&self) -> session_store::Result<()> {
        match self {
            Self::Postgres(s) => s.delete_expired().await,
            Self::Memory(s) => s.delete_expired().await,
        }
    }
}
