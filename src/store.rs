use std::cmp::Reverse;

use async_trait::async_trait;

use crate::config::{StoreConfig, StoreKind};
use crate::db::PgStore;
use crate::local::LocalStore;
use crate::models::{parse_timestamp, WorkoutRecord, WorkoutSession};

/// Append-only persistence for workout sessions.
///
/// Failures are reported to the caller as-is; implementations do not retry.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create whatever backing storage the store needs.
    async fn prepare(&self) -> anyhow::Result<()>;

    async fn append_session(&self, session: &WorkoutSession) -> anyhow::Result<()>;

    /// All sessions, newest first.
    async fn list_sessions(&self) -> anyhow::Result<Vec<WorkoutSession>>;

    /// All sessions flattened to one record per set.
    async fn list_records(&self) -> anyhow::Result<Vec<WorkoutRecord>> {
        let sessions = self.list_sessions().await?;
        Ok(sessions.iter().flat_map(WorkoutSession::to_records).collect())
    }

    fn describe(&self) -> String;
}

pub async fn open_store(config: &StoreConfig) -> anyhow::Result<Box<dyn SessionStore>> {
    let store: Box<dyn SessionStore> = match config.kind {
        StoreKind::Local => Box::new(LocalStore::new(config.data_file.clone())),
        StoreKind::Postgres => {
            let url = config.require_database_url()?;
            Box::new(PgStore::connect(url, config.max_connections).await?)
        }
    };
    tracing::debug!(store = %store.describe(), "opened session store");
    Ok(store)
}

/// Sessions with unparseable dates sort after every dated one.
pub fn sort_newest_first(sessions: &mut [WorkoutSession]) {
    sessions.sort_by_key(|session| Reverse(parse_timestamp(&session.date).ok()));
}
