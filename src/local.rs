use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{bail, Context};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::models::WorkoutSession;
use crate::store::{sort_newest_first, SessionStore};

/// Session history kept as a JSON array in a single file.
pub struct LocalStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(path: PathBuf) -> Self {
        LocalStore {
            path,
            write_lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> anyhow::Result<Vec<WorkoutSession>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {}", self.path.display()))
            }
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse workout history in {}", self.path.display()))
    }

    async fn write_all(&self, sessions: &[WorkoutSession]) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let body = serde_json::to_string_pretty(sessions)?;
        tokio::fs::write(&self.path, body)
            .await
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

#[async_trait]
impl SessionStore for LocalStore {
    async fn prepare(&self) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        if tokio::fs::try_exists(&self.path).await? {
            // Surface a corrupt file now rather than on first use.
            self.read_all().await?;
            return Ok(());
        }
        self.write_all(&[]).await
    }

    async fn append_session(&self, session: &WorkoutSession) -> anyhow::Result<()> {
        session.check()?;

        let _guard = self.write_lock.lock().await;
        let mut sessions = self.read_all().await?;
        if sessions.iter().any(|existing| existing.id == session.id) {
            bail!("session {} is already recorded", session.id);
        }
        sessions.push(session.clone());
        self.write_all(&sessions).await?;
        tracing::debug!(session = %session.id, path = %self.path.display(), "appended session");
        Ok(())
    }

    async fn list_sessions(&self) -> anyhow::Result<Vec<WorkoutSession>> {
        let mut sessions = self.read_all().await?;
        sort_newest_first(&mut sessions);
        Ok(sessions)
    }

    fn describe(&self) -> String {
        format!("local file {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Exercise, WorkoutType};
    use chrono::{TimeZone, Utc};

    fn session(day: u32) -> WorkoutSession {
        let performed_at = Utc.with_ymd_and_hms(2025, 5, day, 9, 0, 0).unwrap();
        WorkoutSession::new(
            performed_at,
            WorkoutType::Strength,
            1500,
            vec![Exercise {
                name: "Squats".to_string(),
                sets: 3,
                reps: 12,
                weight: 135.0,
                comment: None,
            }],
        )
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("history.json"));
        assert!(store.list_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn appends_and_lists_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("nested").join("history.json"));
        store.prepare().await.unwrap();

        let older = session(1);
        let newer = session(4);
        store.append_session(&older).await.unwrap();
        store.append_session(&newer).await.unwrap();

        let listed = store.list_sessions().await.unwrap();
        assert_eq!(listed, vec![newer, older]);
        assert_eq!(store.list_records().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn rejects_duplicate_and_undated_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("history.json"));

        let first = session(2);
        store.append_session(&first).await.unwrap();
        assert!(store.append_session(&first).await.is_err());

        let mut undated = session(3);
        undated.date = "someday".to_string();
        assert!(store.append_session(&undated).await.is_err());
        assert_eq!(store.list_sessions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn non_finite_weight_never_reaches_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("history.json"));
        store.append_session(&session(1)).await.unwrap();

        let mut unreadable = session(2);
        unreadable.exercises[0].weight = f64::NAN;
        assert!(store.append_session(&unreadable).await.is_err());

        let mut oversized = session(3);
        oversized.exercises[0].sets = 2_000_000_000;
        assert!(store.append_session(&oversized).await.is_err());

        assert_eq!(store.list_sessions().await.unwrap().len(), 1);
        store.append_session(&session(4)).await.unwrap();
        assert_eq!(store.list_records().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = LocalStore::new(path);

        assert!(store.prepare().await.is_err());
        assert!(store.list_sessions().await.is_err());
    }
}
