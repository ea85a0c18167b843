use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{format_timestamp, Exercise, WorkoutSession, WorkoutType};
use crate::store::SessionStore;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("failed to connect to Postgres")?;
        Ok(PgStore { pool })
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn prepare(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn append_session(&self, session: &WorkoutSession) -> anyhow::Result<()> {
        let performed_at = session.check()?;
        let duration_seconds = i64::try_from(session.duration_seconds)
            .context("session duration does not fit in a BIGINT")?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO workout_tracker.sessions
            (id, performed_at, workout_type, duration_seconds)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(session.id)
        .bind(performed_at)
        .bind(session.workout_type.as_str())
        .bind(duration_seconds)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to insert session {}", session.id))?;

        for (position, exercise) in session.exercises.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO workout_tracker.exercises
                (session_id, position, name, sets, reps, weight, comment)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(session.id)
            .bind(i32::try_from(position)?)
            .bind(&exercise.name)
            .bind(exercise.sets)
            .bind(exercise.reps)
            .bind(exercise.weight)
            .bind(exercise.comment.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(session = %session.id, exercises = session.exercises.len(), "appended session");
        Ok(())
    }

    async fn list_sessions(&self) -> anyhow::Result<Vec<WorkoutSession>> {
        let exercise_rows = sqlx::query(
            "SELECT session_id, name, sets, reps, weight, comment \
             FROM workout_tracker.exercises \
             ORDER BY session_id, position",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut exercises: HashMap<Uuid, Vec<Exercise>> = HashMap::new();
        for row in exercise_rows {
            let session_id: Uuid = row.try_get("session_id")?;
            exercises.entry(session_id).or_default().push(Exercise {
                name: row.try_get("name")?,
                sets: row.try_get("sets")?,
                reps: row.try_get("reps")?,
                weight: row.try_get("weight")?,
                comment: row.try_get("comment")?,
            });
        }

        let session_rows = sqlx::query(
            "SELECT id, performed_at, workout_type, duration_seconds \
             FROM workout_tracker.sessions \
             ORDER BY performed_at DESC, created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut sessions = Vec::with_capacity(session_rows.len());
        for row in session_rows {
            let id: Uuid = row.try_get("id")?;
            let performed_at: DateTime<Utc> = row.try_get("performed_at")?;
            let workout_type: String = row.try_get("workout_type")?;
            let duration_seconds: i64 = row.try_get("duration_seconds")?;

            sessions.push(WorkoutSession {
                id,
                date: format_timestamp(performed_at),
                workout_type: workout_type.parse()?,
                duration_seconds: u64::try_from(duration_seconds).unwrap_or(0),
                exercises: exercises.remove(&id).unwrap_or_default(),
            });
        }

        Ok(sessions)
    }

    fn describe(&self) -> String {
        "postgres".to_string()
    }
}
