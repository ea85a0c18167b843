use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::models::{format_timestamp, parse_timestamp, Exercise, WorkoutSession, WorkoutType};
use crate::store::SessionStore;

#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    date: String,
    exercise_name: String,
    set_weight: f64,
    set_repetitions: i32,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    workout_type: Option<String>,
}

/// Reads per-set rows and groups every row sharing a `date` value into one
/// session, in first-seen order. Any bad row fails the whole file.
pub fn read_csv(csv_path: &Path) -> anyhow::Result<Vec<WorkoutSession>> {
    let reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    sessions_from_reader(reader)
}

fn sessions_from_reader<R: std::io::Read>(
    mut reader: csv::Reader<R>,
) -> anyhow::Result<Vec<WorkoutSession>> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut sessions: Vec<WorkoutSession> = Vec::new();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row_number = line + 1;
        let row = result.with_context(|| format!("invalid CSV row {row_number}"))?;
        parse_timestamp(&row.date).with_context(|| format!("invalid CSV row {row_number}"))?;
        let exercise = Exercise {
            name: row.exercise_name.trim().to_string(),
            sets: 1,
            reps: row.set_repetitions,
            weight: row.set_weight,
            comment: row.comment.filter(|c| !c.trim().is_empty()),
        };
        exercise
            .check()
            .with_context(|| format!("invalid CSV row {row_number}"))?;

        if let Some(&position) = positions.get(&row.date) {
            sessions[position].exercises.push(exercise);
            continue;
        }

        let workout_type = match row.workout_type.as_deref().map(str::trim) {
            Some(kind) if !kind.is_empty() => kind
                .parse()
                .with_context(|| format!("invalid CSV row {row_number}"))?,
            _ => WorkoutType::Strength,
        };
        positions.insert(row.date.clone(), sessions.len());
        sessions.push(WorkoutSession {
            id: Uuid::new_v4(),
            date: row.date,
            workout_type,
            duration_seconds: 0,
            exercises: vec![exercise],
        });
    }

    Ok(sessions)
}

/// Reads the whole file first so a bad row stores nothing.
pub async fn import_csv(store: &dyn SessionStore, csv_path: &Path) -> anyhow::Result<usize> {
    let sessions = read_csv(csv_path)?;
    import_sessions(store, &sessions).await
}

pub async fn import_sessions(
    store: &dyn SessionStore,
    sessions: &[WorkoutSession],
) -> anyhow::Result<usize> {
    let mut inserted = 0usize;
    for session in sessions {
        store.append_session(session).await?;
        inserted += 1;
    }
    Ok(inserted)
}

fn sample_sessions() -> anyhow::Result<Vec<WorkoutSession>> {
    let plan = vec![
        (
            "6f1c2f0e-5d0b-4a9e-9c55-2b7f3f1b8a01",
            (2026, 1, 26, 7, 30),
            WorkoutType::Strength,
            2_940,
            vec!["Squats:3x12@135", "Bench Press:3x10@155", "Barbell Row:3x10@115"],
        ),
        (
            "a3d9b8e2-0c41-4f7e-8d2a-6e5b4c3a2f02",
            (2026, 1, 28, 18, 5),
            WorkoutType::Hiit,
            1_200,
            vec!["Burpees:4x15", "Kettlebell Swing:4x20@35", "Mountain Climbers:4x30"],
        ),
        (
            "c7e4a1f3-9b26-4d8c-a0f1-3d2e1c0b9a03",
            (2026, 1, 30, 7, 45),
            WorkoutType::Strength,
            3_300,
            vec!["Squats:5x5@185", "Overhead Press:4x8@95", "Deadlift:3x5@225"],
        ),
        (
            "e2b5c6d7-1a38-4f9b-b2c4-5f6a7b8c9d04",
            (2026, 2, 1, 9, 0),
            WorkoutType::Cardio,
            2_700,
            vec!["Rowing Intervals:6x1", "Bike Sprint:8x1"],
        ),
        (
            "f9a8b7c6-2d45-4e3f-8a1b-0c9d8e7f6a05",
            (2026, 2, 2, 7, 15),
            WorkoutType::Strength,
            3_120,
            vec!["Bench Press:5x5@175", "Pull Up:4x8", "Squats:3x10@155"],
        ),
    ];

    let mut sessions = Vec::with_capacity(plan.len());
    for (id, (year, month, day, hour, minute), workout_type, duration_seconds, exercises) in plan {
        let performed_at = Utc
            .with_ymd_and_hms(year, month, day, hour, minute, 0)
            .single()
            .context("invalid seed timestamp")?;
        sessions.push(WorkoutSession {
            id: Uuid::parse_str(id)?,
            date: format_timestamp(performed_at),
            workout_type,
            duration_seconds,
            exercises: exercises
                .into_iter()
                .map(|scheme| scheme.parse::<Exercise>())
                .collect::<anyhow::Result<Vec<Exercise>>>()?,
        });
    }
    Ok(sessions)
}

/// Appends the sample sessions that are not already stored.
pub async fn seed(store: &dyn SessionStore) -> anyhow::Result<usize> {
    let existing = store.list_sessions().await?;
    let missing: Vec<WorkoutSession> = sample_sessions()?
        .into_iter()
        .filter(|sample| !existing.iter().any(|session| session.id == sample.id))
        .collect();
    import_sessions(store, &missing).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalStore;

    fn sessions_from(csv_text: &str) -> anyhow::Result<Vec<WorkoutSession>> {
        sessions_from_reader(csv::Reader::from_reader(csv_text.as_bytes()))
    }

    #[test]
    fn groups_rows_by_date() {
        let sessions = sessions_from(
            "date,exercise_name,set_weight,set_repetitions,comment\n\
             2025-05-01T08:00:00Z,Squat,100,5,\n\
             2025-05-02T08:00:00Z,Bench,80,8,felt strong\n\
             2025-05-01T08:00:00Z,Squat,120,3,\n",
        )
        .unwrap();

        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].date, "2025-05-01T08:00:00Z");
        assert_eq!(sessions[0].exercises.len(), 2);
        assert_eq!(sessions[0].exercises[1].weight, 120.0);
        assert_eq!(sessions[1].exercises[0].comment.as_deref(), Some("felt strong"));
        assert_eq!(sessions[1].workout_type, WorkoutType::Strength);

        let records: Vec<_> = sessions.iter().flat_map(WorkoutSession::to_records).collect();
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn reads_optional_workout_type() {
        let sessions = sessions_from(
            "date,exercise_name,set_weight,set_repetitions,comment,workout_type\n\
             2025-05-03,Burpees,0,15,,hiit\n",
        )
        .unwrap();
        assert_eq!(sessions[0].workout_type, WorkoutType::Hiit);
    }

    #[test]
    fn rejects_non_numeric_weight() {
        let result = sessions_from(
            "date,exercise_name,set_weight,set_repetitions,comment\n\
             2025-05-01,Squat,heavy,5,\n",
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_bad_dates_and_non_finite_weights_with_row_number() {
        let bad_date = sessions_from(
            "date,exercise_name,set_weight,set_repetitions,comment\n\
             2025-05-01,Squat,100,5,\n\
             05/02/2025,Bench,80,8,\n",
        )
        .unwrap_err();
        assert!(format!("{bad_date:#}").contains("row 2"));

        let bad_weight = sessions_from(
            "date,exercise_name,set_weight,set_repetitions,comment\n\
             2025-05-01,Squat,NaN,5,\n",
        );
        assert!(bad_weight.is_err());
    }

    #[tokio::test]
    async fn file_with_one_bad_row_stores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("workouts.csv");
        std::fs::write(
            &csv_path,
            "date,exercise_name,set_weight,set_repetitions,comment\n\
             2025-05-01,Squat,100,5,\n\
             05/02/2025,Bench,80,8,\n",
        )
        .unwrap();
        let store = LocalStore::new(dir.path().join("history.json"));

        assert!(import_csv(&store, &csv_path).await.is_err());
        assert!(store.list_sessions().await.unwrap().is_empty());
    }

    #[test]
    fn sample_sessions_are_well_formed() {
        let sessions = sample_sessions().unwrap();
        assert_eq!(sessions.len(), 5);
        assert!(sessions.iter().all(|s| !s.exercises.is_empty()));
    }

    #[tokio::test]
    async fn seeding_twice_adds_nothing_new() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("history.json"));

        assert_eq!(seed(&store).await.unwrap(), 5);
        assert_eq!(seed(&store).await.unwrap(), 0);
        assert_eq!(store.list_sessions().await.unwrap().len(), 5);
    }
}
