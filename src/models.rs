use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DataError;

pub const MAX_SETS: i32 = 1_000;
pub const MAX_REPS: i32 = 10_000;

/// One logged set, flattened out of a session. Fields stay raw so that bad
/// input can be rejected per record during aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutRecord {
    pub date: String,
    pub exercise_name: String,
    pub weight: f64,
    pub repetitions: i64,
    pub comment: Option<String>,
}

/// A validated record keyed on its UTC calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseSet {
    pub day: NaiveDate,
    pub exercise_name: String,
    pub weight: f64,
    pub repetitions: u64,
}

impl ExerciseSet {
    pub fn volume(&self) -> f64 {
        self.weight * self.repetitions as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
    Strength,
    Cardio,
    Hiit,
}

impl WorkoutType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutType::Strength => "strength",
            WorkoutType::Cardio => "cardio",
            WorkoutType::Hiit => "hiit",
        }
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strength" => Ok(WorkoutType::Strength),
            "cardio" => Ok(WorkoutType::Cardio),
            "hiit" => Ok(WorkoutType::Hiit),
            other => bail!("unknown workout type: {other}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub sets: i32,
    pub reps: i32,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Parses the `log` syntax `NAME:SETSxREPS@WEIGHT`; `@WEIGHT` may be omitted
/// for bodyweight work.
impl FromStr for Exercise {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, scheme) = s
            .rsplit_once(':')
            .with_context(|| format!("expected NAME:SETSxREPS@WEIGHT, got {s:?}"))?;
        let name = name.trim();
        if name.is_empty() {
            bail!("exercise name is empty in {s:?}");
        }

        let (volume, weight) = match scheme.split_once('@') {
            Some((volume, weight)) => {
                let weight: f64 = weight
                    .trim()
                    .parse()
                    .with_context(|| format!("invalid weight in {s:?}"))?;
                (volume, weight)
            }
            None => (scheme, 0.0),
        };
        let (sets, reps) = volume
            .trim()
            .split_once(|c: char| c == 'x' || c == 'X')
            .with_context(|| format!("expected SETSxREPS in {s:?}"))?;

        let exercise = Exercise {
            name: name.to_string(),
            sets: sets.trim().parse().with_context(|| format!("invalid sets in {s:?}"))?,
            reps: reps.trim().parse().with_context(|| format!("invalid reps in {s:?}"))?,
            weight,
            comment: None,
        };
        exercise.check()?;
        Ok(exercise)
    }
}

impl Exercise {
    /// Rejects values the stores cannot hold or that would blow up when
    /// flattened. Negative measurements pass through and are rejected per
    /// record during aggregation.
    pub fn check(&self) -> anyhow::Result<()> {
        if !self.weight.is_finite() {
            bail!("{}: weight must be a finite number, got {}", self.name, self.weight);
        }
        if self.sets > MAX_SETS {
            bail!("{}: {} sets exceeds the limit of {MAX_SETS}", self.name, self.sets);
        }
        if self.reps > MAX_REPS {
            bail!("{}: {} reps exceeds the limit of {MAX_REPS}", self.name, self.reps);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    pub id: Uuid,
    pub date: String,
    pub workout_type: WorkoutType,
    pub duration_seconds: u64,
    pub exercises: Vec<Exercise>,
}

impl WorkoutSession {
    pub fn new(
        performed_at: DateTime<Utc>,
        workout_type: WorkoutType,
        duration_seconds: u64,
        exercises: Vec<Exercise>,
    ) -> Self {
        WorkoutSession {
            id: Uuid::new_v4(),
            date: format_timestamp(performed_at),
            workout_type,
            duration_seconds,
            exercises,
        }
    }

    /// Checks everything a store must refuse before appending.
    pub fn check(&self) -> anyhow::Result<DateTime<Utc>> {
        let performed_at = parse_timestamp(&self.date)
            .with_context(|| format!("session {} has an invalid date", self.id))?;
        for exercise in &self.exercises {
            exercise
                .check()
                .with_context(|| format!("session {} has an invalid exercise", self.id))?;
        }
        Ok(performed_at)
    }

    /// One record per performed set, all sharing the session date. Set counts
    /// are clamped to `MAX_SETS` for histories written outside this program.
    pub fn to_records(&self) -> Vec<WorkoutRecord> {
        let mut records = Vec::new();
        for exercise in &self.exercises {
            for _ in 0..exercise.sets.clamp(0, MAX_SETS) {
                records.push(WorkoutRecord {
                    date: self.date.clone(),
                    exercise_name: exercise.name.clone(),
                    weight: exercise.weight,
                    repetitions: i64::from(exercise.reps),
                    comment: exercise.comment.clone(),
                });
            }
        }
        records
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTotal {
    pub day: NaiveDate,
    pub total_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumePoint {
    pub day: NaiveDate,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseFrequency {
    pub exercise: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalRecord {
    pub exercise: String,
    pub max_weight: f64,
}

/// Parses an ISO-8601 timestamp. Offsets are normalised to UTC, naive
/// timestamps and bare dates are taken as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DataError> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(parsed.and_utc());
    }
    if let Ok(day) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = day.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(DataError::MalformedDate(value.to_string()))
}

pub fn parse_day(value: &str) -> Result<NaiveDate, DataError> {
    parse_timestamp(value).map(|timestamp| timestamp.date_naive())
}

pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
