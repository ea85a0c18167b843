use std::collections::{BTreeMap, HashMap};

use anyhow::Context;
use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::error::{DataError, RecordError};
use crate::models::{
    parse_day, DailyTotal, ExerciseFrequency, ExerciseSet, PersonalRecord, VolumePoint,
    WorkoutRecord,
};

pub const TOP_EXERCISES: usize = 10;

/// The four chart views plus whatever had to be skipped to build them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub total_weight_by_day: Vec<DailyTotal>,
    pub volume_over_time: Vec<VolumePoint>,
    pub exercise_frequency: Vec<ExerciseFrequency>,
    pub personal_records: Vec<PersonalRecord>,
    pub rejected: Vec<RecordError>,
}

pub fn validate_record(record: &WorkoutRecord) -> Result<ExerciseSet, DataError> {
    let day = parse_day(&record.date)?;
    if !record.weight.is_finite() {
        return Err(DataError::NonFiniteWeight(record.weight));
    }
    if record.weight < 0.0 {
        return Err(DataError::NegativeWeight(record.weight));
    }
    let repetitions = u64::try_from(record.repetitions)
        .map_err(|_| DataError::NegativeRepetitions(record.repetitions))?;

    Ok(ExerciseSet {
        day,
        exercise_name: record.exercise_name.clone(),
        weight: record.weight,
        repetitions,
    })
}

/// Splits a batch into valid sets and per-record rejections. A bad record
/// never aborts the batch.
pub fn validate_records(records: &[WorkoutRecord]) -> (Vec<ExerciseSet>, Vec<RecordError>) {
    let mut sets = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();

    for (index, record) in records.iter().enumerate() {
        match validate_record(record) {
            Ok(set) => sets.push(set),
            Err(source) => {
                tracing::warn!(index, exercise = %record.exercise_name, error = %source, "skipping workout record");
                rejected.push(RecordError {
                    index,
                    exercise_name: record.exercise_name.clone(),
                    source,
                });
            }
        }
    }

    (sets, rejected)
}

fn daily_volume(sets: &[ExerciseSet]) -> BTreeMap<NaiveDate, f64> {
    let mut by_day = BTreeMap::new();
    for set in sets {
        *by_day.entry(set.day).or_insert(0.0) += set.volume();
    }
    by_day
}

pub fn total_weight_by_day(sets: &[ExerciseSet]) -> Vec<DailyTotal> {
    daily_volume(sets)
        .into_iter()
        .map(|(day, total_weight)| DailyTotal { day, total_weight })
        .collect()
}

pub fn volume_over_time(sets: &[ExerciseSet]) -> Vec<VolumePoint> {
    daily_volume(sets)
        .into_iter()
        .map(|(day, volume)| VolumePoint { day, volume })
        .collect()
}

/// Top exercises by number of logged sets. Ties keep first-seen order.
pub fn exercise_frequency(sets: &[ExerciseSet]) -> Vec<ExerciseFrequency> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<ExerciseFrequency> = Vec::new();

    for set in sets {
        let position = *positions.entry(set.exercise_name.as_str()).or_insert_with(|| {
            counts.push(ExerciseFrequency {
                exercise: set.exercise_name.clone(),
                count: 0,
            });
            counts.len() - 1
        });
        counts[position].count += 1;
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(TOP_EXERCISES);
    counts
}

/// Heaviest weight per exercise, heaviest first. Ties keep first-seen order.
pub fn personal_records(sets: &[ExerciseSet]) -> Vec<PersonalRecord> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut records: Vec<PersonalRecord> = Vec::new();

    for set in sets {
        match positions.get(set.exercise_name.as_str()) {
            Some(&position) => {
                let best = &mut records[position].max_weight;
                if set.weight > *best {
                    *best = set.weight;
                }
            }
            None => {
                positions.insert(set.exercise_name.as_str(), records.len());
                records.push(PersonalRecord {
                    exercise: set.exercise_name.clone(),
                    max_weight: set.weight,
                });
            }
        }
    }

    records.sort_by(|a, b| {
        b.max_weight
            .partial_cmp(&a.max_weight)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    records
}

/// Validates `records`, drops sets before `since` when given, and builds
/// every view.
pub fn summarize(records: &[WorkoutRecord], since: Option<NaiveDate>) -> Insights {
    let (mut sets, rejected) = validate_records(records);
    if let Some(cutoff) = since {
        sets.retain(|set| set.day >= cutoff);
    }

    tracing::debug!(
        valid = sets.len(),
        rejected = rejected.len(),
        "aggregating workout records"
    );

    Insights {
        total_weight_by_day: total_weight_by_day(&sets),
        volume_over_time: volume_over_time(&sets),
        exercise_frequency: exercise_frequency(&sets),
        personal_records: personal_records(&sets),
        rejected,
    }
}

pub fn cutoff_date(since_days: i64) -> anyhow::Result<NaiveDate> {
    Duration::try_days(since_days.max(1))
        .and_then(|window| Utc::now().date_naive().checked_sub_signed(window))
        .with_context(|| format!("--since-days {since_days} reaches past the earliest date"))
}
