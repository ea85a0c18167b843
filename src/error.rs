use serde::ser::{Serialize, SerializeStruct, Serializer};
use thiserror::Error;

/// Why a single workout record was rejected before aggregation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("malformed date: {0:?}")]
    MalformedDate(String),

    #[error("negative weight: {0}")]
    NegativeWeight(f64),

    #[error("weight is not a finite number: {0}")]
    NonFiniteWeight(f64),

    #[error("negative repetitions: {0}")]
    NegativeRepetitions(i64),
}

impl DataError {
    pub fn kind(&self) -> &'static str {
        match self {
            DataError::MalformedDate(_) => "malformedDate",
            DataError::NegativeWeight(_) => "negativeWeight",
            DataError::NonFiniteWeight(_) => "nonFiniteWeight",
            DataError::NegativeRepetitions(_) => "negativeRepetitions",
        }
    }
}

/// A rejected record, tagged with its position in the input batch.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("record {index} ({exercise_name}): {source}")]
pub struct RecordError {
    pub index: usize,
    pub exercise_name: String,
    pub source: DataError,
}

// Flattened to strings so non-finite weights stay representable in JSON.
impl Serialize for RecordError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RecordError", 4)?;
        state.serialize_field("index", &self.index)?;
        state.serialize_field("exerciseName", &self.exercise_name)?;
        state.serialize_field("kind", self.source.kind())?;
        state.serialize_field("message", &self.source.to_string())?;
        state.end()
    }
}
