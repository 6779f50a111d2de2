//! Workout and exercise models
//!
//! A workout is an ordered list of exercises. Each exercise is played as
//! `sets` rounds of work separated by `rest_between_sets`, followed by a
//! single `rest_after_exercise` before the next exercise begins.
//!
//! Field names on the wire follow the library document format
//! (`restBetweenSets`, `restAfter`, `sets`), with rests in fractional seconds.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// A single exercise within a workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    #[serde(rename = "uid", alias = "id")]
    pub id: Uuid,
    pub name: String,
    /// Number of work rounds; must be at least 1 to be playable
    #[serde(rename = "sets")]
    pub set_count: u32,
    #[serde(with = "secs_f64")]
    pub rest_between_sets: Duration,
    #[serde(rename = "restAfter", with = "secs_f64")]
    pub rest_after_exercise: Duration,
}

impl Exercise {
    /// Create an exercise with a fresh identifier
    pub fn new(
        name: impl Into<String>,
        set_count: u32,
        rest_between_sets: Duration,
        rest_after_exercise: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            set_count,
            rest_between_sets,
            rest_after_exercise,
        }
    }
}

/// A named, ordered sequence of exercises
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    #[serde(rename = "uid", alias = "id")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

impl Workout {
    /// Create a workout with a fresh identifier
    pub fn new(name: impl Into<String>, exercises: Vec<Exercise>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            exercises,
        }
    }

    /// Share code used to look this workout up remotely
    pub fn share_code(&self) -> ShareCode {
        ShareCode(self.id)
    }

    /// Whether the workout may be handed to the playback engine
    pub fn is_playable(&self) -> bool {
        self.validate().is_ok()
    }

    /// Check the playback preconditions
    ///
    /// A playable workout has at least one exercise and every exercise has at
    /// least one set. The playback engine relies on this having been checked
    /// by whoever supplies the workout.
    pub fn validate(&self) -> Result<()> {
        if self.exercises.is_empty() {
            return Err(Error::InvalidInput(format!(
                "workout '{}' has no exercises",
                self.name
            )));
        }
        if let Some(exercise) = self.exercises.iter().find(|e| e.set_count == 0) {
            return Err(Error::InvalidInput(format!(
                "exercise '{}' in workout '{}' has zero sets",
                exercise.name, self.name
            )));
        }
        Ok(())
    }

    /// Total number of sets across all exercises
    pub fn total_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.set_count).sum()
    }
}

/// Opaque code identifying a workout for sharing
///
/// The share code is the workout's identifier in hyphenated form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareCode(Uuid);

impl ShareCode {
    pub fn workout_id(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for ShareCode {
    fn from(id: Uuid) -> Self {
        ShareCode(id)
    }
}

impl fmt::Display for ShareCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ShareCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(ShareCode)
            .map_err(|e| Error::InvalidInput(format!("invalid share code '{}': {}", s.trim(), e)))
    }
}

/// Serialize a `Duration` as fractional seconds
mod secs_f64 {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            de::Error::custom(format!(
                "rest must be a non-negative number of seconds, got {}",
                secs
            ))
        })
    }
}
