//! Playback-related type definitions
//!
//! Supporting types for the playback phase and the per-update snapshot.

use crate::time::DisplayTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Label shown while a set is in progress
pub const LABEL_WORKING: &str = "Working out";
/// Label shown during either rest phase
pub const LABEL_RESTING: &str = "Resting";
/// Label shown once the last exercise is done
pub const LABEL_FINISHED: &str = "Workout finished";

/// Playback phase enumeration
///
/// Every exercise starts in `RestingBeforeSet`, alternates with `Working`
/// once per set, and ends in `RestingAfterExercise`. `Finished` is terminal
/// for the whole workout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "PascalCase")]
pub enum Phase {
    /// Waiting to start the next set (counts down between sets)
    RestingBeforeSet,
    /// Set in progress (counts up)
    Working,
    /// All sets done, resting before the next exercise (counts down)
    RestingAfterExercise,
    /// Workout complete
    Finished,
}

impl Phase {
    /// Text shown to the user for this phase
    pub fn label(self) -> &'static str {
        match self {
            Phase::Working => LABEL_WORKING,
            Phase::RestingBeforeSet | Phase::RestingAfterExercise => LABEL_RESTING,
            Phase::Finished => LABEL_FINISHED,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::RestingBeforeSet => write!(f, "RestingBeforeSet"),
            Phase::Working => write!(f, "Working"),
            Phase::RestingAfterExercise => write!(f, "RestingAfterExercise"),
            Phase::Finished => write!(f, "Finished"),
        }
    }
}

/// Immutable view of a playback session handed to the presentation layer
///
/// Once `finished` is true the exercise fields describe nothing and a
/// renderer should show only the phase label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub workout_id: Uuid,
    /// 0-based position into the workout's exercises (equals the exercise
    /// count once finished)
    pub exercise_index: usize,
    /// Empty once finished
    pub exercise_name: String,
    pub completed_sets: u32,
    /// 0 once finished
    pub set_count: u32,
    pub phase: Phase,
    /// Raw timer value
    pub time: DisplayTime,
    /// Timer value formatted to one decimal place
    pub display_time: String,
    pub phase_label: String,
    pub finished: bool,
}

impl PlaybackSnapshot {
    /// "completed/total" set progress, e.g. `2/4`
    pub fn set_progress(&self) -> String {
        format!("{}/{}", self.completed_sets, self.set_count)
    }
}
