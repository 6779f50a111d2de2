//! Playback session state machine
//!
//! Pure, synchronous sequencing of a workout. The engine owns the timer; this
//! type only decides which phase comes next and which timer the new phase
//! needs.
//!
//! Per exercise:
//!
//! ```text
//! RestingBeforeSet ──advance──▶ Working ──advance──▶ RestingBeforeSet   (sets remain)
//!                                   └────advance──▶ RestingAfterExercise (last set)
//! RestingAfterExercise ──advance──▶ next exercise's RestingBeforeSet, or Finished
//! ```

use super::timer::TimerSpec;
use wkt_common::events::{Phase, PlaybackSnapshot};
use wkt_common::{DisplayTime, Exercise, Workout};

/// Position and readout of one playback session
///
/// Invariant: `exercise_index <= exercises.len()`, with equality exactly when
/// the phase is `Finished`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    exercise_index: usize,
    completed_sets: u32,
    phase: Phase,
    time: DisplayTime,
}

impl SessionState {
    /// First exercise, resting, readout 0.0
    pub fn new() -> Self {
        Self {
            exercise_index: 0,
            completed_sets: 0,
            phase: Phase::RestingBeforeSet,
            time: DisplayTime::ZERO,
        }
    }

    pub fn exercise_index(&self) -> usize {
        self.exercise_index
    }

    pub fn completed_sets(&self) -> u32 {
        self.completed_sets
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn time(&self) -> DisplayTime {
        self.time
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn current_exercise<'a>(&self, workout: &'a Workout) -> Option<&'a Exercise> {
        if self.is_finished() {
            return None;
        }
        workout.exercises.get(self.exercise_index)
    }

    /// Apply one `advance()` command
    ///
    /// Returns the timer the new phase runs, if any. The readout is set to the
    /// timer's start value (or 0.0 when no timer runs). No effect once
    /// finished.
    pub fn advance(&mut self, workout: &Workout) -> Option<TimerSpec> {
        let timer = match self.phase {
            Phase::Finished => return None,
            Phase::RestingBeforeSet => {
                self.phase = Phase::Working;
                self.completed_sets += 1;
                Some(TimerSpec::up_from(DisplayTime::ZERO))
            }
            Phase::Working => {
                let Some(exercise) = workout.exercises.get(self.exercise_index) else {
                    self.finish(workout);
                    return None;
                };
                if self.completed_sets >= exercise.set_count {
                    self.phase = Phase::RestingAfterExercise;
                    Some(TimerSpec::down_from(DisplayTime::from_duration(
                        exercise.rest_after_exercise,
                    )))
                } else {
                    self.phase = Phase::RestingBeforeSet;
                    Some(TimerSpec::down_from(DisplayTime::from_duration(
                        exercise.rest_between_sets,
                    )))
                }
            }
            Phase::RestingAfterExercise => {
                self.completed_sets = 0;
                self.exercise_index += 1;
                if self.exercise_index >= workout.exercises.len() {
                    self.finish(workout);
                } else {
                    self.phase = Phase::RestingBeforeSet;
                    self.time = DisplayTime::ZERO;
                }
                None
            }
        };

        if let Some(spec) = timer {
            self.time = spec.start;
        }
        timer
    }

    /// Record a timer readout
    pub fn apply_tick(&mut self, value: DisplayTime) {
        self.time = value;
    }

    fn finish(&mut self, workout: &Workout) {
        self.exercise_index = workout.exercises.len();
        self.completed_sets = 0;
        self.phase = Phase::Finished;
        self.time = DisplayTime::ZERO;
    }

    /// Immutable view for the presentation layer
    pub fn snapshot(&self, workout: &Workout) -> PlaybackSnapshot {
        let (exercise_name, set_count) = match self.current_exercise(workout) {
            Some(exercise) => (exercise.name.clone(), exercise.set_count),
            None => (String::new(), 0),
        };

        PlaybackSnapshot {
            workout_id: workout.id,
            exercise_index: self.exercise_index,
            exercise_name,
            completed_sets: self.completed_sets,
            set_count,
            phase: self.phase,
            time: self.time,
            display_time: self.time.to_string(),
            phase_label: self.phase.label().to_string(),
            finished: self.is_finished(),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
