//! Workout store contract and in-memory library
//!
//! The playback engine only ever reads a finished `Workout` value. Whoever
//! supplies it implements [`WorkoutStore`] and is responsible for refusing
//! unplayable workouts.

use crate::models::{Exercise, ShareCode, Workout};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

/// Read access to workout definitions
pub trait WorkoutStore: Send + Sync {
    /// Fetch a playable workout
    ///
    /// Returns `NotFound` for unknown ids and `InvalidInput` for workouts
    /// that fail [`Workout::validate`].
    fn get_workout(&self, id: Uuid) -> Result<Workout>;

    /// All workouts in library order
    fn list_workouts(&self) -> Vec<Workout>;

    /// Workouts that can be handed to the playback engine
    fn list_playable(&self) -> Vec<Workout> {
        self.list_workouts()
            .into_iter()
            .filter(Workout::is_playable)
            .collect()
    }
}

/// Library document: `{"workouts": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutLibrary {
    #[serde(default)]
    pub workouts: Vec<Workout>,
}

/// Workout library held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkoutStore {
    workouts: Vec<Workout>,
}

impl InMemoryWorkoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_library(library: WorkoutLibrary) -> Self {
        Self {
            workouts: library.workouts,
        }
    }

    /// Seed from a JSON library document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let library: WorkoutLibrary = serde_json::from_str(json)?;
        Ok(Self::from_library(library))
    }

    /// Seed from a JSON library file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let store = Self::from_json_str(&json)?;
        info!(
            "Loaded {} workouts from {}",
            store.workouts.len(),
            path.display()
        );
        Ok(store)
    }

    /// Copy of the current contents as a library document
    pub fn to_library(&self) -> WorkoutLibrary {
        WorkoutLibrary {
            workouts: self.workouts.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    /// Insert a workout, or replace the one with the same id in place
    ///
    /// Returns true if the workout was newly inserted.
    pub fn save_workout(&mut self, workout: Workout) -> bool {
        match self.workouts.iter_mut().find(|w| w.id == workout.id) {
            Some(existing) => {
                debug!("Replacing workout {} ({})", workout.id, workout.name);
                *existing = workout;
                false
            }
            None => {
                debug!("Adding workout {} ({})", workout.id, workout.name);
                self.workouts.push(workout);
                true
            }
        }
    }

    pub fn remove_workout(&mut self, id: Uuid) -> Result<Workout> {
        let index = self.position(id)?;
        Ok(self.workouts.remove(index))
    }

    /// Append an exercise to a workout
    pub fn add_exercise(&mut self, workout_id: Uuid, exercise: Exercise) -> Result<()> {
        let index = self.position(workout_id)?;
        self.workouts[index].exercises.push(exercise);
        Ok(())
    }

    pub fn remove_exercise(&mut self, workout_id: Uuid, exercise_id: Uuid) -> Result<Exercise> {
        let index = self.position(workout_id)?;
        let exercises = &mut self.workouts[index].exercises;
        let exercise_index = exercises
            .iter()
            .position(|e| e.id == exercise_id)
            .ok_or_else(|| Error::NotFound(format!("exercise {}", exercise_id)))?;
        Ok(exercises.remove(exercise_index))
    }

    pub fn find_by_share_code(&self, code: &ShareCode) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id == code.workout_id())
    }

    fn position(&self, id: Uuid) -> Result<usize> {
        self.workouts
            .iter()
            .position(|w| w.id == id)
            .ok_or_else(|| Error::NotFound(format!("workout {}", id)))
    }
}

impl WorkoutStore for InMemoryWorkoutStore {
    fn get_workout(&self, id: Uuid) -> Result<Workout> {
        let workout = &self.workouts[self.position(id)?];
        workout.validate()?;
        Ok(workout.clone())
    }

    fn list_workouts(&self) -> Vec<Workout> {
        self.workouts.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn exercise(name: &str, sets: u32) -> Exercise {
        Exercise::new(name, sets, Duration::from_secs(30), Duration::from_secs(60))
    }

    #[test]
    fn test_list_playable_excludes_empty_workouts() {
        let mut store = InMemoryWorkoutStore::new();
        store.save_workout(Workout::new("Full body", vec![exercise("Burpees", 3)]));
        store.save_workout(Workout::new("Draft", vec![]));

        assert_eq!(store.list_workouts().len(), 2);
        let playable = store.list_playable();
        assert_eq!(playable.len(), 1);
        assert_eq!(playable[0].name, "Full body");
    }

    #[test]
    fn test_get_workout_rejects_unplayable() {
        let mut store = InMemoryWorkoutStore::new();
        let draft = Workout::new("Draft", vec![]);
        let zero_sets = Workout::new("Broken", vec![exercise("Lunges", 0)]);
        let (draft_id, zero_id) = (draft.id, zero_sets.id);
        store.save_workout(draft);
        store.save_workout(zero_sets);

        assert!(matches!(store.get_workout(draft_id), Err(Error::InvalidInput(_))));
        assert!(matches!(store.get_workout(zero_id), Err(Error::InvalidInput(_))));
        assert!(matches!(store.get_workout(Uuid::new_v4()), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_save_workout_upserts_by_id() {
        let mut store = InMemoryWorkoutStore::new();
        let mut workout = Workout::new("Push", vec![exercise("Dips", 3)]);
        assert!(store.save_workout(workout.clone()));

        workout.name = "Push v2".to_string();
        assert!(!store.save_workout(workout.clone()));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get_workout(workout.id).unwrap().name, "Push v2");
    }

    #[test]
    fn test_exercise_management() {
        let mut store = InMemoryWorkoutStore::new();
        let workout = Workout::new("Pull", vec![]);
        let id = workout.id;
        store.save_workout(workout);

        let rows = exercise("Rows", 4);
        let rows_id = rows.id;
        store.add_exercise(id, rows).unwrap();
        store.add_exercise(id, exercise("Curls", 3)).unwrap();
        assert_eq!(store.get_workout(id).unwrap().exercises.len(), 2);

        let removed = store.remove_exercise(id, rows_id).unwrap();
        assert_eq!(removed.name, "Rows");
        assert_eq!(store.get_workout(id).unwrap().exercises[0].name, "Curls");
        assert!(store.remove_exercise(id, rows_id).is_err());
        assert!(store.add_exercise(Uuid::new_v4(), exercise("X", 1)).is_err());
    }

    #[test]
    fn test_remove_workout() {
        let mut store = InMemoryWorkoutStore::new();
        let workout = Workout::new("Legs", vec![exercise("Squats", 5)]);
        let id = workout.id;
        store.save_workout(workout);

        assert_eq!(store.remove_workout(id).unwrap().name, "Legs");
        assert!(store.is_empty());
        assert!(matches!(store.remove_workout(id), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_find_by_share_code() {
        let mut store = InMemoryWorkoutStore::new();
        let workout = Workout::new("Core", vec![exercise("Plank", 3)]);
        let code = workout.share_code();
        store.save_workout(workout);

        assert_eq!(store.find_by_share_code(&code).unwrap().name, "Core");
        assert!(store
            .find_by_share_code(&ShareCode::from(Uuid::new_v4()))
            .is_none());
    }

    #[test]
    fn test_json_library_round_trip_preserves_order() {
        let mut store = InMemoryWorkoutStore::new();
        store.save_workout(Workout::new("A", vec![exercise("a", 1)]));
        store.save_workout(Workout::new("B", vec![exercise("b", 2)]));

        let json = serde_json::to_string(&store.to_library()).unwrap();
        let reloaded = InMemoryWorkoutStore::from_json_str(&json).unwrap();
        let names: Vec<_> = reloaded.list_workouts().into_iter().map(|w| w.name).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_from_json_str_rejects_malformed() {
        assert!(matches!(
            InMemoryWorkoutStore::from_json_str("{\"workouts\": 3}"),
            Err(Error::Json(_))
        ));
    }
}
