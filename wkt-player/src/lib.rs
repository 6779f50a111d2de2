//! # Workout Timer Player Library (wkt-player)
//!
//! Core playback engine for timed workouts.
//!
//! **Purpose:** Sequence a workout's exercises through rest and work phases,
//! run the 100ms work/rest timer, and publish a snapshot on every tick and
//! phase change for whatever renders it.
//!
//! **Architecture:** A pure session state machine (`playback::session`), a
//! cancellable tokio tick task (`playback::timer`), and the engine that ties
//! them together under a single-writer lock (`playback::engine`).

pub mod display;
pub mod error;
pub mod events;
pub mod playback;
pub mod state;

pub use error::{Error, Result};
pub use playback::PlaybackEngine;
pub use state::SharedPlayerState;
