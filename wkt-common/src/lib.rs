//! # Workout Timer Common Library
//!
//! Shared code for the workout timer crates including:
//! - Workout and exercise models, share codes
//! - Playback event types (PlaybackEvent enum) and the EventBus
//! - Display time formatting
//! - Configuration loading
//! - The workout store contract and an in-memory library

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod store;
pub mod time;

pub use error::{Error, Result};
pub use models::{Exercise, ShareCode, Workout};
pub use time::DisplayTime;
