//! Playback engine, session state machine, and tick timer

pub mod engine;
pub mod session;
pub mod timer;

pub use engine::PlaybackEngine;
pub use session::SessionState;
pub use timer::{TimerKind, TimerSpec, TICK_INTERVAL};
