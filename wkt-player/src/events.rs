//! Event system for wkt-player
//!
//! # Architecture
//!
//! - **EventBus** (tokio::broadcast): engine → any number of renderers
//! - **Command** (`PlaybackEngine::advance`): renderer → engine, synchronous
//! - **Shared state** (`SharedPlayerState`): latest snapshot for pollers
//!
//! This module re-exports the shared event types from wkt-common.

pub use wkt_common::events::{EventBus, Phase, PlaybackEvent, PlaybackSnapshot};
