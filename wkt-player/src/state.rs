//! Shared player state
//!
//! Latest playback snapshot for consumers that poll instead of subscribing,
//! kept current by a listener task on the event bus.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use wkt_common::events::{PlaybackEvent, PlaybackSnapshot};

/// Shared state accessible by the driver and any status readers
///
/// Uses RwLock for concurrent read access with one writer (the listener)
pub struct SharedPlayerState {
    /// Snapshot from the most recent event (None before the first event)
    latest: RwLock<Option<PlaybackSnapshot>>,

    /// Number of tick events observed
    ticks_seen: AtomicU64,

    /// Number of events dropped because the listener lagged
    events_missed: AtomicU64,
}

impl SharedPlayerState {
    pub fn new() -> Self {
        Self {
            latest: RwLock::new(None),
            ticks_seen: AtomicU64::new(0),
            events_missed: AtomicU64::new(0),
        }
    }

    /// Latest snapshot seen
    pub async fn latest(&self) -> Option<PlaybackSnapshot> {
        self.latest.read().await.clone()
    }

    pub fn ticks_seen(&self) -> u64 {
        self.ticks_seen.load(Ordering::Relaxed)
    }

    pub fn events_missed(&self) -> u64 {
        self.events_missed.load(Ordering::Relaxed)
    }

    /// Record one event
    pub async fn record(&self, event: &PlaybackEvent) {
        if matches!(event, PlaybackEvent::Tick { .. }) {
            self.ticks_seen.fetch_add(1, Ordering::Relaxed);
        }
        *self.latest.write().await = Some(event.snapshot().clone());
    }

    /// Follow `rx` until the session stops or the bus closes
    pub fn spawn_listener(
        self: Arc<Self>,
        mut rx: broadcast::Receiver<PlaybackEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        self.record(&event).await;
                        if event.is_terminal() {
                            debug!("Session stopped, state listener exiting");
                            break;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!("State listener lagged, {} events skipped", n);
                        self.events_missed.fetch_add(n, Ordering::Relaxed);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Default for SharedPlayerState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::PlaybackEngine;
    use std::time::Duration;
    use wkt_common::events::{EventBus, Phase};
    use wkt_common::{Exercise, Workout};

    fn workout() -> Workout {
        Workout::new(
            "Arms",
            vec![Exercise::new("Curls", 2, Duration::from_secs(1), Duration::from_secs(2))],
        )
    }

    #[tokio::test]
    async fn test_default_is_empty() {
        let state = SharedPlayerState::new();
        assert!(state.latest().await.is_none());
        assert_eq!(state.ticks_seen(), 0);
        assert_eq!(state.events_missed(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listener_tracks_engine() {
        let bus = EventBus::new(64);
        let state = Arc::new(SharedPlayerState::new());
        let listener = Arc::clone(&state).spawn_listener(bus.subscribe());

        let engine = PlaybackEngine::new(workout(), bus).unwrap();
        engine.advance();
        tokio::time::sleep(Duration::from_millis(350)).await;

        let latest = state.latest().await.unwrap();
        assert_eq!(latest.phase, Phase::Working);
        assert_eq!(latest.display_time, "0.3");
        assert_eq!(state.ticks_seen(), 3);

        engine.stop();
        listener.await.unwrap();
        assert_eq!(state.latest().await.unwrap().phase, Phase::Working);
    }
}
