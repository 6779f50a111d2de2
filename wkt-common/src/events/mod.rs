//! Event system for the workout timer
//!
//! Provides playback event definitions and the EventBus used to push them
//! from the playback engine to any number of presentation subscribers.

mod playback_types;

pub use playback_types::{Phase, PlaybackSnapshot, LABEL_FINISHED, LABEL_RESTING, LABEL_WORKING};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Playback event types
///
/// Every event carries the full snapshot of the session at the moment it was
/// produced, so a subscriber can render from any single event without
/// replaying history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlaybackEvent {
    /// Session created, in its initial state (first exercise, resting, 0.0)
    SessionStarted {
        workout_name: String,
        snapshot: PlaybackSnapshot,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// `advance()` moved the session to a new phase or exercise
    ///
    /// The snapshot's time is the start value of the newly armed timer.
    PhaseChanged {
        /// Phase before the transition
        previous: Phase,
        snapshot: PlaybackSnapshot,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Periodic timer update (every 100ms while a timer runs)
    Tick {
        snapshot: PlaybackSnapshot,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Last exercise completed; no further events follow except SessionStopped
    WorkoutFinished {
        snapshot: PlaybackSnapshot,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Session left before or after finishing; the timer has been cancelled
    SessionStopped {
        snapshot: PlaybackSnapshot,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl PlaybackEvent {
    /// Snapshot carried by this event
    pub fn snapshot(&self) -> &PlaybackSnapshot {
        match self {
            PlaybackEvent::SessionStarted { snapshot, .. }
            | PlaybackEvent::PhaseChanged { snapshot, .. }
            | PlaybackEvent::Tick { snapshot, .. }
            | PlaybackEvent::WorkoutFinished { snapshot, .. }
            | PlaybackEvent::SessionStopped { snapshot, .. } => snapshot,
        }
    }

    /// Consume the event, keeping only its snapshot
    pub fn into_snapshot(self) -> PlaybackSnapshot {
        match self {
            PlaybackEvent::SessionStarted { snapshot, .. }
            | PlaybackEvent::PhaseChanged { snapshot, .. }
            | PlaybackEvent::Tick { snapshot, .. }
            | PlaybackEvent::WorkoutFinished { snapshot, .. }
            | PlaybackEvent::SessionStopped { snapshot, .. } => snapshot,
        }
    }

    /// Short event name for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            PlaybackEvent::SessionStarted { .. } => "SessionStarted",
            PlaybackEvent::PhaseChanged { .. } => "PhaseChanged",
            PlaybackEvent::Tick { .. } => "Tick",
            PlaybackEvent::WorkoutFinished { .. } => "WorkoutFinished",
            PlaybackEvent::SessionStopped { .. } => "SessionStopped",
        }
    }

    /// Whether no further events from the session will follow
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlaybackEvent::SessionStopped { .. })
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Distribution bus for playback events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the timer)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// At one tick per 100ms a capacity of 64 holds over six seconds of updates.
///
/// # Examples
///
/// ```
/// use wkt_common::events::EventBus;
///
/// let event_bus = EventBus::new(64);
/// let mut rx = event_bus.subscribe();
/// assert_eq!(event_bus.subscriber_count(), 1);
/// # drop(rx.try_recv());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlaybackEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// A capacity of 0 is raised to 1 since tokio rejects empty channels.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PlaybackEvent,
    ) -> Result<usize, broadcast::error::SendError<PlaybackEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// A session keeps ticking with no renderer attached.
    pub fn emit_lossy(&self, event: PlaybackEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
