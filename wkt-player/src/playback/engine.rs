//! Playback engine - session lifecycle and timer orchestration
//!
//! **Responsibilities:**
//! - Own the playback session for one workout
//! - Arm exactly one tick timer per timed phase, cancelling the previous one
//! - Publish a snapshot on session start, every phase change, and every tick
//! - Stop the session when the screen is left (or the engine is dropped)
//!
//! Session state is guarded by one mutex and has a single writer at a time:
//! `advance()`, `stop()`, and tick callbacks each mutate and publish while
//! holding it. Every timer is tagged with the session generation it was armed
//! in; cancelling bumps the generation, so a tick that raced the cancel finds
//! a stale tag and is dropped before it touches state or reaches subscribers.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::stream::{Stream, StreamExt};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;
use wkt_common::events::{EventBus, PlaybackEvent, PlaybackSnapshot};
use wkt_common::store::WorkoutStore;
use wkt_common::time::now;
use wkt_common::Workout;

use super::session::SessionState;
use super::timer::{spawn_ticker, TimerHandle, TimerSpec, TICK_INTERVAL};
use crate::error::{Error, Result};

/// Everything the engine mutates, kept behind one lock
struct PlaybackSession {
    workout: Arc<Workout>,
    state: SessionState,
    /// Active tick task, if the current phase is timed
    timer: Option<TimerHandle>,
    /// Bumped on every cancel; ticks carrying an older value are discarded
    generation: u64,
    stopped: bool,
}

impl PlaybackSession {
    /// Cancel the active timer (if any) and invalidate its pending ticks
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        self.generation = self.generation.wrapping_add(1);
    }

    fn snapshot(&self) -> PlaybackSnapshot {
        self.state.snapshot(&self.workout)
    }
}

/// Drives one workout from its first rest to "Workout finished"
///
/// Create it inside a tokio runtime; the runtime is captured to run the tick
/// timer, so `advance()` itself is synchronous and can be called from any
/// thread.
pub struct PlaybackEngine {
    session: Arc<Mutex<PlaybackSession>>,
    events: EventBus,
    runtime: Handle,
}

impl PlaybackEngine {
    /// Start a session for `workout`
    ///
    /// The workout must already satisfy [`Workout::validate`]; the engine
    /// does not check it again. Emits `SessionStarted`.
    pub fn new(workout: Workout, events: EventBus) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::Runtime(format!("playback engine needs a tokio runtime: {}", e)))?;

        let workout = Arc::new(workout);
        let session = PlaybackSession {
            workout: Arc::clone(&workout),
            state: SessionState::new(),
            timer: None,
            generation: 0,
            stopped: false,
        };
        let snapshot = session.snapshot();

        info!(
            "Starting workout '{}' ({} exercises, {} sets)",
            workout.name,
            workout.exercises.len(),
            workout.total_sets()
        );
        events.emit_lossy(PlaybackEvent::SessionStarted {
            workout_name: workout.name.clone(),
            snapshot,
            timestamp: now(),
        });

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            events,
            runtime,
        })
    }

    /// Fetch `workout_id` from a store and start a session for it
    pub fn from_store(
        store: &dyn WorkoutStore,
        workout_id: Uuid,
        events: EventBus,
    ) -> Result<Self> {
        let workout = store.get_workout(workout_id)?;
        Self::new(workout, events)
    }

    /// The workout being played
    pub fn workout(&self) -> Arc<Workout> {
        Arc::clone(&self.lock().workout)
    }

    /// Move to the next phase
    ///
    /// Cancels the running timer, applies the transition, publishes
    /// `PhaseChanged` (and `WorkoutFinished` when the last rest ends), then
    /// arms the timer for the new phase. No effect once finished or stopped.
    pub fn advance(&self) {
        let mut guard = self.lock();
        let session = &mut *guard;

        if session.stopped {
            warn!("advance() ignored: session stopped");
            return;
        }
        if session.state.is_finished() {
            debug!("advance() ignored: workout already finished");
            return;
        }

        session.cancel_timer();

        let previous = session.state.phase();
        let next_timer = session.state.advance(&session.workout);
        let snapshot = session.snapshot();

        debug!(
            "Phase {} -> {} (exercise {}, set {}/{}, time {})",
            previous,
            snapshot.phase,
            snapshot.exercise_index,
            snapshot.completed_sets,
            snapshot.set_count,
            snapshot.display_time
        );

        let finished = snapshot.finished;
        self.events.emit_lossy(PlaybackEvent::PhaseChanged {
            previous,
            snapshot: snapshot.clone(),
            timestamp: now(),
        });

        if finished {
            info!("Workout '{}' finished", session.workout.name);
            self.events.emit_lossy(PlaybackEvent::WorkoutFinished {
                snapshot,
                timestamp: now(),
            });
            return;
        }

        if let Some(spec) = next_timer {
            session.timer = Some(self.arm_timer(spec, session.generation));
        }
    }

    /// Leave the session: cancel the timer and stop publishing ticks
    ///
    /// Emits `SessionStopped` once; later calls (and `advance()`) are no-ops.
    pub fn stop(&self) {
        let mut session = self.lock();
        if session.stopped {
            return;
        }

        session.cancel_timer();
        session.stopped = true;

        let snapshot = session.snapshot();
        info!(
            "Stopped workout '{}' at exercise {} ({})",
            session.workout.name, snapshot.exercise_index, snapshot.phase
        );
        self.events.emit_lossy(PlaybackEvent::SessionStopped {
            snapshot,
            timestamp: now(),
        });
    }

    /// Current session snapshot
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.lock().snapshot()
    }

    pub fn is_finished(&self) -> bool {
        self.lock().state.is_finished()
    }

    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    /// Whether a tick timer is armed for the current phase
    pub fn has_active_timer(&self) -> bool {
        self.lock().timer.is_some()
    }

    /// Subscribe to all future playback events
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    /// Stream of snapshots, one per published event
    ///
    /// A subscriber that falls more than the bus capacity behind skips the
    /// missed snapshots. The stream ends when every bus sender is dropped.
    pub fn updates(&self) -> impl Stream<Item = PlaybackSnapshot> {
        BroadcastStream::new(self.events.subscribe()).filter_map(|result| async move {
            match result {
                Ok(event) => Some(event.into_snapshot()),
                Err(e) => {
                    warn!("Playback subscriber lagged: {:?}", e);
                    None
                }
            }
        })
    }

    fn lock(&self) -> MutexGuard<'_, PlaybackSession> {
        // Every critical section leaves the session consistent, so a panic
        // elsewhere does not invalidate it
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn arm_timer(&self, spec: TimerSpec, generation: u64) -> TimerHandle {
        trace!("Arming {:?} timer from {} (generation {})", spec.kind, spec.start, generation);
        let weak: Weak<Mutex<PlaybackSession>> = Arc::downgrade(&self.session);
        let events = self.events.clone();

        spawn_ticker(&self.runtime, spec, TICK_INTERVAL, move |value| {
            let Some(shared) = weak.upgrade() else {
                return ControlFlow::Break(());
            };
            let mut session = shared.lock().unwrap_or_else(PoisonError::into_inner);
            if session.stopped || session.generation != generation {
                trace!("Dropping stale tick from generation {}", generation);
                return ControlFlow::Break(());
            }

            session.state.apply_tick(value);
            let snapshot = session.snapshot();
            trace!("Tick {} ({})", snapshot.display_time, snapshot.phase);
            events.emit_lossy(PlaybackEvent::Tick {
                snapshot,
                timestamp: now(),
            });
            ControlFlow::Continue(())
        })
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::broadcast::error::TryRecvError;
    use tokio::time;
    use wkt_common::events::Phase;
    use wkt_common::store::InMemoryWorkoutStore;
    use wkt_common::Exercise;

    fn workout(sets: u32, between: f64, after: f64) -> Workout {
        Workout::new(
            "Test",
            vec![Exercise::new(
                "Squats",
                sets,
                Duration::from_secs_f64(between),
                Duration::from_secs_f64(after),
            )],
        )
    }

    fn drain(rx: &mut broadcast::Receiver<PlaybackEvent>) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return events,
                Err(TryRecvError::Lagged(n)) => panic!("lagged by {}", n),
            }
        }
    }

    #[test]
    fn test_new_requires_runtime() {
        let err = PlaybackEngine::new(workout(1, 1.0, 1.0), EventBus::new(8)).err().unwrap();
        assert!(matches!(err, Error::Runtime(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_emits_session_started() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let engine = PlaybackEngine::new(workout(2, 1.0, 2.0), bus).unwrap();

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        match &events[0] {
            PlaybackEvent::SessionStarted { workout_name, snapshot, .. } => {
                assert_eq!(workout_name, "Test");
                assert_eq!(snapshot.phase, Phase::RestingBeforeSet);
                assert_eq!(snapshot.display_time, "0.0");
            }
            other => panic!("unexpected {}", other.event_type()),
        }
        assert!(!engine.has_active_timer());
    }

    #[tokio::test(start_paused = true)]
    async fn test_from_store_rejects_unknown_workout() {
        let store = InMemoryWorkoutStore::new();
        let result = PlaybackEngine::from_store(&store, Uuid::new_v4(), EventBus::new(8));
        assert!(matches!(
            result,
            Err(Error::Common(wkt_common::Error::NotFound(_)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_tick_is_not_observed_after_advance() {
        let bus = EventBus::new(64);
        let engine = PlaybackEngine::new(workout(2, 5.0, 5.0), bus.clone()).unwrap();
        engine.advance(); // Working, up-timer armed

        time::sleep(Duration::from_millis(250)).await;
        let mut rx = bus.subscribe();
        engine.advance(); // RestingBeforeSet, down-timer from 5.0

        time::sleep(Duration::from_millis(1000)).await;
        for event in drain(&mut rx) {
            assert_eq!(event.snapshot().phase, Phase::RestingBeforeSet);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_timer() {
        let bus = EventBus::new(64);
        let mut rx = bus.subscribe();
        let engine = PlaybackEngine::new(workout(1, 1.0, 1.0), bus).unwrap();
        engine.advance();
        drop(engine);

        let events = drain(&mut rx);
        assert!(events.last().unwrap().is_terminal());

        time::sleep(Duration::from_secs(1)).await;
        assert!(drain(&mut rx).is_empty());
    }
}
