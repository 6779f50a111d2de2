//! Periodic tick timer for work and rest phases
//!
//! A timer is a tokio task that wakes every [`TICK_INTERVAL`] and reports the
//! next readout to a callback. It has no end condition of its own: it runs
//! until the callback returns `ControlFlow::Break` or the handle is cancelled.
//!
//! Tick `n` fires `n × period` after the timer is armed and carries
//! `start ± 0.1·n`. The value for `n = 0` is the start value itself, which the
//! caller publishes when the phase begins.

use std::ops::ControlFlow;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::trace;
use wkt_common::DisplayTime;

/// Spacing between ticks; each tick moves the readout by 0.1s
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Direction the readout moves on each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Elapsed time during a set
    Up,
    /// Remaining rest; keeps going below zero
    Down,
}

impl TimerKind {
    /// Tenths added per tick
    pub fn step(self) -> i64 {
        match self {
            TimerKind::Up => 1,
            TimerKind::Down => -1,
        }
    }

    /// Readout after `n` ticks
    pub fn value_at(self, start: DisplayTime, n: u64) -> DisplayTime {
        let n = i64::try_from(n).unwrap_or(i64::MAX);
        start.offset(self.step().saturating_mul(n))
    }
}

/// Which timer a phase needs and where it starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSpec {
    pub kind: TimerKind,
    pub start: DisplayTime,
}

impl TimerSpec {
    pub fn up_from(start: DisplayTime) -> Self {
        Self {
            kind: TimerKind::Up,
            start,
        }
    }

    pub fn down_from(start: DisplayTime) -> Self {
        Self {
            kind: TimerKind::Down,
            start,
        }
    }
}

/// Cancellable handle to a running tick task
///
/// Dropping the handle cancels the task as well.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
    spec: TimerSpec,
}

impl TimerHandle {
    /// Abort the tick task
    ///
    /// Abort takes effect at the task's next await point. A tick already
    /// inside its callback still completes, so consumers that must never see
    /// a late tick gate the callback on their own state as well.
    pub fn cancel(self) {
        trace!("Cancelling {:?} timer", self.spec.kind);
        self.task.abort();
    }

    /// Whether the task has exited (cancelled or stopped by its callback)
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Arm a timer on `runtime`
///
/// The first tick is scheduled one `period` from now; `on_tick` receives the
/// readout for ticks 1, 2, 3, ...
pub fn spawn_ticker<F>(
    runtime: &Handle,
    spec: TimerSpec,
    period: Duration,
    mut on_tick: F,
) -> TimerHandle
where
    F: FnMut(DisplayTime) -> ControlFlow<()> + Send + 'static,
{
    // Anchor on the runtime's clock so a paused test clock is honoured
    let first_tick = {
        let _guard = runtime.enter();
        Instant::now() + period
    };

    let task = runtime.spawn(async move {
        let mut interval = time::interval_at(first_tick, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut n: u64 = 0;
        loop {
            interval.tick().await;
            n += 1;
            if on_tick(spec.kind.value_at(spec.start, n)).is_break() {
                trace!("Timer stopped by consumer after {} ticks", n);
                break;
            }
        }
    });

    TimerHandle { task, spec }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn collector() -> (
        Arc<Mutex<Vec<i64>>>,
        impl FnMut(DisplayTime) -> ControlFlow<()> + Send + 'static,
    ) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |value: DisplayTime| {
            sink.lock().unwrap().push(value.tenths());
            ControlFlow::Continue(())
        })
    }

    #[test]
    fn test_value_at() {
        let start = DisplayTime::from_tenths(10);
        assert_eq!(TimerKind::Up.value_at(start, 0), start);
        assert_eq!(TimerKind::Up.value_at(start, 3).tenths(), 13);
        assert_eq!(TimerKind::Down.value_at(start, 3).tenths(), 7);
        assert_eq!(TimerKind::Down.value_at(start, 12).tenths(), -2);
        assert_eq!(TimerKind::Up.value_at(start, u64::MAX).tenths(), i64::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn test_up_timer_ticks_every_100ms() {
        let (seen, sink) = collector();
        let handle = spawn_ticker(
            &Handle::current(),
            TimerSpec::up_from(DisplayTime::ZERO),
            TICK_INTERVAL,
            sink,
        );

        time::sleep(Duration::from_millis(50)).await;
        assert!(seen.lock().unwrap().is_empty());

        time::sleep(Duration::from_millis(100)).await; // t = 150ms
        assert_eq!(*seen.lock().unwrap(), vec![1]);

        time::sleep(Duration::from_millis(200)).await; // t = 350ms
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);

        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_down_timer_runs_past_zero() {
        let (seen, sink) = collector();
        let handle = spawn_ticker(
            &Handle::current(),
            TimerSpec::down_from(DisplayTime::from_tenths(2)),
            TICK_INTERVAL,
            sink,
        );

        time::sleep(Duration::from_millis(450)).await;
        assert_eq!(*seen.lock().unwrap(), vec![1, 0, -1, -2]);
        assert!(!handle.is_finished());
        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticks() {
        let (seen, sink) = collector();
        let handle = spawn_ticker(
            &Handle::current(),
            TimerSpec::up_from(DisplayTime::ZERO),
            TICK_INTERVAL,
            sink,
        );

        time::sleep(Duration::from_millis(250)).await;
        handle.cancel();
        time::sleep(Duration::from_secs(2)).await;

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let (seen, sink) = collector();
        drop(spawn_ticker(
            &Handle::current(),
            TimerSpec::up_from(DisplayTime::ZERO),
            TICK_INTERVAL,
            sink,
        ));

        time::sleep(Duration::from_secs(1)).await;
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_break_ends_task() {
        let mut count = 0;
        let handle = spawn_ticker(
            &Handle::current(),
            TimerSpec::up_from(DisplayTime::ZERO),
            TICK_INTERVAL,
            move |_| {
                count += 1;
                if count == 2 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            },
        );

        time::sleep(Duration::from_millis(500)).await;
        assert!(handle.is_finished());
    }
}
