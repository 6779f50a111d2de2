//! Text rendering of playback snapshots
//!
//! While a workout runs the readout is `exercise  sets  time  label`; once it
//! has finished only "Workout finished" is shown.

use wkt_common::events::PlaybackSnapshot;

/// One-line status for a snapshot
pub fn status_line(snapshot: &PlaybackSnapshot) -> String {
    if snapshot.finished {
        return snapshot.phase_label.clone();
    }
    format!(
        "{}  {}  {:>6}  {}",
        snapshot.exercise_name,
        snapshot.set_progress(),
        snapshot.display_time,
        snapshot.phase_label
    )
}

/// Prompt shown under the status line; None once there is nothing to advance
pub fn control_hint(snapshot: &PlaybackSnapshot) -> Option<&'static str> {
    if snapshot.finished {
        None
    } else {
        Some("[Enter] next")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::SessionState;
    use std::time::Duration;
    use wkt_common::events::Phase;
    use wkt_common::{DisplayTime, Exercise, Workout};

    #[test]
    fn test_status_line_while_working() {
        let workout = Workout::new(
            "Back",
            vec![Exercise::new("Deadlift", 5, Duration::from_secs(90), Duration::from_secs(180))],
        );
        let mut state = SessionState::new();
        state.advance(&workout);
        state.apply_tick(DisplayTime::from_tenths(123));

        let snapshot = state.snapshot(&workout);
        assert_eq!(snapshot.phase, Phase::Working);
        assert_eq!(status_line(&snapshot), "Deadlift  1/5    12.3  Working out");
        assert_eq!(control_hint(&snapshot), Some("[Enter] next"));
    }

    #[test]
    fn test_status_line_negative_rest() {
        let workout = Workout::new(
            "Back",
            vec![Exercise::new("Rows", 2, Duration::from_secs(1), Duration::from_secs(1))],
        );
        let mut state = SessionState::new();
        state.advance(&workout);
        state.advance(&workout);
        state.apply_tick(DisplayTime::from_tenths(-4));

        let line = status_line(&state.snapshot(&workout));
        assert_eq!(line, "Rows  1/2    -0.4  Resting");
    }

    #[test]
    fn test_finished_shows_only_label() {
        let workout = Workout::new(
            "Quick",
            vec![Exercise::new("Jumps", 1, Duration::ZERO, Duration::ZERO)],
        );
        let mut state = SessionState::new();
        for _ in 0..3 {
            state.advance(&workout);
        }

        let snapshot = state.snapshot(&workout);
        assert_eq!(status_line(&snapshot), "Workout finished");
        assert_eq!(control_hint(&snapshot), None);
    }
}
