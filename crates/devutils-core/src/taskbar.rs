//! Taskbar progress indicator derived from tracker state.

use serde::Serialize;

use crate::progress::{Progress, ProgressState};

/// Visual state of a taskbar progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskbarState {
    /// No progress shown.
    #[default]
    None,
    /// Busy without a known fraction.
    Indeterminate,
    /// Regular progress bar.
    Normal,
    /// A project failed. Always shown while the build runs.
    Error,
}

/// What the host's taskbar widget should display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct ProgressReport {
    /// Indicator style.
    pub state: TaskbarState,
    /// Fill in `0.0..=1.0`.
    pub value: f64,
}

impl ProgressReport {
    /// Maps tracker state to a taskbar report.
    ///
    /// A failed build is always indicated; otherwise an active build shows
    /// either a fraction or an indeterminate bar. Idle builds reset to none.
    pub fn from_state(state: &ProgressState) -> Self {
        let value = match state.progress() {
            Progress::Fraction(f) => f,
            Progress::Indeterminate => 0.0,
        };

        if state.has_error {
            return Self {
                state: TaskbarState::Error,
                value,
            };
        }
        if !state.active {
            return Self::default();
        }
        match state.progress() {
            Progress::Indeterminate => Self {
                state: TaskbarState::Indeterminate,
                value: 0.0,
            },
            Progress::Fraction(f) => Self {
                state: TaskbarState::Normal,
                value: f,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(total: usize, completed: usize, has_error: bool, active: bool) -> ProgressState {
        ProgressState {
            total_projects: total,
            completed_projects: completed,
            has_error,
            started_at: None,
            active,
        }
    }

    #[test]
    fn test_idle_resets() {
        let report = ProgressReport::from_state(&state(4, 4, false, false));
        assert_eq!(report, ProgressReport::default());
    }

    #[test]
    fn test_active_without_total_is_indeterminate() {
        let report = ProgressReport::from_state(&state(0, 0, false, true));
        assert_eq!(report.state, TaskbarState::Indeterminate);
    }

    #[test]
    fn test_active_fraction() {
        let report = ProgressReport::from_state(&state(4, 1, false, true));
        assert_eq!(report.state, TaskbarState::Normal);
        assert_eq!(report.value, 0.25);
    }

    #[test]
    fn test_error_wins() {
        let report = ProgressReport::from_state(&state(4, 2, true, true));
        assert_eq!(report.state, TaskbarState::Error);
        assert_eq!(report.value, 0.5);

        let finished = ProgressReport::from_state(&state(4, 4, true, false));
        assert_eq!(finished.state, TaskbarState::Error);
    }
}
