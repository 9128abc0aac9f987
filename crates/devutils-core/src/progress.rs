//! Build progress tracker.
//!
//! Folds the host's build lifecycle events into elapsed time and a
//! completion fraction. Never fails: unknown totals report
//! `Progress::Indeterminate` and untimed builds report no elapsed time.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, trace};

use devutils_models::{BuildContext, BuildEvent, BuildScope};

/// Completion of the current build.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Progress {
    /// The number of projects is not known (yet).
    Indeterminate,
    /// Fraction of projects done, in `0.0..=1.0`.
    Fraction(f64),
}

/// Bookkeeping for one in-flight build. Replaced on every begin event.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ProgressState {
    /// Projects whose "should build" flag was set at build start.
    pub total_projects: usize,
    /// Per-project done events seen so far.
    pub completed_projects: usize,
    /// Set by any failed project; sticky until the next build.
    pub has_error: bool,
    /// Start of a solution-wide build; `None` when the build is not timed.
    pub started_at: Option<DateTime<Utc>>,
    /// Between a begin and the matching done.
    pub active: bool,
}

impl ProgressState {
    /// Returns the completion of this build.
    pub fn progress(&self) -> Progress {
        if self.total_projects == 0 {
            Progress::Indeterminate
        } else {
            Progress::Fraction(self.completed_projects as f64 / self.total_projects as f64)
        }
    }
}

/// Aggregates build events into [`ProgressState`].
#[derive(Debug, Default)]
pub struct BuildProgressTracker {
    state: ProgressState,
    last_elapsed: Option<Duration>,
}

impl BuildProgressTracker {
    /// Creates an idle tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current bookkeeping.
    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// Returns the current completion.
    pub fn progress(&self) -> Progress {
        self.state.progress()
    }

    /// Returns the elapsed time of the last timed build.
    pub fn last_elapsed(&self) -> Option<Duration> {
        self.last_elapsed
    }

    /// Applies one event. Returns the elapsed time when a timed solution
    /// build finished.
    pub fn apply(&mut self, event: &BuildEvent) -> Option<Duration> {
        match event {
            BuildEvent::BuildBegin {
                scope,
                contexts,
                at,
                ..
            } => {
                self.build_begin(*scope, contexts, *at);
                None
            }
            BuildEvent::ProjectBegin { project, .. } => {
                trace!(project = %project, "project build started");
                None
            }
            BuildEvent::ProjectDone {
                project, success, ..
            } => {
                trace!(project = %project, success, "project build done");
                self.project_done(*success);
                None
            }
            BuildEvent::BuildDone { scope, at, .. } => self.build_done(*scope, *at),
        }
    }

    /// Starts a new build, replacing the previous bookkeeping.
    ///
    /// Only solution-wide builds are timed.
    pub fn build_begin(&mut self, scope: BuildScope, contexts: &[BuildContext], at: DateTime<Utc>) {
        let total_projects = contexts.iter().filter(|c| c.should_build).count();
        let started_at = (scope == BuildScope::Solution).then_some(at);

        self.state = ProgressState {
            total_projects,
            completed_projects: 0,
            has_error: false,
            started_at,
            active: true,
        };

        debug!(scope = ?scope, total_projects, timed = started_at.is_some(), "build started");
    }

    /// Records one finished project.
    pub fn project_done(&mut self, success: bool) {
        let state = &mut self.state;
        if state.total_projects == 0 || state.completed_projects < state.total_projects {
            state.completed_projects += 1;
        }
        if !success {
            state.has_error = true;
        }
    }

    /// Finishes the build. Returns `None` if the build never started a
    /// timer (nothing was built, or it was not solution-wide).
    pub fn build_done(&mut self, scope: BuildScope, at: DateTime<Utc>) -> Option<Duration> {
        self.state.active = false;

        if scope != BuildScope::Solution {
            return None;
        }

        let started_at = self.state.started_at.take()?;
        let elapsed = (at - started_at).max(Duration::zero());
        self.last_elapsed = Some(elapsed);

        debug!(elapsed_ms = elapsed.num_milliseconds(), "build finished");
        Some(elapsed)
    }
}

/// Formats a duration as `hh:mm:ss.mmm`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_ms = elapsed.num_milliseconds().max(0);
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn contexts(n: usize) -> Vec<BuildContext> {
        (0..n).map(|i| BuildContext::new(format!("p{}", i))).collect()
    }

    #[test]
    fn test_total_counts_only_should_build() {
        let mut tracker = BuildProgressTracker::new();
        let mut ctx = contexts(3);
        ctx.push(BuildContext::skipped("docs"));

        tracker.build_begin(BuildScope::Solution, &ctx, t(0));
        assert_eq!(tracker.state().total_projects, 3);
        assert_eq!(tracker.progress(), Progress::Fraction(0.0));
    }

    #[test]
    fn test_fraction_and_bound() {
        let mut tracker = BuildProgressTracker::new();
        tracker.build_begin(BuildScope::Solution, &contexts(2), t(0));

        tracker.project_done(true);
        assert_eq!(tracker.progress(), Progress::Fraction(0.5));
        tracker.project_done(true);
        assert_eq!(tracker.progress(), Progress::Fraction(1.0));

        // Extra done events never push completed past total.
        tracker.project_done(true);
        assert_eq!(tracker.state().completed_projects, 2);
    }

    #[test]
    fn test_completed_is_monotonic() {
        let mut tracker = BuildProgressTracker::new();
        tracker.build_begin(BuildScope::Solution, &contexts(5), t(0));

        let mut last = 0;
        for success in [true, false, true, true, false, true] {
            tracker.project_done(success);
            let completed = tracker.state().completed_projects;
            assert!(completed >= last);
            assert!(completed <= tracker.state().total_projects);
            last = completed;
        }
    }

    #[test]
    fn test_error_is_sticky() {
        let mut tracker = BuildProgressTracker::new();
        tracker.build_begin(BuildScope::Solution, &contexts(3), t(0));

        tracker.project_done(false);
        assert!(tracker.state().has_error);
        tracker.project_done(true);
        tracker.project_done(true);
        assert!(tracker.state().has_error);

        // A new build starts clean.
        tracker.build_begin(BuildScope::Solution, &contexts(1), t(10));
        assert!(!tracker.state().has_error);
        assert_eq!(tracker.state().completed_projects, 0);
    }

    #[test]
    fn test_zero_total_is_indeterminate() {
        let mut tracker = BuildProgressTracker::new();
        assert_eq!(tracker.progress(), Progress::Indeterminate);

        tracker.build_begin(BuildScope::Solution, &[], t(0));
        tracker.project_done(true);
        assert_eq!(tracker.progress(), Progress::Indeterminate);
    }

    #[test]
    fn test_elapsed_reported_for_solution_build() {
        let mut tracker = BuildProgressTracker::new();
        tracker.apply(&BuildEvent::BuildBegin {
            scope: BuildScope::Solution,
            action: Default::default(),
            contexts: contexts(1),
            at: t(0),
        });
        let elapsed = tracker.apply(&BuildEvent::BuildDone {
            scope: BuildScope::Solution,
            action: Default::default(),
            at: t(75),
        });

        assert_eq!(elapsed, Some(Duration::seconds(75)));
        assert_eq!(tracker.last_elapsed(), Some(Duration::seconds(75)));
        assert!(tracker.state().started_at.is_none());
        assert!(!tracker.state().active);
    }

    #[test]
    fn test_no_begin_means_no_elapsed() {
        let mut tracker = BuildProgressTracker::new();
        assert_eq!(tracker.build_done(BuildScope::Solution, t(5)), None);

        // A finished build does not leak its start into the next done event.
        tracker.build_begin(BuildScope::Solution, &contexts(1), t(0));
        assert!(tracker.build_done(BuildScope::Solution, t(1)).is_some());
        assert_eq!(tracker.build_done(BuildScope::Solution, t(2)), None);
    }

    #[test]
    fn test_zero_elapsed_is_still_reported() {
        let mut tracker = BuildProgressTracker::new();
        tracker.build_begin(BuildScope::Solution, &contexts(1), t(3));
        assert_eq!(tracker.build_done(BuildScope::Solution, t(3)), Some(Duration::zero()));
    }

    #[test]
    fn test_project_scope_is_not_timed() {
        let mut tracker = BuildProgressTracker::new();
        tracker.build_begin(BuildScope::Project, &contexts(2), t(0));

        assert!(tracker.state().started_at.is_none());
        assert_eq!(tracker.state().total_projects, 2);
        assert_eq!(tracker.build_done(BuildScope::Solution, t(4)), None);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::milliseconds(0)), "00:00:00.000");
        assert_eq!(format_elapsed(Duration::milliseconds(3_723_045)), "01:02:03.045");
        assert_eq!(format_elapsed(Duration::milliseconds(-5)), "00:00:00.000");
    }
}
