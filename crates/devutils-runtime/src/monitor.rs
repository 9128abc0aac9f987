//! Build monitor: the per-event glue between host, tracker and diagnostics.

use devutils_core::{format_elapsed, BuildProgressTracker, DiagnosticExtractor, ProgressReport, TaskList};
use devutils_models::{BuildEvent, BuildScope, Diagnostic};
use tracing::{debug, info, warn};

use crate::host::Host;
use crate::hub::BuildEventHub;

/// Consumes host build events in delivery order.
///
/// For every event the monitor updates the progress tracker, feeds the
/// host's status bar and taskbar, and then republishes the event on the
/// hub for any waiting session. After each finished build it scans the
/// build output for compiler remarks.
#[derive(Debug)]
pub struct BuildMonitor {
    tracker: BuildProgressTracker,
    extractor: DiagnosticExtractor,
    tasks: TaskList,
    hub: BuildEventHub,
}

impl BuildMonitor {
    /// Creates a monitor publishing on `hub`.
    pub fn new(hub: BuildEventHub) -> Self {
        Self {
            tracker: BuildProgressTracker::new(),
            extractor: DiagnosticExtractor::default(),
            tasks: TaskList::new(),
            hub,
        }
    }

    /// Replaces the remark extractor.
    pub fn with_extractor(mut self, extractor: DiagnosticExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// The progress tracker.
    pub fn tracker(&self) -> &BuildProgressTracker {
        &self.tracker
    }

    /// Diagnostics reported so far.
    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    /// Current taskbar report.
    pub fn progress_report(&self) -> ProgressReport {
        ProgressReport::from_state(self.tracker.state())
    }

    /// Handles one event from the host.
    pub fn dispatch<H: Host + ?Sized>(&mut self, host: &H, event: BuildEvent) {
        debug!(event = ?event, "dispatching build event");
        let elapsed = self.tracker.apply(&event);

        match &event {
            BuildEvent::ProjectBegin {
                project,
                project_config,
                platform,
                ..
            } => {
                host.report_status(&format!("Building {} ({}|{})", project, project_config, platform));
            }
            BuildEvent::ProjectDone {
                project, success, ..
            } => {
                let outcome = if *success { "succeeded" } else { "failed" };
                host.report_status(&format!("{} finished: {}", project, outcome));
            }
            BuildEvent::BuildDone { scope, .. } => {
                if let Some(elapsed) = elapsed {
                    let msg = format!("Total build time: {}", format_elapsed(elapsed));
                    info!(scope = ?scope, "{}", msg);
                    host.append_build_output(&format!("\n{}", msg));
                    host.report_status(&msg);
                } else if *scope == BuildScope::Solution {
                    debug!("build finished without a recorded start; nothing was built");
                }
                self.collect_diagnostics(host);
            }
            BuildEvent::BuildBegin { .. } => {}
        }

        host.update_progress(&self.progress_report());
        self.hub.publish(event);
    }

    /// Scans the aggregated build output and reports new diagnostics.
    ///
    /// Returns the diagnostics that were new.
    pub fn collect_diagnostics<H: Host + ?Sized>(&mut self, host: &H) -> Vec<Diagnostic> {
        let output = match host.aggregated_build_output() {
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, "could not read build output");
                return Vec::new();
            }
        };

        let mut fresh = Vec::new();
        for diagnostic in self.extractor.extract(&output) {
            if self.tasks.add(diagnostic.clone()) {
                host.report_diagnostic(&diagnostic);
                fresh.push(diagnostic);
            }
        }

        if !fresh.is_empty() {
            info!(count = fresh.len(), "reported compiler remarks");
        }
        fresh
    }
}
