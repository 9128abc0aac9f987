//! Runtime: the long-lived owner of host, monitor and session plumbing.

use std::sync::{Arc, Mutex, MutexGuard};

use devutils_core::{ProgressReport, ProgressState};
use devutils_models::{BuildEvent, Diagnostic, OutputMode};
use tracing::info;

use crate::config::SessionConfig;
use crate::error::Result;
use crate::gate::SessionGate;
use crate::host::Host;
use crate::hub::BuildEventHub;
use crate::monitor::BuildMonitor;
use crate::session::{BuildSession, LocatedArtifact};

/// Entry point for a host integration.
///
/// The host forwards every build event to [`Runtime::dispatch`] and invokes
/// [`Runtime::show_output`] for the two user commands. Sessions may run
/// concurrently on different build targets.
pub struct Runtime<H: Host> {
    host: Arc<H>,
    monitor: Mutex<BuildMonitor>,
    hub: BuildEventHub,
    gate: SessionGate,
    config: SessionConfig,
}

impl<H: Host> Runtime<H> {
    /// Creates a runtime with a fresh event hub.
    pub fn new(host: Arc<H>, config: SessionConfig) -> Self {
        Self::with_hub(host, config, BuildEventHub::default())
    }

    /// Creates a runtime publishing on an existing hub.
    pub fn with_hub(host: Arc<H>, config: SessionConfig, hub: BuildEventHub) -> Self {
        info!(artifact_dir = %config.artifact_dir.display(), "runtime created");
        Self {
            host,
            monitor: Mutex::new(BuildMonitor::new(hub.clone())),
            hub,
            gate: SessionGate::new(),
            config,
        }
    }

    /// The host.
    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    /// The event hub sessions wait on.
    pub fn hub(&self) -> &BuildEventHub {
        &self.hub
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn monitor(&self) -> MutexGuard<'_, BuildMonitor> {
        self.monitor.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Handles one build event from the host.
    pub fn dispatch(&self, event: BuildEvent) {
        self.monitor().dispatch(self.host.as_ref(), event);
    }

    /// Tells sessions waiting on a project build that it will not finish.
    pub fn abandon_builds(&self) {
        self.hub.abandon_builds();
    }

    /// Runs one "show generated output" session.
    pub async fn show_output(&self, mode: OutputMode) -> Result<LocatedArtifact> {
        let mut session = BuildSession::new(
            mode,
            self.host.as_ref(),
            &self.hub,
            &self.gate,
            &self.config,
        );
        session.run().await
    }

    /// Snapshot of the build progress.
    pub fn progress(&self) -> ProgressState {
        self.monitor().tracker().state().clone()
    }

    /// Current taskbar report.
    pub fn progress_report(&self) -> ProgressReport {
        self.monitor().progress_report()
    }

    /// Diagnostics reported so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.monitor().tasks().iter().cloned().collect()
    }

    /// Re-scans the build output outside of a build-done event.
    pub fn rescan_diagnostics(&self) -> Vec<Diagnostic> {
        self.monitor().collect_diagnostics(self.host.as_ref())
    }
}
