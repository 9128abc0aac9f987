//! Build session: one "show generated output" request.
//!
//! A session runs Capturing -> Configuring -> Compiling -> Restoring ->
//! Locating and ends in Succeeded or Failed. Build-tool options mutated in
//! Configuring are held by an [`OptionsGuard`], so Restoring happens on
//! every path out of Compiling, including failure, panic and abandonment.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use devutils_core::{normalize_signature, OutputLocator};
use devutils_models::{
    AssemblerOutput, BuildEvent, BuildTarget, DocumentContext, LocateResult, OptionsSnapshot, OutputMode,
    PreprocessOutput, SessionId,
};

use crate::artifact;
use crate::config::SessionConfig;
use crate::error::{Result, SessionError, SessionErrorKind};
use crate::gate::SessionGate;
use crate::guard::OptionsGuard;
use crate::host::Host;
use crate::hub::BuildEventHub;

/// Title of the host error dialog for failed sessions.
pub const ERROR_DIALOG_TITLE: &str = "Error";

/// States of a build session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Reading cursor, function and code line from the host.
    Capturing,
    /// Saving and mutating build-tool options.
    Configuring,
    /// Compiling the active file.
    Compiling,
    /// Writing the saved options back.
    Restoring,
    /// Searching the artifact.
    Locating,
    /// Terminal: artifact opened.
    Succeeded,
    /// Terminal: see the returned [`SessionError`].
    Failed,
}

impl SessionState {
    /// Returns true for Succeeded and Failed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Succeeded | SessionState::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Capturing => "capturing",
            SessionState::Configuring => "configuring",
            SessionState::Compiling => "compiling",
            SessionState::Restoring => "restoring",
            SessionState::Locating => "locating",
            SessionState::Succeeded => "succeeded",
            SessionState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// What Capturing learned about the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Implementation file that gets compiled.
    pub file: PathBuf,
    /// Build target owning `file`.
    pub target: BuildTarget,
    /// Enclosing function at the cursor; empty if unknown.
    pub target_signature: String,
    /// Trimmed code line near the cursor.
    pub target_line: Option<String>,
}

/// Successful outcome of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedArtifact {
    /// Session that produced the artifact.
    pub session: SessionId,
    /// Artifact kind.
    pub mode: OutputMode,
    /// File opened in the host.
    pub path: PathBuf,
    /// File the compiler wrote. Differs from `path` for preprocessed output.
    pub raw_path: PathBuf,
    /// Anchor placed in the opened file.
    pub location: LocateResult,
}

/// Applies the option changes a mode needs to produce `artifact`.
pub fn configure_options(mode: OutputMode, options: &mut OptionsSnapshot, artifact: &Path) {
    match mode {
        OutputMode::Assembly => {
            // Whole-program optimization defers codegen to link time: no listing.
            options.whole_program_optimization = false;
            options.warn_as_error = false;
            options.assembler_output = AssemblerOutput::AsmWithSource;
            options.assembler_listing_location = Some(artifact.to_path_buf());
        }
        OutputMode::Preprocessed => {
            // No dedicated output option exists; the object path is reused.
            options.generate_preprocessed_file = PreprocessOutput::Yes;
            options.object_file = Some(artifact.to_path_buf());
        }
    }
}

/// One capture -> compile -> restore -> locate cycle.
pub struct BuildSession<'a, H: Host + ?Sized> {
    id: SessionId,
    mode: OutputMode,
    host: &'a H,
    hub: &'a BuildEventHub,
    gate: &'a SessionGate,
    config: &'a SessionConfig,
    state: SessionState,
    history: Vec<SessionState>,
    capture: Option<Capture>,
    artifact_path: Option<PathBuf>,
}

impl<'a, H: Host + ?Sized> BuildSession<'a, H> {
    /// Creates a session in the Capturing state.
    pub fn new(
        mode: OutputMode,
        host: &'a H,
        hub: &'a BuildEventHub,
        gate: &'a SessionGate,
        config: &'a SessionConfig,
    ) -> Self {
        Self {
            id: SessionId::new(),
            mode,
            host,
            hub,
            gate,
            config,
            state: SessionState::Capturing,
            history: Vec::new(),
            capture: None,
            artifact_path: None,
        }
    }

    /// Session ID.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Artifact kind.
    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Every state entered so far, in order.
    pub fn history(&self) -> &[SessionState] {
        &self.history
    }

    /// What Capturing recorded, once it finished.
    pub fn capture(&self) -> Option<&Capture> {
        self.capture.as_ref()
    }

    /// Path the compiler was asked to write to, once configured.
    pub fn artifact_path(&self) -> Option<&Path> {
        self.artifact_path.as_deref()
    }

    fn transition(&mut self, next: SessionState) {
        debug!(session = %self.id, from = %self.state, to = %next, "session transition");
        self.state = next;
        self.history.push(next);
    }

    /// Runs the session to a terminal state.
    ///
    /// Failures are also shown in the host's error dialog.
    pub async fn run(&mut self) -> Result<LocatedArtifact> {
        info!(session = %self.id, mode = %self.mode, "build session started");
        let outcome = self.drive().await;

        match &outcome {
            Ok(located) => {
                self.transition(SessionState::Succeeded);
                info!(
                    session = %self.id,
                    path = %located.path.display(),
                    function = located.location.function_anchor_found,
                    line = located.location.line_anchor_found,
                    "build session succeeded"
                );
            }
            Err(e) => {
                self.transition(SessionState::Failed);
                warn!(session = %self.id, kind = ?e.kind(), error = %e, "build session failed");
                self.host.show_error_dialog(&e.message, ERROR_DIALOG_TITLE);
            }
        }
        outcome
    }

    async fn drive(&mut self) -> Result<LocatedArtifact> {
        self.transition(SessionState::Capturing);
        let capture = self.capture_context()?;
        self.capture = Some(capture.clone());

        self.transition(SessionState::Configuring);
        let permit = self.gate.try_acquire(&capture.target)?;
        fs::create_dir_all(&self.config.artifact_dir)?;
        let artifact = artifact::artifact_path(&self.config.artifact_dir, &self.id, self.mode);
        self.artifact_path = Some(artifact.clone());

        let mode = self.mode;
        let acquired = OptionsGuard::acquire(self.host, &capture.file, &capture.target, |options| {
            configure_options(mode, options, &artifact)
        });
        let guard = match acquired {
            Ok(guard) => guard,
            Err(e) => {
                // A partial write was already rolled back by the guard's drop.
                self.transition(SessionState::Restoring);
                return Err(e.into());
            }
        };

        self.transition(SessionState::Compiling);
        let compiled = self.compile(&capture).await;

        self.transition(SessionState::Restoring);
        let restored = guard.restore();
        drop(permit);

        compiled?;
        restored?;

        self.transition(SessionState::Locating);
        self.locate(&capture, &artifact)
    }

    /// Capturing: code line and function first, then the header switch.
    fn capture_context(&self) -> Result<Capture> {
        let document = self.host.active_document()?;
        let target_line = self.probe_code_line(&document)?;

        let target_signature = match document.enclosing_function.as_deref() {
            Some(signature) if !signature.trim().is_empty() => signature.trim().to_string(),
            _ => {
                self.host
                    .report_status("Warning: could not get function object from the IDE.");
                String::new()
            }
        };

        let document = if self.config.is_header(&document.path) {
            self.switch_to_implementation(&document.path)?
        } else {
            document
        };

        let target = document.target.clone().ok_or_else(|| {
            SessionError::new(
                SessionErrorKind::NotInProject,
                format!(
                    "{} is not recognized as part of any project",
                    document.path.display()
                ),
            )
        })?;

        debug!(
            file = %document.path.display(),
            target = %target,
            signature = %target_signature,
            "captured cursor context"
        );

        Ok(Capture {
            file: document.path,
            target,
            target_signature,
            target_line: Some(target_line),
        })
    }

    /// Finds a non-blank line around the cursor.
    fn probe_code_line(&self, document: &DocumentContext) -> Result<String> {
        for offset in &self.config.line_probe_offsets {
            let Some(line) = document.cursor_line.checked_add_signed(*offset) else {
                continue;
            };
            if line == 0 {
                continue;
            }
            if let Some(text) = self.host.line_text(&document.path, line)? {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    debug!(line, offset, "usable source line found");
                    return Ok(trimmed.to_string());
                }
            }
        }

        Err(SessionError::new(
            SessionErrorKind::NoUsableSourceLine,
            "Choose a distinctive line of code inside a function or the function definition itself.",
        ))
    }

    fn switch_to_implementation(&self, header: &Path) -> Result<DocumentContext> {
        let sibling = self
            .host
            .switch_to_sibling_file(header, &self.config.implementation_extensions)?;

        match sibling {
            Some(path) => {
                debug!(
                    header = %header.display(),
                    implementation = %path.display(),
                    "switched to implementation file"
                );
                Ok(self.host.active_document()?)
            }
            None => Err(SessionError::new(
                SessionErrorKind::NoImplementationFile,
                "Please open a cpp file calling this code and re-run.",
            )),
        }
    }

    /// Compiling: the single-file primitive, else a project build.
    async fn compile(&self, capture: &Capture) -> Result<()> {
        match self.host.compile_single_file(&capture.file) {
            Ok(true) => return Ok(()),
            Ok(false) => return Err(compile_failed(&capture.file)),
            Err(e) => {
                debug!(error = %e, "single-file compile unavailable, building project");
            }
        }

        let success = self.build_project(&capture.target).await?;
        if success {
            Ok(())
        } else {
            Err(compile_failed(&capture.file))
        }
    }

    /// Triggers a project build and waits for its done event.
    ///
    /// Gives up when the host abandons its builds through
    /// [`BuildEventHub::abandon_builds`] or when the timeout elapses.
    async fn build_project(&self, target: &BuildTarget) -> Result<bool> {
        let mut events = self.hub.subscribe();
        let mut abandoned = self.hub.watch_abandoned();
        abandoned.borrow_and_update();
        self.host.trigger_project_build(target)?;

        let wait = async {
            loop {
                tokio::select! {
                    biased;
                    received = events.recv() => match received {
                        Ok(BuildEvent::ProjectDone {
                            project, success, ..
                        }) if project == target.project => return Ok(success),
                        Ok(_) => continue,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "session lagged behind build events");
                        }
                        Err(RecvError::Closed) => return Err(build_abandoned(target)),
                    },
                    _ = abandoned.changed() => return Err(build_abandoned(target)),
                }
            }
        };

        match tokio::time::timeout(self.config.compile_timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(SessionError::new(
                SessionErrorKind::CompileFailed,
                format!(
                    "Timed out after {}s waiting for {} to build",
                    self.config.compile_timeout.as_secs(),
                    target
                ),
            )),
        }
    }

    /// Locating: never fails on missing anchors, only on a missing artifact.
    fn locate(&self, capture: &Capture, artifact: &Path) -> Result<LocatedArtifact> {
        if !artifact.exists() {
            return Err(SessionError::new(
                SessionErrorKind::ArtifactMissing,
                format!("Could not find expected output file\n{}", artifact.display()),
            ));
        }

        let path = match self.mode {
            OutputMode::Assembly => artifact.to_path_buf(),
            OutputMode::Preprocessed => {
                artifact::strip_empty_lines(artifact, &self.config.artifact_dir)?
            }
        };

        let bytes = fs::read(&path).map_err(|e| {
            SessionError::new(
                SessionErrorKind::ArtifactMissing,
                format!("Could not read output file {}: {}", path.display(), e),
            )
        })?;

        let location = OutputLocator::new(self.mode).locate_bytes(
            &bytes,
            &capture.target_signature,
            capture.target_line.as_deref(),
        );

        if !location.function_anchor_found
            && self.mode == OutputMode::Assembly
            && !capture.target_signature.is_empty()
        {
            self.host.report_status(&format!(
                "Couldn't find function '{}'",
                normalize_signature(&capture.target_signature)
            ));
        }

        if let Err(e) = self.host.open_artifact(&path, &location) {
            warn!(path = %path.display(), error = %e, "could not open artifact");
        }

        Ok(LocatedArtifact {
            session: self.id.clone(),
            mode: self.mode,
            path,
            raw_path: artifact.to_path_buf(),
            location,
        })
    }
}

fn build_abandoned(target: &BuildTarget) -> SessionError {
    SessionError::new(
        SessionErrorKind::CompileFailed,
        format!("The build of {} was abandoned", target),
    )
}

fn compile_failed(file: &Path) -> SessionError {
    SessionError::new(
        SessionErrorKind::CompileFailed,
        format!("Compilation of {} failed", file.display()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_assembly() {
        let mut options = OptionsSnapshot {
            whole_program_optimization: true,
            warn_as_error: true,
            ..Default::default()
        };
        configure_options(OutputMode::Assembly, &mut options, Path::new("/tmp/x.asm"));

        assert!(!options.whole_program_optimization);
        assert!(!options.warn_as_error);
        assert_eq!(options.assembler_output, AssemblerOutput::AsmWithSource);
        assert_eq!(options.assembler_listing_location, Some(PathBuf::from("/tmp/x.asm")));
        assert_eq!(options.generate_preprocessed_file, PreprocessOutput::No);
    }

    #[test]
    fn test_configure_preprocessed() {
        let mut options = OptionsSnapshot::default();
        configure_options(OutputMode::Preprocessed, &mut options, Path::new("/tmp/x.cpp"));

        assert_eq!(options.generate_preprocessed_file, PreprocessOutput::Yes);
        assert_eq!(options.object_file, Some(PathBuf::from("/tmp/x.cpp")));
        assert_eq!(options.assembler_output, AssemblerOutput::NoListing);
    }

    #[test]
    fn test_terminal_states() {
        assert!(SessionState::Succeeded.is_terminal());
        assert!(SessionState::Failed.is_terminal());
        assert!(!SessionState::Restoring.is_terminal());
    }
}
