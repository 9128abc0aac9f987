//! Host backed by the local filesystem and a command-line compiler.
//!
//! `LocalHost` stands in for the IDE: the "active document" is a file given
//! on the command line, build-tool options translate to compiler flags, and
//! status/dialog output goes to the terminal.
//!
//! Listings are produced with `-S -fverbose-asm`. GCC then annotates the
//! assembly with the source lines it came from, so line anchors work. The
//! `PROC ; <function>` header is MSVC listing syntax; GCC and Clang output
//! never contains it, so function anchors only match MSVC-style listings.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use devutils_core::{ProgressReport, TaskbarState};
use devutils_models::{
    AssemblerOutput, BuildEvent, BuildTarget, Diagnostic, DocumentContext, LocateResult,
    OptionsSnapshot, PreprocessOutput,
};
use devutils_runtime::{BuildEventHub, Host, HostError, HostResult};
use tracing::{debug, info};

use crate::error::{CliError, Result};

/// Compilers probed on `PATH` when none is given.
pub const DEFAULT_COMPILERS: &[&str] = &["c++", "g++", "clang++", "cc"];

/// Resolves the compiler executable.
pub fn resolve_compiler(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(compiler) = explicit {
        return which::which(compiler)
            .map_err(|e| CliError::CompilerNotFound(format!("{}: {}", compiler.display(), e)));
    }

    DEFAULT_COMPILERS
        .iter()
        .find_map(|name| which::which(name).ok())
        .ok_or_else(|| CliError::CompilerNotFound(DEFAULT_COMPILERS.join(", ")))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Terminal host for one document.
pub struct LocalHost {
    document: Mutex<Option<DocumentContext>>,
    compiler: Option<PathBuf>,
    options: Mutex<OptionsSnapshot>,
    build_output: Mutex<String>,
    opened: Mutex<Option<(PathBuf, LocateResult)>>,
    hub: Option<BuildEventHub>,
    quiet: bool,
}

impl LocalHost {
    /// Creates a host with `document` active, compiling with `compiler`.
    pub fn new(document: DocumentContext, compiler: impl Into<PathBuf>) -> Self {
        Self {
            document: Mutex::new(Some(document)),
            compiler: Some(compiler.into()),
            options: Mutex::new(OptionsSnapshot::default()),
            build_output: Mutex::new(String::new()),
            opened: Mutex::new(None),
            hub: None,
            quiet: false,
        }
    }

    /// Creates a host with no document that serves a recorded build log.
    pub fn for_replay(build_output: impl Into<String>) -> Self {
        Self {
            document: Mutex::new(None),
            compiler: None,
            options: Mutex::new(OptionsSnapshot::default()),
            build_output: Mutex::new(build_output.into()),
            opened: Mutex::new(None),
            hub: None,
            quiet: false,
        }
    }

    /// Publishes project build events on `hub`.
    pub fn with_hub(mut self, hub: BuildEventHub) -> Self {
        self.hub = Some(hub);
        self
    }

    /// Suppresses terminal output.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Current options.
    pub fn options(&self) -> OptionsSnapshot {
        lock(&self.options).clone()
    }

    /// Last artifact opened.
    pub fn opened(&self) -> Option<(PathBuf, LocateResult)> {
        lock(&self.opened).clone()
    }

    /// Compiler flags for the current options.
    pub fn compiler_args(options: &OptionsSnapshot) -> Vec<String> {
        let mut args = Vec::new();

        if options.generate_preprocessed_file != PreprocessOutput::No {
            args.push("-E".to_string());
            if options.generate_preprocessed_file == PreprocessOutput::WithoutLineNumbers {
                args.push("-P".to_string());
            }
            if let Some(out) = &options.object_file {
                args.push("-o".to_string());
                args.push(out.display().to_string());
            }
        } else if options.assembler_output != AssemblerOutput::NoListing {
            args.push("-S".to_string());
            args.push("-fverbose-asm".to_string());
            if let Some(out) = &options.assembler_listing_location {
                args.push("-o".to_string());
                args.push(out.display().to_string());
            }
        } else {
            args.push("-fsyntax-only".to_string());
        }

        if options.whole_program_optimization {
            args.push("-flto".to_string());
        }
        if options.warn_as_error {
            args.push("-Werror".to_string());
        }
        args
    }

    fn run_compiler(&self, file: &Path) -> HostResult<bool> {
        let compiler = self
            .compiler
            .as_ref()
            .ok_or_else(|| HostError::Unsupported("compiling without a compiler".to_string()))?;
        let args = Self::compiler_args(&self.options());

        debug!(compiler = %compiler.display(), args = ?args, file = %file.display(), "running compiler");
        let output = Command::new(compiler)
            .args(&args)
            .arg(file)
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                    HostError::ToolUnavailable(format!("{}: {}", compiler.display(), e))
                }
                _ => HostError::Io(e),
            })?;

        let mut log = lock(&self.build_output);
        log.push_str(&String::from_utf8_lossy(&output.stdout));
        log.push_str(&String::from_utf8_lossy(&output.stderr));

        info!(file = %file.display(), success = output.status.success(), "compiler finished");
        Ok(output.status.success())
    }
}

impl Host for LocalHost {
    fn active_document(&self) -> HostResult<DocumentContext> {
        lock(&self.document)
            .clone()
            .ok_or_else(|| HostError::NotFound("no active document".to_string()))
    }

    fn line_text(&self, path: &Path, line: usize) -> HostResult<Option<String>> {
        if line == 0 {
            return Ok(None);
        }
        let text = fs::read(path)?;
        let text = String::from_utf8_lossy(&text);
        Ok(text.lines().nth(line - 1).map(str::to_string))
    }

    fn switch_to_sibling_file(
        &self,
        header: &Path,
        extensions: &[String],
    ) -> HostResult<Option<PathBuf>> {
        let Some(sibling) = extensions
            .iter()
            .map(|ext| header.with_extension(ext))
            .find(|candidate| candidate.is_file())
        else {
            return Ok(None);
        };

        let mut document = lock(&self.document);
        if let Some(current) = document.as_mut() {
            current.path = sibling.clone();
            current.cursor_line = 1;
        }
        debug!(sibling = %sibling.display(), "switched document");
        Ok(Some(sibling))
    }

    fn build_tool_options(&self, _file: &Path, _target: &BuildTarget) -> HostResult<OptionsSnapshot> {
        Ok(self.options())
    }

    fn set_build_tool_options(
        &self,
        _file: &Path,
        _target: &BuildTarget,
        options: &OptionsSnapshot,
    ) -> HostResult<()> {
        *lock(&self.options) = options.clone();
        Ok(())
    }

    fn compile_single_file(&self, file: &Path) -> HostResult<bool> {
        self.run_compiler(file)
    }

    fn trigger_project_build(&self, target: &BuildTarget) -> HostResult<()> {
        let hub = self
            .hub
            .as_ref()
            .ok_or_else(|| HostError::Unsupported("project builds".to_string()))?;
        let document = self.active_document()?;

        hub.publish(BuildEvent::ProjectBegin {
            project: target.project.clone(),
            project_config: target.configuration.clone(),
            platform: target.platform.clone(),
            solution_config: target.configuration.clone(),
            at: Utc::now(),
        });
        let success = self.run_compiler(&document.path)?;
        hub.publish(BuildEvent::project_done(&target.project, success));
        Ok(())
    }

    fn aggregated_build_output(&self) -> HostResult<String> {
        Ok(lock(&self.build_output).clone())
    }

    fn open_artifact(&self, path: &Path, location: &LocateResult) -> HostResult<()> {
        if !self.quiet {
            println!("{}:{}", path.display(), location.cursor_line);
        }
        *lock(&self.opened) = Some((path.to_path_buf(), *location));
        Ok(())
    }

    fn report_status(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}", message);
        }
    }

    fn report_diagnostic(&self, diagnostic: &Diagnostic) {
        if !self.quiet {
            println!("{}", diagnostic);
        }
    }

    fn show_error_dialog(&self, message: &str, title: &str) {
        // The failed session's error is printed once, by `main`.
        debug!(title, message, "error dialog");
    }

    fn append_build_output(&self, text: &str) {
        lock(&self.build_output).push_str(text);
    }

    fn update_progress(&self, report: &ProgressReport) {
        if self.quiet {
            return;
        }
        match report.state {
            TaskbarState::Normal => eprintln!("[{:>3.0}%]", report.value * 100.0),
            TaskbarState::Error => eprintln!("[{:>3.0}%] errors", report.value * 100.0),
            TaskbarState::Indeterminate | TaskbarState::None => {}
        }
    }
}
