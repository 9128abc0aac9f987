//! The host collaborator contract.
//!
//! The engine never reaches into an IDE directly. Everything it needs from
//! the editor, the build system and the UI goes through [`Host`].

use std::path::{Path, PathBuf};

use devutils_core::ProgressReport;
use devutils_models::{BuildTarget, Diagnostic, DocumentContext, LocateResult, OptionsSnapshot};

use crate::error::{HostError, HostResult};

/// Trait implemented by every host binding.
///
/// Methods take `&self`; implementations use interior mutability where
/// they keep state.
pub trait Host: Send + Sync {
    /// Returns the active document, cursor and enclosing function.
    fn active_document(&self) -> HostResult<DocumentContext>;

    /// Returns the text of a 1-based line, or `None` outside the document.
    fn line_text(&self, path: &Path, line: usize) -> HostResult<Option<String>>;

    /// Opens the first existing sibling of `path` with one of `extensions`
    /// (probed in order) and makes it the active document.
    fn switch_to_sibling_file(
        &self,
        path: &Path,
        extensions: &[String],
    ) -> HostResult<Option<PathBuf>>;

    /// Reads the compiler tool options of `file` for `target`.
    fn build_tool_options(&self, file: &Path, target: &BuildTarget) -> HostResult<OptionsSnapshot>;

    /// Writes the compiler tool options of `file` for `target`.
    fn set_build_tool_options(
        &self,
        file: &Path,
        target: &BuildTarget,
        options: &OptionsSnapshot,
    ) -> HostResult<()>;

    /// Compiles exactly one file. `Ok(false)` means the compiler failed.
    fn compile_single_file(&self, file: &Path) -> HostResult<bool> {
        Err(HostError::Unsupported(format!(
            "single-file compile of {}",
            file.display()
        )))
    }

    /// Starts a build of the target's project. Completion arrives as a
    /// project done event.
    fn trigger_project_build(&self, target: &BuildTarget) -> HostResult<()>;

    /// Returns the whole text of the build output pane.
    fn aggregated_build_output(&self) -> HostResult<String>;

    /// Opens a generated artifact and moves the cursor to `location`.
    fn open_artifact(&self, path: &Path, location: &LocateResult) -> HostResult<()>;

    /// Shows a status bar message.
    fn report_status(&self, message: &str);

    /// Adds a diagnostic to the host's task list.
    fn report_diagnostic(&self, diagnostic: &Diagnostic);

    /// Shows a modal error.
    fn show_error_dialog(&self, message: &str, title: &str);

    /// Appends text to the build output pane.
    fn append_build_output(&self, _text: &str) {}

    /// Updates the taskbar progress indicator.
    fn update_progress(&self, _report: &ProgressReport) {}
}
