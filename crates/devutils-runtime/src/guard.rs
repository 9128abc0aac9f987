//! Scoped mutation of build-tool options.
//!
//! [`OptionsGuard`] writes mutated options on acquisition and puts the saved
//! snapshot back exactly once: explicitly through [`OptionsGuard::restore`],
//! or from `Drop` when the owner unwinds or is abandoned mid-compile.

use std::path::{Path, PathBuf};

use devutils_models::{BuildTarget, OptionsSnapshot};
use tracing::{debug, warn};

use crate::error::HostResult;
use crate::host::Host;

/// Holds mutated build-tool options and restores the saved snapshot.
pub struct OptionsGuard<'h, H: Host + ?Sized> {
    host: &'h H,
    file: PathBuf,
    target: BuildTarget,
    saved: OptionsSnapshot,
    restored: bool,
}

impl<'h, H: Host + ?Sized> OptionsGuard<'h, H> {
    /// Snapshots the current options, applies `mutate`, and returns the guard.
    ///
    /// If writing the mutated options fails, the snapshot is written back
    /// before the error is returned.
    pub fn acquire<F>(host: &'h H, file: &Path, target: &BuildTarget, mutate: F) -> HostResult<Self>
    where
        F: FnOnce(&mut OptionsSnapshot),
    {
        let saved = host.build_tool_options(file, target)?;
        let mut mutated = saved.clone();
        mutate(&mut mutated);

        let guard = Self {
            host,
            file: file.to_path_buf(),
            target: target.clone(),
            saved,
            restored: false,
        };

        host.set_build_tool_options(file, target, &mutated)?;
        debug!(file = %file.display(), target = %target, "build options mutated");
        Ok(guard)
    }

    /// The options as they were before acquisition.
    pub fn saved(&self) -> &OptionsSnapshot {
        &self.saved
    }

    /// Writes the saved snapshot back.
    pub fn restore(mut self) -> HostResult<()> {
        self.restored = true;
        self.write_back()
    }

    fn write_back(&self) -> HostResult<()> {
        let result = self
            .host
            .set_build_tool_options(&self.file, &self.target, &self.saved);
        debug!(
            file = %self.file.display(),
            ok = result.is_ok(),
            "build options restored"
        );
        result
    }
}

impl<H: Host + ?Sized> Drop for OptionsGuard<'_, H> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;
        if let Err(e) = self.write_back() {
            warn!(file = %self.file.display(), error = %e, "failed to restore build options");
        }
    }
}
