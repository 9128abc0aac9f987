//! Typed snapshot of the per-file compiler tool options a session touches.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Kind of assembler listing the compiler emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssemblerOutput {
    /// No listing.
    #[default]
    NoListing,
    /// Assembly only.
    AsmOnly,
    /// Assembly with machine code.
    AsmWithMachineCode,
    /// Assembly with interleaved source lines.
    AsmWithSource,
    /// Assembly, machine code and source.
    AsmWithAll,
}

/// Whether the compiler writes preprocessed output to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PreprocessOutput {
    /// Normal compilation.
    #[default]
    No,
    /// Preprocess to file, keeping `#line` directives.
    Yes,
    /// Preprocess to file without `#line` directives.
    WithoutLineNumbers,
}

/// The build-tool options saved before and restored after a session.
///
/// Restoring a snapshot must leave the tool exactly as it was, so the whole
/// set is captured even though each mode only mutates part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct OptionsSnapshot {
    /// Whole-program optimization (suppresses listings when on).
    pub whole_program_optimization: bool,
    /// Treat warnings as errors.
    pub warn_as_error: bool,
    /// Listing kind.
    pub assembler_output: AssemblerOutput,
    /// Listing file location.
    pub assembler_listing_location: Option<PathBuf>,
    /// Preprocess-to-file switch.
    pub generate_preprocessed_file: PreprocessOutput,
    /// Object file location.
    pub object_file: Option<PathBuf>,
}
