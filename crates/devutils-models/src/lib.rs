//! Core data models for DevUtils.
//!
//! This crate provides the plain data types shared by the engine crates:
//! build lifecycle events, extracted diagnostics, typed build-tool options,
//! document context snapshots and locator results.

pub mod diagnostic;
pub mod document;
pub mod event;
pub mod ids;
pub mod options;
pub mod output;

// Re-export main types
pub use diagnostic::{Diagnostic, Severity};
pub use document::{BuildTarget, DocumentContext};
pub use event::{BuildAction, BuildContext, BuildEvent, BuildScope};
pub use ids::SessionId;
pub use options::{AssemblerOutput, OptionsSnapshot, PreprocessOutput};
pub use output::{LocateResult, OutputMode};
