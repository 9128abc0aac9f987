//! DevUtils Core - the pure algorithms behind the build tooling.
//!
//! Nothing in this crate talks to the host; every function takes text or
//! events in and hands structured state back:
//!
//! - **diagnostics**: Extract compiler remarks from free-form build output
//! - **locator**: Anchor a function/line inside a generated artifact
//! - **progress**: Aggregate build lifecycle events into elapsed time and progress
//! - **taskbar**: Map tracker state onto a taskbar progress indicator
//! - **task_list**: Deduplicating list of reported diagnostics

pub mod diagnostics;
pub mod locator;
pub mod progress;
pub mod task_list;
pub mod taskbar;

pub use diagnostics::{DiagnosticExtractor, RemarkFamily};
pub use locator::{normalize_signature, OutputLocator};
pub use progress::{format_elapsed, BuildProgressTracker, Progress, ProgressState};
pub use task_list::TaskList;
pub use taskbar::{ProgressReport, TaskbarState};
