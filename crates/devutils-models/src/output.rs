//! Generated output kinds and locator results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which compiler-generated artifact a session produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Assembly listing.
    Assembly,
    /// Preprocessed source.
    Preprocessed,
}

impl OutputMode {
    /// File extension of the generated artifact.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputMode::Assembly => "asm",
            OutputMode::Preprocessed => "cpp",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Assembly => write!(f, "assembly"),
            OutputMode::Preprocessed => write!(f, "preprocessed"),
        }
    }
}

/// Where in an artifact the cursor should be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocateResult {
    /// The function marker was found.
    pub function_anchor_found: bool,
    /// The source line text was found.
    pub line_anchor_found: bool,
    /// Byte offset of the anchor (0 when nothing was found).
    pub cursor_offset: usize,
    /// 1-based line containing the anchor.
    pub cursor_line: usize,
}

impl LocateResult {
    /// Result pointing at the document start with no anchors.
    pub fn document_start() -> Self {
        Self {
            function_anchor_found: false,
            line_anchor_found: false,
            cursor_offset: 0,
            cursor_line: 1,
        }
    }

    /// Returns true if any anchor was found.
    pub fn is_anchored(&self) -> bool {
        self.function_anchor_found || self.line_anchor_found
    }
}

impl Default for LocateResult {
    fn default() -> Self {
        Self::document_start()
    }
}
