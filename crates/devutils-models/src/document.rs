//! Snapshots of the host's editor state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The build target owning a source file: project plus active configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildTarget {
    /// Unique project name, including the solution folder hierarchy.
    pub project: String,
    /// Active configuration name (e.g. "Release").
    pub configuration: String,
    /// Active platform name (e.g. "x64").
    pub platform: String,
}

impl BuildTarget {
    /// Creates a new build target.
    pub fn new(
        project: impl Into<String>,
        configuration: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            configuration: configuration.into(),
            platform: platform.into(),
        }
    }

    /// Returns the `configuration|platform` pair used to address tool options.
    pub fn config_key(&self) -> String {
        format!("{}|{}", self.configuration, self.platform)
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.project, self.config_key())
    }
}

/// What the host reports about the active document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentContext {
    /// Full path of the active document.
    pub path: PathBuf,
    /// 1-based line of the cursor.
    pub cursor_line: usize,
    /// Fully-qualified name of the function around the cursor, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enclosing_function: Option<String>,
    /// Owning build target. `None` when the file is not part of any project.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<BuildTarget>,
}

impl DocumentContext {
    /// Creates a context for a file outside any project.
    pub fn new(path: impl Into<PathBuf>, cursor_line: usize) -> Self {
        Self {
            path: path.into(),
            cursor_line,
            enclosing_function: None,
            target: None,
        }
    }

    /// Sets the enclosing function signature.
    pub fn with_function(mut self, signature: impl Into<String>) -> Self {
        self.enclosing_function = Some(signature.into());
        self
    }

    /// Sets the owning build target.
    pub fn with_target(mut self, target: BuildTarget) -> Self {
        self.target = Some(target);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_key() {
        let target = BuildTarget::new("engine", "Release", "x64");
        assert_eq!(target.config_key(), "Release|x64");
        assert_eq!(target.to_string(), "engine (Release|x64)");
    }

    #[test]
    fn test_document_builder() {
        let ctx = DocumentContext::new("/src/a.cpp", 10)
            .with_function("ns::a")
            .with_target(BuildTarget::new("p", "Debug", "Win32"));
        assert_eq!(ctx.enclosing_function.as_deref(), Some("ns::a"));
        assert_eq!(ctx.target.unwrap().project, "p");
    }
}
