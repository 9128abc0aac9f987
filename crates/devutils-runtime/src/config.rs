//! Session configuration.
//!
//! # Environment Variables
//!
//! - `DEVUTILS_ARTIFACT_DIR`: Directory receiving generated artifacts
//! - `DEVUTILS_COMPILE_TIMEOUT_SECS`: How long to wait for a project build

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

/// Environment variable for the artifact directory.
pub const ARTIFACT_DIR_ENV: &str = "DEVUTILS_ARTIFACT_DIR";

/// Environment variable for the project build wait, in seconds.
pub const COMPILE_TIMEOUT_ENV: &str = "DEVUTILS_COMPILE_TIMEOUT_SECS";

/// Configuration for build sessions.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Where artifacts are written.
    pub artifact_dir: PathBuf,
    /// How long to wait for the per-project done event.
    pub compile_timeout: Duration,
    /// Extensions (without dot, lowercase) treated as headers.
    pub header_extensions: Vec<String>,
    /// Whether files without extension are headers (standard library).
    pub extensionless_is_header: bool,
    /// Sibling implementation extensions, in probe order.
    pub implementation_extensions: Vec<String>,
    /// Cursor-relative line offsets probed for usable code, in order.
    pub line_probe_offsets: Vec<isize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            artifact_dir: std::env::temp_dir(),
            compile_timeout: Duration::from_secs(300),
            header_extensions: vec!["h".to_string(), "hpp".to_string()],
            extensionless_is_header: true,
            implementation_extensions: vec!["cpp".to_string(), "cc".to_string()],
            line_probe_offsets: vec![0, 1, -1, 2],
        }
    }
}

impl SessionConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a config from defaults overlaid with environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var(ARTIFACT_DIR_ENV) {
            config.artifact_dir = PathBuf::from(dir);
        }

        if let Ok(raw) = std::env::var(COMPILE_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => config.compile_timeout = Duration::from_secs(secs),
                Err(_) => warn!(value = %raw, "ignoring invalid {}", COMPILE_TIMEOUT_ENV),
            }
        }

        config
    }

    /// Sets the artifact directory.
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = dir.into();
        self
    }

    /// Sets the project build wait.
    pub fn with_compile_timeout(mut self, timeout: Duration) -> Self {
        self.compile_timeout = timeout;
        self
    }

    /// Sets the line probe offsets.
    pub fn with_line_probe_offsets(mut self, offsets: Vec<isize>) -> Self {
        self.line_probe_offsets = offsets;
        self
    }

    /// Sets the sibling implementation extensions.
    pub fn with_implementation_extensions(mut self, extensions: Vec<String>) -> Self {
        self.implementation_extensions = extensions;
        self
    }

    /// Returns true if `path` names a header-like file.
    pub fn is_header(&self, path: &Path) -> bool {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => self
                .header_extensions
                .iter()
                .any(|h| h.eq_ignore_ascii_case(ext)),
            None => self.extensionless_is_header,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();

        assert_eq!(config.compile_timeout, Duration::from_secs(300));
        assert_eq!(config.implementation_extensions, vec!["cpp", "cc"]);
        assert_eq!(config.line_probe_offsets, vec![0, 1, -1, 2]);
    }

    #[test]
    fn test_config_builder() {
        let config = SessionConfig::new()
            .with_artifact_dir("/tmp/out")
            .with_compile_timeout(Duration::from_secs(5))
            .with_line_probe_offsets(vec![0]);

        assert_eq!(config.artifact_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.compile_timeout, Duration::from_secs(5));
        assert_eq!(config.line_probe_offsets, vec![0]);
    }

    #[test]
    fn test_is_header() {
        let config = SessionConfig::default();

        assert!(config.is_header(Path::new("/src/foo.h")));
        assert!(config.is_header(Path::new("/src/Foo.HPP")));
        assert!(config.is_header(Path::new("/usr/include/c++/vector")));
        assert!(!config.is_header(Path::new("/src/foo.cpp")));
        assert!(!config.is_header(Path::new("/src/foo.cc")));
    }
}
