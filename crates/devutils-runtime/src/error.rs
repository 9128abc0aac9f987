//! Error types for the runtime crate.

use thiserror::Error;

/// Errors raised by host collaborators.
#[derive(Debug, Error)]
pub enum HostError {
    /// The host does not offer this primitive.
    #[error("not supported by host: {0}")]
    Unsupported(String),

    /// An external tool could not be launched.
    #[error("external tool unavailable: {0}")]
    ToolUnavailable(String),

    /// A requested object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The host reported a failure.
    #[error("host operation failed: {0}")]
    Failed(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for host calls.
pub type HostResult<T> = std::result::Result<T, HostError>;

/// Why a build session ended in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionErrorKind {
    /// A header has no sibling implementation file.
    NoImplementationFile,
    /// No non-blank line near the cursor.
    NoUsableSourceLine,
    /// The active document belongs to no build target.
    NotInProject,
    /// Compilation reported failure (or never finished).
    CompileFailed,
    /// The compiler reported success but the artifact is absent.
    ArtifactMissing,
    /// A collaborator process could not be launched.
    ExternalToolUnavailable,
    /// Another session holds the build target.
    SessionBusy,
    /// Local file handling failed.
    Io,
    /// Any other host failure.
    Host,
}

/// Terminal failure of a build session, with a message for the user.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct SessionError {
    /// Failure category.
    pub kind: SessionErrorKind,
    /// Human-readable message shown in the host's error dialog.
    pub message: String,
}

impl SessionError {
    /// Creates a new session error.
    pub fn new(kind: SessionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the failure category.
    pub fn kind(&self) -> SessionErrorKind {
        self.kind
    }
}

impl From<HostError> for SessionError {
    fn from(err: HostError) -> Self {
        let kind = match &err {
            HostError::ToolUnavailable(_) => SessionErrorKind::ExternalToolUnavailable,
            HostError::Io(_) => SessionErrorKind::Io,
            _ => SessionErrorKind::Host,
        };
        SessionError::new(kind, err.to_string())
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::new(SessionErrorKind::Io, format!("io error: {}", err))
    }
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
