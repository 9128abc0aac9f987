//! Async runtime for DevUtils.
//!
//! This crate drives the host-facing side of the build tooling:
//! - `BuildSession` - one capture/compile/restore/locate cycle
//! - `BuildMonitor` - consumes build events, feeds progress and diagnostics
//! - `Runtime` - main entry point combining monitor and sessions
//!
//! The IDE or build driver is reached only through the [`Host`] trait.
//!
//! # Example
//!
//! ```ignore
//! use devutils_runtime::{Runtime, SessionConfig};
//! use devutils_models::OutputMode;
//! use std::sync::Arc;
//!
//! let runtime = Runtime::new(Arc::new(my_host), SessionConfig::from_env());
//!
//! // Forward host build events
//! runtime.dispatch(event);
//!
//! // Show assembly for the active file
//! let located = runtime.show_output(OutputMode::Assembly).await?;
//! println!("opened {}", located.path.display());
//! ```

pub mod artifact;
pub mod config;
pub mod error;
pub mod gate;
pub mod guard;
pub mod host;
pub mod hub;
pub mod monitor;
pub mod runtime;
pub mod session;

pub use config::SessionConfig;
pub use error::{HostError, HostResult, Result, SessionError, SessionErrorKind};
pub use gate::{SessionGate, SessionPermit};
pub use guard::OptionsGuard;
pub use host::Host;
pub use hub::BuildEventHub;
pub use monitor::BuildMonitor;
pub use runtime::Runtime;
pub use session::{BuildSession, Capture, LocatedArtifact, SessionState};
