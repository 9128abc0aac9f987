//! Build lifecycle events raised by the host.
//!
//! Events arrive in a single serialized sequence. The same stream feeds the
//! progress tracker and any session waiting on a project build.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a build event pertains to the whole solution or a subset of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BuildScope {
    /// The whole solution is being built.
    #[default]
    Solution,
    /// A batch build across selected configurations.
    Batch,
    /// A single project (or selection) is being built.
    Project,
}

/// The kind of build operation requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BuildAction {
    /// Incremental build.
    #[default]
    Build,
    /// Clean followed by a full build.
    RebuildAll,
    /// Clean only.
    Clean,
    /// Deploy after build.
    Deploy,
}

/// One entry of the active solution configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildContext {
    /// Unique project name (including solution folder hierarchy).
    pub project: String,
    /// Whether the project takes part in the build.
    #[serde(default = "default_should_build")]
    pub should_build: bool,
}

fn default_should_build() -> bool {
    true
}

impl BuildContext {
    /// Creates a context that participates in the build.
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            should_build: true,
        }
    }

    /// Creates a context that is excluded from the build.
    pub fn skipped(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            should_build: false,
        }
    }
}

/// A build lifecycle notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildEvent {
    /// A build started.
    BuildBegin {
        scope: BuildScope,
        #[serde(default)]
        action: BuildAction,
        /// Build contexts of the active solution configuration.
        #[serde(default)]
        contexts: Vec<BuildContext>,
        #[serde(default = "Utc::now")]
        at: DateTime<Utc>,
    },
    /// A build finished.
    BuildDone {
        scope: BuildScope,
        #[serde(default)]
        action: BuildAction,
        #[serde(default = "Utc::now")]
        at: DateTime<Utc>,
    },
    /// A single project configuration started building.
    ProjectBegin {
        project: String,
        #[serde(default)]
        project_config: String,
        #[serde(default)]
        platform: String,
        #[serde(default)]
        solution_config: String,
        #[serde(default = "Utc::now")]
        at: DateTime<Utc>,
    },
    /// A single project configuration finished building.
    ProjectDone {
        project: String,
        #[serde(default)]
        project_config: String,
        #[serde(default)]
        platform: String,
        #[serde(default)]
        solution_config: String,
        success: bool,
        #[serde(default = "Utc::now")]
        at: DateTime<Utc>,
    },
}

impl BuildEvent {
    /// Creates a solution-scope begin event stamped now.
    pub fn solution_begin(contexts: Vec<BuildContext>) -> Self {
        BuildEvent::BuildBegin {
            scope: BuildScope::Solution,
            action: BuildAction::Build,
            contexts,
            at: Utc::now(),
        }
    }

    /// Creates a solution-scope done event stamped now.
    pub fn solution_done() -> Self {
        BuildEvent::BuildDone {
            scope: BuildScope::Solution,
            action: BuildAction::Build,
            at: Utc::now(),
        }
    }

    /// Creates a per-project done event stamped now.
    pub fn project_done(project: impl Into<String>, success: bool) -> Self {
        BuildEvent::ProjectDone {
            project: project.into(),
            project_config: String::new(),
            platform: String::new(),
            solution_config: String::new(),
            success,
            at: Utc::now(),
        }
    }

    /// Returns when the event was raised.
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            BuildEvent::BuildBegin { at, .. }
            | BuildEvent::BuildDone { at, .. }
            | BuildEvent::ProjectBegin { at, .. }
            | BuildEvent::ProjectDone { at, .. } => *at,
        }
    }

    /// Returns the project name for per-project events.
    pub fn project(&self) -> Option<&str> {
        match self {
            BuildEvent::ProjectBegin { project, .. } | BuildEvent::ProjectDone { project, .. } => {
                Some(project)
            }
            _ => None,
        }
    }

    /// Returns true if this is the done event of the given project.
    pub fn is_project_done_for(&self, unique_name: &str) -> bool {
        matches!(self, BuildEvent::ProjectDone { project, .. } if project == unique_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_accessor() {
        let event = BuildEvent::project_done("core\\engine", true);
        assert_eq!(event.project(), Some("core\\engine"));
        assert_eq!(BuildEvent::solution_done().project(), None);
    }

    #[test]
    fn test_is_project_done_for_matches_exact_name() {
        let event = BuildEvent::project_done("engine", false);
        assert!(event.is_project_done_for("engine"));
        assert!(!event.is_project_done_for("engine2"));
        assert!(!BuildEvent::solution_done().is_project_done_for("engine"));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{"kind":"build_begin","scope":"solution","contexts":[{"project":"a"},{"project":"b","should_build":false}]}"#;
        let event: BuildEvent = serde_json::from_str(json).unwrap();
        match event {
            BuildEvent::BuildBegin {
                scope,
                action,
                contexts,
                ..
            } => {
                assert_eq!(scope, BuildScope::Solution);
                assert_eq!(action, BuildAction::Build);
                assert_eq!(contexts, vec![BuildContext::new("a"), BuildContext::skipped("b")]);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_project_done_json() {
        let json = r#"{"kind":"project_done","project":"engine","success":false,"at":"2024-01-01T00:00:05Z"}"#;
        let event: BuildEvent = serde_json::from_str(json).unwrap();
        assert!(event.is_project_done_for("engine"));
        assert_eq!(event.at().to_rfc3339(), "2024-01-01T00:00:05+00:00");
    }
}
