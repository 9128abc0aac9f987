//! Per-target serialization of build sessions.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use devutils_models::BuildTarget;
use tracing::debug;

use crate::error::{Result, SessionError, SessionErrorKind};

/// Admits at most one session per build target at a time.
#[derive(Debug, Clone, Default)]
pub struct SessionGate {
    active: Arc<Mutex<HashSet<String>>>,
}

impl SessionGate {
    /// Creates an empty gate.
    pub fn new() -> Self {
        Self::default()
    }

    fn key(target: &BuildTarget) -> String {
        format!("{}|{}", target.project, target.config_key())
    }

    /// Claims `target`, or fails with `SessionBusy` if it is already held.
    pub fn try_acquire(&self, target: &BuildTarget) -> Result<SessionPermit> {
        let key = Self::key(target);
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());

        if !active.insert(key.clone()) {
            return Err(SessionError::new(
                SessionErrorKind::SessionBusy,
                format!("A build session for {} is already running", target),
            ));
        }

        debug!(target = %key, "session permit acquired");
        Ok(SessionPermit {
            active: Arc::clone(&self.active),
            key,
        })
    }

    /// Returns true if `target` is currently held.
    pub fn is_held(&self, target: &BuildTarget) -> bool {
        let active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        active.contains(&Self::key(target))
    }
}

/// Releases its target when dropped.
#[derive(Debug)]
pub struct SessionPermit {
    active: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl Drop for SessionPermit {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        active.remove(&self.key);
        debug!(target = %self.key, "session permit released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_rejected() {
        let gate = SessionGate::new();
        let target = BuildTarget::new("engine", "Release", "x64");

        let _permit = gate.try_acquire(&target).unwrap();
        let err = gate.try_acquire(&target).unwrap_err();
        assert_eq!(err.kind(), SessionErrorKind::SessionBusy);
    }

    #[test]
    fn test_drop_releases() {
        let gate = SessionGate::new();
        let target = BuildTarget::new("engine", "Release", "x64");

        let permit = gate.try_acquire(&target).unwrap();
        assert!(gate.is_held(&target));
        drop(permit);
        assert!(!gate.is_held(&target));
        assert!(gate.try_acquire(&target).is_ok());
    }

    #[test]
    fn test_distinct_targets_are_independent() {
        let gate = SessionGate::new();
        let _a = gate.try_acquire(&BuildTarget::new("a", "Debug", "x64")).unwrap();
        assert!(gate.try_acquire(&BuildTarget::new("b", "Debug", "x64")).is_ok());
        assert!(gate.try_acquire(&BuildTarget::new("a", "Release", "x64")).is_ok());
    }
}
