//! Deduplicating list of diagnostics reported to the host.

use std::collections::HashSet;

use devutils_models::{Diagnostic, Severity};

/// Diagnostics reported so far, keyed by their raw message.
///
/// Build output accumulates across builds, so the same remark is seen by
/// every later extraction pass; only the first sighting is new.
#[derive(Debug, Default)]
pub struct TaskList {
    seen: HashSet<String>,
    items: Vec<Diagnostic>,
}

impl TaskList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a diagnostic. Returns false if its raw message was already listed.
    pub fn add(&mut self, diagnostic: Diagnostic) -> bool {
        if !self.seen.insert(diagnostic.raw_message.clone()) {
            return false;
        }
        self.items.push(diagnostic);
        true
    }

    /// Number of listed diagnostics.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing has been listed.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates in report order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Diagnostics pointing at `file_path`.
    pub fn by_file<'a>(&'a self, file_path: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.items.iter().filter(move |d| d.file_path == file_path)
    }

    /// Counts diagnostics of one severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.items.iter().filter(|d| d.severity == severity).count()
    }

    /// Removes everything.
    pub fn clear(&mut self) {
        self.seen.clear();
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_dedups_on_raw_message() {
        let mut list = TaskList::new();
        assert!(list.add(Diagnostic::new("r1", "a.cpp", 1, "1")));
        assert!(!list.add(Diagnostic::new("r1", "a.cpp", 1, "1")));
        assert!(list.add(Diagnostic::new("r2", "a.cpp", 2, "1")));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_by_file_and_count() {
        let mut list = TaskList::new();
        list.add(Diagnostic::new("r1", "a.cpp", 1, "1"));
        list.add(Diagnostic::new("r2", "b.cpp", 2, "1").with_severity(Severity::Warning));
        list.add(Diagnostic::new("r3", "a.cpp", 3, "1"));

        assert_eq!(list.by_file("a.cpp").count(), 2);
        assert_eq!(list.count(Severity::Message), 2);
        assert_eq!(list.count(Severity::Warning), 1);
    }

    #[test]
    fn test_clear_forgets_seen() {
        let mut list = TaskList::new();
        list.add(Diagnostic::new("r1", "a.cpp", 1, "1"));
        list.clear();
        assert!(list.is_empty());
        assert!(list.add(Diagnostic::new("r1", "a.cpp", 1, "1")));
    }
}
