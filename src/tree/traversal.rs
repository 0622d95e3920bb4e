//! Traversal-scoped state and directory listing for the walker.
//!
//! All counters of a single walk live in [`TraversalState`], which is created
//! per call and threaded through the recursion. Nothing here is global, so
//! walks are independent of each other.

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::config::EntryOrder;
use super::node::{ExclusionReason, ExclusionTally, Truncation};

/// Running counters for one walk.
#[derive(Debug)]
pub struct TraversalState {
    budget: Option<usize>,
    used: usize,
    /// Speculative ancestors of the current position not yet charged. They
    /// always form a suffix of the ancestor chain.
    uncharged: usize,
    pub truncation: Truncation,
    pub exclusions: ExclusionTally,
    pub items_hidden: usize,
    pub entries_omitted: usize,
}

impl TraversalState {
    /// Fresh state; the root is charged immediately.
    pub fn new(budget: Option<usize>) -> Self {
        Self {
            budget,
            used: 1,
            uncharged: 0,
            truncation: Truncation::default(),
            exclusions: ExclusionTally::default(),
            items_hidden: 0,
            entries_omitted: 0,
        }
    }

    /// Whether the walk should stop adding entries.
    pub fn stopped(&self) -> bool {
        self.truncation.budget_exhausted || self.truncation.aborted
    }

    /// Charge one new entry plus any uncharged speculative ancestors.
    ///
    /// Returns `false` (and marks the budget exhausted) when it does not fit.
    pub fn try_add(&mut self) -> bool {
        self.charge(1 + self.uncharged)
    }

    /// Charge only the uncharged speculative ancestors (the current
    /// directory included), making them permanent.
    pub fn materialize(&mut self) -> bool {
        self.charge(self.uncharged)
    }

    fn charge(&mut self, cost: usize) -> bool {
        if self.budget.is_some_and(|max| self.used + cost > max) {
            self.truncation.budget_exhausted = true;
            return false;
        }
        self.used += cost;
        self.uncharged = 0;
        true
    }

    /// Enter a speculative directory. Returns the value to hand back to
    /// [`TraversalState::leave_speculative`].
    pub fn enter_speculative(&mut self) -> usize {
        let saved = self.uncharged;
        self.uncharged += 1;
        saved
    }

    /// Leave a speculative directory. If it was charged meanwhile, so were
    /// all of its uncharged ancestors.
    pub fn leave_speculative(&mut self, saved: usize) {
        self.uncharged = self.uncharged.min(saved);
    }

    pub fn exclude(&mut self, reason: ExclusionReason) {
        self.exclusions.record(reason);
    }
}

/// A listed child of a directory.
#[derive(Debug, Clone)]
pub struct Child {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
}

/// List a directory's children in a deterministic order.
///
/// Symlinks and special files are skipped; entries that vanish or cannot be
/// inspected mid-listing are dropped.
pub fn read_children(path: &Path, order: EntryOrder) -> io::Result<Vec<Child>> {
    let mut children = Vec::new();
    for entry in fs::read_dir(path)? {
        let Ok(entry) = entry else { continue };
        let Ok(file_type) = entry.file_type() else { continue };
        if file_type.is_symlink() {
            continue;
        }
        let is_dir = file_type.is_dir();
        if !is_dir && !file_type.is_file() {
            continue;
        }
        let size = if is_dir {
            0
        } else {
            entry.metadata().map(|m| m.len()).unwrap_or(0)
        };
        children.push(Child {
            path: entry.path(),
            name: entry.file_name().to_string_lossy().to_string(),
            is_dir,
            size,
        });
    }
    children.sort_by(|a, b| compare(a, b, order));
    Ok(children)
}

fn compare(a: &Child, b: &Child, order: EntryOrder) -> Ordering {
    match order {
        EntryOrder::Name => a.name.cmp(&b.name),
        EntryOrder::FilesFirst => a.is_dir.cmp(&b.is_dir).then_with(|| a.name.cmp(&b.name)),
    }
}

/// Join a child name onto a `/`-separated relative path.
pub fn child_rel_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Name shown for a walked path, `.` when it has none.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_budget_counts_root() {
        let mut state = TraversalState::new(Some(3));
        assert_eq!(state.used, 1);
        assert!(state.try_add());
        assert!(state.try_add());
        assert!(!state.try_add());
        assert!(state.truncation.budget_exhausted);
        assert!(state.stopped());
    }

    #[test]
    fn test_unbounded_budget() {
        let mut state = TraversalState::new(None);
        for _ in 0..1000 {
            assert!(state.try_add());
        }
        assert!(!state.stopped());
    }

    #[test]
    fn test_speculative_charged_with_first_descendant() {
        let mut state = TraversalState::new(Some(10));
        let outer = state.enter_speculative();
        let inner = state.enter_speculative();
        assert_eq!(state.uncharged, 2);

        // first file below two speculative dirs costs three entries
        assert!(state.try_add());
        assert_eq!(state.used, 4);
        assert_eq!(state.uncharged, 0);

        state.leave_speculative(inner);
        state.leave_speculative(outer);
        assert!(state.try_add());
        assert_eq!(state.used, 5);
    }

    #[test]
    fn test_uncharged_speculative_costs_nothing() {
        let mut state = TraversalState::new(Some(10));
        let saved = state.enter_speculative();
        state.leave_speculative(saved);
        assert_eq!(state.used, 1);
        assert!(state.try_add());
        assert_eq!(state.used, 2);
    }

    #[test]
    fn test_speculative_does_not_fit() {
        let mut state = TraversalState::new(Some(2));
        let saved = state.enter_speculative();
        assert!(!state.try_add());
        state.leave_speculative(saved);
        assert_eq!(state.used, 1);
    }

    #[test]
    fn test_read_children_sorted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("c.txt"), "cc").unwrap();

        let names: Vec<_> = read_children(dir.path(), EntryOrder::Name)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["a", "b.txt", "c.txt"]);

        let children = read_children(dir.path(), EntryOrder::FilesFirst).unwrap();
        let names: Vec<_> = children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["b.txt", "c.txt", "a"]);
        assert_eq!(children[1].size, 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_read_children_skips_symlinks() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("real.txt"), "x").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt"))
            .unwrap();

        let names: Vec<_> = read_children(dir.path(), EntryOrder::Name)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["real.txt"]);
    }

    #[test]
    fn test_child_rel_path() {
        assert_eq!(child_rel_path("", "a"), "a");
        assert_eq!(child_rel_path("a/b", "c"), "a/b/c");
    }
}
