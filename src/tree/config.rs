//! Configuration types for the tree walker

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Default per-directory item cap.
pub const DEFAULT_MAX_ITEMS: usize = 20;

/// Default global entry budget (the root counts as one entry).
pub const DEFAULT_MAX_ENTRIES: usize = 40;

/// Which kinds of entries end up in the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KindFilter {
    #[default]
    All,
    /// Files only; directories are kept only as containers of surviving files.
    FilesOnly,
    /// Directories only; files are walked and counted but never shown.
    DirsOnly,
}

/// Sibling ordering within a directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryOrder {
    /// Byte order of the file name.
    #[default]
    Name,
    /// Files before directories, each group by name.
    FilesFirst,
}

/// Configuration for tree walking behavior.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Deepest depth listed (root = 0). `None` = unbounded.
    pub max_depth: Option<usize>,
    /// Per-directory cap on retained children. `None` disables it.
    pub max_items: Option<usize>,
    /// Global cap on entries in the result, root included. `None` disables it.
    pub max_entries: Option<usize>,
    pub include_hidden: bool,
    pub kind_filter: KindFilter,
    /// User exclude patterns (gitignore syntax, no negation).
    pub excludes: Vec<String>,
    /// Limit user excludes to entries at this depth or shallower.
    pub exclude_depth: Option<usize>,
    /// User include patterns. When any include mechanism is set, files must match one.
    pub includes: Vec<String>,
    /// File type names (`rust`, `py`) or bare extensions (`.toml`).
    pub include_file_types: Vec<String>,
    pub respect_ignore_files: bool,
    /// How deep ignore files are discovered (0 = root only). `None` = unbounded.
    pub ignore_depth: Option<usize>,
    pub order: EntryOrder,
    /// Explicit set of files to keep (absolute paths), e.g. from interactive selection.
    pub selection: Option<BTreeSet<PathBuf>>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            max_items: Some(DEFAULT_MAX_ITEMS),
            max_entries: Some(DEFAULT_MAX_ENTRIES),
            include_hidden: false,
            kind_filter: KindFilter::All,
            excludes: Vec::new(),
            exclude_depth: None,
            includes: Vec::new(),
            include_file_types: Vec::new(),
            respect_ignore_files: true,
            ignore_depth: None,
            order: EntryOrder::Name,
            selection: None,
        }
    }
}

impl WalkerConfig {
    /// A configuration with no item cap and no entry budget.
    pub fn unlimited() -> Self {
        Self {
            max_items: None,
            max_entries: None,
            ..Self::default()
        }
    }

    /// Whether any include mechanism (patterns or file types) is configured.
    pub fn has_includes(&self) -> bool {
        !self.includes.is_empty() || !self.include_file_types.is_empty()
    }

    /// Reject settings that cannot produce a meaningful traversal.
    pub fn validate(&self) -> Result<()> {
        if self.max_items == Some(0) {
            return Err(Error::config("max_items must be at least 1"));
        }
        if self.max_entries == Some(0) {
            return Err(Error::config("max_entries must be at least 1"));
        }
        if self.kind_filter == KindFilter::DirsOnly && self.has_includes() {
            return Err(Error::config(
                "include patterns select files and cannot be combined with directories-only mode",
            ));
        }
        Ok(())
    }
}
