//! Tree and result types produced by the walker

use std::path::{Path, PathBuf};

use serde::Serialize;

/// One entry of the accepted tree.
///
/// Serializes with a `type` tag (`"file"` / `"dir"`) so JSON consumers can
/// dispatch on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    File {
        name: String,
        path: PathBuf,
        depth: usize,
        size_bytes: u64,
    },
    Dir {
        name: String,
        path: PathBuf,
        depth: usize,
        children: Vec<TreeNode>,
        /// Children exist below the depth limit.
        #[serde(skip_serializing_if = "is_false")]
        depth_truncated: bool,
        /// Children dropped by the per-directory item cap.
        #[serde(skip_serializing_if = "is_zero")]
        items_hidden: usize,
        /// The directory could not be listed.
        #[serde(skip_serializing_if = "is_false")]
        read_error: bool,
        /// Kept only while a matching descendant may still exist.
        #[serde(skip)]
        speculative: bool,
    },
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

impl TreeNode {
    pub fn name(&self) -> &str {
        match self {
            TreeNode::File { name, .. } => name,
            TreeNode::Dir { name, .. } => name,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            TreeNode::File { path, .. } => path,
            TreeNode::Dir { path, .. } => path,
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            TreeNode::File { depth, .. } => *depth,
            TreeNode::Dir { depth, .. } => *depth,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, TreeNode::Dir { .. })
    }

    pub fn children(&self) -> &[TreeNode] {
        match self {
            TreeNode::File { .. } => &[],
            TreeNode::Dir { children, .. } => children,
        }
    }

    /// Number of files in this subtree.
    pub fn file_count(&self) -> usize {
        match self {
            TreeNode::File { .. } => 1,
            TreeNode::Dir { children, .. } => children.iter().map(TreeNode::file_count).sum(),
        }
    }

    /// Number of directories strictly below this node.
    pub fn dir_count(&self) -> usize {
        self.children()
            .iter()
            .filter(|c| c.is_dir())
            .map(|c| 1 + c.dir_count())
            .sum()
    }

    /// Number of entries in this subtree, this node included.
    pub fn entry_count(&self) -> usize {
        1 + self.children().iter().map(TreeNode::entry_count).sum::<usize>()
    }

    /// Pre-order iterator over this node and all its descendants.
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }

    /// Files of this subtree in pre-order.
    pub fn files(&self) -> impl Iterator<Item = &TreeNode> {
        self.iter().filter(|n| !n.is_dir())
    }
}

/// Depth-first, pre-order walk over a [`TreeNode`].
pub struct PreOrder<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

/// Aggregate counts over the final tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TraversalStats {
    pub files_shown: usize,
    /// Directories below the root.
    pub dirs_shown: usize,
    /// Entries dropped by per-directory item caps.
    pub items_hidden: usize,
    /// Retained entries abandoned because the walk stopped early. An
    /// abandoned directory counts once; its contents are never listed, so
    /// this is a lower bound on what was left out.
    pub entries_omitted: usize,
}

/// Which limits cut the output short.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Truncation {
    pub depth_truncated: bool,
    pub item_capped: bool,
    pub budget_exhausted: bool,
    pub aborted: bool,
}

impl Truncation {
    pub fn any(&self) -> bool {
        self.depth_truncated || self.item_capped || self.budget_exhausted || self.aborted
    }
}

/// Why an entry was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    Hidden,
    IgnoreRule,
    UserExclude,
    NotIncluded,
    DirsOnly,
    NotSelected,
}

/// Per-mechanism counts of excluded entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExclusionTally {
    pub hidden: usize,
    pub ignore_rule: usize,
    pub user_exclude: usize,
    pub not_included: usize,
    /// Files walked and counted but not shown in directories-only mode.
    pub dirs_only: usize,
    pub not_selected: usize,
}

impl ExclusionTally {
    pub fn record(&mut self, reason: ExclusionReason) {
        match reason {
            ExclusionReason::Hidden => self.hidden += 1,
            ExclusionReason::IgnoreRule => self.ignore_rule += 1,
            ExclusionReason::UserExclude => self.user_exclude += 1,
            ExclusionReason::NotIncluded => self.not_included += 1,
            ExclusionReason::DirsOnly => self.dirs_only += 1,
            ExclusionReason::NotSelected => self.not_selected += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.hidden
            + self.ignore_rule
            + self.user_exclude
            + self.not_included
            + self.dirs_only
            + self.not_selected
    }
}

/// Everything a traversal produced. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraversalResult {
    pub root: TreeNode,
    pub stats: TraversalStats,
    pub truncation: Truncation,
    pub exclusions: ExclusionTally,
    /// The entry budget in effect, for "budget of N reached" markers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_budget: Option<usize>,
    /// Include patterns and file types that matched no file.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unmatched_includes: Vec<String>,
}

impl TraversalResult {
    /// Path of `node` relative to the traversal root, `/`-separated.
    pub fn relative_path(&self, node: &TreeNode) -> String {
        let path = node.path();
        match path.strip_prefix(self.root.path()) {
            Ok(rel) => crate::pattern::to_match_path(rel),
            Err(_) => path.to_string_lossy().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, depth: usize) -> TreeNode {
        TreeNode::File {
            name: name.to_string(),
            path: PathBuf::from(name),
            depth,
            size_bytes: 1,
        }
    }

    fn dir(name: &str, depth: usize, children: Vec<TreeNode>) -> TreeNode {
        TreeNode::Dir {
            name: name.to_string(),
            path: PathBuf::from(name),
            depth,
            children,
            depth_truncated: false,
            items_hidden: 0,
            read_error: false,
            speculative: false,
        }
    }

    #[test]
    fn test_counts() {
        let tree = dir(
            ".",
            0,
            vec![dir("a", 1, vec![file("x", 2), dir("b", 2, vec![])]), file("y", 1)],
        );
        assert_eq!(tree.file_count(), 2);
        assert_eq!(tree.dir_count(), 2);
        assert_eq!(tree.entry_count(), 5);
    }

    #[test]
    fn test_pre_order() {
        let tree = dir(
            ".",
            0,
            vec![dir("a", 1, vec![file("x", 2)]), file("y", 1)],
        );
        let names: Vec<_> = tree.iter().map(TreeNode::name).collect();
        assert_eq!(names, vec![".", "a", "x", "y"]);
        let files: Vec<_> = tree.files().map(TreeNode::name).collect();
        assert_eq!(files, vec!["x", "y"]);
    }

    #[test]
    fn test_serialize_skips_default_flags() {
        let json = serde_json::to_value(dir("a", 1, vec![])).unwrap();
        assert_eq!(json["type"], "dir");
        assert!(json.get("depth_truncated").is_none());
        assert!(json.get("items_hidden").is_none());
        assert!(json.get("speculative").is_none());

        let json = serde_json::to_value(file("x", 1)).unwrap();
        assert_eq!(json["type"], "file");
        assert_eq!(json["size_bytes"], 1);
    }

    #[test]
    fn test_tally() {
        let mut tally = ExclusionTally::default();
        tally.record(ExclusionReason::IgnoreRule);
        tally.record(ExclusionReason::UserExclude);
        tally.record(ExclusionReason::UserExclude);
        assert_eq!(tally.ignore_rule, 1);
        assert_eq!(tally.user_exclude, 2);
        assert_eq!(tally.total(), 3);
    }
}
