//! TreeWalker - builds the filtered tree in memory
//!
//! The walk is single-threaded, depth-first and pre-order. Each directory's
//! children are listed, filtered, capped and then visited one by one, so the
//! entry budget is consumed in the same order the tree is printed. A second
//! pass prunes speculative directories that ended up empty.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::rules::RuleSet;

use super::config::WalkerConfig;
use super::filter::{Candidate, FilterDecision, FilterPolicy};
use super::node::{TraversalResult, TraversalStats, TreeNode};
use super::traversal::{Child, TraversalState, child_rel_path, display_name, read_children};

/// Walk `root` with `config`.
pub fn traverse(root: &Path, config: WalkerConfig) -> Result<TraversalResult> {
    TreeWalker::new(config)?.walk(root)
}

/// Tree walker that builds the full tree in memory.
pub struct TreeWalker {
    config: WalkerConfig,
    abort: Option<Arc<AtomicBool>>,
}

impl TreeWalker {
    /// Validate `config` and create a walker.
    pub fn new(config: WalkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            abort: None,
        })
    }

    /// Stop the walk as soon as `flag` is raised (checked before each
    /// directory visit).
    pub fn with_abort_signal(mut self, flag: Arc<AtomicBool>) -> Self {
        self.abort = Some(flag);
        self
    }

    pub fn config(&self) -> &WalkerConfig {
        &self.config
    }

    /// Walk `root` and return the resolved tree.
    ///
    /// Fails only if `root` is unusable or a user pattern is invalid; read
    /// errors below the root are recorded on the tree.
    pub fn walk(&self, root: &Path) -> Result<TraversalResult> {
        let meta = fs::metadata(root).map_err(|source| Error::RootNotFound {
            path: root.to_path_buf(),
            source,
        })?;
        if !meta.is_dir() {
            return Err(Error::NotADirectory(root.to_path_buf()));
        }

        let rules = if self.config.respect_ignore_files {
            RuleSet::discover(root, self.config.ignore_depth)
        } else {
            RuleSet::new()
        };
        let policy = FilterPolicy::new(rules, &self.config)?;

        let mut state = TraversalState::new(self.config.max_entries);
        let walked = self.walk_dir(root, "", 0, false, &policy, &mut state);
        let root_node = resolve(walked).unwrap_or_else(|| empty_dir(root));

        let stats = TraversalStats {
            files_shown: root_node.file_count(),
            dirs_shown: root_node.dir_count(),
            items_hidden: state.items_hidden,
            entries_omitted: state.entries_omitted,
        };
        debug!(
            "walked {}: {} files, {} dirs, {} excluded",
            root.display(),
            stats.files_shown,
            stats.dirs_shown,
            state.exclusions.total()
        );

        let mut result = TraversalResult {
            root: root_node,
            stats,
            truncation: state.truncation,
            exclusions: state.exclusions,
            entry_budget: self.config.max_entries,
            unmatched_includes: Vec::new(),
        };
        if self.config.has_includes() && !result.truncation.any() {
            result.unmatched_includes = policy.unmatched_includes(&result);
        }
        Ok(result)
    }

    fn aborted(&self) -> bool {
        self.abort
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn at_max_depth(&self, depth: usize) -> bool {
        self.config.max_depth.is_some_and(|max| depth >= max)
    }

    /// Build the node for directory `path`. The caller has already charged it
    /// (or entered it as speculative).
    fn walk_dir(
        &self,
        path: &Path,
        rel: &str,
        depth: usize,
        speculative: bool,
        policy: &FilterPolicy,
        state: &mut TraversalState,
    ) -> TreeNode {
        let mut children = Vec::new();
        let mut depth_truncated = false;
        let mut items_hidden = 0;
        let mut read_error = false;
        let mut speculative = speculative;

        if self.aborted() {
            state.truncation.aborted = true;
        }

        if !state.stopped() {
            match read_children(path, self.config.order) {
                Ok(listed) => {
                    let decided: Vec<(Child, FilterDecision)> = listed
                        .into_iter()
                        .map(|child| {
                            let child_rel = child_rel_path(rel, &child.name);
                            let decision = policy.decide(&Candidate {
                                path: &child.path,
                                rel_path: &child_rel,
                                name: &child.name,
                                is_dir: child.is_dir,
                                depth: depth + 1,
                            });
                            (child, decision)
                        })
                        .collect();

                    if self.at_max_depth(depth) {
                        depth_truncated = if speculative {
                            decided.iter().any(|(_, d)| *d == FilterDecision::Visible)
                        } else {
                            decided
                                .iter()
                                .any(|(_, d)| !matches!(d, FilterDecision::Excluded(_)))
                        };
                        if depth_truncated && speculative {
                            if state.materialize() {
                                speculative = false;
                            } else {
                                depth_truncated = false;
                            }
                        }
                        if depth_truncated {
                            state.truncation.depth_truncated = true;
                        }
                    } else {
                        items_hidden =
                            self.walk_children(rel, depth, decided, policy, state, &mut children);
                    }
                }
                Err(e) => {
                    warn!("cannot read directory {}: {}", path.display(), e);
                    read_error = true;
                }
            }
        }

        // A speculative directory carrying a cap or error marker is kept.
        if speculative && (read_error || items_hidden > 0) && state.materialize() {
            speculative = false;
        }

        TreeNode::Dir {
            name: display_name(path),
            path: path.to_path_buf(),
            depth,
            children,
            depth_truncated,
            items_hidden,
            read_error,
            speculative,
        }
    }

    /// Filter, cap and visit the children of one directory. Returns the
    /// number of children dropped by the item cap.
    fn walk_children(
        &self,
        rel: &str,
        depth: usize,
        decided: Vec<(Child, FilterDecision)>,
        policy: &FilterPolicy,
        state: &mut TraversalState,
        out: &mut Vec<TreeNode>,
    ) -> usize {
        let mut retained = Vec::new();
        for (child, decision) in decided {
            match decision {
                FilterDecision::Excluded(reason) => state.exclude(reason),
                _ => retained.push((child, decision)),
            }
        }

        let items_hidden = match self.config.max_items {
            Some(cap) if retained.len() > cap => {
                let dropped = retained.len() - cap;
                retained.truncate(cap);
                state.truncation.item_capped = true;
                state.items_hidden += dropped;
                dropped
            }
            _ => 0,
        };

        let total = retained.len();
        for (index, (child, decision)) in retained.into_iter().enumerate() {
            if state.stopped() {
                state.entries_omitted += total - index;
                break;
            }
            let child_rel = child_rel_path(rel, &child.name);

            match (child.is_dir, decision) {
                (true, FilterDecision::ExcludedButDescend) => {
                    let saved = state.enter_speculative();
                    let node =
                        self.walk_dir(&child.path, &child_rel, depth + 1, true, policy, state);
                    state.leave_speculative(saved);
                    out.push(node);
                }
                (true, _) => {
                    if !state.try_add() {
                        state.entries_omitted += total - index;
                        break;
                    }
                    let node =
                        self.walk_dir(&child.path, &child_rel, depth + 1, false, policy, state);
                    out.push(node);
                }
                (false, _) => {
                    if !state.try_add() {
                        state.entries_omitted += total - index;
                        break;
                    }
                    out.push(TreeNode::File {
                        name: child.name,
                        path: child.path,
                        depth: depth + 1,
                        size_bytes: child.size,
                    });
                }
            }
        }
        items_hidden
    }
}

/// Prune speculative directories whose subtree resolved to nothing,
/// bottom-up. Returns `None` when `node` itself is pruned.
///
/// A directory still speculative here was never charged to the entry budget,
/// so keeping it would overrun the budget.
fn resolve(node: TreeNode) -> Option<TreeNode> {
    match node {
        TreeNode::File { .. } => Some(node),
        TreeNode::Dir {
            name,
            path,
            depth,
            children,
            depth_truncated,
            items_hidden,
            read_error,
            speculative,
        } => {
            let children: Vec<TreeNode> = children.into_iter().filter_map(resolve).collect();
            if speculative && children.is_empty() && !depth_truncated {
                return None;
            }
            Some(TreeNode::Dir {
                name,
                path,
                depth,
                children,
                depth_truncated,
                items_hidden,
                read_error,
                speculative: false,
            })
        }
    }
}

fn empty_dir(path: &Path) -> TreeNode {
    TreeNode::Dir {
        name: display_name(path),
        path: path.to_path_buf(),
        depth: 0,
        children: Vec::new(),
        depth_truncated: false,
        items_hidden: 0,
        read_error: false,
        speculative: false,
    }
}
