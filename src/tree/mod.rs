//! Directory tree walking logic
//!
//! `TreeWalker` lists the tree top-down, asks the `FilterPolicy` about every
//! entry and applies the depth limit, per-directory item cap and global entry
//! budget on the way. The result is one immutable `TraversalResult` that every
//! renderer consumes.

mod config;
mod filter;
mod node;
mod traversal;
mod utils;
mod walker;

pub use config::{DEFAULT_MAX_ENTRIES, DEFAULT_MAX_ITEMS, EntryOrder, KindFilter, WalkerConfig};
pub use filter::{Candidate, FilterDecision, FilterPolicy, FilterStage, Verdict};
pub use node::{
    ExclusionReason, ExclusionTally, PreOrder, TraversalResult, TraversalStats, TreeNode,
    Truncation,
};
pub use utils::{format_mb, format_size};
pub use walker::{TreeWalker, traverse};
