//! gitree - a directory tree that respects .gitignore, with text, JSON,
//! Markdown and zip exports

pub mod config;
pub mod content;
pub mod error;
pub mod export;
pub mod interactive;
pub mod language;
pub mod output;
pub mod pattern;
pub mod rules;
pub mod summary;
pub mod tree;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{OutputFormat, UserConfig};
pub use content::{ContentOptions, ContentRecord, load_contents};
pub use error::{Error, Result};
pub use output::{MarkdownFormatter, OutputConfig, TreeFormatter, create_zip, to_json, to_json_many};
pub use pattern::{Rule, RuleSource};
pub use rules::RuleSet;
pub use summary::TreeSummary;
pub use tree::{
    EntryOrder, ExclusionReason, FilterDecision, FilterPolicy, KindFilter, TraversalResult,
    TreeNode, TreeWalker, WalkerConfig, traverse,
};
