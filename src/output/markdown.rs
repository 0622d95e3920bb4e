//! Markdown output formatting
//!
//! `MarkdownFormatter` renders the tree as a nested list and, when contents
//! were loaded, follows it with one fenced code block per file.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::content::ContentRecord;
use crate::language::fence_tag_for;
use crate::tree::{TraversalResult, TreeNode, format_size};

/// Markdown output formatter - outputs tree as nested markdown list.
pub struct MarkdownFormatter {
    show_size: bool,
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownFormatter {
    pub fn new() -> Self {
        Self { show_size: false }
    }

    /// Append human-readable sizes to file bullets.
    pub fn with_sizes(mut self, show: bool) -> Self {
        self.show_size = show;
        self
    }

    pub fn format(
        &self,
        result: &TraversalResult,
        contents: Option<&BTreeMap<PathBuf, ContentRecord>>,
    ) -> String {
        let mut output = String::new();
        self.format_node(&result.root, &mut output, 0);

        if result.truncation.budget_exhausted {
            output.push_str(&format!(
                "- *... and {} more entries*\n",
                result.stats.entries_omitted
            ));
        }
        if result.truncation.aborted {
            output.push_str("- *traversal aborted*\n");
        }
        output.push('\n');
        output.push_str(&format!(
            "*{} directories, {} files*\n",
            result.stats.dirs_shown, result.stats.files_shown
        ));

        if let Some(contents) = contents {
            for file in result.root.files() {
                let Some(record) = contents.get(file.path()) else {
                    continue;
                };
                output.push('\n');
                output.push_str(&format!("### {}\n\n", result.relative_path(file)));
                match record {
                    ContentRecord::Text(text) => {
                        let fence = fence_for(text);
                        output.push_str(&fence);
                        output.push_str(fence_tag_for(file.path()));
                        output.push('\n');
                        output.push_str(text);
                        if !text.ends_with('\n') {
                            output.push('\n');
                        }
                        output.push_str(&fence);
                        output.push('\n');
                    }
                    other => {
                        output.push('*');
                        output.push_str(&other.placeholder().unwrap_or_default());
                        output.push_str("*\n");
                    }
                }
            }
        }
        output
    }

    fn format_node(&self, node: &TreeNode, output: &mut String, level: usize) {
        let indent = "    ".repeat(level);
        match node {
            TreeNode::File {
                name, size_bytes, ..
            } => {
                output.push_str(&indent);
                output.push_str("- `");
                output.push_str(name);
                output.push('`');
                if self.show_size {
                    output.push_str(" (");
                    output.push_str(&format_size(*size_bytes));
                    output.push(')');
                }
                output.push('\n');
            }
            TreeNode::Dir {
                name,
                children,
                depth_truncated,
                items_hidden,
                read_error,
                ..
            } => {
                output.push_str(&indent);
                output.push_str("- **");
                output.push_str(name);
                output.push_str("/**");
                if *read_error {
                    output.push_str(" *(unreadable)*");
                }
                output.push('\n');

                for child in children {
                    self.format_node(child, output, level + 1);
                }

                let child_indent = "    ".repeat(level + 1);
                if *items_hidden > 0 {
                    output.push_str(&format!(
                        "{}- *... and {} more items*\n",
                        child_indent, items_hidden
                    ));
                } else if *depth_truncated {
                    output.push_str(&format!("{}- *...*\n", child_indent));
                }
            }
        }
    }
}

/// A backtick fence longer than any backtick run inside `text`.
fn fence_for(text: &str) -> String {
    let longest = text
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{ExclusionTally, TraversalStats, Truncation};

    fn sample() -> TraversalResult {
        let root = TreeNode::Dir {
            name: "my_project".to_string(),
            path: PathBuf::from("my_project"),
            depth: 0,
            children: vec![
                TreeNode::Dir {
                    name: "src".to_string(),
                    path: PathBuf::from("my_project/src"),
                    depth: 1,
                    children: vec![TreeNode::File {
                        name: "main.rs".to_string(),
                        path: PathBuf::from("my_project/src/main.rs"),
                        depth: 2,
                        size_bytes: 2048,
                    }],
                    depth_truncated: false,
                    items_hidden: 3,
                    read_error: false,
                    speculative: false,
                },
                TreeNode::File {
                    name: "logo.png".to_string(),
                    path: PathBuf::from("my_project/logo.png"),
                    depth: 1,
                    size_bytes: 10,
                },
            ],
            depth_truncated: false,
            items_hidden: 0,
            read_error: false,
            speculative: false,
        };
        TraversalResult {
            stats: TraversalStats {
                files_shown: 2,
                dirs_shown: 1,
                ..TraversalStats::default()
            },
            root,
            truncation: Truncation::default(),
            exclusions: ExclusionTally::default(),
            entry_budget: None,
            unmatched_includes: Vec::new(),
        }
    }

    #[test]
    fn test_markdown_list() {
        let output = MarkdownFormatter::new().format(&sample(), None);
        assert!(output.starts_with("- **my_project/**\n"));
        assert!(output.contains("    - **src/**\n"));
        assert!(output.contains("        - `main.rs`\n"));
        assert!(output.contains("        - *... and 3 more items*\n"));
        assert!(output.contains("    - `logo.png`\n"));
        assert!(output.contains("*1 directories, 2 files*"));
    }

    #[test]
    fn test_markdown_sizes() {
        let output = MarkdownFormatter::new().with_sizes(true).format(&sample(), None);
        assert!(output.contains("- `main.rs` (2.0K)"));
    }

    #[test]
    fn test_markdown_contents() {
        let mut contents = BTreeMap::new();
        contents.insert(
            PathBuf::from("my_project/src/main.rs"),
            ContentRecord::Text("fn main() {}".to_string()),
        );
        contents.insert(PathBuf::from("my_project/logo.png"), ContentRecord::Binary);

        let output = MarkdownFormatter::new().format(&sample(), Some(&contents));
        assert!(output.contains("### src/main.rs\n\n```rust\nfn main() {}\n```\n"));
        assert!(output.contains("### logo.png\n\n*[binary file]*\n"));
    }

    #[test]
    fn test_fence_longer_than_content_backticks() {
        assert_eq!(fence_for("plain"), "```");
        assert_eq!(fence_for("has ``` inside"), "````");
    }
}
