//! Per-level summary of a traversal
//!
//! Counts the files and directories shown at each depth below the root,
//! printed after the tree when `--summary` is given.

use std::collections::BTreeMap;
use std::io;

use serde::Serialize;
use termcolor::{Buffer, Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::tree::TraversalResult;

/// Counts for one depth level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelSummary {
    pub depth: usize,
    pub files: usize,
    pub dirs: usize,
}

/// Shown entries grouped by depth, shallowest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeSummary {
    pub levels: Vec<LevelSummary>,
    pub files: usize,
    pub dirs: usize,
}

impl TreeSummary {
    /// Summarize the entries of a finished traversal. The root is not counted.
    pub fn from_result(result: &TraversalResult) -> Self {
        let mut by_depth: BTreeMap<usize, LevelSummary> = BTreeMap::new();
        for node in result.root.iter().filter(|n| n.depth() > 0) {
            let level = by_depth.entry(node.depth()).or_insert(LevelSummary {
                depth: node.depth(),
                ..LevelSummary::default()
            });
            if node.is_dir() {
                level.dirs += 1;
            } else {
                level.files += 1;
            }
        }

        let levels: Vec<LevelSummary> = by_depth.into_values().collect();
        Self {
            files: levels.iter().map(|l| l.files).sum(),
            dirs: levels.iter().map(|l| l.dirs).sum(),
            levels,
        }
    }

    /// Render the summary table without color.
    pub fn format(&self) -> String {
        let mut buffer = Buffer::no_color();
        let _ = self.render(&mut buffer);
        String::from_utf8_lossy(buffer.as_slice()).into_owned()
    }

    /// Print the summary table to stdout.
    pub fn print(&self, use_color: bool) -> io::Result<()> {
        let color_choice = if use_color {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        let mut stdout = StandardStream::stdout(color_choice);
        self.render(&mut stdout)
    }

    pub fn render<W: WriteColor>(&self, out: &mut W) -> io::Result<()> {
        let mut bold = ColorSpec::new();
        bold.set_bold(true);
        out.set_color(&bold)?;
        writeln!(out, "Summary")?;
        out.reset()?;
        writeln!(out, "───────")?;

        let mut level_color = ColorSpec::new();
        level_color.set_fg(Some(Color::Cyan));

        for level in &self.levels {
            out.set_color(&level_color)?;
            write!(out, "Level {:<4}", level.depth)?;
            out.reset()?;
            writeln!(out, "{:>6} dirs  {:>6} files", level.dirs, level.files)?;
        }

        out.set_color(&bold)?;
        write!(out, "Total     ")?;
        out.reset()?;
        writeln!(out, "{:>6} dirs  {:>6} files", self.dirs, self.files)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{ExclusionTally, TraversalStats, TreeNode, Truncation};
    use std::path::PathBuf;

    fn file(path: &str, depth: usize) -> TreeNode {
        TreeNode::File {
            name: path.rsplit('/').next().unwrap().to_string(),
            path: PathBuf::from(path),
            depth,
            size_bytes: 1,
        }
    }

    fn dir(path: &str, depth: usize, children: Vec<TreeNode>) -> TreeNode {
        TreeNode::Dir {
            name: path.rsplit('/').next().unwrap().to_string(),
            path: PathBuf::from(path),
            depth,
            children,
            depth_truncated: false,
            items_hidden: 0,
            read_error: false,
            speculative: false,
        }
    }

    fn sample() -> TraversalResult {
        let root = dir(
            "p",
            0,
            vec![
                file("p/README.md", 1),
                dir(
                    "p/src",
                    1,
                    vec![
                        file("p/src/a.rs", 2),
                        dir("p/src/util", 2, vec![file("p/src/util/b.rs", 3)]),
                    ],
                ),
                dir("p/docs", 1, vec![]),
            ],
        );
        TraversalResult {
            stats: TraversalStats::default(),
            root,
            truncation: Truncation::default(),
            exclusions: ExclusionTally::default(),
            entry_budget: None,
            unmatched_includes: Vec::new(),
        }
    }

    #[test]
    fn test_levels() {
        let summary = TreeSummary::from_result(&sample());
        assert_eq!(
            summary.levels,
            vec![
                LevelSummary { depth: 1, files: 1, dirs: 2 },
                LevelSummary { depth: 2, files: 1, dirs: 1 },
                LevelSummary { depth: 3, files: 1, dirs: 0 },
            ]
        );
        assert_eq!(summary.files, 3);
        assert_eq!(summary.dirs, 3);
    }

    #[test]
    fn test_empty_root() {
        let mut result = sample();
        result.root = dir("p", 0, vec![]);
        let summary = TreeSummary::from_result(&result);
        assert!(summary.levels.is_empty());
        assert_eq!(summary.files, 0);
    }

    #[test]
    fn test_format() {
        let output = TreeSummary::from_result(&sample()).format();
        assert!(output.starts_with("Summary\n"));
        assert!(output.contains("Level 1        2 dirs       1 files\n"));
        assert!(output.contains("Total          3 dirs       3 files\n"));
    }
}
