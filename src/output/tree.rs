//! Tree formatter for text output
//!
//! `TreeFormatter` renders a `TraversalResult` as a box-drawing tree, either
//! into a string or straight to stdout with colors. Every limit that cut the
//! listing short leaves a visible marker.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use termcolor::{Buffer, Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::content::ContentRecord;
use crate::tree::{TraversalResult, TreeNode};

use super::config::OutputConfig;

const FILE_EMOJI: &str = "📄";
const DIR_EMOJI: &str = "📁";
const EMPTY_DIR_EMOJI: &str = "📂";

/// Formatter for text tree output.
pub struct TreeFormatter {
    config: OutputConfig,
}

impl TreeFormatter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Render to a plain string (colors are never embedded).
    pub fn format(
        &self,
        result: &TraversalResult,
        contents: Option<&BTreeMap<PathBuf, ContentRecord>>,
    ) -> String {
        let mut buffer = Buffer::no_color();
        // writing into memory cannot fail
        let _ = self.render(result, contents, &mut buffer);
        String::from_utf8_lossy(buffer.as_slice()).into_owned()
    }

    /// Print to stdout, colored when enabled.
    pub fn print(
        &self,
        result: &TraversalResult,
        contents: Option<&BTreeMap<PathBuf, ContentRecord>>,
    ) -> io::Result<()> {
        let choice = if self.config.use_color {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        let mut stdout = StandardStream::stdout(choice);
        self.render(result, contents, &mut stdout)
    }

    /// Render the tree, limit markers, footer and (optionally) contents.
    pub fn render<W: WriteColor>(
        &self,
        result: &TraversalResult,
        contents: Option<&BTreeMap<PathBuf, ContentRecord>>,
        out: &mut W,
    ) -> io::Result<()> {
        self.write_node(&result.root, out, "", true, true)?;

        if result.truncation.budget_exhausted {
            match result.entry_budget {
                Some(budget) if result.stats.entries_omitted > 0 => writeln!(
                    out,
                    "... and {} more entries (entry budget of {} reached)",
                    result.stats.entries_omitted, budget
                )?,
                Some(budget) => writeln!(out, "... entry budget of {} reached", budget)?,
                None => {}
            }
        }
        if result.truncation.aborted {
            writeln!(out, "... traversal aborted")?;
        }

        writeln!(out)?;
        writeln!(
            out,
            "{} directories, {} files",
            result.stats.dirs_shown, result.stats.files_shown
        )?;

        if let Some(contents) = contents {
            for file in result.root.files() {
                let Some(record) = contents.get(file.path()) else {
                    continue;
                };
                writeln!(out)?;
                writeln!(out, "==== {} ====", result.relative_path(file))?;
                let text = record.display_text();
                write!(out, "{}", text)?;
                if !text.ends_with('\n') {
                    writeln!(out)?;
                }
            }
        }
        Ok(())
    }

    fn write_name<W: WriteColor>(&self, out: &mut W, node: &TreeNode) -> io::Result<()> {
        if self.config.emoji {
            let emoji = match node {
                TreeNode::File { .. } => FILE_EMOJI,
                TreeNode::Dir {
                    children,
                    depth_truncated,
                    items_hidden,
                    ..
                } if children.is_empty() && !depth_truncated && *items_hidden == 0 => {
                    EMPTY_DIR_EMOJI
                }
                TreeNode::Dir { .. } => DIR_EMOJI,
            };
            write!(out, "{} ", emoji)?;
        }

        let hidden = node.name().starts_with('.') && node.depth() > 0;
        let mut spec = ColorSpec::new();
        if node.is_dir() {
            spec.set_fg(Some(Color::Blue)).set_bold(true);
        }
        if hidden {
            spec.set_dimmed(true);
        }
        out.set_color(&spec)?;
        write!(out, "{}", node.name())?;
        if node.is_dir() && node.depth() > 0 {
            write!(out, "/")?;
        }
        out.reset()?;
        Ok(())
    }

    fn write_node<W: WriteColor>(
        &self,
        node: &TreeNode,
        out: &mut W,
        prefix: &str,
        is_last: bool,
        is_root: bool,
    ) -> io::Result<()> {
        let connector = if is_last { "└── " } else { "├── " };
        if !is_root {
            write!(out, "{}{}", prefix, connector)?;
        }
        self.write_name(out, node)?;

        let TreeNode::Dir {
            children,
            depth_truncated,
            items_hidden,
            read_error,
            ..
        } = node
        else {
            writeln!(out)?;
            return Ok(());
        };

        if *read_error {
            write!(out, " [unreadable]")?;
        }
        writeln!(out)?;

        let new_prefix = if is_root {
            String::new()
        } else if is_last {
            format!("{}    ", prefix)
        } else {
            format!("{}│   ", prefix)
        };

        let has_marker = *depth_truncated || *items_hidden > 0;
        for (i, child) in children.iter().enumerate() {
            let child_is_last = i == children.len() - 1 && !has_marker;
            self.write_node(child, out, &new_prefix, child_is_last, false)?;
        }

        if *items_hidden > 0 {
            writeln!(out, "{}└── ... and {} more items", new_prefix, items_hidden)?;
        } else if *depth_truncated {
            writeln!(out, "{}└── ...", new_prefix)?;
        }
        Ok(())
    }
}
