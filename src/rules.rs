//! Layered ignore rules
//!
//! Ignore files are discovered from the root downwards and every line becomes
//! a [`Rule`] anchored at the directory that holds the file. The resulting
//! [`RuleSet`] is ordered by anchor depth and then by line order, and is
//! evaluated last-match-wins, so a deeper `!keep.log` overrides a shallower
//! `*.log` for the paths it covers.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::pattern::{Rule, RuleSource, to_match_path};

/// File name of the per-directory ignore file.
pub const IGNORE_FILE_NAME: &str = ".gitignore";

/// Directory names that are never walked, whatever the rules say.
pub const ALWAYS_SKIPPED_DIRS: &[&str] = &[".git"];

/// Outcome of evaluating a path against a [`RuleSet`].
#[derive(Debug, Clone, Copy)]
pub enum Match<'a> {
    /// No rule matched.
    None,
    /// The deciding rule excludes the path.
    Ignore(&'a Rule),
    /// The deciding rule is a negation that re-includes the path.
    Whitelist(&'a Rule),
}

impl<'a> Match<'a> {
    pub fn is_ignore(&self) -> bool {
        matches!(self, Match::Ignore(_))
    }

    pub fn is_whitelist(&self) -> bool {
        matches!(self, Match::Whitelist(_))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Match::None)
    }

    /// The rule that decided the outcome, if any.
    pub fn rule(&self) -> Option<&'a Rule> {
        match self {
            Match::None => None,
            Match::Ignore(rule) | Match::Whitelist(rule) => Some(rule),
        }
    }
}

/// Ordered, read-only collection of rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `root` for ignore files down to `max_depth` (0 = root only,
    /// `None` = unbounded).
    ///
    /// Directories already excluded by shallower rules are not scanned, and
    /// `.git` is never entered. Unreadable directories and ignore files are
    /// skipped with a warning; malformed lines are skipped individually.
    pub fn discover(root: &Path, max_depth: Option<usize>) -> RuleSet {
        let mut set = RuleSet::new();
        let mut level: Vec<(PathBuf, String)> = vec![(root.to_path_buf(), String::new())];
        let mut depth = 0;

        while !level.is_empty() {
            let mut next = Vec::new();

            for (dir, rel) in &level {
                let ignore_file = dir.join(IGNORE_FILE_NAME);
                if ignore_file.is_file() {
                    set.load_file(&ignore_file, rel, depth);
                }

                if max_depth.is_some_and(|max| depth >= max) {
                    continue;
                }

                let entries = match fs::read_dir(dir) {
                    Ok(entries) => entries,
                    Err(e) => {
                        warn!("skipping ignore discovery in {}: {}", dir.display(), e);
                        continue;
                    }
                };
                let mut children: Vec<_> = entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
                    .collect();
                children.sort_by_key(|e| e.file_name());

                for child in children {
                    let name = child.file_name().to_string_lossy().to_string();
                    if ALWAYS_SKIPPED_DIRS.contains(&name.as_str()) {
                        continue;
                    }
                    let child_rel = if rel.is_empty() {
                        name
                    } else {
                        format!("{}/{}", rel, name)
                    };
                    if set.matched(&child_rel, true).is_ignore() {
                        continue;
                    }
                    next.push((child.path(), child_rel));
                }
            }

            level = next;
            depth += 1;
        }

        debug!(
            "discovered {} ignore rules under {}",
            set.len(),
            root.display()
        );
        set
    }

    /// Read one ignore file and append its rules, anchored at `base`.
    fn load_file(&mut self, path: &Path, base: &str, depth: usize) {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("could not read {}: {}", path.display(), e);
                return;
            }
        };
        let text = String::from_utf8_lossy(&bytes);
        let before = self.rules.len();

        for (index, line) in text.lines().enumerate() {
            let source = RuleSource::IgnoreFile {
                path: path.to_path_buf(),
                line: index + 1,
            };
            match Rule::parse(line, base, depth, source) {
                Ok(Some(rule)) => self.rules.push(rule),
                Ok(None) => {}
                Err(e) => warn!("{}:{}: skipping line: {}", path.display(), index + 1, e),
            }
        }

        debug!(
            "loaded {} rules from {}",
            self.rules.len() - before,
            path.display()
        );
    }

    /// Parse `lines` as if they were an ignore file at `base`.
    pub fn add_lines<'l>(
        &mut self,
        lines: impl IntoIterator<Item = &'l str>,
        base: &str,
        depth: usize,
        file: &Path,
    ) -> Result<()> {
        for (index, line) in lines.into_iter().enumerate() {
            let source = RuleSource::IgnoreFile {
                path: file.to_path_buf(),
                line: index + 1,
            };
            if let Some(rule) = Rule::parse(line, base, depth, source)? {
                self.rules.push(rule);
            }
        }
        Ok(())
    }

    /// Merge rules (e.g. user excludes) at their anchor depth, after every
    /// existing rule of the same or shallower depth.
    pub fn merge(&mut self, rules: impl IntoIterator<Item = Rule>) {
        for rule in rules {
            let at = self
                .rules
                .iter()
                .position(|r| r.anchor_depth() > rule.anchor_depth())
                .unwrap_or(self.rules.len());
            self.rules.insert(at, rule);
        }
    }

    /// Evaluate `rel_path` alone (its ancestors are assumed to be visible).
    ///
    /// Rules with a depth scope that does not cover `depth` are skipped.
    pub fn matched_at(&self, rel_path: &str, is_dir: bool, depth: usize) -> Match<'_> {
        let mut outcome = Match::None;
        for rule in &self.rules {
            if !rule.applies_at(depth) || !rule.matches(rel_path, is_dir) {
                continue;
            }
            outcome = if rule.is_negated() {
                Match::Whitelist(rule)
            } else {
                Match::Ignore(rule)
            };
        }
        outcome
    }

    /// Evaluate `rel_path`, deriving its depth from the number of segments.
    pub fn matched(&self, rel_path: &str, is_dir: bool) -> Match<'_> {
        let depth = rel_path.split('/').count();
        self.matched_at(rel_path, is_dir, depth)
    }

    /// Evaluate `rel_path` and each of its ancestor directories, root first.
    ///
    /// An excluded ancestor is final: negation on the path itself cannot
    /// resurrect something whose directory was excluded.
    pub fn matched_path_or_any_parents(&self, rel_path: &str, is_dir: bool) -> Match<'_> {
        let mut end = 0;
        while let Some(offset) = rel_path[end..].find('/') {
            end += offset;
            let parent = &rel_path[..end];
            let m = self.matched(parent, true);
            if m.is_ignore() {
                return m;
            }
            end += 1;
        }
        self.matched(rel_path, is_dir)
    }

    /// Same as [`RuleSet::matched_path_or_any_parents`] for a path below `root`.
    pub fn matched_path(&self, root: &Path, path: &Path, is_dir: bool) -> Match<'_> {
        match path.strip_prefix(root) {
            Ok(rel) => self.matched_path_or_any_parents(&to_match_path(rel), is_dir),
            Err(_) => Match::None,
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
