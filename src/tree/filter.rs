//! Per-entry visibility decisions
//!
//! A [`FilterPolicy`] is a short chain of independent [`FilterStage`]s. Each
//! stage looks at one [`Candidate`] and either lets it pass, rejects it with a
//! reason, or defers (keeps a directory around only as a possible container
//! of matching descendants). The first rejection wins; any deferral turns a
//! directory into [`FilterDecision::ExcludedButDescend`].

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use ignore::types::{Types, TypesBuilder};
use tracing::debug;

use crate::error::{Error, Result};
use crate::pattern::{Rule, RuleSource};
use crate::rules::{ALWAYS_SKIPPED_DIRS, Match, RuleSet};

use super::config::{KindFilter, WalkerConfig};
use super::node::{ExclusionReason, TraversalResult};

/// An entry under consideration.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// Path as walked (root joined with the relative path).
    pub path: &'a Path,
    /// `/`-separated path relative to the root.
    pub rel_path: &'a str,
    pub name: &'a str,
    pub is_dir: bool,
    /// Root = 0.
    pub depth: usize,
}

/// Final outcome for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    Visible,
    Excluded(ExclusionReason),
    /// Not shown by itself, but walked for descendants that might match.
    ExcludedButDescend,
}

/// Outcome of a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Reject(ExclusionReason),
    Defer,
}

/// One predicate in the filter chain.
pub trait FilterStage: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, candidate: &Candidate<'_>) -> Verdict;
}

/// Include patterns and file types, shared by the hidden and include stages.
struct Includes {
    patterns: Vec<Rule>,
    types: Option<Types>,
    type_names: Vec<String>,
}

impl Includes {
    fn new(config: &WalkerConfig) -> Result<Self> {
        let mut patterns = Vec::new();
        for pattern in &config.includes {
            if let Some(rule) = Rule::user(pattern, RuleSource::UserInclude, None)? {
                patterns.push(rule);
            }
        }
        let types = build_types(&config.include_file_types)?;
        Ok(Self {
            patterns,
            types,
            type_names: config.include_file_types.clone(),
        })
    }

    fn is_active(&self) -> bool {
        !self.patterns.is_empty() || self.types.is_some()
    }

    fn pattern_matches(&self, rel_path: &str, is_dir: bool) -> bool {
        self.patterns.iter().any(|r| r.matches(rel_path, is_dir))
    }

    fn type_matches(&self, name: &str) -> bool {
        self.types
            .as_ref()
            .is_some_and(|t| t.matched(name, false).is_whitelist())
    }

    /// Whether an ancestor directory of `rel_path` matches an include directly.
    fn ancestor_matches(&self, rel_path: &str) -> bool {
        rel_path
            .match_indices('/')
            .any(|(i, _)| self.pattern_matches(&rel_path[..i], true))
    }

    /// Whether some include names a literal path inside directory `rel_path`.
    fn points_inside(&self, rel_path: &str) -> bool {
        self.patterns.iter().filter_map(Rule::literal_dir_prefix).any(|prefix| {
            prefix == rel_path
                || prefix
                    .strip_prefix(rel_path)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    fn file_included(&self, rel_path: &str, name: &str) -> bool {
        self.pattern_matches(rel_path, false)
            || self.type_matches(name)
            || self.ancestor_matches(rel_path)
    }
}

/// Build a type matcher from names such as `rust`, `py` or `.toml`.
///
/// Known ripgrep type names select that type; anything else is treated as a
/// bare file extension.
fn build_types(names: &[String]) -> Result<Option<Types>> {
    if names.is_empty() {
        return Ok(None);
    }
    let mut builder = TypesBuilder::new();
    builder.add_defaults();
    let known: HashSet<String> = builder
        .definitions()
        .iter()
        .map(|d| d.name().to_string())
        .collect();

    for raw in names {
        let name = raw.trim().trim_start_matches('.');
        if known.contains(name) {
            builder.select(name);
            continue;
        }
        let type_name: String = name.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        if type_name.is_empty() {
            return Err(Error::InvalidFileType {
                name: raw.clone(),
                source: ignore::Error::InvalidDefinition,
            });
        }
        let type_name = format!("ext{}", type_name);
        builder
            .add(&type_name, &format!("*.{}", name))
            .map_err(|source| Error::InvalidFileType {
                name: raw.clone(),
                source,
            })?;
        builder.select(&type_name);
    }

    let types = builder.build().map_err(|source| Error::InvalidFileType {
        name: names.join(","),
        source,
    })?;
    Ok(Some(types))
}

/// Hidden entries (leading `.`), unless hidden items are requested or an
/// include pattern reaches them.
struct HiddenStage<'p> {
    include_hidden: bool,
    includes: &'p Includes,
}

impl FilterStage for HiddenStage<'_> {
    fn name(&self) -> &'static str {
        "hidden"
    }

    fn evaluate(&self, candidate: &Candidate<'_>) -> Verdict {
        if self.include_hidden || !candidate.name.starts_with('.') {
            return Verdict::Pass;
        }
        let overridden = self.includes.pattern_matches(candidate.rel_path, candidate.is_dir)
            || (candidate.is_dir && self.includes.points_inside(candidate.rel_path));
        if overridden {
            Verdict::Pass
        } else {
            Verdict::Reject(ExclusionReason::Hidden)
        }
    }
}

/// Ignore-file rules and user excludes, evaluated last-match-wins.
struct RuleStage<'p> {
    rules: &'p RuleSet,
}

impl FilterStage for RuleStage<'_> {
    fn name(&self) -> &'static str {
        "rules"
    }

    fn evaluate(&self, candidate: &Candidate<'_>) -> Verdict {
        if candidate.is_dir && ALWAYS_SKIPPED_DIRS.contains(&candidate.name) {
            return Verdict::Reject(ExclusionReason::IgnoreRule);
        }
        match self
            .rules
            .matched_at(candidate.rel_path, candidate.is_dir, candidate.depth)
        {
            Match::Ignore(rule) => match rule.source() {
                RuleSource::UserExclude => Verdict::Reject(ExclusionReason::UserExclude),
                _ => Verdict::Reject(ExclusionReason::IgnoreRule),
            },
            Match::Whitelist(_) | Match::None => Verdict::Pass,
        }
    }
}

/// Include patterns and file types. Directories are deferred unless matched
/// directly.
struct IncludeStage<'p> {
    includes: &'p Includes,
}

impl FilterStage for IncludeStage<'_> {
    fn name(&self) -> &'static str {
        "include"
    }

    fn evaluate(&self, candidate: &Candidate<'_>) -> Verdict {
        if !self.includes.is_active() {
            return Verdict::Pass;
        }
        if candidate.is_dir {
            if self.includes.pattern_matches(candidate.rel_path, true)
                || self.includes.ancestor_matches(candidate.rel_path)
            {
                Verdict::Pass
            } else {
                Verdict::Defer
            }
        } else if self.includes.file_included(candidate.rel_path, candidate.name) {
            Verdict::Pass
        } else {
            Verdict::Reject(ExclusionReason::NotIncluded)
        }
    }
}

/// Files-only / directories-only mode.
struct KindStage {
    kind: KindFilter,
}

impl FilterStage for KindStage {
    fn name(&self) -> &'static str {
        "kind"
    }

    fn evaluate(&self, candidate: &Candidate<'_>) -> Verdict {
        match (self.kind, candidate.is_dir) {
            (KindFilter::DirsOnly, false) => Verdict::Reject(ExclusionReason::DirsOnly),
            (KindFilter::FilesOnly, true) => Verdict::Defer,
            _ => Verdict::Pass,
        }
    }
}

/// Explicit file selection (interactive mode).
struct SelectionStage<'p> {
    selected: &'p BTreeSet<PathBuf>,
}

impl FilterStage for SelectionStage<'_> {
    fn name(&self) -> &'static str {
        "selection"
    }

    fn evaluate(&self, candidate: &Candidate<'_>) -> Verdict {
        if candidate.is_dir {
            let below = self
                .selected
                .range(candidate.path.to_path_buf()..)
                .next()
                .is_some_and(|p| p.starts_with(candidate.path));
            if below {
                Verdict::Defer
            } else {
                Verdict::Reject(ExclusionReason::NotSelected)
            }
        } else if self.selected.contains(candidate.path) {
            Verdict::Pass
        } else {
            Verdict::Reject(ExclusionReason::NotSelected)
        }
    }
}

/// The combined filter for one traversal. Read-only once built.
pub struct FilterPolicy {
    rules: RuleSet,
    includes: Includes,
    include_hidden: bool,
    kind: KindFilter,
    selection: Option<BTreeSet<PathBuf>>,
}

impl FilterPolicy {
    /// Combine discovered ignore rules with the user settings in `config`.
    ///
    /// User excludes join the rule set at the root anchor, after the root
    /// ignore file's own rules. Invalid user patterns are configuration errors.
    pub fn new(mut rules: RuleSet, config: &WalkerConfig) -> Result<Self> {
        let mut excludes = Vec::new();
        for pattern in &config.excludes {
            let rule = Rule::user(pattern, RuleSource::UserExclude, config.exclude_depth)?;
            excludes.extend(rule);
        }
        rules.merge(excludes);

        let includes = Includes::new(config)?;
        debug!(
            "filter policy: {} rules, {} include patterns, {} file types",
            rules.len(),
            includes.patterns.len(),
            includes.type_names.len()
        );

        Ok(Self {
            rules,
            includes,
            include_hidden: config.include_hidden,
            kind: config.kind_filter,
            selection: config.selection.clone(),
        })
    }

    /// Run the stages in order and fold their verdicts into one decision.
    pub fn decide(&self, candidate: &Candidate<'_>) -> FilterDecision {
        let hidden = HiddenStage {
            include_hidden: self.include_hidden,
            includes: &self.includes,
        };
        let rules = RuleStage { rules: &self.rules };
        let include = IncludeStage {
            includes: &self.includes,
        };
        let kind = KindStage { kind: self.kind };
        let selection = self.selection.as_ref().map(|selected| SelectionStage { selected });

        let mut stages: Vec<&dyn FilterStage> = vec![&hidden, &rules, &include, &kind];
        if let Some(stage) = &selection {
            stages.push(stage);
        }
        fold(&stages, candidate)
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Include patterns and file types that matched no file of `result`.
    pub fn unmatched_includes(&self, result: &TraversalResult) -> Vec<String> {
        let files: Vec<(String, &str)> = result
            .root
            .files()
            .map(|f| (result.relative_path(f), f.name()))
            .collect();

        let mut unmatched = Vec::new();
        for rule in &self.includes.patterns {
            let hit = files.iter().any(|(rel, _)| {
                rule.matches(rel, false)
                    || rel
                        .match_indices('/')
                        .any(|(i, _)| rule.matches(&rel[..i], true))
            });
            if !hit {
                unmatched.push(rule.pattern().to_string());
            }
        }
        for name in &self.includes.type_names {
            let Ok(Some(types)) = build_types(std::slice::from_ref(name)) else {
                continue;
            };
            if !files.iter().any(|(_, n)| types.matched(n, false).is_whitelist()) {
                unmatched.push(name.clone());
            }
        }
        unmatched
    }
}

fn fold(stages: &[&dyn FilterStage], candidate: &Candidate<'_>) -> FilterDecision {
    let mut deferred = false;
    for stage in stages {
        match stage.evaluate(candidate) {
            Verdict::Pass => {}
            Verdict::Reject(reason) => return FilterDecision::Excluded(reason),
            Verdict::Defer => {
                if !candidate.is_dir {
                    debug!("stage {} deferred a file: {}", stage.name(), candidate.rel_path);
                    return FilterDecision::Excluded(ExclusionReason::NotIncluded);
                }
                deferred = true;
            }
        }
    }
    if deferred {
        FilterDecision::ExcludedButDescend
    } else {
        FilterDecision::Visible
    }
}
