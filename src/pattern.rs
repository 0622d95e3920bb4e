//! Gitignore-style pattern matching
//!
//! A [`Rule`] is one parsed line of an ignore file (or one user-supplied
//! include/exclude pattern). Rules are compiled once with globset and matched
//! against `/`-separated paths relative to the traversal root.
//!
//! Supported syntax:
//! - `*` matches any run of characters except `/`
//! - `**` matches any run including `/` (`**/x`, `x/**`, `a/**/b`)
//! - `?` matches a single character, `[...]` is a character class
//! - a leading `!` negates the rule (re-includes a path)
//! - a trailing `/` restricts the rule to directories
//! - a leading `/`, or any `/` in the middle, anchors the rule to the
//!   directory that owns it; otherwise the rule matches the basename at any
//!   depth below that directory

use std::fmt;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};

use crate::error::{Error, Result};

/// Where a rule was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    /// A line of an ignore file discovered on disk.
    IgnoreFile { path: PathBuf, line: usize },
    /// A `--exclude` pattern.
    UserExclude,
    /// A `--include` pattern.
    UserInclude,
    /// A `--no-contents-for` pattern.
    NoContents,
}

/// One parsed and compiled pattern. Immutable once built.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: String,
    glob: String,
    negated: bool,
    dir_only: bool,
    anchored: bool,
    base: String,
    anchor_depth: usize,
    max_depth: Option<usize>,
    source: RuleSource,
    matcher: GlobMatcher,
}

impl Rule {
    /// Parse one ignore-file line.
    ///
    /// `base` is the owning directory relative to the root (`""` for the root
    /// itself) and `anchor_depth` its depth. Returns `Ok(None)` for blank and
    /// comment lines.
    pub fn parse(
        line: &str,
        base: &str,
        anchor_depth: usize,
        source: RuleSource,
    ) -> Result<Option<Rule>> {
        let line = trim_trailing_spaces(line.trim_end_matches(['\r', '\n']));
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (negated, body) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };

        let (dir_only, body) = match body.strip_suffix('/') {
            Some(rest) => (true, rest),
            None => (false, body),
        };

        let (anchored, body) = match body.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (body.contains('/'), body),
        };

        if body.is_empty() {
            return Ok(None);
        }

        let matcher = GlobBuilder::new(body)
            .literal_separator(true)
            .backslash_escape(true)
            .build()
            .map_err(|source| Error::InvalidPattern {
                pattern: line.to_string(),
                source,
            })?
            .compile_matcher();

        Ok(Some(Rule {
            pattern: line.to_string(),
            glob: body.to_string(),
            negated,
            dir_only,
            anchored,
            base: base.trim_matches('/').to_string(),
            anchor_depth,
            max_depth: None,
            source,
            matcher,
        }))
    }

    /// Parse a user-supplied pattern anchored at the root.
    ///
    /// User patterns cannot be negated; a leading `!` is a configuration error.
    /// Blank patterns yield `Ok(None)`.
    pub fn user(
        pattern: &str,
        source: RuleSource,
        max_depth: Option<usize>,
    ) -> Result<Option<Rule>> {
        if pattern.trim_start().starts_with('!') {
            return Err(Error::config(format!(
                "pattern '{}' cannot be negated; only ignore files support '!'",
                pattern
            )));
        }
        let rule = Rule::parse(pattern, "", 0, source)?;
        Ok(rule.map(|mut r| {
            r.max_depth = max_depth;
            r
        }))
    }

    /// Check whether this rule matches `rel_path` (relative to the traversal
    /// root, `/`-separated).
    pub fn matches(&self, rel_path: &str, is_dir: bool) -> bool {
        if self.dir_only && !is_dir {
            return false;
        }
        let Some(local) = self.strip_base(rel_path) else {
            return false;
        };
        if self.anchored {
            self.matcher.is_match(local)
        } else {
            self.matcher.is_match(basename(local))
        }
    }

    /// Whether an entry at `depth` is inside this rule's depth scope.
    pub fn applies_at(&self, depth: usize) -> bool {
        self.max_depth.is_none_or(|max| depth <= max)
    }

    /// For anchored rules, the longest glob-free directory prefix relative to
    /// the root (`docs/api/*.md` -> `docs/api`).
    pub fn literal_dir_prefix(&self) -> Option<String> {
        if !self.anchored {
            return None;
        }
        let literal_end = self
            .glob
            .find(['*', '?', '[', '{', '\\'])
            .unwrap_or(self.glob.len());
        let literal = &self.glob[..literal_end];
        let dir = if literal_end == self.glob.len() && self.dir_only {
            literal
        } else {
            literal.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
        };
        let full = match (self.base.is_empty(), dir.is_empty()) {
            (true, _) => dir.to_string(),
            (false, true) => self.base.clone(),
            (false, false) => format!("{}/{}", self.base, dir),
        };
        if full.is_empty() { None } else { Some(full) }
    }

    fn strip_base<'p>(&self, rel_path: &'p str) -> Option<&'p str> {
        if self.base.is_empty() {
            return Some(rel_path);
        }
        rel_path.strip_prefix(self.base.as_str())?.strip_prefix('/')
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn is_dir_only(&self) -> bool {
        self.dir_only
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// Directory that owns the rule, relative to the root.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn anchor_depth(&self) -> usize {
        self.anchor_depth
    }

    pub fn source(&self) -> &RuleSource {
        &self.source
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            RuleSource::IgnoreFile { path, line } => {
                write!(f, "{}:{}: {}", path.display(), line, self.pattern)
            }
            RuleSource::UserExclude => write!(f, "--exclude {}", self.pattern),
            RuleSource::UserInclude => write!(f, "--include {}", self.pattern),
            RuleSource::NoContents => write!(f, "--no-contents-for {}", self.pattern),
        }
    }
}

/// Convert a relative path into the `/`-separated form rules match against.
pub fn to_match_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Strip unescaped trailing spaces, as git does.
fn trim_trailing_spaces(line: &str) -> &str {
    let mut end = line.len();
    while end > 0 && line.as_bytes()[end - 1] == b' ' {
        if end >= 2 && line.as_bytes()[end - 2] == b'\\' {
            break;
        }
        end -= 1;
    }
    &line[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(line: &str) -> Rule {
        Rule::parse(line, "", 0, RuleSource::UserExclude)
            .unwrap()
            .expect("pattern should parse to a rule")
    }

    fn rule_at(line: &str, base: &str, depth: usize) -> Rule {
        Rule::parse(line, base, depth, RuleSource::UserExclude)
            .unwrap()
            .expect("pattern should parse to a rule")
    }

    #[test]
    fn test_blank_and_comment_lines() {
        let src = || RuleSource::UserExclude;
        assert!(Rule::parse("", "", 0, src()).unwrap().is_none());
        assert!(Rule::parse("   ", "", 0, src()).unwrap().is_none());
        assert!(Rule::parse("# comment", "", 0, src()).unwrap().is_none());
        assert!(Rule::parse("!", "", 0, src()).unwrap().is_none());
        assert!(Rule::parse("/", "", 0, src()).unwrap().is_none());
    }

    #[test]
    fn test_glob_match() {
        // Basic patterns
        assert!(rule("*.rs").matches("main.rs", false));
        assert!(rule("*.rs").matches("src/lib.rs", false));
        assert!(!rule("*.rs").matches("main.py", false));
        assert!(rule("test*").matches("test_foo", false));
        assert!(!rule("test*").matches("foo_test", false));
        assert!(rule("exact").matches("exact", false));
        assert!(!rule("exact").matches("notexact", false));

        // Single character wildcard
        assert!(rule("test?.rs").matches("test1.rs", false));
        assert!(!rule("test?.rs").matches("test12.rs", false));

        // Character classes and ranges
        assert!(rule("[abc].txt").matches("b.txt", false));
        assert!(!rule("[abc].txt").matches("d.txt", false));
        assert!(rule("[a-z].txt").matches("x.txt", false));
        assert!(!rule("[a-z].txt").matches("X.txt", false));
    }

    #[test]
    fn test_case_sensitive() {
        assert!(rule("README.md").matches("README.md", false));
        assert!(!rule("README.md").matches("readme.md", false));
    }

    #[test]
    fn test_star_does_not_cross_separator() {
        let r = rule("src/*.rs");
        assert!(r.is_anchored());
        assert!(r.matches("src/main.rs", false));
        assert!(!r.matches("src/nested/main.rs", false));
        assert!(!r.matches("other/src/main.rs", false));
    }

    #[test]
    fn test_double_star() {
        let r = rule("**/generated");
        assert!(r.matches("generated", true));
        assert!(r.matches("a/b/generated", true));

        let r = rule("logs/**");
        assert!(r.matches("logs/a.txt", false));
        assert!(r.matches("logs/deep/a.txt", false));
        assert!(!r.matches("logs", true));

        let r = rule("a/**/z.txt");
        assert!(r.matches("a/z.txt", false));
        assert!(r.matches("a/b/c/z.txt", false));
        assert!(!r.matches("b/z.txt", false));
    }

    #[test]
    fn test_dir_only() {
        let r = rule("build/");
        assert!(r.is_dir_only());
        assert!(!r.is_anchored());
        assert!(r.matches("build", true));
        assert!(r.matches("nested/build", true));
        assert!(!r.matches("build", false));
    }

    #[test]
    fn test_leading_slash_anchors() {
        let r = rule("/target");
        assert!(r.is_anchored());
        assert!(r.matches("target", true));
        assert!(!r.matches("crates/target", true));
    }

    #[test]
    fn test_negation_flag() {
        let r = rule("!keep.log");
        assert!(r.is_negated());
        assert!(r.matches("keep.log", false));
        assert_eq!(r.pattern(), "!keep.log");
    }

    #[test]
    fn test_escaped_leading_characters() {
        let r = rule(r"\#notes");
        assert!(!r.is_negated());
        assert!(r.matches("#notes", false));

        let r = rule(r"\!important");
        assert!(!r.is_negated());
        assert!(r.matches("!important", false));
    }

    #[test]
    fn test_trailing_spaces_trimmed_unless_escaped() {
        assert!(rule("foo.txt   ").matches("foo.txt", false));
        assert_eq!(trim_trailing_spaces(r"foo\ "), r"foo\ ");
    }

    #[test]
    fn test_rule_scoped_to_base_directory() {
        let r = rule_at("*.tmp", "sub", 1);
        assert_eq!(r.anchor_depth(), 1);
        assert!(r.matches("sub/a.tmp", false));
        assert!(r.matches("sub/deeper/a.tmp", false));
        assert!(!r.matches("a.tmp", false));
        assert!(!r.matches("subway/a.tmp", false));

        let r = rule_at("/only-here.txt", "sub", 1);
        assert!(r.matches("sub/only-here.txt", false));
        assert!(!r.matches("sub/deeper/only-here.txt", false));
    }

    #[test]
    fn test_user_patterns_reject_negation() {
        let err = Rule::user("!foo", RuleSource::UserExclude, None).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_invalid_glob_is_reported() {
        let err = Rule::user("[unclosed", RuleSource::UserExclude, None).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn test_depth_scope() {
        let r = Rule::user("*.log", RuleSource::UserExclude, Some(1))
            .unwrap()
            .unwrap();
        assert!(r.applies_at(1));
        assert!(!r.applies_at(2));

        let r = Rule::user("*.log", RuleSource::UserExclude, None)
            .unwrap()
            .unwrap();
        assert!(r.applies_at(99));
    }

    #[test]
    fn test_literal_dir_prefix() {
        assert_eq!(rule("docs/api/*.md").literal_dir_prefix().as_deref(), Some("docs/api"));
        assert_eq!(rule(".github/").literal_dir_prefix(), None);
        assert_eq!(rule("/.github/").literal_dir_prefix().as_deref(), Some(".github"));
        assert_eq!(rule(".config/app.toml").literal_dir_prefix().as_deref(), Some(".config"));
        assert_eq!(rule("*.md").literal_dir_prefix(), None);
        assert_eq!(rule_at("/x/*.rs", "sub", 1).literal_dir_prefix().as_deref(), Some("sub/x"));
    }

    #[test]
    fn test_to_match_path() {
        assert_eq!(to_match_path(Path::new("a/b/c.txt")), "a/b/c.txt");
        assert_eq!(to_match_path(Path::new("single")), "single");
    }

    #[test]
    fn test_display_names_source() {
        let r = Rule::parse(
            "*.log",
            "",
            0,
            RuleSource::IgnoreFile {
                path: PathBuf::from(".gitignore"),
                line: 3,
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(r.to_string(), ".gitignore:3: *.log");
    }
}
