//! File content loading for exports that embed contents
//!
//! Contents are read only on request, classified, and kept in a side map keyed
//! by path so the tree itself stays reusable across renderers.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use content_inspector::{ContentType, inspect};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::Result;
use crate::pattern::{Rule, RuleSource};
use crate::tree::{TraversalResult, format_mb};

/// Files larger than this are not loaded (1 MiB).
pub const CONTENT_SIZE_LIMIT: u64 = 1024 * 1024;

/// Bytes sniffed from oversized files to tell binary from text.
const SNIFF_WINDOW: u64 = 8 * 1024;

/// What was found when loading one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRecord {
    Text(String),
    Binary,
    Oversized { size: u64 },
    Unreadable { reason: String },
    /// Contents deliberately not loaded (`--no-contents-for`).
    Skipped,
}

impl ContentRecord {
    /// Text to show instead of the contents, `None` for loaded text.
    pub fn placeholder(&self) -> Option<String> {
        match self {
            ContentRecord::Text(_) => None,
            ContentRecord::Binary => Some("[binary file]".to_string()),
            ContentRecord::Oversized { size } => {
                Some(format!("[file too large: {}]", format_mb(*size)))
            }
            ContentRecord::Unreadable { reason } => Some(format!("[unreadable: {}]", reason)),
            ContentRecord::Skipped => Some("[contents omitted]".to_string()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentRecord::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Loaded text, or the placeholder.
    pub fn display_text(&self) -> String {
        match self {
            ContentRecord::Text(text) => text.clone(),
            other => other.placeholder().unwrap_or_default(),
        }
    }
}

/// Load and classify one file with the default size limit.
pub fn load(path: &Path) -> ContentRecord {
    load_with_limit(path, CONTENT_SIZE_LIMIT)
}

/// Load and classify one file.
///
/// A file exactly `limit` bytes long is loaded; one byte more yields
/// [`ContentRecord::Oversized`] unless the file looks binary.
pub fn load_with_limit(path: &Path, limit: u64) -> ContentRecord {
    match try_load(path, limit) {
        Ok(record) => record,
        Err(e) => ContentRecord::Unreadable {
            reason: e.to_string(),
        },
    }
}

fn try_load(path: &Path, limit: u64) -> io::Result<ContentRecord> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();

    if size > limit {
        let mut head = Vec::new();
        file.take(SNIFF_WINDOW).read_to_end(&mut head)?;
        if looks_binary(&head) {
            return Ok(ContentRecord::Binary);
        }
        return Ok(ContentRecord::Oversized { size });
    }

    let mut bytes = Vec::with_capacity(size as usize);
    file.take(limit + 1).read_to_end(&mut bytes)?;
    if bytes.len() as u64 > limit {
        // grew since the metadata call
        return Ok(if looks_binary(&bytes) {
            ContentRecord::Binary
        } else {
            ContentRecord::Oversized {
                size: bytes.len() as u64,
            }
        });
    }

    Ok(classify(bytes))
}

fn looks_binary(bytes: &[u8]) -> bool {
    if bytes.contains(&0) {
        return true;
    }
    matches!(
        inspect(bytes),
        ContentType::BINARY
            | ContentType::UTF_16LE
            | ContentType::UTF_16BE
            | ContentType::UTF_32LE
            | ContentType::UTF_32BE
    )
}

fn classify(bytes: Vec<u8>) -> ContentRecord {
    if looks_binary(&bytes) {
        return ContentRecord::Binary;
    }
    let bytes = if inspect(&bytes) == ContentType::UTF_8_BOM {
        bytes[3..].to_vec()
    } else {
        bytes
    };
    match String::from_utf8(bytes) {
        Ok(text) => ContentRecord::Text(text),
        Err(_) => ContentRecord::Binary,
    }
}

/// Options for bulk loading.
#[derive(Debug, Clone)]
pub struct ContentOptions {
    pub limit: u64,
    /// Worker threads. 0 = auto-detect, 1 = sequential, N = dedicated pool.
    pub jobs: usize,
    skip: Vec<Rule>,
}

impl Default for ContentOptions {
    fn default() -> Self {
        Self {
            limit: CONTENT_SIZE_LIMIT,
            jobs: 0,
            skip: Vec::new(),
        }
    }
}

impl ContentOptions {
    /// Options that skip loading files matching any of `patterns`.
    pub fn new(jobs: usize, patterns: &[String]) -> Result<Self> {
        let mut skip = Vec::new();
        for pattern in patterns {
            if let Some(rule) = Rule::user(pattern, RuleSource::NoContents, None)? {
                skip.push(rule);
            }
        }
        Ok(Self {
            jobs,
            skip,
            ..Self::default()
        })
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Whether `rel_path` or one of its parent directories matches a skip
    /// pattern.
    fn skips(&self, rel_path: &str) -> bool {
        let parents = rel_path
            .match_indices('/')
            .map(|(end, _)| (&rel_path[..end], true));
        parents
            .chain(std::iter::once((rel_path, false)))
            .any(|(path, is_dir)| self.skip.iter().any(|r| r.matches(path, is_dir)))
    }
}

/// Load the contents of every file in `result`.
///
/// Reads run in parallel; the map is keyed by path so output order always
/// comes from the tree.
pub fn load_contents(
    result: &TraversalResult,
    options: &ContentOptions,
) -> BTreeMap<PathBuf, ContentRecord> {
    let files: Vec<(PathBuf, bool)> = result
        .root
        .files()
        .map(|f| (f.path().to_path_buf(), options.skips(&result.relative_path(f))))
        .collect();
    let limit = options.limit;

    let load_one = |(path, skipped): &(PathBuf, bool)| {
        let record = if *skipped {
            ContentRecord::Skipped
        } else {
            load_with_limit(path, limit)
        };
        (path.clone(), record)
    };

    let loaded: Vec<(PathBuf, ContentRecord)> = match options.jobs {
        0 => files.par_iter().map(load_one).collect(),
        1 => files.iter().map(load_one).collect(),
        n => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
            Ok(pool) => pool.install(|| files.par_iter().map(load_one).collect()),
            Err(e) => {
                warn!("could not build a pool of {} threads: {}", n, e);
                files.par_iter().map(load_one).collect()
            }
        },
    };

    debug!("loaded contents of {} files", loaded.len());
    loaded.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{WalkerConfig, traverse};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_text_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.rs");
        fs::write(&path, "fn main() {}").unwrap();

        assert_eq!(load(&path), ContentRecord::Text("fn main() {}".to_string()));
        assert_eq!(load(&path).placeholder(), None);
    }

    #[test]
    fn test_null_byte_is_binary_regardless_of_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"hello\0world").unwrap();
        assert_eq!(load(&path), ContentRecord::Binary);

        // null byte past the sniffing window of the inspector
        let mut bytes = vec![b'a'; 4096];
        bytes.push(0);
        fs::write(&path, &bytes).unwrap();
        assert_eq!(load(&path), ContentRecord::Binary);
    }

    #[test]
    fn test_invalid_utf8_is_binary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("latin1.txt");
        fs::write(&path, [b'c', b'a', b'f', 0xE9]).unwrap();
        assert_eq!(load(&path), ContentRecord::Binary);
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bom.txt");
        fs::write(&path, b"\xEF\xBB\xBFhello").unwrap();
        assert_eq!(load(&path), ContentRecord::Text("hello".to_string()));
    }

    #[test]
    fn test_file_exactly_at_limit_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("at.txt");
        let limit = 50_000u64;
        fs::write(&path, "x".repeat(limit as usize)).unwrap();

        let record = load_with_limit(&path, limit);
        assert_eq!(record.as_text().map(str::len), Some(limit as usize));
    }

    #[test]
    fn test_one_byte_over_limit_is_oversized() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("over.txt");
        let limit = 50_000u64;
        fs::write(&path, "x".repeat(limit as usize + 1)).unwrap();

        assert_eq!(
            load_with_limit(&path, limit),
            ContentRecord::Oversized { size: limit + 1 }
        );
    }

    #[test]
    fn test_default_limit_boundary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.txt");
        fs::write(&path, "y".repeat(CONTENT_SIZE_LIMIT as usize)).unwrap();
        assert!(matches!(load(&path), ContentRecord::Text(_)));

        fs::write(&path, "y".repeat(CONTENT_SIZE_LIMIT as usize + 1)).unwrap();
        let record = load(&path);
        assert_eq!(
            record,
            ContentRecord::Oversized {
                size: CONTENT_SIZE_LIMIT + 1
            }
        );
        assert_eq!(record.placeholder().unwrap(), "[file too large: 1.00mb]");
    }

    #[test]
    fn test_oversized_binary_is_binary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blob.bin");
        let mut bytes = vec![0u8; 16];
        bytes.extend(std::iter::repeat_n(b'z', 100));
        fs::write(&path, &bytes).unwrap();
        assert_eq!(load_with_limit(&path, 50), ContentRecord::Binary);
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let record = load(Path::new("/nonexistent/file.rs"));
        assert!(matches!(record, ContentRecord::Unreadable { .. }));
        assert!(record.placeholder().unwrap().starts_with("[unreadable: "));
    }

    #[test]
    fn test_load_contents_keyed_by_path() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::write(dir.path().join("b.lock"), "beta").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/c.txt"), "gamma").unwrap();

        let result = traverse(dir.path(), WalkerConfig::unlimited()).unwrap();
        for jobs in [0, 1, 3] {
            let options = ContentOptions::new(jobs, &["*.lock".to_string()]).unwrap();
            let contents = load_contents(&result, &options);
            assert_eq!(contents.len(), 3);
            assert_eq!(
                contents[&dir.path().join("a.txt")],
                ContentRecord::Text("alpha".to_string())
            );
            assert_eq!(contents[&dir.path().join("b.lock")], ContentRecord::Skipped);
            assert_eq!(
                contents[&dir.path().join("sub/c.txt")],
                ContentRecord::Text("gamma".to_string())
            );
        }
    }

    #[test]
    fn test_directory_pattern_skips_files_below() {
        let options = ContentOptions::new(1, &["vendor/".to_string()]).unwrap();
        assert!(options.skips("vendor/lib.rs"));
        assert!(options.skips("crates/vendor/deep/mod.rs"));
        assert!(!options.skips("vendor"));
        assert!(!options.skips("src/vendor.rs"));
    }
}
