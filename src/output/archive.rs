//! Zip archive output
//!
//! Writes every file of one or more accepted trees into a deflated archive,
//! with entry names relative to each root.

use std::fs::{self, File};
use std::io::{self, Seek, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Local, Timelike};
use tracing::{debug, warn};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::Result;
use crate::tree::TraversalResult;

/// Append `.zip` unless the name already ends with it.
pub fn zip_path(name: &str) -> PathBuf {
    if name.to_lowercase().ends_with(".zip") {
        PathBuf::from(name)
    } else {
        PathBuf::from(format!("{}.zip", name))
    }
}

/// Archive entry name prefix for each root: none for a single root, the
/// root's directory name otherwise.
pub fn root_prefixes(results: &[TraversalResult]) -> Vec<Option<String>> {
    if results.len() <= 1 {
        return vec![None; results.len()];
    }
    results
        .iter()
        .map(|r| Some(r.root.name().to_string()))
        .collect()
}

fn modified_time(path: &Path) -> zip::DateTime {
    let Ok(modified) = fs::metadata(path).and_then(|m| m.modified()) else {
        return zip::DateTime::default();
    };
    let local: DateTime<Local> = modified.into();
    zip::DateTime::from_date_and_time(
        local.year().clamp(1980, 2107) as u16,
        local.month() as u8,
        local.day() as u8,
        local.hour() as u8,
        local.minute() as u8,
        local.second().min(59) as u8,
    )
    .unwrap_or_default()
}

/// Write the files of `results` into `writer`. Returns the number of files
/// archived.
///
/// Files that cannot be read are skipped with a warning. `skip` names a path
/// (usually the archive itself) that is never added.
pub fn write_zip<W: Write + Seek>(
    writer: W,
    results: &[TraversalResult],
    skip: Option<&Path>,
) -> Result<usize> {
    let mut zip = ZipWriter::new(writer);
    let prefixes = root_prefixes(results);
    let skip = skip.and_then(|p| p.canonicalize().ok());
    let mut written = 0;

    for (result, prefix) in results.iter().zip(prefixes) {
        for file in result.root.files() {
            let path = file.path();
            if skip.is_some() && path.canonicalize().ok() == skip {
                warn!("skipping {}: it is the archive being written", path.display());
                continue;
            }

            let rel = result.relative_path(file);
            let name = match &prefix {
                Some(prefix) => format!("{}/{}", prefix, rel),
                None => rel,
            };

            let mut source = match File::open(path) {
                Ok(source) => source,
                Err(e) => {
                    warn!("skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            let options = SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .last_modified_time(modified_time(path));
            zip.start_file(name, options)?;
            io::copy(&mut source, &mut zip)?;
            written += 1;
        }
    }

    zip.finish()?;
    debug!("archived {} files", written);
    Ok(written)
}

/// Create the archive at `path` from `results`.
pub fn create_zip(path: &Path, results: &[TraversalResult]) -> Result<usize> {
    let file = File::create(path)?;
    write_zip(file, results, Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{WalkerConfig, traverse};
    use std::io::{Cursor, Read};
    use tempfile::TempDir;

    fn archive_names(bytes: Vec<u8>) -> Vec<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_zip_path() {
        assert_eq!(zip_path("out"), PathBuf::from("out.zip"));
        assert_eq!(zip_path("out.zip"), PathBuf::from("out.zip"));
    }

    #[test]
    fn test_single_root_names_relative() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("README.md"), "# hi").unwrap();
        fs::write(dir.path().join("debug.log"), "noise").unwrap();
        fs::write(dir.path().join(".gitignore"), "*.log\n").unwrap();

        let result = traverse(dir.path(), WalkerConfig::unlimited()).unwrap();
        let mut cursor = Cursor::new(Vec::new());
        let count = write_zip(&mut cursor, &[result], None).unwrap();

        assert_eq!(count, 2);
        assert_eq!(archive_names(cursor.into_inner()), vec!["README.md", "src/main.rs"]);
    }

    #[test]
    fn test_multiple_roots_prefixed() {
        let dir = TempDir::new().unwrap();
        for name in ["one", "two"] {
            fs::create_dir(dir.path().join(name)).unwrap();
            fs::write(dir.path().join(name).join("file.txt"), name).unwrap();
        }
        let results = vec![
            traverse(&dir.path().join("one"), WalkerConfig::unlimited()).unwrap(),
            traverse(&dir.path().join("two"), WalkerConfig::unlimited()).unwrap(),
        ];

        let mut cursor = Cursor::new(Vec::new());
        write_zip(&mut cursor, &results, None).unwrap();
        assert_eq!(
            archive_names(cursor.into_inner()),
            vec!["one/file.txt", "two/file.txt"]
        );
    }

    #[test]
    fn test_archive_inside_root_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        let archive = dir.path().join("out.zip");
        fs::write(&archive, "stale").unwrap();

        let result = traverse(dir.path(), WalkerConfig::unlimited()).unwrap();
        let count = create_zip(&archive, &[result]).unwrap();
        assert_eq!(count, 1);

        let mut bytes = Vec::new();
        File::open(&archive).unwrap().read_to_end(&mut bytes).unwrap();
        assert_eq!(archive_names(bytes), vec!["a.txt"]);
    }
}
