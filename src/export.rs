//! Writing rendered output to files and the clipboard

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::config::OutputFormat;
use crate::error::{Error, Result};

/// Clipboard tools tried in order; the first one that runs wins.
const CLIPBOARD_TOOLS: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("clip", &[]),
];

/// Append the format's extension to `path` when it has none.
pub fn with_extension(path: &Path, format: OutputFormat) -> PathBuf {
    with_default_extension(path, format.extension())
}

pub fn with_default_extension(path: &Path, extension: &str) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(extension)
    }
}

/// Write `text` to `path`. An existing file is replaced only when `overwrite` is set.
pub fn write_export(path: &Path, text: &str, overwrite: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut options = OpenOptions::new();
    options.write(true);
    if overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }

    let mut file = options.open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::AlreadyExists {
            Error::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists (set override_files to replace it)", path.display()),
            ))
        } else {
            Error::Io(e)
        }
    })?;
    file.write_all(text.as_bytes())?;
    debug!("wrote {} bytes to {}", text.len(), path.display());
    Ok(())
}

/// Pipe `text` into the first clipboard tool that is installed.
///
/// Returns the name of the tool used.
pub fn copy_to_clipboard(text: &str) -> Result<&'static str> {
    for (program, args) in CLIPBOARD_TOOLS {
        match pipe_to(program, args, text) {
            Ok(true) => return Ok(program),
            Ok(false) => debug!("{} failed", program),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => debug!("{}: {}", program, e),
        }
    }
    Err(Error::Io(io::Error::new(
        io::ErrorKind::NotFound,
        "could not copy to clipboard; install a clipboard utility (xclip, wl-copy)",
    )))
}

fn pipe_to(program: &str, args: &[&str], text: &str) -> io::Result<bool> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }
    Ok(child.wait()?.success())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extension_added_when_missing() {
        assert_eq!(
            with_extension(Path::new("out"), OutputFormat::Md),
            PathBuf::from("out.md")
        );
        assert_eq!(
            with_extension(Path::new("dir/tree"), OutputFormat::Json),
            PathBuf::from("dir/tree.json")
        );
    }

    #[test]
    fn test_existing_extension_kept() {
        assert_eq!(
            with_extension(Path::new("notes.markdown"), OutputFormat::Md),
            PathBuf::from("notes.markdown")
        );
        assert_eq!(
            with_default_extension(Path::new("bundle"), "zip"),
            PathBuf::from("bundle.zip")
        );
    }

    #[test]
    fn test_write_export_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out.txt");
        write_export(&path, "hello\n", false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn test_write_export_refuses_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, "old").unwrap();

        let err = write_export(&path, "new", false).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");

        write_export(&path, "new", true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }
}
