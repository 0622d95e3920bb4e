//! Test utilities for building temporary directory trees.
//!
//! This module is only compiled for tests and benchmarks.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory tree, removed when dropped.
pub struct TestTree {
    dir: TempDir,
}

impl TestTree {
    /// Create a new empty temporary directory.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        Self { dir }
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file, creating parent directories as needed.
    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let full_path = self.dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    /// Write raw bytes, creating parent directories as needed.
    pub fn add_bytes(&self, path: &str, content: &[u8]) -> PathBuf {
        let full_path = self.dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    /// Create an (empty) directory.
    pub fn add_dir(&self, path: &str) -> PathBuf {
        let full_path = self.dir.path().join(path);
        fs::create_dir_all(&full_path).expect("Failed to create dir");
        full_path
    }

    /// Write a `.gitignore` into `dir` ("" for the root).
    pub fn add_gitignore(&self, dir: &str, lines: &[&str]) -> PathBuf {
        let path = if dir.is_empty() {
            ".gitignore".to_string()
        } else {
            format!("{}/.gitignore", dir)
        };
        self.add_file(&path, &format!("{}\n", lines.join("\n")))
    }

    /// Fill `dir` with `count` files named `file_000.txt`, `file_001.txt`, ...
    pub fn add_many(&self, dir: &str, count: usize) {
        for i in 0..count {
            let path = if dir.is_empty() {
                format!("file_{:03}.txt", i)
            } else {
                format!("{}/file_{:03}.txt", dir, i)
            };
            self.add_file(&path, "x");
        }
    }
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}
