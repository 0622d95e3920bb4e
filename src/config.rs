//! Per-project user configuration
//!
//! Settings are read from `.gitree/config.json` in the working directory.
//! Every key is optional; a key that is present overrides the built-in
//! default and is in turn overridden by the matching command-line flag.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::tree::{DEFAULT_MAX_ENTRIES, DEFAULT_MAX_ITEMS};

pub const CONFIG_DIR: &str = ".gitree";
pub const CONFIG_FILE: &str = "config.json";

/// Largest accepted per-directory item cap.
pub const MAX_ITEMS_LIMIT: usize = 10_000;

/// Format used for exports and stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Txt,
    Json,
    Md,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "txt" => Some(Self::Txt),
            "json" => Some(Self::Json),
            "md" => Some(Self::Md),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Json => "json",
            Self::Md => "md",
        }
    }

    /// File extension appended to export paths that have none.
    pub fn extension(self) -> &'static str {
        self.name()
    }
}

/// Contents of `.gitree/config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UserConfig {
    pub max_items: Option<usize>,
    pub max_entries: Option<usize>,
    pub max_depth: Option<usize>,
    pub gitignore_depth: Option<usize>,
    pub exclude_depth: Option<usize>,
    pub hidden_items: Option<bool>,
    pub exclude: Option<Vec<String>>,
    pub include: Option<Vec<String>>,
    pub include_file_types: Option<Vec<String>>,
    pub emoji: Option<bool>,
    pub no_color: Option<bool>,
    pub no_gitignore: Option<bool>,
    pub no_files: Option<bool>,
    pub no_limit: Option<bool>,
    pub no_max_entries: Option<bool>,
    pub no_contents: Option<bool>,
    pub no_contents_for: Option<Vec<String>>,
    pub files_first: Option<bool>,
    pub format: Option<String>,
    pub override_files: Option<bool>,
}

impl UserConfig {
    /// The file written by `--init-config`: every key at its default.
    pub fn defaults() -> Self {
        Self {
            max_items: Some(DEFAULT_MAX_ITEMS),
            max_entries: Some(DEFAULT_MAX_ENTRIES),
            max_depth: None,
            gitignore_depth: None,
            exclude_depth: None,
            hidden_items: Some(false),
            exclude: Some(Vec::new()),
            include: Some(Vec::new()),
            include_file_types: Some(Vec::new()),
            emoji: Some(false),
            no_color: Some(false),
            no_gitignore: Some(false),
            no_files: Some(false),
            no_limit: Some(false),
            no_max_entries: Some(false),
            no_contents: Some(false),
            no_contents_for: Some(Vec::new()),
            files_first: Some(false),
            format: Some(OutputFormat::Txt.name().to_string()),
            override_files: Some(true),
        }
    }

    /// Load the config under `base`, or `None` when there is no file.
    pub fn load(base: &Path) -> Result<Option<Self>> {
        let path = config_path(base);
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: UserConfig =
            serde_json::from_str(&text).map_err(|source| Error::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        debug!("loaded user config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(items) = self.max_items {
            if !(1..=MAX_ITEMS_LIMIT).contains(&items) {
                return Err(Error::config(format!(
                    "key 'max_items' must be between 1 and {}, got {}",
                    MAX_ITEMS_LIMIT, items
                )));
            }
        }
        if self.max_entries == Some(0) {
            return Err(Error::config("key 'max_entries' must be at least 1, got 0"));
        }
        if let Some(format) = &self.format {
            if OutputFormat::from_name(format).is_none() {
                return Err(Error::config(format!(
                    "key 'format' must be one of txt, json, md, got '{}'",
                    format
                )));
            }
        }
        Ok(())
    }

    /// The configured format. Only valid after [`UserConfig::validate`].
    pub fn output_format(&self) -> Option<OutputFormat> {
        self.format.as_deref().and_then(OutputFormat::from_name)
    }
}

pub fn config_path(base: &Path) -> PathBuf {
    base.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Write the default config under `base`.
///
/// Returns `false` without touching anything when a config already exists.
pub fn init(base: &Path) -> Result<bool> {
    let path = config_path(base);
    if path.exists() {
        warn!("{} already exists", path.display());
        return Ok(false);
    }
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut json =
        serde_json::to_string_pretty(&UserConfig::defaults()).map_err(io::Error::other)?;
    json.push('\n');
    fs::write(&path, json)?;
    debug!("created {}", path.display());
    Ok(true)
}

/// Open the config under `base` in the user's editor, creating it first if needed.
pub fn open_in_editor(base: &Path) -> Result<()> {
    let path = config_path(base);
    if !path.exists() {
        init(base)?;
    }

    let editor = std::env::var("VISUAL")
        .ok()
        .or_else(|| std::env::var("EDITOR").ok())
        .filter(|e| !e.trim().is_empty());

    let candidates: Vec<Vec<String>> = match editor {
        Some(editor) => vec![editor.split_whitespace().map(String::from).collect()],
        None => fallback_editors(),
    };

    for mut argv in candidates {
        if argv.is_empty() {
            continue;
        }
        let program = argv.remove(0);
        match Command::new(&program).args(&argv).arg(&path).status() {
            Ok(status) if status.success() => return Ok(()),
            Ok(status) => {
                return Err(Error::Io(io::Error::other(format!(
                    "editor '{}' exited with {}",
                    program, status
                ))));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("editor '{}' not found", program);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(Error::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!(
            "no editor found; set $EDITOR or open {} manually",
            path.display()
        ),
    )))
}

fn fallback_editors() -> Vec<Vec<String>> {
    let names: &[&[&str]] = if cfg!(target_os = "macos") {
        &[&["open", "-t"]]
    } else if cfg!(windows) {
        &[&["notepad"]]
    } else {
        &[&["xdg-open"], &["nano"], &["vim"], &["vi"]]
    };
    names
        .iter()
        .map(|argv| argv.iter().map(|s| s.to_string()).collect())
        .collect()
}
