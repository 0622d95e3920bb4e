//! Interactive file selection
//!
//! Lists every file an uncapped traversal would show and lets the user pick a
//! subset. The picked set is fed back as [`WalkerConfig::selection`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use dialoguer::MultiSelect;
use dialoguer::theme::ColorfulTheme;

use crate::error::Result;
use crate::tree::{TraversalResult, TreeWalker, WalkerConfig};

/// One selectable file: its label (path relative to the root) and absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionItem {
    pub label: String,
    pub path: PathBuf,
}

/// The files of `result` in tree order.
pub fn selection_items(result: &TraversalResult) -> Vec<SelectionItem> {
    result
        .root
        .files()
        .map(|file| SelectionItem {
            label: result.relative_path(file),
            path: file.path().to_path_buf(),
        })
        .collect()
}

/// Prompt for the files under `root` to keep.
///
/// Item caps, the entry budget and any previous selection are lifted for the
/// listing. Returns `None` when the prompt is cancelled.
pub fn select_files(root: &Path, config: &WalkerConfig) -> Result<Option<BTreeSet<PathBuf>>> {
    let listing = WalkerConfig {
        max_items: None,
        max_entries: None,
        selection: None,
        ..config.clone()
    };
    let result = TreeWalker::new(listing)?.walk(root)?;
    let items = selection_items(&result);
    if items.is_empty() {
        return Ok(Some(BTreeSet::new()));
    }

    let labels: Vec<&str> = items.iter().map(|item| item.label.as_str()).collect();
    let defaults = vec![true; items.len()];
    let chosen = MultiSelect::with_theme(&ColorfulTheme::default())
        .with_prompt(format!(
            "Select files under {} (space toggles, enter confirms)",
            root.display()
        ))
        .items(&labels)
        .defaults(&defaults)
        .interact_opt()?;

    Ok(chosen.map(|indices| {
        indices
            .into_iter()
            .map(|i| items[i].path.clone())
            .collect()
    }))
}
