//! JSON output formatting

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::content::ContentRecord;
use crate::tree::{ExclusionTally, TraversalResult, TraversalStats, TreeNode, Truncation};

/// A tree node with its content attached, borrowed from the result.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum JsonNode<'a> {
    File {
        name: &'a str,
        path: &'a Path,
        size_bytes: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    Dir {
        name: &'a str,
        path: &'a Path,
        children: Vec<JsonNode<'a>>,
        #[serde(skip_serializing_if = "is_false")]
        depth_truncated: bool,
        #[serde(skip_serializing_if = "is_zero")]
        items_hidden: usize,
        #[serde(skip_serializing_if = "is_false")]
        read_error: bool,
    },
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    root: JsonNode<'a>,
    stats: &'a TraversalStats,
    truncation: &'a Truncation,
    exclusions: &'a ExclusionTally,
    #[serde(skip_serializing_if = "Option::is_none")]
    entry_budget: Option<usize>,
}

fn convert<'a>(
    node: &'a TreeNode,
    contents: Option<&BTreeMap<PathBuf, ContentRecord>>,
) -> JsonNode<'a> {
    match node {
        TreeNode::File {
            name,
            path,
            size_bytes,
            ..
        } => JsonNode::File {
            name,
            path,
            size_bytes: *size_bytes,
            content: contents
                .and_then(|c| c.get(path))
                .map(ContentRecord::display_text),
        },
        TreeNode::Dir {
            name,
            path,
            children,
            depth_truncated,
            items_hidden,
            read_error,
            ..
        } => JsonNode::Dir {
            name,
            path,
            children: children.iter().map(|c| convert(c, contents)).collect(),
            depth_truncated: *depth_truncated,
            items_hidden: *items_hidden,
            read_error: *read_error,
        },
    }
}

fn document<'a>(
    result: &'a TraversalResult,
    contents: Option<&BTreeMap<PathBuf, ContentRecord>>,
) -> JsonDocument<'a> {
    JsonDocument {
        root: convert(&result.root, contents),
        stats: &result.stats,
        truncation: &result.truncation,
        exclusions: &result.exclusions,
        entry_budget: result.entry_budget,
    }
}

/// Serialize a result (and contents, when loaded) as pretty-printed JSON.
pub fn to_json(
    result: &TraversalResult,
    contents: Option<&BTreeMap<PathBuf, ContentRecord>>,
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&document(result, contents))
}

/// Serialize several roots. A single root gives the same document as
/// [`to_json`]; more than one gives an array of documents.
pub fn to_json_many(
    results: &[TraversalResult],
    contents: Option<&BTreeMap<PathBuf, ContentRecord>>,
) -> serde_json::Result<String> {
    match results {
        [single] => to_json(single, contents),
        many => {
            let documents: Vec<JsonDocument<'_>> =
                many.iter().map(|r| document(r, contents)).collect();
            serde_json::to_string_pretty(&documents)
        }
    }
}
