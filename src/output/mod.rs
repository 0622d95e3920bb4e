//! Tree formatting and export
//!
//! - `tree` - box-drawing text tree (plain string or colored stdout)
//! - `json` - JSON document with stats, truncation flags and exclusion tallies
//! - `markdown` - nested list plus fenced file contents
//! - `archive` - deflated zip archive of the accepted files

mod archive;
mod config;
mod json;
mod markdown;
mod tree;

pub use archive::{create_zip, root_prefixes, write_zip, zip_path};
pub use config::OutputConfig;
pub use json::{to_json, to_json_many};
pub use markdown::MarkdownFormatter;
pub use tree::TreeFormatter;
