//! Language detection for fenced code blocks
//!
//! Maps file extensions (and a few well-known file names) to the tag used
//! after the opening fence in Markdown exports.

use std::path::Path;

/// Languages with a known fence tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Go,
    C,
    Cpp,
    CSharp,
    Java,
    Kotlin,
    Swift,
    Ruby,
    PHP,
    Shell,
    Markdown,
    Json,
    Toml,
    Yaml,
    Html,
    Css,
    Sql,
    Xml,
    Dockerfile,
    Makefile,
}

impl Language {
    /// Detect language from a file extension (case-insensitive).
    ///
    /// ```
    /// use gitree::language::Language;
    ///
    /// assert_eq!(Language::from_extension("rs"), Some(Language::Rust));
    /// assert_eq!(Language::from_extension("YML"), Some(Language::Yaml));
    /// assert_eq!(Language::from_extension("unknown"), None);
    /// ```
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "rs" => Some(Language::Rust),
            "py" | "pyw" | "pyi" => Some(Language::Python),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "ts" | "tsx" | "mts" | "cts" => Some(Language::TypeScript),
            "go" => Some(Language::Go),
            "c" | "h" => Some(Language::C),
            "cpp" | "cxx" | "cc" | "hpp" | "hxx" | "hh" => Some(Language::Cpp),
            "cs" => Some(Language::CSharp),
            "java" => Some(Language::Java),
            "kt" | "kts" => Some(Language::Kotlin),
            "swift" => Some(Language::Swift),
            "rb" => Some(Language::Ruby),
            "php" => Some(Language::PHP),
            "sh" | "bash" | "zsh" | "fish" => Some(Language::Shell),
            "md" | "markdown" => Some(Language::Markdown),
            "json" => Some(Language::Json),
            "toml" => Some(Language::Toml),
            "yml" | "yaml" => Some(Language::Yaml),
            "html" | "htm" => Some(Language::Html),
            "css" | "scss" => Some(Language::Css),
            "sql" => Some(Language::Sql),
            "xml" | "svg" => Some(Language::Xml),
            _ => None,
        }
    }

    /// Detect language from a file path, falling back to well-known names.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        match name {
            "Dockerfile" => return Some(Language::Dockerfile),
            "Makefile" | "makefile" | "GNUmakefile" => return Some(Language::Makefile),
            _ => {}
        }
        let ext = path.extension()?.to_str()?;
        Self::from_extension(ext)
    }

    /// Tag written after the opening fence.
    pub fn fence_tag(&self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Java => "java",
            Language::Kotlin => "kotlin",
            Language::Swift => "swift",
            Language::Ruby => "ruby",
            Language::PHP => "php",
            Language::Shell => "bash",
            Language::Markdown => "markdown",
            Language::Json => "json",
            Language::Toml => "toml",
            Language::Yaml => "yaml",
            Language::Html => "html",
            Language::Css => "css",
            Language::Sql => "sql",
            Language::Xml => "xml",
            Language::Dockerfile => "dockerfile",
            Language::Makefile => "makefile",
        }
    }
}

/// Fence tag for `path`, empty when unknown.
pub fn fence_tag_for(path: &Path) -> &'static str {
    Language::from_path(path).map_or("", |l| l.fence_tag())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension_case_insensitive() {
        assert_eq!(Language::from_extension("RS"), Some(Language::Rust));
        assert_eq!(Language::from_extension("Py"), Some(Language::Python));
        assert_eq!(Language::from_extension("Json"), Some(Language::Json));
    }

    #[test]
    fn test_from_extension_variants() {
        assert_eq!(Language::from_extension("jsx"), Some(Language::JavaScript));
        assert_eq!(Language::from_extension("tsx"), Some(Language::TypeScript));
        assert_eq!(Language::from_extension("hpp"), Some(Language::Cpp));
        assert_eq!(Language::from_extension("zsh"), Some(Language::Shell));
        assert_eq!(Language::from_extension("yaml"), Some(Language::Yaml));
        assert_eq!(Language::from_extension("txt"), None);
    }

    #[test]
    fn test_from_path_well_known_names() {
        assert_eq!(
            Language::from_path(Path::new("docker/Dockerfile")),
            Some(Language::Dockerfile)
        );
        assert_eq!(Language::from_path(Path::new("Makefile")), Some(Language::Makefile));
        assert_eq!(Language::from_path(Path::new("LICENSE")), None);
    }

    #[test]
    fn test_fence_tag_for() {
        assert_eq!(fence_tag_for(Path::new("src/main.rs")), "rust");
        assert_eq!(fence_tag_for(Path::new("setup.sh")), "bash");
        assert_eq!(fence_tag_for(Path::new("Cargo.toml")), "toml");
        assert_eq!(fence_tag_for(Path::new("notes.txt")), "");
    }
}
