//! Output configuration types

/// Configuration for output formatting.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
    /// Prefix entries with 📄 / 📁 / 📂.
    pub emoji: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            use_color: true,
            emoji: false,
        }
    }
}

impl OutputConfig {
    /// Plain text: no color, no emoji.
    pub fn plain() -> Self {
        Self {
            use_color: false,
            emoji: false,
        }
    }
}
