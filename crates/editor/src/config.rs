//! Editor configuration
//!
//! Tunables for a store and its drag controller, loadable from TOML:
//!
//! ```toml
//! history_limit = 100
//! drag_threshold = 4.0
//! key_separator = "-"
//! ```

use formforge_core::{BuilderError, BuilderResult};
use formforge_schema::is_valid_key;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of undo steps kept
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Default pointer travel (in pixels) before a press becomes a drag
pub const DEFAULT_DRAG_THRESHOLD: f32 = 8.0;

/// Default separator between a blueprint key and its collision counter
pub const DEFAULT_KEY_SEPARATOR: &str = "_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of undo steps
    pub history_limit: usize,
    /// Minimum pointer travel that starts a drag
    pub drag_threshold: f32,
    /// Separator used when allocating `text_1`, `text_2`, ...
    pub key_separator: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            drag_threshold: DEFAULT_DRAG_THRESHOLD,
            key_separator: DEFAULT_KEY_SEPARATOR.to_string(),
        }
    }
}

impl EditorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_drag_threshold(mut self, threshold: f32) -> Self {
        self.drag_threshold = threshold;
        self
    }

    /// Parse and validate a TOML document; missing keys take defaults
    pub fn from_toml_str(raw: &str) -> BuilderResult<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|e| BuilderError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> BuilderResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| BuilderError::FileRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config = Self::from_toml_str(&raw)?;
        tracing::debug!("Loaded editor config from {}", path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> BuilderResult<String> {
        toml::to_string_pretty(self).map_err(|e| BuilderError::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> BuilderResult<()> {
        if self.history_limit == 0 {
            return Err(BuilderError::InvalidConfig(
                "history_limit must be at least 1".into(),
            ));
        }
        if !self.drag_threshold.is_finite() || self.drag_threshold < 0.0 {
            return Err(BuilderError::InvalidConfig(format!(
                "drag_threshold must be a non-negative number, got {}",
                self.drag_threshold
            )));
        }
        // the separator ends up inside keys, so "text{sep}1" must be legal
        if self.key_separator.is_empty() || !is_valid_key(&format!("a{}1", self.key_separator)) {
            return Err(BuilderError::InvalidConfig(format!(
                "key_separator '{}' cannot be used inside field keys",
                self.key_separator
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.drag_threshold, 8.0);
        assert_eq!(config.key_separator, "_");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_takes_defaults() {
        let config = EditorConfig::from_toml_str("history_limit = 5").unwrap();
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.key_separator, "_");
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(EditorConfig::from_toml_str("history_limit = 0").is_err());
        assert!(EditorConfig::from_toml_str("drag_threshold = -1.0").is_err());
        assert!(EditorConfig::from_toml_str("key_separator = \".\"").is_err());
        assert!(EditorConfig::from_toml_str("key_separator = \"\"").is_err());
        assert!(EditorConfig::from_toml_str("history_limit = \"many\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("formforge.toml");
        let config = EditorConfig::new().with_history_limit(7).with_drag_threshold(2.5);
        std::fs::write(&file, config.to_toml_string().unwrap()).unwrap();

        assert_eq!(EditorConfig::load(&file).unwrap(), config);
        assert!(EditorConfig::load(dir.path().join("missing.toml")).is_err());
    }
}
