//! Error types for FormForge
//!
//! Every fallible operation in the builder returns [`BuilderResult`]. Structural
//! errors are raised synchronously at the offending call and always leave the
//! store untouched; import errors carry the full list of violations so a host
//! can report them all at once.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for FormForge
#[derive(Debug, Error)]
pub enum BuilderError {
    // ========================================================================
    // Structural Errors
    // ========================================================================
    /// A field path did not resolve to a node
    #[error("Field not found: '{0}'")]
    NotFound(String),

    /// The target of an insert/move is not a container, or cannot be touched
    #[error("Invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    /// A reorder request was not a permutation of the sibling keys
    #[error("Order mismatch under '{parent}': expected {expected:?}, got {given:?}")]
    OrderMismatch {
        parent: String,
        expected: Vec<String>,
        given: Vec<String>,
    },

    /// A rule on a field references the field itself
    #[error("Rule on '{0}' cannot depend on the field itself")]
    SelfReference(String),

    /// A rule references a field that does not exist
    #[error("Rule on '{field}' references missing field '{parent}'")]
    DanglingReference { field: String, parent: String },

    /// No blueprint is registered under the key
    #[error("Unknown blueprint: '{0}'")]
    UnknownBlueprint(String),

    /// A property key is empty or contains illegal characters
    #[error("Invalid field key '{0}'")]
    InvalidKey(String),

    // ========================================================================
    // Import Errors
    // ========================================================================
    /// Import validation failed; every violation found is listed
    #[error("Schema import failed with {} violation(s): {}", violations.len(), violations.join("; "))]
    SchemaImport { violations: Vec<String> },

    // ========================================================================
    // File / Serialization Errors
    // ========================================================================
    /// File read error
    #[error("Failed to read file '{path}': {message}")]
    FileRead { path: PathBuf, message: String },

    /// File write error
    #[error("Failed to write file '{path}': {message}")]
    FileWrite { path: PathBuf, message: String },

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Persistence Errors
    // ========================================================================
    /// A caller-supplied save callback failed
    #[error("Persistence failed: {0}")]
    Persistence(String),
}

impl BuilderError {
    /// Create a not-found error for a path
    pub fn not_found(path: impl ToString) -> Self {
        BuilderError::NotFound(path.to_string())
    }

    /// Create an invalid-target error
    pub fn invalid_target(target: impl ToString, reason: impl Into<String>) -> Self {
        BuilderError::InvalidTarget {
            target: target.to_string(),
            reason: reason.into(),
        }
    }

    /// Check if this error is a recoverable precondition failure of a store
    /// or compiler operation
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            BuilderError::NotFound(_)
                | BuilderError::InvalidTarget { .. }
                | BuilderError::OrderMismatch { .. }
                | BuilderError::SelfReference(_)
                | BuilderError::DanglingReference { .. }
                | BuilderError::UnknownBlueprint(_)
                | BuilderError::InvalidKey(_)
        )
    }

    /// Check if this error is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BuilderError::NotFound(_) | BuilderError::UnknownBlueprint(_)
        )
    }

    /// Violations carried by an import error (empty for other errors)
    pub fn violations(&self) -> &[String] {
        match self {
            BuilderError::SchemaImport { violations } => violations,
            _ => &[],
        }
    }
}

/// Result type alias using BuilderError
pub type BuilderResult<T> = Result<T, BuilderError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_not_found_error() {
        let err = BuilderError::not_found("address.city");
        assert!(err.is_not_found());
        assert!(err.is_structural());
        assert_eq!(err.to_string(), "Field not found: 'address.city'");
    }

    #[test]
    fn test_invalid_target_error() {
        let err = BuilderError::invalid_target("name", "not a container");
        assert!(err.is_structural());
        assert_eq!(err.to_string(), "Invalid target 'name': not a container");
    }

    #[test]
    fn test_order_mismatch_display() {
        let err = BuilderError::OrderMismatch {
            parent: "<root>".to_string(),
            expected: vec!["a".to_string(), "b".to_string()],
            given: vec!["a".to_string()],
        };
        assert!(err.is_structural());
        assert!(err.to_string().contains("Order mismatch under '<root>'"));
    }

    #[test]
    fn test_schema_import_lists_every_violation() {
        let err = BuilderError::SchemaImport {
            violations: vec!["first".to_string(), "second".to_string()],
        };
        assert!(!err.is_structural());
        assert_eq!(err.violations().len(), 2);
        assert_eq!(
            err.to_string(),
            "Schema import failed with 2 violation(s): first; second"
        );
    }

    #[test]
    fn test_json_error_converts() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: BuilderError = json_err.into();
        assert!(matches!(err, BuilderError::Json(_)));
        assert!(!err.is_structural());
        assert!(err.violations().is_empty());
    }
}
