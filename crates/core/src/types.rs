//! Core types used throughout FormForge
//!
//! This module contains the value types shared by the schema tree, the rule
//! compiler and the editor: the closed set of field kinds, enumerated options
//! and pointer geometry for drag gestures.

use serde::{Deserialize, Serialize};

// ============================================================================
// Field Types
// ============================================================================

/// The closed set of field kinds a schema node can have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Enum,
    Date,
    Object,
    Array,
    /// Layout-only section; owns children but carries no value
    Void,
}

impl FieldType {
    /// Whether nodes of this type may own child properties
    pub fn is_container(&self) -> bool {
        matches!(self, FieldType::Object | FieldType::Array | FieldType::Void)
    }

    /// Whether nodes of this type carry a list of enumerated options
    pub fn is_choice(&self) -> bool {
        matches!(self, FieldType::Enum)
    }

    /// Whether the field produces a value at run time
    pub fn has_value(&self) -> bool {
        !matches!(self, FieldType::Void)
    }

    /// Get the serialized name of this type
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Enum => "enum",
            FieldType::Date => "date",
            FieldType::Object => "object",
            FieldType::Array => "array",
            FieldType::Void => "void",
        }
    }

    /// Look up a type by its serialized name
    pub fn from_name(name: &str) -> Option<FieldType> {
        Self::all().iter().copied().find(|t| t.as_str() == name)
    }

    /// All field types
    pub fn all() -> &'static [FieldType] {
        &[
            FieldType::String,
            FieldType::Number,
            FieldType::Integer,
            FieldType::Boolean,
            FieldType::Enum,
            FieldType::Date,
            FieldType::Object,
            FieldType::Array,
            FieldType::Void,
        ]
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Enumerated Options
// ============================================================================

/// One option of a choice-type field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumOption {
    pub label: String,
    pub value: serde_json::Value,
}

impl EnumOption {
    /// Create a new option
    pub fn new(label: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Create an option whose value is its label
    pub fn text(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            value: serde_json::Value::String(label.clone()),
            label,
        }
    }
}

// ============================================================================
// Geometry Types
// ============================================================================

/// Pointer position in screen space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    /// Create a new position
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Create a position at the origin (0, 0)
    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Calculate the Euclidean distance to another position
    pub fn distance_to(&self, other: &Position) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Add an offset to this position
    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::zero()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_field_type_classification() {
        assert!(FieldType::Object.is_container());
        assert!(FieldType::Array.is_container());
        assert!(FieldType::Void.is_container());
        assert!(!FieldType::String.is_container());

        assert!(FieldType::Enum.is_choice());
        assert!(!FieldType::Boolean.is_choice());

        assert!(!FieldType::Void.has_value());
        assert!(FieldType::Date.has_value());
    }

    #[test]
    fn test_field_type_serde_names() {
        for ty in FieldType::all() {
            let json = serde_json::to_string(ty).unwrap();
            assert_eq!(json, format!("\"{}\"", ty.as_str()));
        }
        let parsed: FieldType = serde_json::from_str("\"void\"").unwrap();
        assert_eq!(parsed, FieldType::Void);
    }

    #[test]
    fn test_field_type_from_name() {
        assert_eq!(FieldType::from_name("enum"), Some(FieldType::Enum));
        assert_eq!(FieldType::from_name("text"), None);
        assert_eq!(FieldType::from_name("Enum"), None);
    }

    #[test]
    fn test_enum_option_text() {
        let opt = EnumOption::text("approved");
        assert_eq!(opt.label, "approved");
        assert_eq!(opt.value, serde_json::json!("approved"));
    }

    #[test]
    fn test_position_distance() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(a.offset(1.0, 2.0), Position::new(1.0, 2.0));
    }
}
