//! Field blueprint catalog
//!
//! A blueprint is the template a palette item stands for: a key, a category
//! and the default [`SchemaProperty`] a new field starts from. The catalog is
//! read-only once built and is handed to each store instance.

use crate::path::is_valid_key;
use crate::property::SchemaProperty;
use formforge_core::{BuilderError, BuilderResult, EnumOption, FieldType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Palette grouping of a blueprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlueprintCategory {
    Input,
    Choice,
    Layout,
}

impl BlueprintCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            BlueprintCategory::Input => "Inputs",
            BlueprintCategory::Choice => "Choices",
            BlueprintCategory::Layout => "Layout",
        }
    }

    pub fn all() -> &'static [BlueprintCategory] {
        &[
            BlueprintCategory::Input,
            BlueprintCategory::Choice,
            BlueprintCategory::Layout,
        ]
    }
}

/// Template for a new field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldBlueprint {
    pub key: String,
    pub category: BlueprintCategory,
    pub default_field: SchemaProperty,
}

impl FieldBlueprint {
    pub fn new(
        key: impl Into<String>,
        category: BlueprintCategory,
        default_field: SchemaProperty,
    ) -> Self {
        Self {
            key: key.into(),
            category,
            default_field,
        }
    }

    /// Fresh copy of the default field, ready for insertion
    pub fn instantiate(&self) -> SchemaProperty {
        let mut field = self.default_field.clone();
        field.order = 0;
        field.reactions = None;
        field
    }
}

/// Ordered, read-only registry of blueprints
#[derive(Debug, Clone, PartialEq)]
pub struct BlueprintCatalog {
    entries: Vec<FieldBlueprint>,
}

impl BlueprintCatalog {
    /// Build a catalog, rejecting invalid or duplicate keys
    pub fn from_entries(entries: Vec<FieldBlueprint>) -> BuilderResult<Self> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !is_valid_key(&entry.key) {
                return Err(BuilderError::InvalidKey(entry.key.clone()));
            }
            if !seen.insert(entry.key.as_str()) {
                return Err(BuilderError::InvalidConfig(format!(
                    "duplicate blueprint key '{}'",
                    entry.key
                )));
            }
        }
        Ok(Self { entries })
    }

    /// The built-in palette
    pub fn standard() -> Self {
        use BlueprintCategory::{Choice, Input, Layout};

        let yes_no = vec![EnumOption::new("Yes", true), EnumOption::new("No", false)];
        let entries = vec![
            FieldBlueprint::new(
                "text",
                Input,
                SchemaProperty::new(FieldType::String)
                    .with_title("Text")
                    .with_component("Input"),
            ),
            FieldBlueprint::new(
                "textarea",
                Input,
                SchemaProperty::new(FieldType::String)
                    .with_title("Long Text")
                    .with_component("TextArea"),
            ),
            FieldBlueprint::new(
                "number",
                Input,
                SchemaProperty::new(FieldType::Number)
                    .with_title("Number")
                    .with_component("NumberPicker"),
            ),
            FieldBlueprint::new(
                "date",
                Input,
                SchemaProperty::new(FieldType::Date)
                    .with_title("Date")
                    .with_component("DatePicker"),
            ),
            FieldBlueprint::new(
                "checkbox",
                Choice,
                SchemaProperty::new(FieldType::Boolean)
                    .with_title("Checkbox")
                    .with_component("Checkbox"),
            ),
            FieldBlueprint::new(
                "switch",
                Choice,
                SchemaProperty::new(FieldType::Boolean)
                    .with_title("Switch")
                    .with_default(false)
                    .with_component("Switch"),
            ),
            FieldBlueprint::new(
                "select",
                Choice,
                SchemaProperty::new(FieldType::Enum)
                    .with_title("Select")
                    .with_options(vec![
                        EnumOption::text("Option 1"),
                        EnumOption::text("Option 2"),
                    ])
                    .with_component("Select"),
            ),
            FieldBlueprint::new(
                "radio",
                Choice,
                SchemaProperty::new(FieldType::Enum)
                    .with_title("Radio")
                    .with_options(yes_no)
                    .with_component("Radio.Group"),
            ),
            FieldBlueprint::new(
                "group",
                Layout,
                SchemaProperty::new(FieldType::Object)
                    .with_title("Group")
                    .with_component("FormLayout"),
            ),
            FieldBlueprint::new(
                "list",
                Layout,
                SchemaProperty::new(FieldType::Array)
                    .with_title("List")
                    .with_component("ArrayItems"),
            ),
            FieldBlueprint::new(
                "section",
                Layout,
                SchemaProperty::new(FieldType::Void)
                    .with_title("Section")
                    .with_component("Card"),
            ),
        ];
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&FieldBlueprint> {
        self.entries.iter().find(|b| b.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldBlueprint> {
        self.entries.iter()
    }

    pub fn by_category(&self, category: BlueprintCategory) -> Vec<&FieldBlueprint> {
        self.entries
            .iter()
            .filter(|b| b.category == category)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for BlueprintCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog() {
        let catalog = BlueprintCatalog::standard();
        assert!(catalog.get("text").is_some());
        assert!(catalog.get("unknown").is_none());
        assert_eq!(catalog.by_category(BlueprintCategory::Layout).len(), 3);
        assert!(
            catalog
                .by_category(BlueprintCategory::Layout)
                .iter()
                .all(|b| b.default_field.is_container())
        );
        // the standard catalog must itself pass validation
        assert!(BlueprintCatalog::from_entries(catalog.iter().cloned().collect()).is_ok());
    }

    #[test]
    fn test_from_entries_rejects_duplicates() {
        let entry = FieldBlueprint::new(
            "text",
            BlueprintCategory::Input,
            SchemaProperty::new(FieldType::String),
        );
        let err = BlueprintCatalog::from_entries(vec![entry.clone(), entry]).unwrap_err();
        assert!(matches!(err, BuilderError::InvalidConfig(_)));
    }

    #[test]
    fn test_from_entries_rejects_bad_key() {
        let entry = FieldBlueprint::new(
            "bad key",
            BlueprintCategory::Input,
            SchemaProperty::new(FieldType::String),
        );
        assert!(BlueprintCatalog::from_entries(vec![entry]).is_err());
    }

    #[test]
    fn test_instantiate_resets_position() {
        let mut default_field = SchemaProperty::new(FieldType::String);
        default_field.order = 5;
        let blueprint = FieldBlueprint::new("text", BlueprintCategory::Input, default_field);
        assert_eq!(blueprint.instantiate().order, 0);
    }
}
