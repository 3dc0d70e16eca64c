//! Import and export of schema documents
//!
//! Export is pretty-printed JSON of the property tree. Import runs every
//! structural check before anything is accepted and reports all violations
//! in one [`BuilderError::SchemaImport`]. Duplicate sibling keys are found on
//! the raw text, since a map silently keeps only the last of them. Field
//! types and rule paths are checked per node on the parsed value, so a bad
//! type is reported alongside everything else instead of ending the parse.

use crate::compiler::{compile_reaction, disable_reaction, unresolved_references};
use crate::path::{FieldPath, is_valid_key};
use crate::property::{Schema, SchemaProperty};
use crate::validation::{
    ValidationError, ValidationErrorCode, ValidationResult, ValidationWarning, Validator,
    invalid_key_error,
};
use formforge_core::{BuilderError, BuilderResult, FieldType};
use serde::de::{self, DeserializeSeed, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

// ============================================================================
// Constants
// ============================================================================

/// File extension for schema documents
pub const SCHEMA_EXTENSION: &str = "form.json";

// ============================================================================
// Import options and report
// ============================================================================

/// What import does with a rule whose parent field does not resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DanglingPolicy {
    /// Fail the import
    #[default]
    Reject,
    /// Accept the document, storing the rule disabled and flagged
    Disable,
}

/// Import settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportOptions {
    pub dangling: DanglingPolicy,
}

impl ImportOptions {
    pub fn strict() -> Self {
        Self::default()
    }

    pub fn lenient() -> Self {
        Self {
            dangling: DanglingPolicy::Disable,
        }
    }
}

/// An accepted document plus what import changed or noticed on the way in
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub schema: Schema,
    pub warnings: Vec<ValidationWarning>,
    /// Rules switched off because their parent field is missing
    pub disabled_rules: Vec<FieldPath>,
    /// Reactions recompiled because they disagreed with their rule
    pub rebuilt_reactions: Vec<FieldPath>,
}

// ============================================================================
// Export
// ============================================================================

/// Serialize a schema to pretty JSON
pub fn export_schema(schema: &Schema) -> BuilderResult<String> {
    Ok(serde_json::to_string_pretty(schema)?)
}

/// Write a schema to a file, creating parent directories as needed
pub fn save_schema(schema: &Schema, path: impl AsRef<Path>) -> BuilderResult<()> {
    let path = path.as_ref();
    let json = export_schema(schema).map_err(|e| BuilderError::FileWrite {
        path: path.to_path_buf(),
        message: format!("Failed to serialize schema: {e}"),
    })?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| BuilderError::FileWrite {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
        }
    }

    std::fs::write(path, json).map_err(|e| BuilderError::FileWrite {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    tracing::info!("Schema saved to {}", path.display());
    Ok(())
}

// ============================================================================
// Import
// ============================================================================

/// Parse, validate and normalise a schema document
pub fn import_schema(json: &str, options: ImportOptions) -> BuilderResult<ImportReport> {
    let duplicates = scan_duplicate_keys(json)?;
    let raw: Value = serde_json::from_str(json)?;

    let mut result = ValidationResult::ok();
    for error in duplicates {
        result.add_error(error);
    }

    // a node that cannot be read blocks building the tree, so report what
    // can be seen per node and stop there
    let mut shape = ShapeScan::default();
    shape.scan(&raw, &FieldPath::root());
    if !shape.blocking.is_empty() {
        for error in shape.bad_keys.into_iter().chain(shape.blocking) {
            result.add_error(error);
        }
        tracing::debug!("Schema import rejected with {} violation(s)", result.errors.len());
        result.clone().to_result()?;
    }
    let mut schema: Schema = serde_json::from_value(raw)?;

    let allow_dangling = options.dangling == DanglingPolicy::Disable;
    result.merge(Validator::for_import(allow_dangling).validate(&schema));

    let warnings = result.warnings.clone();
    if result.has_errors() {
        tracing::debug!("Schema import rejected with {} violation(s)", result.errors.len());
        result.to_result()?;
    }

    schema.normalize_order();

    let unresolved: HashSet<FieldPath> = unresolved_references(&schema)
        .into_iter()
        .map(|(owner, _)| owner)
        .collect();
    let mut disabled_rules = Vec::new();
    let mut rebuilt_reactions = Vec::new();
    schema.visit_mut(|path, node| {
        let Some(reaction) = node.reactions.as_mut() else {
            return;
        };
        if unresolved.contains(path) {
            if !reaction.dangling || reaction.rule.enabled {
                tracing::warn!(
                    "Rule on '{}' references missing field '{}'; disabled",
                    path,
                    reaction.rule.parent_field
                );
                disable_reaction(reaction, true);
                disabled_rules.push(path.clone());
            }
            return;
        }
        let expected = compile_reaction(&reaction.rule);
        if expected.fulfill != reaction.fulfill || expected.dependencies != reaction.dependencies {
            tracing::warn!("Reaction on '{}' disagreed with its rule; recompiled", path);
            let dangling = reaction.dangling;
            *reaction = expected;
            reaction.dangling = dangling;
            rebuilt_reactions.push(path.clone());
        }
    });

    tracing::info!(
        "Imported schema with {} field(s), {} warning(s)",
        schema.field_count(),
        warnings.len()
    );
    Ok(ImportReport {
        schema,
        warnings,
        disabled_rules,
        rebuilt_reactions,
    })
}

/// Read and import a schema file
pub fn load_schema(path: impl AsRef<Path>, options: ImportOptions) -> BuilderResult<ImportReport> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|e| BuilderError::FileRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    import_schema(&json, options).map_err(|e| match e {
        BuilderError::Json(je) => BuilderError::FileRead {
            path: path.to_path_buf(),
            message: format!("Invalid schema file format: {je}"),
        },
        other => other,
    })
}

/// Make sure a path ends in the schema extension
pub fn ensure_extension(path: impl AsRef<Path>) -> std::path::PathBuf {
    let path = path.as_ref();
    let has_extension = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(&format!(".{SCHEMA_EXTENSION}")));
    if has_extension {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_os_string();
        name.push(format!(".{SCHEMA_EXTENSION}"));
        name.into()
    }
}

// ============================================================================
// Node shape scan
// ============================================================================

/// Per-node problems found on the parsed JSON before it becomes a tree
#[derive(Default)]
struct ShapeScan {
    /// Problems that keep a node from being read at all
    blocking: Vec<ValidationError>,
    /// Illegal keys; these alone do not block reading the tree
    bad_keys: Vec<ValidationError>,
}

impl ShapeScan {
    fn scan(&mut self, node: &Value, path: &FieldPath) {
        let Some(object) = node.as_object() else {
            self.blocking.push(
                ValidationError::new(ValidationErrorCode::MalformedField, "field must be a JSON object")
                    .with_path(path),
            );
            return;
        };

        let before = self.blocking.len();
        self.check_type(object.get("type"), path);
        if let Some(reactions) = object.get("x-reactions") {
            self.check_reaction_paths(reactions, path);
        }
        if self.blocking.len() == before {
            // everything else about the node, children aside
            let mut attributes = object.clone();
            attributes.remove("properties");
            if let Err(e) = serde_json::from_value::<SchemaProperty>(Value::Object(attributes)) {
                self.blocking.push(
                    ValidationError::new(ValidationErrorCode::MalformedField, e.to_string())
                        .with_path(path),
                );
            }
        }

        match object.get("properties") {
            None => {}
            Some(Value::Object(children)) => {
                for (key, child) in children {
                    if !is_valid_key(key) {
                        self.bad_keys.push(invalid_key_error(key, path));
                    }
                    self.scan(child, &path.child(key.as_str()));
                }
            }
            Some(_) => self.blocking.push(
                ValidationError::new(
                    ValidationErrorCode::MalformedField,
                    "'properties' must be an object of fields",
                )
                .with_path(path),
            ),
        }
    }

    fn check_type(&mut self, field_type: Option<&Value>, path: &FieldPath) {
        let message = match field_type {
            Some(Value::String(name)) if FieldType::from_name(name).is_some() => return,
            Some(Value::String(name)) => format!("unknown field type '{name}'"),
            Some(other) => format!("field type must be a string, got {other}"),
            None => "field has no type".to_string(),
        };
        let names: Vec<&str> = FieldType::all().iter().map(FieldType::as_str).collect();
        self.blocking.push(
            ValidationError::new(ValidationErrorCode::UnknownType, message)
                .with_path(path)
                .with_suggestion(format!("use one of {}", names.join(", "))),
        );
    }

    fn check_reaction_paths(&mut self, reactions: &Value, path: &FieldPath) {
        let parent = reactions.pointer("/rule/parentField");
        let dependencies = reactions
            .get("dependencies")
            .and_then(Value::as_array)
            .into_iter()
            .flatten();
        for reference in parent.into_iter().chain(dependencies) {
            let Some(raw) = reference.as_str() else {
                continue;
            };
            if FieldPath::parse(raw).is_err() {
                self.blocking.push(
                    ValidationError::new(
                        ValidationErrorCode::InvalidKey,
                        format!("rule references '{raw}', which is not a field path"),
                    )
                    .with_path(path),
                );
            }
        }
    }
}

// ============================================================================
// Duplicate key scan
// ============================================================================

/// Report every `properties` object that names the same key twice
fn scan_duplicate_keys(json: &str) -> BuilderResult<Vec<ValidationError>> {
    let mut found = Vec::new();
    let mut deserializer = serde_json::Deserializer::from_str(json);
    ScanSeed {
        path: FieldPath::root(),
        mode: ScanMode::Node,
        found: &mut found,
    }
    .deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(found)
}

#[derive(Clone, Copy)]
enum ScanMode {
    /// A schema node: its `properties` entry holds the children
    Node,
    /// A `properties` object: keys are sibling field keys
    Properties,
}

struct ScanSeed<'a> {
    path: FieldPath,
    mode: ScanMode,
    found: &'a mut Vec<ValidationError>,
}

impl<'de> DeserializeSeed<'de> for ScanSeed<'_> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<(), D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for ScanSeed<'_> {
    type Value = ();

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a schema document")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        let mut seen = HashSet::new();
        while let Some(key) = map.next_key::<String>()? {
            match self.mode {
                ScanMode::Properties => {
                    if !seen.insert(key.clone()) {
                        self.found.push(
                            ValidationError::new(
                                ValidationErrorCode::DuplicateKey,
                                format!("field key '{key}' appears more than once"),
                            )
                            .with_path(&self.path),
                        );
                    }
                    map.next_value_seed(ScanSeed {
                        path: self.path.child(key),
                        mode: ScanMode::Node,
                        found: &mut *self.found,
                    })?;
                }
                ScanMode::Node if key == "properties" => {
                    map.next_value_seed(ScanSeed {
                        path: self.path.clone(),
                        mode: ScanMode::Properties,
                        found: &mut *self.found,
                    })?;
                }
                ScanMode::Node => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(())
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<(), E> {
        Ok(())
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<(), E> {
        Ok(())
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<(), E> {
        Ok(())
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<(), E> {
        Ok(())
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<(), E> {
        Ok(())
    }

    fn visit_unit<E: de::Error>(self) -> Result<(), E> {
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
