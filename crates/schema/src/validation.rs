//! Structural validation of schema documents
//!
//! Runs the checks import needs before a document is accepted: legal keys,
//! container-only children, option sets, and rule references. Every problem
//! is collected so a host can report them all at once.

use crate::compiler::compile_reaction;
use crate::path::{FieldPath, is_valid_key};
use crate::property::{Schema, SchemaProperty};
use formforge_core::{BuilderError, BuilderResult};
use std::collections::HashSet;

// ============================================================================
// ValidationResult
// ============================================================================

/// Result of a validation operation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the validation passed
    pub valid: bool,

    /// List of errors (empty if valid)
    pub errors: Vec<ValidationError>,

    /// List of warnings (non-fatal issues)
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn error(error: ValidationError) -> Self {
        Self {
            valid: false,
            errors: vec![error],
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.valid = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Merge another validation result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Convert to a `SchemaImport` error listing every violation
    pub fn to_result(self) -> BuilderResult<()> {
        if self.valid {
            Ok(())
        } else {
            Err(BuilderError::SchemaImport {
                violations: self.errors.iter().map(ToString::to_string).collect(),
            })
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

// ============================================================================
// ValidationError
// ============================================================================

/// A validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error code for programmatic handling
    pub code: ValidationErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Dotted path of the offending node
    pub path: Option<String>,

    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(code: ValidationErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
            suggestion: None,
        }
    }

    pub fn with_path(mut self, path: impl ToString) -> Self {
        self.path = Some(path.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "[{}] {}", path, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

/// Error codes for validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorCode {
    // Keys
    InvalidKey,
    DuplicateKey,

    // Structure
    UnknownType,
    MalformedField,
    RootNotObject,
    ChildrenOnLeaf,

    // Options
    OptionsOnNonChoice,
    DuplicateOptionValue,

    // Rules
    SelfReference,
    RootReference,
    DanglingReference,
    UnexpectedTargetValue,

    // Generic
    Custom,
}

// ============================================================================
// ValidationWarning
// ============================================================================

/// A validation warning (non-fatal issue)
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    pub code: ValidationWarningCode,
    pub message: String,
    pub path: Option<String>,
}

impl ValidationWarning {
    pub fn new(code: ValidationWarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl ToString) -> Self {
        self.path = Some(path.to_string());
        self
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "[{}] Warning: {}", path, self.message)
        } else {
            write!(f, "Warning: {}", self.message)
        }
    }
}

/// Warning codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationWarningCode {
    NoOptions,
    IncompleteRule,
    DanglingReference,
    InconsistentReaction,
    Custom,
}

// ============================================================================
// ValidationRule Trait
// ============================================================================

/// One family of checks run over a schema
pub trait ValidationRule {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn validate(&self, schema: &Schema) -> ValidationResult;
}

// ============================================================================
// Validator
// ============================================================================

/// Runs a list of validation rules and merges their results
#[derive(Default)]
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// The checks import applies in strict mode
    pub fn with_default_rules() -> Self {
        Self::for_import(false)
    }

    /// The checks import applies; `allow_dangling` turns unresolved rule
    /// parents into warnings
    pub fn for_import(allow_dangling: bool) -> Self {
        let mut validator = Self::new();
        validator.add_rule(Box::new(KeysRule));
        validator.add_rule(Box::new(ContainersRule));
        validator.add_rule(Box::new(OptionsRule));
        validator.add_rule(Box::new(ReactionsRule { allow_dangling }));
        validator
    }

    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    pub fn validate(&self, schema: &Schema) -> ValidationResult {
        let mut result = ValidationResult::ok();
        for rule in &self.rules {
            result.merge(rule.validate(schema));
        }
        result
    }

    pub fn validate_result(&self, schema: &Schema) -> BuilderResult<()> {
        self.validate(schema).to_result()
    }
}

/// Error for an illegal property key found under `parent`
pub(crate) fn invalid_key_error(key: &str, parent: &FieldPath) -> ValidationError {
    ValidationError::new(
        ValidationErrorCode::InvalidKey,
        format!("'{key}' is not a legal field key"),
    )
    .with_path(parent)
    .with_suggestion("start with a letter or '_' and use only letters, digits, '_' and '-'")
}

fn every_node(schema: &Schema) -> impl Iterator<Item = (FieldPath, &SchemaProperty)> {
    std::iter::once((FieldPath::root(), schema.root())).chain(
        schema
            .ordered_fields(&FieldPath::root())
            .into_iter()
            .flatten(),
    )
}

// ============================================================================
// Built-in Validation Rules
// ============================================================================

/// Rule: every property key is legal
pub struct KeysRule;

impl ValidationRule for KeysRule {
    fn name(&self) -> &'static str {
        "keys"
    }

    fn description(&self) -> &'static str {
        "Validates that every property key is a legal identifier"
    }

    fn validate(&self, schema: &Schema) -> ValidationResult {
        let mut result = ValidationResult::ok();
        for (path, node) in every_node(schema) {
            for key in node.properties.keys() {
                if !is_valid_key(key) {
                    result.add_error(invalid_key_error(key, &path));
                }
            }
        }
        result
    }
}

/// Rule: the root is an object and only containers have children
pub struct ContainersRule;

impl ValidationRule for ContainersRule {
    fn name(&self) -> &'static str {
        "containers"
    }

    fn description(&self) -> &'static str {
        "Validates that the root is an object and that only containers hold children"
    }

    fn validate(&self, schema: &Schema) -> ValidationResult {
        let mut result = ValidationResult::ok();
        if schema.root().field_type != formforge_core::FieldType::Object {
            result.add_error(
                ValidationError::new(
                    ValidationErrorCode::RootNotObject,
                    format!("root must be an object, found '{}'", schema.root().field_type),
                )
                .with_path(FieldPath::root()),
            );
        }
        for (path, node) in every_node(schema) {
            if !node.is_container() && !node.properties.is_empty() {
                result.add_error(
                    ValidationError::new(
                        ValidationErrorCode::ChildrenOnLeaf,
                        format!(
                            "'{}' fields cannot contain other fields ({} found)",
                            node.field_type,
                            node.properties.len()
                        ),
                    )
                    .with_path(&path),
                );
            }
        }
        result
    }
}

/// Rule: option sets belong to choice fields and have distinct values
pub struct OptionsRule;

impl ValidationRule for OptionsRule {
    fn name(&self) -> &'static str {
        "options"
    }

    fn description(&self) -> &'static str {
        "Validates enumerated option sets"
    }

    fn validate(&self, schema: &Schema) -> ValidationResult {
        let mut result = ValidationResult::ok();
        for (path, node) in every_node(schema) {
            match (&node.options, node.field_type.is_choice()) {
                (Some(_), false) => result.add_error(
                    ValidationError::new(
                        ValidationErrorCode::OptionsOnNonChoice,
                        format!("'{}' fields cannot declare options", node.field_type),
                    )
                    .with_path(&path),
                ),
                (Some(options), true) => {
                    let mut seen = HashSet::new();
                    for option in options {
                        if !seen.insert(option.value.to_string()) {
                            result.add_error(
                                ValidationError::new(
                                    ValidationErrorCode::DuplicateOptionValue,
                                    format!("option value {} appears more than once", option.value),
                                )
                                .with_path(&path),
                            );
                        }
                    }
                    if options.is_empty() {
                        result.add_warning(
                            ValidationWarning::new(
                                ValidationWarningCode::NoOptions,
                                "choice field has no options",
                            )
                            .with_path(&path),
                        );
                    }
                }
                (None, true) => result.add_warning(
                    ValidationWarning::new(
                        ValidationWarningCode::NoOptions,
                        "choice field has no options",
                    )
                    .with_path(&path),
                ),
                (None, false) => {}
            }
        }
        result
    }
}

/// Rule: stored rules reference other, existing fields
pub struct ReactionsRule {
    /// Report unresolved parents as warnings instead of errors
    pub allow_dangling: bool,
}

impl ValidationRule for ReactionsRule {
    fn name(&self) -> &'static str {
        "reactions"
    }

    fn description(&self) -> &'static str {
        "Validates rule parent references and compiled expressions"
    }

    fn validate(&self, schema: &Schema) -> ValidationResult {
        let mut result = ValidationResult::ok();
        for (owner, reaction) in schema.reactions() {
            let rule = &reaction.rule;
            let parent = &rule.parent_field;

            if parent == &owner {
                result.add_error(
                    ValidationError::new(
                        ValidationErrorCode::SelfReference,
                        "rule cannot depend on its own field",
                    )
                    .with_path(&owner),
                );
                continue;
            }
            if parent.is_root() {
                result.add_error(
                    ValidationError::new(
                        ValidationErrorCode::RootReference,
                        "rule cannot depend on the root",
                    )
                    .with_path(&owner),
                );
                continue;
            }
            if !schema.contains(parent) {
                if reaction.dangling || self.allow_dangling {
                    result.add_warning(
                        ValidationWarning::new(
                            ValidationWarningCode::DanglingReference,
                            format!("rule references missing field '{parent}' and is inert"),
                        )
                        .with_path(&owner),
                    );
                } else {
                    result.add_error(
                        ValidationError::new(
                            ValidationErrorCode::DanglingReference,
                            format!("rule references missing field '{parent}'"),
                        )
                        .with_path(&owner)
                        .with_suggestion("remove the rule or import in lenient mode"),
                    );
                }
            }
            if rule.target_value.is_some() && !rule.condition.requires_target() {
                result.add_error(
                    ValidationError::new(
                        ValidationErrorCode::UnexpectedTargetValue,
                        format!("'{}' rules take no target value", rule.condition),
                    )
                    .with_path(&owner),
                );
            }
            if rule.is_incomplete() {
                result.add_warning(
                    ValidationWarning::new(
                        ValidationWarningCode::IncompleteRule,
                        format!("'{}' rule has no target value yet", rule.condition),
                    )
                    .with_path(&owner),
                );
            }
            let expected = compile_reaction(rule);
            if expected.fulfill != reaction.fulfill || expected.dependencies != reaction.dependencies
            {
                result.add_warning(
                    ValidationWarning::new(
                        ValidationWarningCode::InconsistentReaction,
                        "compiled expressions do not match the stored rule and will be rebuilt",
                    )
                    .with_path(&owner),
                );
            }
        }
        result
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile_reaction;
    use crate::rule::{Condition, ConditionalVisibilityRule, RuleAction};
    use formforge_core::{EnumOption, FieldType};

    fn path(raw: &str) -> FieldPath {
        FieldPath::parse(raw).unwrap()
    }

    fn valid_schema() -> Schema {
        let mut notes = SchemaProperty::new(FieldType::String);
        notes.reactions = Some(compile_reaction(
            &ConditionalVisibilityRule::new(path("status"), Condition::Equals, RuleAction::Show)
                .with_target("approved"),
        ));
        Schema::from_root(
            SchemaProperty::object()
                .with_child(
                    "status",
                    SchemaProperty::new(FieldType::Enum)
                        .with_options(vec![EnumOption::text("approved")]),
                )
                .with_child("notes", notes),
        )
    }

    fn codes(result: &ValidationResult) -> Vec<ValidationErrorCode> {
        result.errors.iter().map(|e| e.code).collect()
    }

    #[test]
    fn test_validation_result_merge() {
        let mut result = ValidationResult::ok();
        result.merge(ValidationResult::error(ValidationError::new(
            ValidationErrorCode::Custom,
            "Error",
        )));
        assert!(!result.valid);
        assert!(result.has_errors());
    }

    #[test]
    fn test_validation_error_display() {
        let error = ValidationError::new(ValidationErrorCode::InvalidKey, "bad key")
            .with_path("address")
            .with_suggestion("rename it");
        assert_eq!(error.to_string(), "[address] bad key (rename it)");
    }

    #[test]
    fn test_valid_schema_passes() {
        let result = Validator::with_default_rules().validate(&valid_schema());
        assert!(result.valid, "{:?}", result.errors);
        assert!(!result.has_warnings());
        assert!(Validator::with_default_rules().validate_result(&valid_schema()).is_ok());
    }

    #[test]
    fn test_collects_every_violation() {
        let mut schema = valid_schema();
        let root = schema.root_mut();
        root.properties
            .insert("bad key".into(), SchemaProperty::new(FieldType::String));
        root.properties.insert(
            "leaf".into(),
            SchemaProperty::new(FieldType::String)
                .with_child("child", SchemaProperty::new(FieldType::String))
                .with_options(vec![EnumOption::text("a")]),
        );
        let status = root.properties.get_mut("status").unwrap();
        status.options = Some(vec![EnumOption::text("a"), EnumOption::text("a")]);

        let result = Validator::with_default_rules().validate(&schema);
        let codes = codes(&result);
        assert!(codes.contains(&ValidationErrorCode::InvalidKey));
        assert!(codes.contains(&ValidationErrorCode::ChildrenOnLeaf));
        assert!(codes.contains(&ValidationErrorCode::OptionsOnNonChoice));
        assert!(codes.contains(&ValidationErrorCode::DuplicateOptionValue));

        let err = Validator::with_default_rules().validate_result(&schema).unwrap_err();
        assert_eq!(err.violations().len(), result.errors.len());
    }

    #[test]
    fn test_root_must_be_object() {
        let schema = Schema::from_root(SchemaProperty::new(FieldType::Array));
        let result = Validator::with_default_rules().validate(&schema);
        assert_eq!(codes(&result), vec![ValidationErrorCode::RootNotObject]);
    }

    #[test]
    fn test_dangling_strict_and_lenient() {
        let mut schema = valid_schema();
        schema.root_mut().properties.remove("status");

        let strict = Validator::for_import(false).validate(&schema);
        assert_eq!(codes(&strict), vec![ValidationErrorCode::DanglingReference]);

        let lenient = Validator::for_import(true).validate(&schema);
        assert!(lenient.valid);
        assert_eq!(lenient.warnings[0].code, ValidationWarningCode::DanglingReference);
    }

    #[test]
    fn test_self_reference_and_stray_target() {
        let mut schema = valid_schema();
        let notes = schema.get_mut(&path("notes")).unwrap();
        let reaction = notes.reactions.as_mut().unwrap();
        reaction.rule.parent_field = path("notes");

        let mut status_rule = compile_reaction(&ConditionalVisibilityRule::new(
            path("notes"),
            Condition::HasValue,
            RuleAction::Show,
        ));
        status_rule.rule.target_value = Some("x".into());
        schema.get_mut(&path("status")).unwrap().reactions = Some(status_rule);

        let result = Validator::with_default_rules().validate(&schema);
        let codes = codes(&result);
        assert!(codes.contains(&ValidationErrorCode::SelfReference));
        assert!(codes.contains(&ValidationErrorCode::UnexpectedTargetValue));
    }

    #[test]
    fn test_incomplete_and_inconsistent_are_warnings() {
        let mut schema = valid_schema();
        let reaction = schema
            .get_mut(&path("notes"))
            .unwrap()
            .reactions
            .as_mut()
            .unwrap();
        reaction.fulfill.clear();
        reaction.fulfill.insert(
            crate::rule::StateProperty::Visible,
            crate::expression::Expression::Const { value: false },
        );

        let mut incomplete = SchemaProperty::new(FieldType::String);
        incomplete.reactions = Some(compile_reaction(&ConditionalVisibilityRule::new(
            path("status"),
            Condition::NotEquals,
            RuleAction::Hide,
        )));
        schema.root_mut().insert_child("extra".into(), incomplete, None);

        let result = Validator::with_default_rules().validate(&schema);
        assert!(result.valid, "{:?}", result.errors);
        let warnings: Vec<_> = result.warnings.iter().map(|w| w.code).collect();
        assert!(warnings.contains(&ValidationWarningCode::InconsistentReaction));
        assert!(warnings.contains(&ValidationWarningCode::IncompleteRule));
    }
}
