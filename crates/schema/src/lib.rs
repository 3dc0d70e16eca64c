//! # FormForge Schema
//!
//! The form document and everything that works on it without editor state:
//!
//! - **SchemaProperty / Schema**: the property tree, addressed by [`FieldPath`]
//! - **Tree utilities**: ordered traversal, key allocation, reordering
//! - **BlueprintCatalog**: the templates new fields are created from
//! - **Rules**: conditional visibility rules, their compiler and evaluator
//! - **Import / export**: JSON persistence with full structural validation

pub mod blueprint;
pub mod compiler;
pub mod expression;
pub mod path;
pub mod property;
pub mod rule;
pub mod serialization;
pub mod tree;
pub mod validation;

pub use blueprint::{BlueprintCatalog, BlueprintCategory, FieldBlueprint};
pub use compiler::{
    CompiledRule, compile, compile_reaction, decompile, disable_reaction,
    disable_rules_referencing, preview, unresolved_references,
};
pub use expression::Expression;
pub use path::{FieldPath, is_valid_key};
pub use property::{FieldPatch, Schema, SchemaProperty};
pub use rule::{
    Condition, ConditionalReaction, ConditionalVisibilityRule, FieldState, RuleAction,
    StateProperty,
};
pub use serialization::{
    DanglingPolicy, ImportOptions, ImportReport, export_schema, import_schema, load_schema,
    save_schema,
};
pub use tree::{OrderedFields, allocate_key};
pub use validation::{ValidationResult, ValidationRule, ValidationWarning, Validator};

pub use formforge_core::{BuilderError, BuilderResult, EnumOption, FieldType};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
