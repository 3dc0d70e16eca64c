//! Rule compiler
//!
//! Turns a [`ConditionalVisibilityRule`] into the [`ConditionalReaction`] the
//! renderer evaluates, and back again so saved schemas can be edited.
//!
//! | condition   | base expression      |
//! |-------------|----------------------|
//! | `hasValue`  | `dep` truthy         |
//! | `isEmpty`   | `dep` falsy          |
//! | `equals`    | `dep === target`     |
//! | `notEquals` | `dep !== target`     |
//!
//! `show` sets `visible` to the base expression, `hide` sets it to the
//! negated base, `disable` sets `disabled` and leaves `visible` alone.

use crate::expression::Expression;
use crate::path::FieldPath;
use crate::property::Schema;
use crate::rule::{
    Condition, ConditionalReaction, ConditionalVisibilityRule, RuleAction, StateProperty,
};
use formforge_core::{BuilderError, BuilderResult, EnumOption};
use serde_json::Value;
use std::collections::BTreeMap;

/// Result of compiling a rule against a schema
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    /// Reaction to store under the owner's `x-reactions`
    pub reaction: ConditionalReaction,
    /// equals/notEquals with no target value; compiled permissively to `true`
    pub incomplete: bool,
    /// Options of the parent field, when it has an enumerated value set
    pub parent_options: Option<Vec<EnumOption>>,
    /// Human-readable sentence describing the rule
    pub preview: String,
}

/// Compile `rule` for the field at `owner`.
///
/// The owner and the parent must both resolve, and the parent must be a
/// different, non-root field that carries a value and does not sit inside
/// the owner.
pub fn compile(
    schema: &Schema,
    owner: &FieldPath,
    rule: &ConditionalVisibilityRule,
) -> BuilderResult<CompiledRule> {
    if owner.is_root() {
        return Err(BuilderError::invalid_target(owner, "the root cannot carry a rule"));
    }
    schema.resolve(owner)?;

    let parent_path = &rule.parent_field;
    if parent_path == owner {
        return Err(BuilderError::SelfReference(owner.to_string()));
    }
    if parent_path.is_root() {
        return Err(BuilderError::invalid_target(
            parent_path,
            "the root cannot be a rule's parent field",
        ));
    }
    let parent = schema
        .get(parent_path)
        .ok_or_else(|| BuilderError::DanglingReference {
            field: owner.to_string(),
            parent: parent_path.to_string(),
        })?;
    if parent_path.is_within(owner) {
        return Err(BuilderError::invalid_target(
            parent_path,
            format!("a rule on '{owner}' cannot depend on one of its own children"),
        ));
    }
    if !parent.field_type.has_value() {
        return Err(BuilderError::invalid_target(
            parent_path,
            format!("'{}' fields carry no value to test", parent.field_type),
        ));
    }

    let reaction = compile_reaction(rule);
    let parent_label = parent.label(parent_path.key().unwrap_or_default());
    Ok(CompiledRule {
        incomplete: reaction.incomplete,
        parent_options: parent.options.clone(),
        preview: preview(&reaction.rule, parent_label),
        reaction,
    })
}

/// Build the reaction for a rule without consulting any schema
pub fn compile_reaction(rule: &ConditionalVisibilityRule) -> ConditionalReaction {
    let mut rule = rule.clone();
    if !rule.condition.requires_target() {
        rule.target_value = None;
    }
    let incomplete = rule.is_incomplete();

    if !rule.enabled {
        return ConditionalReaction {
            dependencies: Vec::new(),
            fulfill: BTreeMap::new(),
            rule,
            incomplete,
            dangling: false,
        };
    }

    let base = base_expression(rule.condition, rule.target_value.as_ref());
    let mut fulfill = BTreeMap::new();
    match rule.action {
        RuleAction::Show => {
            fulfill.insert(StateProperty::Visible, base);
        }
        RuleAction::Hide => {
            fulfill.insert(StateProperty::Visible, base.negate());
        }
        RuleAction::Disable => {
            fulfill.insert(StateProperty::Disabled, base);
        }
    }

    ConditionalReaction {
        dependencies: vec![rule.parent_field.clone()],
        fulfill,
        rule,
        incomplete,
        dangling: false,
    }
}

fn base_expression(condition: Condition, target: Option<&Value>) -> Expression {
    match (condition, target) {
        (Condition::HasValue, _) => Expression::Truthy { dep: 0 },
        (Condition::IsEmpty, _) => Expression::Falsy { dep: 0 },
        (Condition::Equals, Some(value)) => Expression::StrictEquals {
            dep: 0,
            value: value.clone(),
        },
        (Condition::NotEquals, Some(value)) => Expression::StrictNotEquals {
            dep: 0,
            value: value.clone(),
        },
        (Condition::Equals | Condition::NotEquals, None) => Expression::Const { value: true },
    }
}

/// Recover the authored rule from a stored reaction.
///
/// Active, complete reactions are read back from their expressions; inert or
/// incomplete ones fall back to the rule kept alongside them. Returns `None`
/// when the expressions do not have a shape the compiler produces.
pub fn decompile(reaction: &ConditionalReaction) -> Option<ConditionalVisibilityRule> {
    if reaction.is_inert() || reaction.incomplete {
        return Some(reaction.rule.clone());
    }

    let parent_field = reaction.dependencies.first()?.clone();
    let (action, base) = match reaction.fulfill.get(&StateProperty::Disabled) {
        Some(expression) => (RuleAction::Disable, expression),
        None => match reaction.fulfill.get(&StateProperty::Visible)? {
            Expression::Not { expr } => (RuleAction::Hide, expr.as_ref()),
            expression => (RuleAction::Show, expression),
        },
    };

    let (condition, target_value) = match base {
        Expression::Truthy { dep: 0 } => (Condition::HasValue, None),
        Expression::Falsy { dep: 0 } => (Condition::IsEmpty, None),
        Expression::StrictEquals { dep: 0, value } => (Condition::Equals, Some(value.clone())),
        Expression::StrictNotEquals { dep: 0, value } => {
            (Condition::NotEquals, Some(value.clone()))
        }
        _ => return None,
    };

    Some(ConditionalVisibilityRule {
        parent_field,
        condition,
        target_value,
        action,
        enabled: true,
    })
}

/// Sentence describing a rule: `When "{label}" {condition}, {action} this field`
pub fn preview(rule: &ConditionalVisibilityRule, parent_label: &str) -> String {
    let target = rule
        .target_value
        .as_ref()
        .map(display_value)
        .unwrap_or_else(|| "(no value yet)".to_string());
    let condition = match rule.condition {
        Condition::HasValue => "has a value".to_string(),
        Condition::IsEmpty => "is empty".to_string(),
        Condition::Equals => format!("equals {target}"),
        Condition::NotEquals => format!("does not equal {target}"),
    };
    format!(
        "When \"{parent_label}\" {condition}, {} this field",
        rule.action
    )
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{s}\""),
        other => other.to_string(),
    }
}

// ============================================================================
// Cascades
// ============================================================================

/// Switch a reaction off, keeping its rule for later repair
pub fn disable_reaction(reaction: &mut ConditionalReaction, dangling: bool) {
    reaction.rule.enabled = false;
    reaction.dependencies.clear();
    reaction.fulfill.clear();
    reaction.dangling = dangling;
}

/// Disable and flag every rule whose parent lies at or beneath `removed`.
/// Returns the owners of the rules that changed.
pub fn disable_rules_referencing(schema: &mut Schema, removed: &FieldPath) -> Vec<FieldPath> {
    let mut touched = Vec::new();
    schema.visit_mut(|path, node| {
        if let Some(reaction) = node.reactions.as_mut() {
            if reaction.rule.parent_field.is_within(removed) && !reaction.dangling {
                disable_reaction(reaction, true);
                touched.push(path.clone());
            }
        }
    });
    touched
}

/// Rules whose parent field no longer resolves, as `(owner, parent)` pairs
pub fn unresolved_references(schema: &Schema) -> Vec<(FieldPath, FieldPath)> {
    schema
        .reactions()
        .filter(|(_, reaction)| !schema.contains(reaction.parent_field()))
        .map(|(owner, reaction)| (owner, reaction.parent_field().clone()))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
