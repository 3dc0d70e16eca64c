//! Conditional visibility rules and their compiled reactions

use crate::expression::Expression;
use crate::path::FieldPath;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

fn default_true() -> bool {
    true
}

fn is_false(value: &bool) -> bool {
    !*value
}

// ============================================================================
// Rule model
// ============================================================================

/// Test applied to the parent field's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Condition {
    HasValue,
    IsEmpty,
    Equals,
    NotEquals,
}

impl Condition {
    /// Whether the condition compares against a target value
    pub fn requires_target(&self) -> bool {
        matches!(self, Condition::Equals | Condition::NotEquals)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::HasValue => "hasValue",
            Condition::IsEmpty => "isEmpty",
            Condition::Equals => "equals",
            Condition::NotEquals => "notEquals",
        }
    }

    pub fn all() -> &'static [Condition] {
        &[
            Condition::HasValue,
            Condition::IsEmpty,
            Condition::Equals,
            Condition::NotEquals,
        ]
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Condition::all()
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown condition '{s}'"))
    }
}

/// Effect of a rule on its owning field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Show,
    Hide,
    Disable,
}

impl RuleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleAction::Show => "show",
            RuleAction::Hide => "hide",
            RuleAction::Disable => "disable",
        }
    }

    pub fn all() -> &'static [RuleAction] {
        &[RuleAction::Show, RuleAction::Hide, RuleAction::Disable]
    }
}

impl std::fmt::Display for RuleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RuleAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleAction::all()
            .iter()
            .copied()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown action '{s}'"))
    }
}

/// Author-facing description of when a field is shown, hidden or disabled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalVisibilityRule {
    pub parent_field: FieldPath,
    pub condition: Condition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_value: Option<Value>,
    pub action: RuleAction,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl ConditionalVisibilityRule {
    pub fn new(parent_field: FieldPath, condition: Condition, action: RuleAction) -> Self {
        Self {
            parent_field,
            condition,
            target_value: None,
            action,
            enabled: true,
        }
    }

    pub fn with_target(mut self, value: impl Into<Value>) -> Self {
        self.target_value = Some(value.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// True for equals/notEquals without a target value
    pub fn is_incomplete(&self) -> bool {
        self.condition.requires_target() && self.target_value.is_none()
    }

    /// True when the two rules behave identically (ignores `enabled`)
    pub fn same_behavior(&self, other: &Self) -> bool {
        self.parent_field == other.parent_field
            && self.condition == other.condition
            && self.action == other.action
            && self.target_value == other.target_value
    }
}

// ============================================================================
// Compiled reaction
// ============================================================================

/// Presentation state a reaction can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateProperty {
    Visible,
    Disabled,
}

/// Evaluated presentation state; `None` means the reaction leaves it alone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldState {
    pub visible: Option<bool>,
    pub disabled: Option<bool>,
}

/// Dependency-tracked expressions stored under `x-reactions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalReaction {
    pub dependencies: Vec<FieldPath>,
    #[serde(default)]
    pub fulfill: BTreeMap<StateProperty, Expression>,
    pub rule: ConditionalVisibilityRule,
    #[serde(default, skip_serializing_if = "is_false")]
    pub incomplete: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub dangling: bool,
}

impl ConditionalReaction {
    /// A reaction with no run-time effect is inert
    pub fn is_inert(&self) -> bool {
        self.fulfill.is_empty()
    }

    /// Parent field of the stored rule
    pub fn parent_field(&self) -> &FieldPath {
        &self.rule.parent_field
    }

    /// Evaluate against the form's current values (a nested JSON object
    /// keyed the same way as the schema)
    pub fn evaluate(&self, form_values: &Value) -> FieldState {
        let deps: Vec<Value> = self
            .dependencies
            .iter()
            .map(|path| lookup_value(form_values, path).cloned().unwrap_or(Value::Null))
            .collect();

        let mut state = FieldState::default();
        for (property, expression) in &self.fulfill {
            let result = expression.evaluate(&deps);
            match property {
                StateProperty::Visible => state.visible = Some(result),
                StateProperty::Disabled => state.disabled = Some(result),
            }
        }
        state
    }
}

/// Find the value addressed by `path` inside nested form values
pub fn lookup_value<'a>(form_values: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    let mut current = form_values;
    for key in path.segments() {
        current = current.as_object()?.get(key)?;
    }
    Some(current)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status() -> FieldPath {
        FieldPath::parse("status").unwrap()
    }

    #[test]
    fn test_rule_serde_shape() {
        let rule = ConditionalVisibilityRule::new(status(), Condition::Equals, RuleAction::Show)
            .with_target("approved");
        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            value,
            json!({
                "parentField": "status",
                "condition": "equals",
                "targetValue": "approved",
                "action": "show",
                "enabled": true
            })
        );

        let missing_enabled: ConditionalVisibilityRule = serde_json::from_value(json!({
            "parentField": "status",
            "condition": "hasValue",
            "action": "hide"
        }))
        .unwrap();
        assert!(missing_enabled.enabled);
    }

    #[test]
    fn test_incomplete_detection() {
        let rule = ConditionalVisibilityRule::new(status(), Condition::NotEquals, RuleAction::Hide);
        assert!(rule.is_incomplete());
        assert!(!rule.with_target("x").is_incomplete());
        assert!(
            !ConditionalVisibilityRule::new(status(), Condition::IsEmpty, RuleAction::Hide)
                .is_incomplete()
        );
    }

    #[test]
    fn test_parse_condition_and_action() {
        assert_eq!("hasValue".parse::<Condition>().unwrap(), Condition::HasValue);
        assert_eq!("notequals".parse::<Condition>().unwrap(), Condition::NotEquals);
        assert_eq!("HIDE".parse::<RuleAction>().unwrap(), RuleAction::Hide);
        assert!("toggle".parse::<RuleAction>().is_err());
    }

    #[test]
    fn test_lookup_nested_value() {
        let values = json!({ "address": { "city": "Oslo" } });
        let city = FieldPath::parse("address.city").unwrap();
        assert_eq!(lookup_value(&values, &city), Some(&json!("Oslo")));
        assert_eq!(lookup_value(&values, &status()), None);
    }

    #[test]
    fn test_evaluate_reaction() {
        let mut fulfill = BTreeMap::new();
        fulfill.insert(StateProperty::Disabled, Expression::Falsy { dep: 0 });
        let reaction = ConditionalReaction {
            dependencies: vec![status()],
            fulfill,
            rule: ConditionalVisibilityRule::new(status(), Condition::IsEmpty, RuleAction::Disable),
            incomplete: false,
            dangling: false,
        };

        let state = reaction.evaluate(&json!({}));
        assert_eq!(state.disabled, Some(true));
        assert_eq!(state.visible, None);

        let state = reaction.evaluate(&json!({ "status": "draft" }));
        assert_eq!(state.disabled, Some(false));
    }
}
