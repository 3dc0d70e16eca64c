//! Rule editor contract
//!
//! What a rule panel needs from the store: the rule currently on a field,
//! the fields it may depend on, and a way to set or clear it.

use crate::store::SchemaStore;
use formforge_core::{BuilderResult, EnumOption, FieldType};
use formforge_schema::{
    CompiledRule, ConditionalVisibilityRule, FieldPatch, FieldPath, compile, decompile,
};

/// A field a rule may depend on
#[derive(Debug, Clone, PartialEq)]
pub struct ParentCandidate {
    pub path: FieldPath,
    pub label: String,
    pub field_type: FieldType,
    /// Enumerated values, so the editor can offer a picker for the target
    pub options: Option<Vec<EnumOption>>,
}

/// What `apply_rule` did
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    Applied(CompiledRule),
    Cleared,
}

/// A stored rule that no longer has a live parent field
#[derive(Debug, Clone, PartialEq)]
pub struct DanglingRule {
    pub owner: FieldPath,
    pub rule: ConditionalVisibilityRule,
}

impl SchemaStore {
    /// The rule stored on a field, if any
    pub fn current_rule(&self, path: &FieldPath) -> BuilderResult<Option<ConditionalVisibilityRule>> {
        let node = self.schema().resolve(path)?;
        Ok(node.reactions.as_ref().and_then(decompile))
    }

    /// Fields the rule on `path` may reference: everything except the field
    /// itself, its descendants and value-less layout sections, in display
    /// order
    pub fn available_parents(&self, path: &FieldPath) -> BuilderResult<Vec<ParentCandidate>> {
        self.schema().resolve(path)?;
        let candidates = self
            .schema()
            .ordered_fields(&FieldPath::root())?
            .filter(|(candidate, node)| !candidate.is_within(path) && node.field_type.has_value())
            .map(|(candidate, node)| ParentCandidate {
                label: node.label(candidate.key().unwrap_or_default()).to_string(),
                field_type: node.field_type,
                options: node.options.clone(),
                path: candidate,
            })
            .collect();
        Ok(candidates)
    }

    /// Compile and store a rule on a field, or clear it with `None`.
    /// Produces exactly one history entry; on error nothing changes.
    pub fn apply_rule(
        &mut self,
        path: &FieldPath,
        rule: Option<ConditionalVisibilityRule>,
    ) -> BuilderResult<RuleOutcome> {
        match rule {
            None => {
                self.update_field_labeled(
                    path,
                    FieldPatch::new().clear_reactions(),
                    format!("Clear rule on '{path}'"),
                )?;
                Ok(RuleOutcome::Cleared)
            }
            Some(rule) => {
                let compiled = compile(self.schema(), path, &rule)?;
                if compiled.incomplete {
                    tracing::debug!("Rule on {} has no target value yet", path);
                }
                self.update_field_labeled(
                    path,
                    FieldPatch::new().reactions(compiled.reaction.clone()),
                    format!("Set rule on '{path}'"),
                )?;
                Ok(RuleOutcome::Applied(compiled))
            }
        }
    }

    /// Rules that are flagged dangling or whose parent no longer resolves
    pub fn dangling_rules(&self) -> Vec<DanglingRule> {
        self.schema()
            .reactions()
            .filter(|(_, reaction)| {
                reaction.dangling || !self.schema().contains(reaction.parent_field())
            })
            .map(|(owner, reaction)| DanglingRule {
                owner,
                rule: reaction.rule.clone(),
            })
            .collect()
    }
}
