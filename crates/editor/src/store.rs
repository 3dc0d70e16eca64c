//! Schema store
//!
//! The single writer of a form document. Every structural mutation runs on a
//! working copy and is committed in one step: the previous state goes onto
//! the undo stack, the document is marked dirty, and subscribers are told.
//! A failed operation leaves everything as it was.

use crate::config::EditorConfig;
use crate::history::{History, HistoryEntry};
use formforge_core::{BuilderError, BuilderResult, FieldType};
use formforge_schema::{
    BlueprintCatalog, FieldPatch, FieldPath, ImportOptions, ImportReport, OrderedFields, Schema,
    SchemaProperty, allocate_key, disable_rules_referencing, export_schema, import_schema,
};
use std::sync::Arc;
use uuid::Uuid;

/// Handle returned by [`SchemaStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Change notification delivered to subscribers after a commit
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    FieldAdded {
        path: FieldPath,
        index: usize,
    },
    FieldUpdated {
        path: FieldPath,
    },
    FieldDeleted {
        path: FieldPath,
        removed: usize,
        disabled_rules: Vec<FieldPath>,
    },
    FieldsReordered {
        parent: FieldPath,
    },
    SelectionChanged {
        selected: Option<FieldPath>,
    },
    Undone {
        label: String,
    },
    Redone {
        label: String,
    },
    Imported {
        warnings: usize,
    },
    Saved,
}

type Listener = Box<dyn FnMut(&StoreEvent, &Schema)>;

/// Editable form document with undo history and selection
pub struct SchemaStore {
    id: Uuid,
    schema: Schema,
    catalog: Arc<BlueprintCatalog>,
    config: EditorConfig,
    history: History,
    selection: Option<FieldPath>,
    is_dirty: bool,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for SchemaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaStore")
            .field("id", &self.id)
            .field("fields", &self.schema.field_count())
            .field("selection", &self.selection)
            .field("is_dirty", &self.is_dirty)
            .field("undo_count", &self.history.undo_count())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for SchemaStore {
    fn default() -> Self {
        Self::new(Arc::new(BlueprintCatalog::standard()), EditorConfig::default())
    }
}

impl SchemaStore {
    /// Create a store over an empty schema
    pub fn new(catalog: Arc<BlueprintCatalog>, config: EditorConfig) -> Self {
        Self::with_schema(Schema::new(), catalog, config)
    }

    /// Create a store over an existing schema
    pub fn with_schema(schema: Schema, catalog: Arc<BlueprintCatalog>, config: EditorConfig) -> Self {
        let history = History::with_max_size(config.history_limit);
        Self {
            id: Uuid::new_v4(),
            schema,
            catalog,
            config,
            history,
            selection: None,
            is_dirty: false,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn catalog(&self) -> &BlueprintCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selected(&self) -> Option<&FieldPath> {
        self.selection.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Labels of the undoable actions, oldest first
    pub fn history_labels(&self) -> Vec<&str> {
        self.history.undo_labels()
    }

    /// Lazily walk the fields beneath `path` in display order
    pub fn ordered_fields(&self, path: &FieldPath) -> BuilderResult<OrderedFields<'_>> {
        self.schema.ordered_fields(path)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Instantiate a blueprint under `target_parent` (the root when `None`)
    /// at `index` (clamped; the end when `None`). Returns the new field's path.
    pub fn add_field(
        &mut self,
        blueprint: &str,
        target_parent: Option<&FieldPath>,
        index: Option<usize>,
    ) -> BuilderResult<FieldPath> {
        let blueprint = self
            .catalog
            .get(blueprint)
            .ok_or_else(|| BuilderError::UnknownBlueprint(blueprint.to_string()))?;
        let parent = target_parent.cloned().unwrap_or_default();

        let mut working = self.schema.clone();
        let container = working.container_mut(&parent)?;
        let key = allocate_key(&container.properties, &blueprint.key, &self.config.key_separator);
        let landed = container.insert_child(key.clone(), blueprint.instantiate(), index);
        let path = parent.child(key);

        tracing::debug!("Added '{}' field at {} (index {})", blueprint.key, path, landed);
        self.commit(
            format!("Add field '{path}'"),
            working,
            StoreEvent::FieldAdded {
                path: path.clone(),
                index: landed,
            },
        );
        Ok(path)
    }

    /// Merge a patch into one field
    pub fn update_field(&mut self, path: &FieldPath, patch: FieldPatch) -> BuilderResult<()> {
        self.update_field_labeled(path, patch, format!("Update field '{path}'"))
    }

    pub(crate) fn update_field_labeled(
        &mut self,
        path: &FieldPath,
        patch: FieldPatch,
        label: String,
    ) -> BuilderResult<()> {
        self.schema.resolve(path)?;
        if path.is_root() && patch.field_type.is_some_and(|t| t != FieldType::Object) {
            return Err(BuilderError::invalid_target(path, "the root must stay an object"));
        }
        if let Some(Some(reaction)) = &patch.reactions {
            let parent = reaction.parent_field();
            if parent == path {
                return Err(BuilderError::SelfReference(path.to_string()));
            }
            if reaction.rule.enabled && !self.schema.contains(parent) {
                return Err(BuilderError::DanglingReference {
                    field: path.to_string(),
                    parent: parent.to_string(),
                });
            }
        }

        let mut working = self.schema.clone();
        let node = working
            .get_mut(path)
            .ok_or_else(|| BuilderError::not_found(path))?;
        patch.apply(path, node)?;

        tracing::debug!("Updated field {}", path);
        self.commit(label, working, StoreEvent::FieldUpdated { path: path.clone() });
        Ok(())
    }

    /// Remove a field and its subtree, disabling every rule that pointed into
    /// it. Returns the removed subtree.
    pub fn delete_field(&mut self, path: &FieldPath) -> BuilderResult<SchemaProperty> {
        if path.is_root() {
            return Err(BuilderError::invalid_target(path, "the root cannot be deleted"));
        }
        self.schema.resolve(path)?;

        let mut working = self.schema.clone();
        let parent_path = path.parent().unwrap_or_default();
        let key = path.key().unwrap_or_default();
        let removed = working
            .get_mut(&parent_path)
            .and_then(|parent| parent.remove_child(key))
            .ok_or_else(|| BuilderError::not_found(path))?;

        let disabled_rules = disable_rules_referencing(&mut working, path);
        for owner in &disabled_rules {
            tracing::warn!("Rule on '{}' referenced deleted field '{}'; disabled", owner, path);
        }

        let count = 1 + removed.descendant_count();
        tracing::debug!("Deleted {} ({} node(s))", path, count);
        self.commit(
            format!("Delete field '{path}'"),
            working,
            StoreEvent::FieldDeleted {
                path: path.clone(),
                removed: count,
                disabled_rules,
            },
        );
        Ok(removed)
    }

    /// Reorder the children of `parent`; `ordered_keys` must be a permutation
    /// of the current child keys
    pub fn reorder_fields<S: AsRef<str>>(
        &mut self,
        parent: &FieldPath,
        ordered_keys: &[S],
    ) -> BuilderResult<()> {
        let mut working = self.schema.clone();
        working.reorder(parent, ordered_keys)?;

        tracing::debug!("Reordered children of {}", parent);
        self.commit(
            format!("Reorder fields in '{parent}'"),
            working,
            StoreEvent::FieldsReordered {
                parent: parent.clone(),
            },
        );
        Ok(())
    }

    /// Select a field, or clear the selection with `None`
    pub fn select_field(&mut self, path: Option<FieldPath>) -> BuilderResult<()> {
        if let Some(path) = &path {
            if path.is_root() {
                return Err(BuilderError::invalid_target(path, "the root cannot be selected"));
            }
            self.schema.resolve(path)?;
        }
        if self.selection != path {
            self.selection = path;
            self.notify(StoreEvent::SelectionChanged {
                selected: self.selection.clone(),
            });
        }
        Ok(())
    }

    /// Revert the last mutation; `false` when there is nothing to undo
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.history.undo(self.schema.clone()) else {
            return false;
        };
        tracing::info!("Undo: {}", entry.label);
        self.restore(entry.schema);
        self.notify(StoreEvent::Undone { label: entry.label });
        true
    }

    /// Reapply the last undone mutation; `false` when there is nothing to redo
    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.history.redo(self.schema.clone()) else {
            return false;
        };
        tracing::info!("Redo: {}", entry.label);
        self.restore(entry.schema);
        self.notify(StoreEvent::Redone { label: entry.label });
        true
    }

    // ========================================================================
    // Persistence boundary
    // ========================================================================

    /// Serialize the current document
    pub fn export_json(&self) -> BuilderResult<String> {
        export_schema(&self.schema)
    }

    /// Replace the document with an imported one. History and selection
    /// start over; nothing changes if the import fails.
    pub fn import_json(&mut self, json: &str, options: ImportOptions) -> BuilderResult<ImportReport> {
        let report = import_schema(json, options)?;
        self.schema = report.schema.clone();
        self.history.clear();
        self.selection = None;
        self.is_dirty = false;

        tracing::info!("Store {} loaded a schema with {} field(s)", self.id, self.schema.field_count());
        self.notify(StoreEvent::Imported {
            warnings: report.warnings.len(),
        });
        Ok(report)
    }

    /// Hand the document to a caller-supplied persistence callback; the
    /// dirty flag clears only when it succeeds
    pub fn save_with<F, E>(&mut self, save: F) -> BuilderResult<()>
    where
        F: FnOnce(&Schema) -> Result<(), E>,
        E: std::fmt::Display,
    {
        save(&self.schema).map_err(|e| BuilderError::Persistence(e.to_string()))?;
        self.is_dirty = false;
        tracing::info!("Store {} saved", self.id);
        self.notify(StoreEvent::Saved);
        Ok(())
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Register a listener called after every committed change
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&StoreEvent, &Schema) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener; `false` if it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn commit(&mut self, label: String, working: Schema, event: StoreEvent) {
        let previous = std::mem::replace(&mut self.schema, working);
        self.history.push(HistoryEntry::new(label, previous));
        self.is_dirty = true;
        let selection_cleared = self.reconcile_selection();
        self.notify(event);
        if selection_cleared {
            self.notify(StoreEvent::SelectionChanged { selected: None });
        }
    }

    fn restore(&mut self, schema: Schema) {
        self.schema = schema;
        self.is_dirty = true;
        if self.reconcile_selection() {
            self.notify(StoreEvent::SelectionChanged { selected: None });
        }
    }

    /// Drop a selection that no longer resolves; true if it was dropped
    fn reconcile_selection(&mut self) -> bool {
        match &self.selection {
            Some(path) if !self.schema.contains(path) => {
                self.selection = None;
                true
            }
            _ => false,
        }
    }

    fn notify(&mut self, event: StoreEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event, &self.schema);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use formforge_core::EnumOption;
    use formforge_schema::{Condition, ConditionalVisibilityRule, RuleAction, compile_reaction};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn path(raw: &str) -> FieldPath {
        FieldPath::parse(raw).unwrap()
    }

    fn orders(store: &SchemaStore, parent: &FieldPath) -> Vec<(String, u32)> {
        store
            .schema()
            .resolve(parent)
            .unwrap()
            .ordered_children()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.order))
            .collect()
    }

    #[test]
    fn test_add_and_reorder_scenario() {
        let mut store = SchemaStore::default();
        let root = FieldPath::root();
        let first = store.add_field("text", Some(&root), None).unwrap();
        let second = store.add_field("number", Some(&root), None).unwrap();
        assert_eq!(
            orders(&store, &root),
            vec![("text".to_string(), 0), ("number".to_string(), 1)]
        );

        store
            .reorder_fields(&root, &[second.key().unwrap(), first.key().unwrap()])
            .unwrap();
        assert_eq!(
            orders(&store, &root),
            vec![("number".to_string(), 0), ("text".to_string(), 1)]
        );

        assert!(store.undo());
        assert_eq!(
            orders(&store, &root),
            vec![("text".to_string(), 0), ("number".to_string(), 1)]
        );
    }

    #[test]
    fn test_add_field_allocates_unique_keys() {
        let mut store = SchemaStore::default();
        let a = store.add_field("text", None, None).unwrap();
        let b = store.add_field("text", None, None).unwrap();
        let c = store.add_field("text", None, Some(0)).unwrap();
        assert_eq!(a.to_dotted(), "text");
        assert_eq!(b.to_dotted(), "text_1");
        assert_eq!(c.to_dotted(), "text_2");
        assert_eq!(store.schema().sibling_index(&c), Some(0));
        assert_eq!(store.history().undo_count(), 3);
    }

    #[test]
    fn test_add_field_errors_leave_state_unchanged() {
        let mut store = SchemaStore::default();
        let name = store.add_field("text", None, None).unwrap();
        let before = store.schema().clone();

        assert!(matches!(
            store.add_field("nope", None, None),
            Err(BuilderError::UnknownBlueprint(_))
        ));
        assert!(matches!(
            store.add_field("text", Some(&name), None),
            Err(BuilderError::InvalidTarget { .. })
        ));
        assert!(matches!(
            store.add_field("text", Some(&path("missing")), None),
            Err(BuilderError::InvalidTarget { .. })
        ));
        assert_eq!(store.schema(), &before);
        assert_eq!(store.history().undo_count(), 1);
    }

    #[test]
    fn test_add_into_container_clamps_index() {
        let mut store = SchemaStore::default();
        let group = store.add_field("group", None, None).unwrap();
        let inner = store.add_field("text", Some(&group), Some(42)).unwrap();
        assert_eq!(inner.to_dotted(), "group.text");
        assert_eq!(store.schema().sibling_index(&inner), Some(0));
    }

    #[test]
    fn test_update_field_replaces_metadata_wholesale() {
        let mut store = SchemaStore::default();
        let name = store.add_field("text", None, None).unwrap();
        let mut props = serde_json::Map::new();
        props.insert("placeholder".into(), serde_json::json!("a"));
        props.insert("maxLength".into(), serde_json::json!(3));
        store
            .update_field(&name, FieldPatch::new().component_props(props))
            .unwrap();

        let mut replacement = serde_json::Map::new();
        replacement.insert("placeholder".into(), serde_json::json!("b"));
        store
            .update_field(&name, FieldPatch::new().title("Name").component_props(replacement))
            .unwrap();

        let node = store.schema().get(&name).unwrap();
        assert_eq!(node.title.as_deref(), Some("Name"));
        assert_eq!(node.component.as_deref(), Some("Input"));
        assert_eq!(node.component_props.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_update_field_rejections() {
        let mut store = SchemaStore::default();
        let group = store.add_field("group", None, None).unwrap();
        store.add_field("text", Some(&group), None).unwrap();
        let before = store.schema().clone();

        assert!(store.update_field(&path("missing"), FieldPatch::new()).unwrap_err().is_not_found());
        assert!(
            store
                .update_field(&group, FieldPatch::new().field_type(FieldType::String))
                .is_err()
        );
        assert!(
            store
                .update_field(&FieldPath::root(), FieldPatch::new().field_type(FieldType::Array))
                .is_err()
        );

        let own_rule = compile_reaction(&ConditionalVisibilityRule::new(
            group.clone(),
            Condition::HasValue,
            RuleAction::Show,
        ));
        assert!(matches!(
            store.update_field(&group, FieldPatch::new().reactions(own_rule)),
            Err(BuilderError::SelfReference(_))
        ));
        assert_eq!(store.schema(), &before);
    }

    #[test]
    fn test_delete_cascade() {
        let mut store = SchemaStore::default();
        let group = store.add_field("group", None, None).unwrap();
        let inner = store.add_field("select", Some(&group), None).unwrap();
        store.add_field("text", Some(&group), None).unwrap();
        let notes = store.add_field("textarea", None, None).unwrap();
        let other = store.add_field("text", None, None).unwrap();

        let rule = compile_reaction(
            &ConditionalVisibilityRule::new(inner.clone(), Condition::Equals, RuleAction::Show)
                .with_target("Option 1"),
        );
        store.update_field(&notes, FieldPatch::new().reactions(rule)).unwrap();
        let unrelated = compile_reaction(&ConditionalVisibilityRule::new(
            notes.clone(),
            Condition::HasValue,
            RuleAction::Show,
        ));
        store
            .update_field(&other, FieldPatch::new().reactions(unrelated))
            .unwrap();
        store.select_field(Some(inner.clone())).unwrap();

        let fields_before = store.schema().field_count();
        let undo_before = store.history().undo_count();
        let removed = store.delete_field(&group).unwrap();

        assert_eq!(removed.descendant_count(), 2);
        assert_eq!(store.schema().field_count(), fields_before - 3);
        assert_eq!(store.history().undo_count(), undo_before + 1);
        assert_eq!(store.selected(), None);

        let reaction = store.schema().get(&notes).unwrap().reactions.as_ref().unwrap();
        assert!(reaction.dangling);
        assert!(!reaction.rule.enabled);
        let untouched = store.schema().get(&other).unwrap().reactions.as_ref().unwrap();
        assert!(untouched.rule.enabled);
        assert_eq!(orders(&store, &FieldPath::root()).iter().map(|(_, o)| *o).collect::<Vec<_>>(), vec![0, 1]);

        // one undo restores the subtree and the rule together
        assert!(store.undo());
        let reaction = store.schema().get(&notes).unwrap().reactions.as_ref().unwrap();
        assert!(reaction.rule.enabled);
        assert!(store.schema().contains(&inner));
    }

    #[test]
    fn test_delete_root_rejected() {
        let mut store = SchemaStore::default();
        assert!(matches!(
            store.delete_field(&FieldPath::root()),
            Err(BuilderError::InvalidTarget { .. })
        ));
        assert!(store.delete_field(&path("ghost")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_reorder_mismatch_keeps_orders() {
        let mut store = SchemaStore::default();
        store.add_field("text", None, None).unwrap();
        store.add_field("number", None, None).unwrap();
        let before = store.schema().clone();

        let err = store
            .reorder_fields(&FieldPath::root(), &["text", "text"])
            .unwrap_err();
        assert!(matches!(err, BuilderError::OrderMismatch { .. }));
        assert_eq!(store.schema(), &before);
        assert_eq!(store.history().undo_count(), 2);
    }

    #[test]
    fn test_reorder_leaf_is_rejected_without_history() {
        let mut store = SchemaStore::default();
        let text = store.add_field("text", None, None).unwrap();
        let before = store.schema().clone();

        let err = store.reorder_fields::<&str>(&text, &[]).unwrap_err();
        assert!(matches!(err, BuilderError::InvalidTarget { .. }));
        assert_eq!(store.schema(), &before);
        assert_eq!(store.history().undo_count(), 1);
        assert!(!store.history().can_redo());
    }

    #[test]
    fn test_undo_redo_inverse_law() {
        let mut store = SchemaStore::default();
        let initial = store.schema().clone();

        let group = store.add_field("group", None, None).unwrap();
        let status = store.add_field("radio", Some(&group), None).unwrap();
        store.add_field("text", None, Some(0)).unwrap();
        store
            .update_field(
                &status,
                FieldPatch::new().options(vec![EnumOption::text("a"), EnumOption::text("b")]),
            )
            .unwrap();
        store
            .reorder_fields(&FieldPath::root(), &["group", "text"])
            .unwrap();
        store.delete_field(&status).unwrap();
        let final_state = store.schema().clone();

        let steps = store.history().undo_count();
        assert_eq!(steps, 6);
        for _ in 0..steps {
            assert!(store.undo());
        }
        assert!(!store.undo());
        assert_eq!(store.schema(), &initial);

        for _ in 0..steps {
            assert!(store.redo());
        }
        assert!(!store.redo());
        assert_eq!(store.schema(), &final_state);
    }

    #[test]
    fn test_new_mutation_clears_redo() {
        let mut store = SchemaStore::default();
        store.add_field("text", None, None).unwrap();
        store.undo();
        assert!(store.can_redo());
        store.add_field("number", None, None).unwrap();
        assert!(!store.can_redo());
    }

    #[test]
    fn test_history_limit_from_config() {
        let config = EditorConfig::default().with_history_limit(2);
        let mut store = SchemaStore::new(Arc::new(BlueprintCatalog::standard()), config);
        for _ in 0..4 {
            store.add_field("text", None, None).unwrap();
        }
        assert_eq!(store.history().undo_count(), 2);
    }

    #[test]
    fn test_selection() {
        let mut store = SchemaStore::default();
        let name = store.add_field("text", None, None).unwrap();

        store.select_field(Some(name.clone())).unwrap();
        assert_eq!(store.selected(), Some(&name));
        assert!(store.select_field(Some(path("ghost"))).unwrap_err().is_not_found());
        assert_eq!(store.selected(), Some(&name));

        // undoing the add makes the selection unresolvable
        store.undo();
        assert_eq!(store.selected(), None);
        assert_eq!(store.history().undo_count(), 0);
    }

    #[test]
    fn test_subscriptions() {
        let mut store = SchemaStore::default();
        let seen: Rc<RefCell<Vec<StoreEvent>>> = Rc::default();
        let sink = Rc::clone(&seen);
        let id = store.subscribe(move |event, _| sink.borrow_mut().push(event.clone()));

        let name = store.add_field("text", None, None).unwrap();
        store.select_field(Some(name.clone())).unwrap();
        store.undo();

        {
            let events = seen.borrow();
            assert_eq!(
                events[0],
                StoreEvent::FieldAdded {
                    path: name.clone(),
                    index: 0
                }
            );
            assert!(matches!(events[1], StoreEvent::SelectionChanged { selected: Some(_) }));
            assert!(events.contains(&StoreEvent::SelectionChanged { selected: None }));
            assert!(matches!(events.last(), Some(StoreEvent::Undone { .. })));
        }

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        let count = seen.borrow().len();
        store.redo();
        assert_eq!(seen.borrow().len(), count);
    }

    #[test]
    fn test_dirty_flag_and_save() {
        let mut store = SchemaStore::default();
        assert!(!store.is_dirty());
        store.add_field("text", None, None).unwrap();
        assert!(store.is_dirty());

        let err = store.save_with(|_| Err("disk full")).unwrap_err();
        assert!(matches!(err, BuilderError::Persistence(_)));
        assert!(store.is_dirty());

        let mut saved = None;
        store
            .save_with(|schema| {
                saved = Some(schema.clone());
                Ok::<(), String>(())
            })
            .unwrap();
        assert!(!store.is_dirty());
        assert_eq!(saved.as_ref(), Some(store.schema()));
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut store = SchemaStore::default();
        let group = store.add_field("group", None, None).unwrap();
        store.add_field("select", Some(&group), None).unwrap();
        store.add_field("text", None, Some(0)).unwrap();
        let json = store.export_json().unwrap();

        let mut other = SchemaStore::default();
        let report = other.import_json(&json, ImportOptions::strict()).unwrap();
        assert!(report.disabled_rules.is_empty());
        assert_eq!(other.schema(), store.schema());
        assert!(!other.can_undo());
        assert!(!other.is_dirty());
    }

    #[test]
    fn test_failed_import_keeps_document() {
        let mut store = SchemaStore::default();
        store.add_field("text", None, None).unwrap();
        let before = store.schema().clone();
        let err = store
            .import_json(r#"{"type":"object","properties":{"bad key":{"type":"string"}}}"#, ImportOptions::strict())
            .unwrap_err();
        assert_eq!(err.violations().len(), 1);
        assert_eq!(store.schema(), &before);
        assert!(store.can_undo());
    }

    #[test]
    fn test_stores_are_independent() {
        let catalog = Arc::new(BlueprintCatalog::standard());
        let mut a = SchemaStore::new(Arc::clone(&catalog), EditorConfig::default());
        let b = SchemaStore::new(catalog, EditorConfig::default());
        a.add_field("text", None, None).unwrap();
        assert_eq!(b.schema().field_count(), 0);
        assert_ne!(a.id(), b.id());
    }
}
