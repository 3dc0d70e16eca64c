//! Schema tree nodes
//!
//! [`SchemaProperty`] is one node of the form schema; [`Schema`] wraps the
//! root object. Containers (`object`, `array`, `void`) own their children
//! exclusively through `properties`, keyed by sibling-unique keys. Sibling
//! position lives in `x-index` and is kept contiguous (`0..n`) by every
//! structural operation.

use crate::path::FieldPath;
use crate::rule::ConditionalReaction;
use crate::tree::OrderedFields;
use formforge_core::{BuilderError, BuilderResult, EnumOption, FieldType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

fn is_false(value: &bool) -> bool {
    !*value
}

// ============================================================================
// SchemaProperty
// ============================================================================

/// One node of the schema tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaProperty {
    /// Field kind
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Display title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Ordered options, only for choice-type fields
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<EnumOption>>,

    /// Initial value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Whether the field must be filled in
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,

    /// Position among siblings (ascending)
    #[serde(rename = "x-index", default)]
    pub order: u32,

    /// Renderer component name
    #[serde(rename = "x-component", default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,

    /// Renderer component metadata (replaced wholesale on update)
    #[serde(
        rename = "x-component-props",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub component_props: Option<Map<String, Value>>,

    /// Compiled conditional rule (replaced wholesale on update)
    #[serde(rename = "x-reactions", default, skip_serializing_if = "Option::is_none")]
    pub reactions: Option<ConditionalReaction>,

    /// Children of a container, keyed by property key
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, SchemaProperty>,
}

impl SchemaProperty {
    /// Create a new property of the given type
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            title: None,
            description: None,
            options: None,
            default: None,
            required: false,
            order: 0,
            component: None,
            component_props: None,
            reactions: None,
            properties: BTreeMap::new(),
        }
    }

    /// Create an object container
    pub fn object() -> Self {
        Self::new(FieldType::Object)
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_options(mut self, options: Vec<EnumOption>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Append a child at the end of the sibling list
    pub fn with_child(mut self, key: impl Into<String>, child: SchemaProperty) -> Self {
        self.insert_child(key.into(), child, None);
        self
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn is_container(&self) -> bool {
        self.field_type.is_container()
    }

    /// Title, falling back to the property key
    pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
        self.title.as_deref().unwrap_or(key)
    }

    /// Children sorted by ascending order, ties broken by key
    pub fn ordered_children(&self) -> Vec<(&str, &SchemaProperty)> {
        let mut children: Vec<(&str, &SchemaProperty)> = self
            .properties
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        children.sort_by(|a, b| a.1.order.cmp(&b.1.order).then_with(|| a.0.cmp(b.0)));
        children
    }

    /// Child keys in display order
    pub fn ordered_keys(&self) -> Vec<String> {
        self.ordered_children()
            .into_iter()
            .map(|(k, _)| k.to_string())
            .collect()
    }

    /// Number of nodes beneath this one
    pub fn descendant_count(&self) -> usize {
        self.properties
            .values()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }

    // ========================================================================
    // Structural edits
    // ========================================================================

    /// Insert a child at `index` (clamped; `None` appends) and renumber the
    /// siblings. Returns the position the child landed at.
    pub fn insert_child(
        &mut self,
        key: String,
        child: SchemaProperty,
        index: Option<usize>,
    ) -> usize {
        let mut keys = self.ordered_keys();
        keys.retain(|k| k != &key);
        let position = index.unwrap_or(keys.len()).min(keys.len());
        keys.insert(position, key.clone());
        self.properties.insert(key, child);
        self.apply_order(&keys);
        position
    }

    /// Remove a child and renumber the remaining siblings
    pub fn remove_child(&mut self, key: &str) -> Option<SchemaProperty> {
        let removed = self.properties.remove(key)?;
        let keys = self.ordered_keys();
        self.apply_order(&keys);
        Some(removed)
    }

    /// Rewrite sibling `order` values to follow `keys`
    pub fn apply_order<S: AsRef<str>>(&mut self, keys: &[S]) {
        for (index, key) in keys.iter().enumerate() {
            if let Some(child) = self.properties.get_mut(key.as_ref()) {
                child.order = index as u32;
            }
        }
    }
}

// ============================================================================
// FieldPatch
// ============================================================================

/// Partial update for a single node
///
/// Top-level attributes are merged shallowly: every `Some` replaces the
/// current value, every `None` leaves it alone. `component_props` and
/// `reactions` are replaced as whole values, never merged key by key, so no
/// stale nested entries survive an update. Keys, children and `order` are not
/// patchable; structural operations own them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
    pub field_type: Option<FieldType>,
    pub title: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub options: Option<Option<Vec<EnumOption>>>,
    pub default: Option<Option<Value>>,
    pub required: Option<bool>,
    pub component: Option<Option<String>>,
    pub component_props: Option<Option<Map<String, Value>>>,
    pub reactions: Option<Option<ConditionalReaction>>,
}

impl FieldPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(Some(title.into()));
        self
    }

    pub fn clear_title(mut self) -> Self {
        self.title = Some(None);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(Some(description.into()));
        self
    }

    pub fn options(mut self, options: Vec<EnumOption>) -> Self {
        self.options = Some(Some(options));
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(Some(value.into()));
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(Some(component.into()));
        self
    }

    pub fn component_props(mut self, props: Map<String, Value>) -> Self {
        self.component_props = Some(Some(props));
        self
    }

    pub fn reactions(mut self, reaction: ConditionalReaction) -> Self {
        self.reactions = Some(Some(reaction));
        self
    }

    pub fn clear_reactions(mut self) -> Self {
        self.reactions = Some(None);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the patch into a node.
    ///
    /// Fails without touching the node if the patch would turn a container
    /// that still owns children into a leaf type, or would leave options on
    /// a field that cannot have them. Changing a choice field to another type
    /// drops its options.
    pub fn apply(self, path: &FieldPath, target: &mut SchemaProperty) -> BuilderResult<()> {
        let new_type = self.field_type.unwrap_or(target.field_type);
        if !new_type.is_container() && !target.properties.is_empty() {
            return Err(BuilderError::invalid_target(
                path,
                format!(
                    "cannot change a container with {} child field(s) to '{}'",
                    target.properties.len(),
                    new_type
                ),
            ));
        }
        if let Some(Some(options)) = &self.options {
            if !new_type.is_choice() {
                return Err(BuilderError::invalid_target(
                    path,
                    format!("'{new_type}' fields cannot declare options"),
                ));
            }
            let mut seen = std::collections::HashSet::new();
            if let Some(duplicate) = options.iter().find(|o| !seen.insert(o.value.to_string())) {
                return Err(BuilderError::invalid_target(
                    path,
                    format!("option value {} appears more than once", duplicate.value),
                ));
            }
        }

        target.field_type = new_type;
        if !new_type.is_choice() {
            target.options = None;
        }
        if let Some(title) = self.title {
            target.title = title;
        }
        if let Some(description) = self.description {
            target.description = description;
        }
        if let Some(options) = self.options {
            target.options = options;
        }
        if let Some(default) = self.default {
            target.default = default;
        }
        if let Some(required) = self.required {
            target.required = required;
        }
        if let Some(component) = self.component {
            target.component = component;
        }
        if let Some(props) = self.component_props {
            target.component_props = props;
        }
        if let Some(reactions) = self.reactions {
            target.reactions = reactions;
        }
        Ok(())
    }
}

// ============================================================================
// Schema
// ============================================================================

/// The whole form document: an object-type root property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    root: SchemaProperty,
}

impl Schema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self {
            root: SchemaProperty::object(),
        }
    }

    /// Wrap an existing root node
    pub fn from_root(root: SchemaProperty) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &SchemaProperty {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut SchemaProperty {
        &mut self.root
    }

    /// Resolve a path to a node
    pub fn get(&self, path: &FieldPath) -> Option<&SchemaProperty> {
        let mut node = &self.root;
        for key in path.segments() {
            node = node.properties.get(key)?;
        }
        Some(node)
    }

    /// Resolve a path to a mutable node
    pub fn get_mut(&mut self, path: &FieldPath) -> Option<&mut SchemaProperty> {
        let mut node = &mut self.root;
        for key in path.segments() {
            node = node.properties.get_mut(key)?;
        }
        Some(node)
    }

    pub fn contains(&self, path: &FieldPath) -> bool {
        self.get(path).is_some()
    }

    /// Resolve a path or fail with `NotFound`
    pub fn resolve(&self, path: &FieldPath) -> BuilderResult<&SchemaProperty> {
        self.get(path).ok_or_else(|| BuilderError::not_found(path))
    }

    /// Resolve a path that must name a container
    pub fn container_mut(&mut self, path: &FieldPath) -> BuilderResult<&mut SchemaProperty> {
        let node = self
            .get_mut(path)
            .ok_or_else(|| BuilderError::invalid_target(path, "target does not exist"))?;
        if !node.is_container() {
            return Err(BuilderError::invalid_target(
                path,
                format!("'{}' fields cannot contain other fields", node.field_type),
            ));
        }
        Ok(node)
    }

    /// Child keys of a container in display order
    pub fn ordered_keys(&self, parent: &FieldPath) -> BuilderResult<Vec<String>> {
        Ok(self.resolve(parent)?.ordered_keys())
    }

    /// Index of a node among its siblings
    pub fn sibling_index(&self, path: &FieldPath) -> Option<usize> {
        let parent = self.get(&path.parent()?)?;
        let key = path.key()?;
        parent.ordered_keys().iter().position(|k| k == key)
    }

    /// Lazily walk every node beneath `from` in display order
    pub fn ordered_fields(&self, from: &FieldPath) -> BuilderResult<OrderedFields<'_>> {
        let node = self.resolve(from)?;
        Ok(OrderedFields::new(from.clone(), node))
    }

    /// Number of nodes, excluding the root
    pub fn field_count(&self) -> usize {
        self.root.descendant_count()
    }

    /// Label of a node (title or key); the root has no key
    pub fn label_of(&self, path: &FieldPath) -> Option<String> {
        let node = self.get(path)?;
        Some(node.label(path.key().unwrap_or_default()).to_string())
    }

    /// Every node carrying a reaction, in display order
    pub fn reactions(&self) -> impl Iterator<Item = (FieldPath, &ConditionalReaction)> + '_ {
        OrderedFields::new(FieldPath::root(), &self.root)
            .filter_map(|(path, node)| node.reactions.as_ref().map(|r| (path, r)))
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
