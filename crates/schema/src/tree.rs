//! Tree utilities shared by the store, the compiler and import
//!
//! Ordered traversal, sibling-unique key allocation, order normalisation and
//! sibling reordering.

use crate::path::FieldPath;
use crate::property::{Schema, SchemaProperty};
use formforge_core::{BuilderError, BuilderResult};
use std::collections::BTreeMap;
use std::iter::FusedIterator;

// ============================================================================
// Ordered traversal
// ============================================================================

/// Depth-first, display-ordered walk over the nodes beneath a starting node
///
/// The walk is lazy and finite. Clone it (or ask the schema for a new one) to
/// start over.
#[derive(Debug, Clone)]
pub struct OrderedFields<'a> {
    stack: Vec<(FieldPath, &'a SchemaProperty)>,
}

impl<'a> OrderedFields<'a> {
    pub(crate) fn new(base: FieldPath, node: &'a SchemaProperty) -> Self {
        let mut walk = Self { stack: Vec::new() };
        walk.push_children(&base, node);
        walk
    }

    fn push_children(&mut self, base: &FieldPath, node: &'a SchemaProperty) {
        for (key, child) in node.ordered_children().into_iter().rev() {
            self.stack.push((base.child(key), child));
        }
    }
}

impl<'a> Iterator for OrderedFields<'a> {
    type Item = (FieldPath, &'a SchemaProperty);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, node) = self.stack.pop()?;
        self.push_children(&path, node);
        Some((path, node))
    }
}

impl FusedIterator for OrderedFields<'_> {}

// ============================================================================
// Keys
// ============================================================================

/// Pick a key unique among `siblings`: `base` if free, else `base{sep}1`,
/// `base{sep}2`, ...
pub fn allocate_key(
    siblings: &BTreeMap<String, SchemaProperty>,
    base: &str,
    separator: &str,
) -> String {
    if !siblings.contains_key(base) {
        return base.to_string();
    }
    let mut counter = 1usize;
    loop {
        let candidate = format!("{base}{separator}{counter}");
        if !siblings.contains_key(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

// ============================================================================
// Structural helpers on Schema
// ============================================================================

impl Schema {
    /// Rewrite the order of `parent`'s children to follow `ordered_keys`.
    ///
    /// `ordered_keys` must be a permutation of the current child keys;
    /// anything else is rejected with `OrderMismatch` and nothing changes.
    /// A `parent` that is missing or cannot hold children is `InvalidTarget`.
    pub fn reorder<S: AsRef<str>>(
        &mut self,
        parent: &FieldPath,
        ordered_keys: &[S],
    ) -> BuilderResult<()> {
        let node = self.container_mut(parent)?;
        let current = node.ordered_keys();
        let given: Vec<String> = ordered_keys.iter().map(|k| k.as_ref().to_string()).collect();

        let mut expected_set = current.clone();
        expected_set.sort();
        let mut given_set = given.clone();
        given_set.sort();
        if expected_set != given_set {
            return Err(BuilderError::OrderMismatch {
                parent: parent.to_string(),
                expected: current,
                given,
            });
        }

        node.apply_order(&given);
        Ok(())
    }

    /// Visit every node (root first, then depth-first in display order)
    /// with mutable access
    pub fn visit_mut<F>(&mut self, mut visitor: F)
    where
        F: FnMut(&FieldPath, &mut SchemaProperty),
    {
        fn walk<F>(path: &FieldPath, node: &mut SchemaProperty, visitor: &mut F)
        where
            F: FnMut(&FieldPath, &mut SchemaProperty),
        {
            visitor(path, node);
            let keys = node.ordered_keys();
            for key in keys {
                if let Some(child) = node.properties.get_mut(&key) {
                    walk(&path.child(key), child, visitor);
                }
            }
        }
        walk(&FieldPath::root(), self.root_mut(), &mut visitor);
    }

    /// Renumber every sibling group to `0..n`, keeping relative order
    pub fn normalize_order(&mut self) {
        self.visit_mut(|_, node| {
            let keys = node.ordered_keys();
            node.apply_order(&keys);
        });
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use formforge_core::FieldType;
    use pretty_assertions::assert_eq;

    fn nested() -> Schema {
        Schema::from_root(
            SchemaProperty::object()
                .with_child("first", SchemaProperty::new(FieldType::String))
                .with_child(
                    "group",
                    SchemaProperty::object()
                        .with_child("inner_a", SchemaProperty::new(FieldType::String))
                        .with_child("inner_b", SchemaProperty::new(FieldType::Number)),
                )
                .with_child("last", SchemaProperty::new(FieldType::Boolean)),
        )
    }

    fn dotted(walk: OrderedFields<'_>) -> Vec<String> {
        walk.map(|(path, _)| path.to_dotted()).collect()
    }

    #[test]
    fn test_ordered_fields_depth_first() {
        let schema = nested();
        let walk = schema.ordered_fields(&FieldPath::root()).unwrap();
        assert_eq!(
            dotted(walk),
            vec!["first", "group", "group.inner_a", "group.inner_b", "last"]
        );
    }

    #[test]
    fn test_ordered_fields_is_restartable() {
        let schema = nested();
        let walk = schema.ordered_fields(&FieldPath::parse("group").unwrap()).unwrap();
        let again = walk.clone();
        assert_eq!(dotted(walk), vec!["group.inner_a", "group.inner_b"]);
        assert_eq!(dotted(again), vec!["group.inner_a", "group.inner_b"]);
    }

    #[test]
    fn test_ordered_fields_follows_order_not_key() {
        let mut schema = nested();
        schema
            .reorder(&FieldPath::root(), &["last", "group", "first"])
            .unwrap();
        let top: Vec<String> = schema
            .ordered_fields(&FieldPath::root())
            .unwrap()
            .filter(|(path, _)| path.depth() == 1)
            .map(|(path, _)| path.to_dotted())
            .collect();
        assert_eq!(top, vec!["last", "group", "first"]);
    }

    #[test]
    fn test_reorder_rejects_partial_and_duplicates() {
        let mut schema = nested();
        let before = schema.clone();

        let err = schema.reorder(&FieldPath::root(), &["first", "group"]).unwrap_err();
        assert!(matches!(err, BuilderError::OrderMismatch { .. }));

        let err = schema
            .reorder(&FieldPath::root(), &["first", "first", "group"])
            .unwrap_err();
        assert!(matches!(err, BuilderError::OrderMismatch { .. }));

        let err = schema
            .reorder(&FieldPath::root(), &["first", "group", "unknown"])
            .unwrap_err();
        assert!(matches!(err, BuilderError::OrderMismatch { .. }));

        assert_eq!(schema, before);
    }

    #[test]
    fn test_reorder_needs_a_container() {
        let mut schema = nested();
        let before = schema.clone();
        let leaf = FieldPath::parse("first").unwrap();

        let err = schema.reorder::<&str>(&leaf, &[]).unwrap_err();
        assert!(matches!(err, BuilderError::InvalidTarget { .. }));
        let err = schema
            .reorder(&FieldPath::parse("ghost").unwrap(), &["a"])
            .unwrap_err();
        assert!(matches!(err, BuilderError::InvalidTarget { .. }));

        assert_eq!(schema, before);
    }

    #[test]
    fn test_allocate_key() {
        let mut siblings = BTreeMap::new();
        assert_eq!(allocate_key(&siblings, "text", "_"), "text");
        siblings.insert("text".to_string(), SchemaProperty::new(FieldType::String));
        assert_eq!(allocate_key(&siblings, "text", "_"), "text_1");
        siblings.insert("text_1".to_string(), SchemaProperty::new(FieldType::String));
        assert_eq!(allocate_key(&siblings, "text", "_"), "text_2");
    }

    #[test]
    fn test_normalize_order() {
        let mut root = SchemaProperty::object();
        let mut a = SchemaProperty::new(FieldType::String);
        a.order = 7;
        let mut b = SchemaProperty::new(FieldType::String);
        b.order = 3;
        root.properties.insert("a".into(), a);
        root.properties.insert("b".into(), b);
        let mut schema = Schema::from_root(root);

        schema.normalize_order();
        assert_eq!(schema.root().properties["b"].order, 0);
        assert_eq!(schema.root().properties["a"].order, 1);
    }
}
