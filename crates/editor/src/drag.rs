//! Drag-and-drop controller
//!
//! A four-state machine fed by an input layer through `on_gesture_start`,
//! `on_gesture_move`, `on_gesture_end` and `on_gesture_cancel`. It keeps only
//! transient state (the phase, the candidate target and the overlay) and
//! changes the document exclusively through [`SchemaStore`] calls made on
//! release. Cancelling never touches the store.
//!
//! ```text
//!   Idle --start--> Pending --move past threshold--> DraggingNew / DraggingExisting
//!     ^                |                                        |
//!     +--- end/cancel -+------------------ end/cancel ----------+
//! ```

use crate::store::SchemaStore;
use formforge_core::{BuilderError, BuilderResult, Position};
use formforge_schema::FieldPath;

// ============================================================================
// Types
// ============================================================================

/// What the gesture picked up
#[derive(Debug, Clone, PartialEq)]
pub enum DragSource {
    /// A palette item, by blueprint key
    Blueprint(String),
    /// A field already on the canvas
    Field(FieldPath),
}

/// What the pointer is over
#[derive(Debug, Clone, PartialEq)]
pub enum DropTarget {
    /// Empty canvas area (the root container)
    CanvasRoot,
    /// An existing field acting as an anchor
    Field(FieldPath),
    /// An insertion slot: final position `index` among `parent`'s children
    Slot { parent: FieldPath, index: usize },
    /// Back over the palette
    Palette,
    /// Outside any target
    Nowhere,
}

/// Controller state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    /// Pressed, not yet moved past the threshold
    Pending { source: DragSource, origin: Position },
    DraggingNew { blueprint: String, origin: Position },
    DraggingExisting { path: FieldPath, origin: Position },
}

/// Floating preview of the dragged item
#[derive(Debug, Clone, PartialEq)]
pub struct DragOverlay {
    pub source: DragSource,
    pub position: Position,
}

/// Why a release changed nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// No gesture was in progress
    NotDragging,
    /// Released over the palette or outside any target
    NoTarget,
    /// A palette item was pressed and released without moving
    Click,
    /// The field would land where it already is
    SameIndex,
    /// Moving between containers is not supported
    CrossContainer,
}

/// Result of a release
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// A new field was created
    Added(FieldPath),
    /// A field moved among its siblings
    Moved {
        parent: FieldPath,
        from: usize,
        to: usize,
    },
    /// A press on a field without dragging selected it
    Selected(FieldPath),
    Discarded(DiscardReason),
}

// ============================================================================
// DragController
// ============================================================================

#[derive(Debug, Clone)]
pub struct DragController {
    phase: DragPhase,
    threshold: f32,
    pointer: Position,
    candidate: Option<DropTarget>,
}

impl DragController {
    /// Create a controller; `threshold` is the pointer travel that turns a
    /// press into a drag
    pub fn new(threshold: f32) -> Self {
        Self {
            phase: DragPhase::Idle,
            threshold: threshold.max(0.0),
            pointer: Position::zero(),
            candidate: None,
        }
    }

    /// Create a controller using the store's configured threshold
    pub fn for_store(store: &SchemaStore) -> Self {
        Self::new(store.config().drag_threshold)
    }

    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == DragPhase::Idle
    }

    pub fn is_dragging(&self) -> bool {
        matches!(
            self.phase,
            DragPhase::DraggingNew { .. } | DragPhase::DraggingExisting { .. }
        )
    }

    /// Target the pointer was last reported over
    pub fn candidate(&self) -> Option<&DropTarget> {
        self.candidate.as_ref()
    }

    /// Preview to draw while dragging
    pub fn overlay(&self) -> Option<DragOverlay> {
        let source = match &self.phase {
            DragPhase::DraggingNew { blueprint, .. } => DragSource::Blueprint(blueprint.clone()),
            DragPhase::DraggingExisting { path, .. } => DragSource::Field(path.clone()),
            DragPhase::Idle | DragPhase::Pending { .. } => return None,
        };
        Some(DragOverlay {
            source,
            position: self.pointer,
        })
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Press on a palette item or a field. Ignored (returns `false`) unless
    /// the controller is idle.
    pub fn on_gesture_start(&mut self, source: DragSource, at: Position) -> bool {
        if !self.is_idle() {
            tracing::trace!("Ignoring gesture start while {:?}", self.phase);
            return false;
        }
        tracing::trace!("Gesture started on {:?}", source);
        self.pointer = at;
        self.candidate = None;
        self.phase = DragPhase::Pending { source, origin: at };
        true
    }

    /// Pointer motion over `target`
    pub fn on_gesture_move(&mut self, at: Position, target: DropTarget) {
        if self.is_idle() {
            return;
        }
        self.pointer = at;
        self.candidate = Some(target);
        self.promote_if_past_threshold();
    }

    /// Release over `target`. The controller is idle again afterwards,
    /// whatever the outcome.
    pub fn on_gesture_end(
        &mut self,
        store: &mut SchemaStore,
        at: Position,
        target: DropTarget,
    ) -> BuilderResult<DropOutcome> {
        self.pointer = at;
        self.promote_if_past_threshold();
        let phase = std::mem::take(&mut self.phase);
        self.candidate = None;

        let outcome = match phase {
            DragPhase::Idle => Ok(DropOutcome::Discarded(DiscardReason::NotDragging)),
            DragPhase::Pending {
                source: DragSource::Field(path),
                ..
            } => store
                .select_field(Some(path.clone()))
                .map(|()| DropOutcome::Selected(path)),
            DragPhase::Pending {
                source: DragSource::Blueprint(_),
                ..
            } => Ok(DropOutcome::Discarded(DiscardReason::Click)),
            DragPhase::DraggingNew { blueprint, .. } => drop_new(store, &blueprint, target),
            DragPhase::DraggingExisting { path, .. } => drop_existing(store, &path, target),
        };

        match &outcome {
            Ok(result) => tracing::debug!("Gesture ended: {:?}", result),
            Err(e) => tracing::debug!("Gesture rejected by store: {}", e),
        }
        outcome
    }

    /// Abort the gesture; the store is never touched
    pub fn on_gesture_cancel(&mut self) {
        if !self.is_idle() {
            tracing::trace!("Gesture cancelled");
        }
        self.phase = DragPhase::Idle;
        self.candidate = None;
    }

    fn promote_if_past_threshold(&mut self) {
        let DragPhase::Pending { source, origin } = &self.phase else {
            return;
        };
        if origin.distance_to(&self.pointer) < self.threshold {
            return;
        }
        let origin = *origin;
        self.phase = match source.clone() {
            DragSource::Blueprint(blueprint) => DragPhase::DraggingNew { blueprint, origin },
            DragSource::Field(path) => DragPhase::DraggingExisting { path, origin },
        };
        tracing::trace!("Drag started: {:?}", self.phase);
    }
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_DRAG_THRESHOLD)
    }
}

// ============================================================================
// Drop resolution
// ============================================================================

fn drop_new(
    store: &mut SchemaStore,
    blueprint: &str,
    target: DropTarget,
) -> BuilderResult<DropOutcome> {
    let (parent, index) = match target {
        DropTarget::CanvasRoot => (FieldPath::root(), None),
        DropTarget::Slot { parent, index } => (parent, Some(index)),
        DropTarget::Field(anchor) => {
            let node = store.schema().resolve(&anchor)?;
            if node.is_container() {
                (anchor, None)
            } else {
                let index = store
                    .schema()
                    .sibling_index(&anchor)
                    .ok_or_else(|| BuilderError::not_found(&anchor))?;
                (anchor.parent().unwrap_or_default(), Some(index))
            }
        }
        DropTarget::Palette | DropTarget::Nowhere => {
            return Ok(DropOutcome::Discarded(DiscardReason::NoTarget));
        }
    };
    store
        .add_field(blueprint, Some(&parent), index)
        .map(DropOutcome::Added)
}

fn drop_existing(
    store: &mut SchemaStore,
    path: &FieldPath,
    target: DropTarget,
) -> BuilderResult<DropOutcome> {
    let parent = path
        .parent()
        .ok_or_else(|| BuilderError::invalid_target(path, "the root cannot be moved"))?;
    let mut keys = store.schema().ordered_keys(&parent)?;
    let key = path.key().unwrap_or_default();
    let from = keys
        .iter()
        .position(|k| k == key)
        .ok_or_else(|| BuilderError::not_found(path))?;
    let last = keys.len() - 1;

    let to = match target {
        DropTarget::Palette | DropTarget::Nowhere => {
            return Ok(DropOutcome::Discarded(DiscardReason::NoTarget));
        }
        DropTarget::CanvasRoot if parent.is_root() => last,
        DropTarget::CanvasRoot => return Ok(DropOutcome::Discarded(DiscardReason::CrossContainer)),
        DropTarget::Slot {
            parent: slot_parent,
            index,
        } => {
            if slot_parent != parent {
                return Ok(DropOutcome::Discarded(DiscardReason::CrossContainer));
            }
            index.min(last)
        }
        DropTarget::Field(anchor) => {
            if anchor.parent().as_ref() != Some(&parent) {
                return Ok(DropOutcome::Discarded(DiscardReason::CrossContainer));
            }
            let anchor_key = anchor.key().unwrap_or_default();
            keys.iter()
                .position(|k| k == anchor_key)
                .ok_or_else(|| BuilderError::not_found(&anchor))?
        }
    };

    if from == to {
        return Ok(DropOutcome::Discarded(DiscardReason::SameIndex));
    }
    let moved = keys.remove(from);
    keys.insert(to, moved);
    store.reorder_fields(&parent, &keys)?;
    Ok(DropOutcome::Moved { parent, from, to })
}

// ============================================================================
// Tests
// ============================================================================
