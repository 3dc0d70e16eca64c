//! Undo/redo history
//!
//! Two bounded stacks of schema snapshots. `past` holds the state before each
//! committed mutation, `future` the states undone since. A new mutation
//! clears `future`.

use chrono::{DateTime, Utc};
use formforge_schema::Schema;
use uuid::Uuid;

/// Snapshot of the schema taken around a mutation
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub id: Uuid,
    /// Description of the action
    pub label: String,
    pub recorded_at: DateTime<Utc>,
    pub schema: Schema,
}

impl HistoryEntry {
    pub fn new(label: impl Into<String>, schema: Schema) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            recorded_at: Utc::now(),
            schema,
        }
    }
}

#[derive(Debug, Clone)]
pub struct History {
    past: Vec<HistoryEntry>,
    future: Vec<HistoryEntry>,
    max_size: usize,
}

impl Default for History {
    fn default() -> Self {
        Self {
            past: Vec::new(),
            future: Vec::new(),
            max_size: crate::config::DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create history with custom max size (at least one step)
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            max_size: max_size.max(1),
            ..Default::default()
        }
    }

    /// Record the state before a mutation (clears the redo stack)
    pub fn push(&mut self, entry: HistoryEntry) {
        self.past.push(entry);
        self.future.clear();

        if self.past.len() > self.max_size {
            let overflow = self.past.len() - self.max_size;
            self.past.drain(..overflow);
        }
    }

    /// Step back: returns the previous state and keeps `current` for redo
    pub fn undo(&mut self, current: Schema) -> Option<HistoryEntry> {
        let previous = self.past.pop()?;
        self.future.push(HistoryEntry::new(previous.label.clone(), current));
        Some(previous)
    }

    /// Step forward: returns the next state and keeps `current` for undo
    pub fn redo(&mut self, current: Schema) -> Option<HistoryEntry> {
        let next = self.future.pop()?;
        self.past.push(HistoryEntry::new(next.label.clone(), current));
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    pub fn undo_count(&self) -> usize {
        self.past.len()
    }

    pub fn redo_count(&self) -> usize {
        self.future.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Labels of the undoable actions, oldest first
    pub fn undo_labels(&self) -> Vec<&str> {
        self.past.iter().map(|e| e.label.as_str()).collect()
    }

    /// Label of the action the next undo reverts
    pub fn next_undo_label(&self) -> Option<&str> {
        self.past.last().map(|e| e.label.as_str())
    }

    /// Label of the action the next redo reapplies
    pub fn next_redo_label(&self) -> Option<&str> {
        self.future.last().map(|e| e.label.as_str())
    }
}
