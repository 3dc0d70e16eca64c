//! # FormForge Editor
//!
//! Editing state on top of the schema document:
//!
//! - **SchemaStore**: undoable CRUD, selection and change subscriptions
//! - **History**: bounded past/future snapshot stacks
//! - **DragController**: palette and canvas gesture state machine
//! - **Rules**: the contract a rule panel talks to
//! - **EditorConfig**: TOML-loadable tunables

pub mod config;
pub mod drag;
pub mod history;
pub mod rules;
pub mod store;

pub use config::EditorConfig;
pub use drag::{DiscardReason, DragController, DragOverlay, DragPhase, DragSource, DropOutcome, DropTarget};
pub use history::{History, HistoryEntry};
pub use rules::{DanglingRule, ParentCandidate, RuleOutcome};
pub use store::{SchemaStore, StoreEvent, SubscriptionId};
