//! # FormForge Core
//!
//! Core types and error handling for FormForge.
//!
//! This crate provides the foundational building blocks used throughout
//! the form builder, including:
//!
//! - **Types**: field kinds, enumerated options, pointer positions
//! - **Errors**: unified error handling with `BuilderError` and `BuilderResult`
//!

pub mod error;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{BuilderError, BuilderResult};
pub use types::{EnumOption, FieldType, Position};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
