//! Document model for the task-list editor.
//!
//! # Responsibility
//! - Define node variants, their nesting legality and cursor addressing.
//! - Stay free of editing behavior; commands live in `commands`.
//!
//! # Invariants
//! - Every committed document passes `schema::check_document`.
//! - Every task list holds at least one task item.

pub mod node;
pub mod schema;
pub mod selection;
