//! Flutter-facing bindings for the task-list editor core.

pub mod api;
