//! Roster domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by roster business logic.
//! - Keep wire shape (serde) next to the types so every caller serializes
//!   assignments the same way.
//!
//! # Invariants
//! - Every persisted object is identified by its SQLite row id.
//! - A role belongs to exactly one task for its whole lifetime.

pub mod artifact;
pub mod assignment;
pub mod period;
pub mod roster;
