//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the roster operations: batch plan,
//!   manual override, availability grouping and export caching.
//! - Own transaction boundaries; repositories only borrow the connection.
//!
//! # Invariants
//! - Every service borrows one caller-provided connection for its lifetime.
//! - Plan mutations and the matching artifact invalidation commit together.

pub mod artifact_cache;
pub mod assignment_service;
pub mod plan_service;
pub mod resolver;
