//! Canonical domain records for maker projects.
//!
//! # Responsibility
//! - Define the single milestone shape consumed by the progress engine.
//! - Define project, tag, post and comment records persisted by the
//!   repository layer.
//!
//! # Invariants
//! - Every project and milestone is identified by a stable, non-nil `Uuid`.
//! - Optional milestone fields are explicit `Option`s, never "maybe present".

pub mod milestone;
pub mod post;
pub mod project;
pub mod tag;
