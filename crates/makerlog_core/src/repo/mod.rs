//! Repository layer for project storage.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes enforce record `validate()` before persistence.
//! - Semantic errors (`ProjectNotFound`, `MilestoneNotFound`, `PostNotFound`) are reported
//!   separately from transport errors.

pub mod post_repo;
pub mod project_repo;
