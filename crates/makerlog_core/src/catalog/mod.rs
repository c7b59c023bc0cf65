//! Static milestone catalogue.
//!
//! # Responsibility
//! - Ship the built-in milestone templates offered when creating a project.
//! - Map milestones to display icons.
//!
//! # Invariants
//! - Catalogue data is compiled in and read-only.

pub mod icons;
pub mod templates;
