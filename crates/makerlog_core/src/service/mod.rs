//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into project/milestone use-cases.
//! - Keep the cached project progress in step with milestone mutations.
//! - Publish progress posts and accept comments on public ones.

pub mod clock;
pub mod milestone_service;
pub mod post_service;
