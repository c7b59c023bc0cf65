//! Milestone progress engine.
//!
//! # Responsibility
//! - Convert a milestone snapshot into a single progress percentage.
//! - Classify individual milestones for badges and timelines.
//!
//! # Invariants
//! - Every function here is pure: no I/O, no clock reads, no shared state.
//!   Callers pass the evaluation instant explicitly.
//! - Inputs are borrowed read-only and never retained.

pub mod calculator;
pub mod calendar;
pub mod status;
