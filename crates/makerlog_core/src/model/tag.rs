//! Tag model and slug normalization.
//!
//! # Invariants
//! - Slugs contain only `[a-z0-9-]` with no leading or trailing `-`.
//! - Tag color is derived from the slug, so the same tag always renders
//!   the same way.

use crate::model::milestone::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static NON_SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

const TAG_COLORS: &[&str] = &[
    "#ef4444", "#f97316", "#f59e0b", "#eab308", "#84cc16", "#22c55e", "#10b981", "#14b8a6",
    "#06b6d4", "#0ea5e9", "#3b82f6", "#6366f1", "#8b5cf6", "#a855f7", "#d946ef", "#ec4899",
    "#f43f5e",
];

/// Persisted tag row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    /// Display name as first entered (trimmed).
    pub name: String,
    pub slug: String,
    pub color: Option<String>,
}

/// Normalizes a tag display name into its URL slug.
///
/// # Errors
/// - `ValidationError::EmptyTag` when nothing alphanumeric remains.
pub fn slugify_tag(name: &str) -> Result<String, ValidationError> {
    let lowered = name.trim().to_lowercase();
    let slug = NON_SLUG_RE
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string();
    if slug.is_empty() {
        return Err(ValidationError::EmptyTag(name.to_string()));
    }
    Ok(slug)
}

/// Picks a palette color for a slug.
pub fn tag_color(slug: &str) -> &'static str {
    let index = slug
        .bytes()
        .fold(0usize, |acc, byte| acc.wrapping_mul(31).wrapping_add(usize::from(byte)));
    TAG_COLORS[index % TAG_COLORS.len()]
}
