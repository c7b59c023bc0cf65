//! Milestone icon lookup.

use crate::catalog::templates::find_template;
use crate::model::milestone::Milestone;

/// Icon shown when nothing more specific applies.
pub const FALLBACK_ICON: &str = "Target";

/// Icon names authors may pick for custom milestones.
pub const ICON_NAMES: &[&str] = &[
    "ClipboardList",
    "Brush",
    "Rocket",
    "Settings",
    "CheckCircle",
    "Search",
    "MessageCircle",
    "Eye",
    "Flag",
    "BarChart2",
    "Target",
];

pub fn is_known_icon(name: &str) -> bool {
    ICON_NAMES.contains(&name)
}

/// Resolves the icon for a milestone.
///
/// Template milestones use their template icon; custom milestones use their
/// own icon when it is a known name; everything else gets `FALLBACK_ICON`.
pub fn resolve_icon(milestone: &Milestone) -> &'static str {
    if let Some(template) = milestone.template_id.as_deref().and_then(find_template) {
        return template.icon;
    }

    milestone
        .icon
        .as_deref()
        .and_then(|name| ICON_NAMES.iter().copied().find(|known| *known == name))
        .unwrap_or(FALLBACK_ICON)
}
