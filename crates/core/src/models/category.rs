use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user-visible grouping for holdings.
///
/// Default categories are seeded once at first run and can never be
/// deleted. Custom categories may be renamed, recolored, or deleted —
/// deletion reassigns affected holdings to a fallback default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier
    pub id: Uuid,

    pub name: String,

    /// Hex RGB color for charts (e.g., "#F7931A")
    pub color: String,

    /// True for seeded system categories, false for user-created ones
    pub is_default: bool,
}

impl Category {
    pub fn new(name: impl Into<String>, color: impl Into<String>, is_default: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color: color.into(),
            is_default,
        }
    }
}

/// The fixed seed list of default categories, created at first run.
pub const DEFAULT_CATEGORIES: [(&str, &str); 8] = [
    ("Crypto", "#F7931A"),
    ("Stock", "#4CAF50"),
    ("ETF", "#2196F3"),
    ("Bond", "#9C27B0"),
    ("Cash", "#607D8B"),
    ("Real Estate", "#795548"),
    ("Commodities", "#FFD700"),
    ("Options", "#E91E63"),
];
