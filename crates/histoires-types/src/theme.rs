//! Theme catalog types

use serde::{Deserialize, Serialize};

/// A selectable story theme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    /// Key sent back when generating a story
    pub value: String,
    pub label: String,
    pub description: String,
    /// Optional preview video URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
}

/// A group of themes shown together in the creation form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeCategory {
    pub id: i32,
    pub name: String,
    pub icon: String,
    pub themes: Vec<Theme>,
}
