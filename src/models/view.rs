//! Layout preferences for entry listings

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// How entries are arranged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode, Default)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Grid,
    List,
    /// Also accepted as `masonry`
    #[serde(alias = "masonry")]
    Compact,
}

/// Spacing between entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode, Default)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    #[default]
    Comfortable,
    Compact,
}

impl Layout {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::List => "list",
            Self::Compact => "compact",
        }
    }
}

impl Density {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Comfortable => "comfortable",
            Self::Compact => "compact",
        }
    }
}

/// Persisted view preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode, Default)]
pub struct ViewMode {
    #[serde(rename = "type")]
    pub layout: Layout,
    pub density: Density,
}

/// Partial update of a [`ViewMode`]; `None` keeps the current value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewModePatch {
    pub layout: Option<Layout>,
    pub density: Option<Density>,
}

impl ViewMode {
    /// Shallow-merge `patch` into a copy of `self`
    #[must_use]
    pub fn merged(self, patch: ViewModePatch) -> Self {
        Self {
            layout: patch.layout.unwrap_or(self.layout),
            density: patch.density.unwrap_or(self.density),
        }
    }
}
