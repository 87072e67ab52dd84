//! Filter and sort specification for entry listings
//!
//! `SearchFilters` is a value object: the store owns the current one and the
//! pipeline reads it. Category and tag selections are sets; an empty set means
//! "no filtering" on that dimension.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Ordering applied after filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Creation time, most recent first
    #[default]
    Newest,
    /// Click count, highest first
    Popular,
    /// Rating, highest first
    Rating,
    /// Title, A to Z
    Alphabetical,
}

impl SortBy {
    pub const ALL: [Self; 4] = [Self::Newest, Self::Popular, Self::Rating, Self::Alphabetical];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Popular => "popular",
            Self::Rating => "rating",
            Self::Alphabetical => "alphabetical",
        }
    }

    /// Parse a sort key, falling back to `Newest` for anything unrecognised
    #[must_use]
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_else(|()| {
            log::debug!("unknown sort key '{value}', using newest");
            Self::Newest
        })
    }
}

impl FromStr for SortBy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(Self::Newest),
            "popular" => Ok(Self::Popular),
            "rating" => Ok(Self::Rating),
            "alphabetical" => Ok(Self::Alphabetical),
            _ => Err(()),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SortBy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map_or(Self::Newest, Self::parse_lenient))
    }
}

/// Current search and filter selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    /// Free-text query
    #[serde(default)]
    pub query: String,
    /// Selected category identifiers
    #[serde(default)]
    pub categories: BTreeSet<String>,
    /// Selected tags, matched with OR semantics
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Only featured entries
    #[serde(default)]
    pub featured: bool,
    /// Only verified entries
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub sort_by: SortBy,
}

impl SearchFilters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Query with surrounding whitespace removed
    #[must_use]
    pub fn trimmed_query(&self) -> &str {
        self.query.trim()
    }

    /// True when nothing but the sort order is specified
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        self.trimmed_query().is_empty()
            && self.categories.is_empty()
            && self.tags.is_empty()
            && !self.featured
            && !self.verified
    }

    /// Shallow-merge `patch` into `self`; unspecified fields are kept
    pub fn merge(&mut self, patch: SearchFiltersPatch) {
        if let Some(query) = patch.query {
            self.query = query;
        }
        if let Some(categories) = patch.categories {
            self.categories = categories;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(featured) = patch.featured {
            self.featured = featured;
        }
        if let Some(verified) = patch.verified {
            self.verified = verified;
        }
        if let Some(sort_by) = patch.sort_by {
            self.sort_by = sort_by;
        }
    }

    /// Add `tag` if absent, remove it if present
    pub fn toggle_tag(&mut self, tag: &str) {
        if !self.tags.remove(tag) {
            self.tags.insert(tag.to_string());
        }
    }
}

/// Partial update of [`SearchFilters`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchFiltersPatch {
    pub query: Option<String>,
    pub categories: Option<BTreeSet<String>>,
    pub tags: Option<BTreeSet<String>>,
    pub featured: Option<bool>,
    pub verified: Option<bool>,
    pub sort_by: Option<SortBy>,
}

impl SearchFiltersPatch {
    #[must_use]
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn categories<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: Some(categories.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: Some(tags.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn sort_by(sort_by: SortBy) -> Self {
        Self {
            sort_by: Some(sort_by),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unfiltered() {
        let filters = SearchFilters::default();
        assert!(filters.is_unfiltered());
        assert_eq!(filters.sort_by, SortBy::Newest);
    }

    #[test]
    fn test_whitespace_query_is_unfiltered() {
        let filters = SearchFilters {
            query: "   ".to_string(),
            ..SearchFilters::default()
        };
        assert!(filters.is_unfiltered());
    }

    #[test]
    fn test_merge_is_shallow() {
        let mut filters = SearchFilters {
            query: "db".to_string(),
            featured: true,
            ..SearchFilters::default()
        };
        filters.merge(SearchFiltersPatch::tags(["sql"]));

        assert_eq!(filters.query, "db");
        assert!(filters.featured);
        assert!(filters.tags.contains("sql"));
    }

    #[test]
    fn test_sort_by_lenient_parse() {
        assert_eq!(SortBy::parse_lenient("popular"), SortBy::Popular);
        assert_eq!(SortBy::parse_lenient(" Alphabetical "), SortBy::Alphabetical);
        assert_eq!(SortBy::parse_lenient("trending"), SortBy::Newest);
        assert_eq!(SortBy::parse_lenient(""), SortBy::Newest);
        assert_eq!(SortBy::parse_lenient("clicks"), SortBy::Newest);
        assert_eq!(SortBy::parse_lenient("title"), SortBy::Newest);
        assert!("alpha".parse::<SortBy>().is_err());
    }

    #[test]
    fn test_sort_by_deserialize_falls_back() {
        let filters: SearchFilters =
            serde_json::from_str(r#"{"query": "", "sortBy": "bogus"}"#).unwrap();
        assert_eq!(filters.sort_by, SortBy::Newest);

        let filters: SearchFilters = serde_json::from_str(r#"{"sortBy": "rating"}"#).unwrap();
        assert_eq!(filters.sort_by, SortBy::Rating);
    }

    #[test]
    fn test_toggle_tag() {
        let mut filters = SearchFilters::default();
        filters.toggle_tag("ai");
        assert!(filters.tags.contains("ai"));
        filters.toggle_tag("ai");
        assert!(filters.tags.is_empty());
    }
}
