//! Categories and their derived link counts

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entry::{CategoryRef, Entry, EntryStatus};

/// A named grouping of entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Unique URL slug
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub featured: bool,
    /// Default display position
    #[serde(default)]
    pub order_index: i32,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Cached count of approved entries; may be stale
    #[serde(default)]
    pub link_count: Option<u64>,
}

fn default_color() -> String {
    "blue".to_string()
}

impl Category {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            slug: slug.into(),
            description: None,
            icon: None,
            color: default_color(),
            featured: false,
            order_index: 0,
            created_at: Utc::now(),
            link_count: None,
        }
    }

    #[must_use]
    pub const fn with_order_index(mut self, order_index: i32) -> Self {
        self.order_index = order_index;
        self
    }

    /// The reference joined onto entries of this category
    #[must_use]
    pub fn to_ref(&self) -> CategoryRef {
        CategoryRef {
            id: self.id.clone(),
            name: self.name.clone(),
            slug: self.slug.clone(),
            color: Some(self.color.clone()),
        }
    }

    /// Sort categories into their default display order
    ///
    /// Ties on `order_index` fall back to the name so the order is total.
    pub fn sort_for_display(categories: &mut [Self]) {
        categories.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then_with(|| a.name.cmp(&b.name))
        });
    }

    /// Recompute `link_count` for each category from approved entries
    #[must_use]
    pub fn with_link_counts(mut categories: Vec<Self>, entries: &[Entry]) -> Vec<Self> {
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for entry in entries.iter().filter(|e| e.status == EntryStatus::Approved) {
            if let Some(id) = entry.category_id() {
                *counts.entry(id).or_default() += 1;
            }
        }

        for category in &mut categories {
            category.link_count = Some(counts.get(category.id.as_str()).copied().unwrap_or(0));
        }
        categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_for_display() {
        let mut categories = vec![
            Category::new("c", "Design", "design").with_order_index(2),
            Category::new("a", "AI", "ai").with_order_index(1),
            Category::new("b", "APIs", "apis").with_order_index(1),
        ];
        Category::sort_for_display(&mut categories);
        let slugs: Vec<_> = categories.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["ai", "apis", "design"]);
    }

    #[test]
    fn test_link_counts_only_count_approved() {
        let dev = Category::new("c1", "Dev", "dev");
        let entries = vec![
            Entry::new("1", "a", "https://a.dev")
                .with_category(dev.to_ref())
                .with_status(EntryStatus::Approved),
            Entry::new("2", "b", "https://b.dev")
                .with_category(dev.to_ref())
                .with_status(EntryStatus::Pending),
        ];
        let categories = Category::with_link_counts(
            vec![dev.clone(), Category::new("c2", "Empty", "empty")],
            &entries,
        );
        assert_eq!(categories[0].link_count, Some(1));
        assert_eq!(categories[1].link_count, Some(0));
    }
}
