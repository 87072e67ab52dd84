//! Catalog entries and their lifecycle status

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::ModelError;

/// Stable identifier of an entry, as issued by the backend
pub type EntryId = String;

/// Upper bound of the rating scale
pub const MAX_RATING: f32 = 5.0;

/// Moderation status of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl EntryStatus {
    /// Lowercase name used on the wire and in filters
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Move to `to`, refusing to leave a final state
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidTransition` when an approved or rejected
    /// entry would change status.
    pub fn transition(self, to: Self) -> Result<Self, ModelError> {
        match (self, to) {
            (from, to) if from == to => Ok(to),
            (Self::Pending, Self::Approved | Self::Rejected) => Ok(to),
            (from, to) => Err(ModelError::InvalidTransition { from, to }),
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The slice of a category that is joined onto each entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// A curated resource in the directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub screenshot_url: Option<String>,
    /// Joined category; the hosted API names this field `categories`
    #[serde(default, alias = "categories")]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub click_count: u64,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub status: EntryStatus,
    #[serde(default)]
    pub submitted_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    /// Create a pending entry with empty metadata
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            domain: domain_of(&url).unwrap_or_default(),
            url,
            icon_url: None,
            screenshot_url: None,
            category: None,
            tags: Vec::new(),
            click_count: 0,
            rating: 0.0,
            featured: false,
            verified: false,
            status: EntryStatus::Pending,
            submitted_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: CategoryRef) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub const fn with_click_count(mut self, click_count: u64) -> Self {
        self.click_count = click_count;
        self
    }

    /// Set the rating, clamped to the `0..=5` scale
    #[must_use]
    pub fn with_rating(mut self, rating: f32) -> Self {
        self.rating = clamp_rating(rating);
        self
    }

    #[must_use]
    pub const fn with_featured(mut self, featured: bool) -> Self {
        self.featured = featured;
        self
    }

    #[must_use]
    pub const fn with_verified(mut self, verified: bool) -> Self {
        self.verified = verified;
        self
    }

    #[must_use]
    pub const fn with_status(mut self, status: EntryStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub const fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = created_at;
        self
    }

    /// Description text, empty when the backend stored none
    #[must_use]
    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    /// Name of the joined category, if any
    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.name.as_str())
    }

    /// Identifier of the joined category, if any
    #[must_use]
    pub fn category_id(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.id.as_str())
    }

    /// Whether any of the entry's tags is in `tags`
    #[must_use]
    pub fn has_any_tag<'a>(&self, mut tags: impl Iterator<Item = &'a String>) -> bool {
        tags.any(|t| self.tags.contains(t))
    }

    /// Repair fields that arrive inconsistent from imports or the wire
    ///
    /// Clamps the rating, drops duplicate tags (first occurrence wins) and
    /// derives `domain` from `url` when it is missing.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.rating = clamp_rating(self.rating);

        let mut seen = std::collections::HashSet::new();
        self.tags.retain(|t| seen.insert(t.clone()));

        if self.domain.is_empty()
            && let Some(domain) = domain_of(&self.url)
        {
            self.domain = domain;
        }
        self
    }

    /// Check the fields that must be present before an entry is stored
    ///
    /// # Errors
    ///
    /// Returns `ModelError` if the id or title is blank or the URL cannot be parsed.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.id.trim().is_empty() {
            return Err(ModelError::MissingField("id"));
        }
        if self.title.trim().is_empty() {
            return Err(ModelError::MissingField("title"));
        }
        url::Url::parse(&self.url).map_err(|_| ModelError::InvalidUrl(self.url.clone()))?;
        Ok(())
    }
}

fn clamp_rating(rating: f32) -> f32 {
    // also folds -0.0 into 0.0
    if rating.is_nan() || rating <= 0.0 {
        0.0
    } else {
        rating.clamp(0.0, MAX_RATING)
    }
}

/// Host of `url` without a leading `www.`
#[must_use]
pub fn domain_of(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}
