//! Weighted multi-field fuzzy index
//!
//! The index case-folds each entry's searchable fields once, at build time,
//! and remembers which [`Catalog`] version it was built from. Queries are
//! split on whitespace; tokens shorter than the minimum length are dropped,
//! and a query with no usable tokens is reported as
//! [`SearchOutcome::Unfiltered`] rather than as an empty result.
//!
//! Each remaining token must match at least one field. A token's score is
//! the weighted sum of the similarities of every field it matched, and an
//! entry's relevance is the mean over tokens. Results are ordered by
//! relevance, ties in catalog order.

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::catalog::{Catalog, CatalogVersion};
use super::error::SearchError;
use super::matcher::{ApproximateMatcher, DEFAULT_THRESHOLD, FuzzyMatcher};
use crate::models::Entry;

/// Relative importance of each searchable field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldWeights {
    #[serde(default = "FieldWeights::default_title")]
    pub title: f64,
    #[serde(default = "FieldWeights::default_description")]
    pub description: f64,
    #[serde(default = "FieldWeights::default_tags")]
    pub tags: f64,
    #[serde(default = "FieldWeights::default_category")]
    pub category: f64,
}

impl FieldWeights {
    const fn default_title() -> f64 {
        0.4
    }
    const fn default_description() -> f64 {
        0.3
    }
    const fn default_tags() -> f64 {
        0.2
    }
    const fn default_category() -> f64 {
        0.1
    }
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            title: Self::default_title(),
            description: Self::default_description(),
            tags: Self::default_tags(),
            category: Self::default_category(),
        }
    }
}

/// Tuning knobs for the index, loaded from the `[search]` config section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Largest tolerated ratio of edit errors to token length
    #[serde(default = "SearchOptions::default_threshold")]
    pub threshold: f64,
    /// Tokens shorter than this are ignored
    #[serde(default = "SearchOptions::default_min_token_len")]
    pub min_token_len: usize,
    #[serde(default)]
    pub weights: FieldWeights,
}

impl SearchOptions {
    const fn default_threshold() -> f64 {
        DEFAULT_THRESHOLD
    }
    const fn default_min_token_len() -> usize {
        2
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            threshold: Self::default_threshold(),
            min_token_len: Self::default_min_token_len(),
            weights: FieldWeights::default(),
        }
    }
}

/// One hit: position in the catalog and relevance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredMatch {
    pub index: usize,
    pub score: f64,
}

/// Result of a query against the index
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The query had no usable tokens; text filtering does not apply
    Unfiltered,
    /// Matching entries, most relevant first
    Ranked(Vec<ScoredMatch>),
}

impl SearchOutcome {
    /// Resolve the hits against the catalog they were computed from
    ///
    /// `Unfiltered` yields every entry in catalog order.
    #[must_use]
    pub fn entries<'a>(&self, catalog: &'a Catalog) -> Vec<&'a Entry> {
        match self {
            Self::Unfiltered => catalog.entries().iter().collect(),
            Self::Ranked(hits) => hits
                .iter()
                .filter_map(|hit| catalog.entries().get(hit.index))
                .collect(),
        }
    }
}

/// Case-folded searchable text of one entry
#[derive(Debug)]
struct Document {
    title: Vec<char>,
    description: Vec<char>,
    tags: Vec<Vec<char>>,
    category: Vec<char>,
}

impl Document {
    fn from_entry(entry: &Entry) -> Self {
        Self {
            title: fold(&entry.title),
            description: fold(entry.description_text()),
            tags: entry.tags.iter().map(|t| fold(t)).collect(),
            category: entry.category_name().map(fold).unwrap_or_default(),
        }
    }
}

fn fold(text: &str) -> Vec<char> {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// Fuzzy index over one catalog version
pub struct SearchIndex {
    version: CatalogVersion,
    documents: Vec<Document>,
    matcher: Arc<dyn FuzzyMatcher>,
    options: SearchOptions,
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex")
            .field("version", &self.version)
            .field("documents", &self.documents.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl SearchIndex {
    /// Build an index with the default approximate matcher
    #[must_use]
    pub fn build(catalog: &Catalog, options: SearchOptions) -> Self {
        Self::with_matcher(
            catalog,
            options,
            Arc::new(ApproximateMatcher::new(options.threshold)),
        )
    }

    /// Build an index around a custom matcher
    #[must_use]
    pub fn with_matcher(
        catalog: &Catalog,
        options: SearchOptions,
        matcher: Arc<dyn FuzzyMatcher>,
    ) -> Self {
        let documents = catalog
            .entries()
            .par_iter()
            .map(Document::from_entry)
            .collect();

        log::debug!(
            "built search index for catalog {} ({} entries)",
            catalog.version(),
            catalog.len()
        );

        Self {
            version: catalog.version(),
            documents,
            matcher,
            options,
        }
    }

    /// Catalog version this index answers for
    #[must_use]
    pub const fn version(&self) -> CatalogVersion {
        self.version
    }

    #[must_use]
    pub const fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Usable, case-folded query tokens
    #[must_use]
    pub fn tokens(&self, query: &str) -> Vec<Vec<char>> {
        query
            .split_whitespace()
            .map(fold)
            .filter(|t| t.len() >= self.options.min_token_len)
            .collect()
    }

    /// Run `query` against the index
    ///
    /// # Errors
    ///
    /// Returns `SearchError::StaleIndex` if `catalog` is not the snapshot the
    /// index was built from.
    pub fn search(&self, catalog: &Catalog, query: &str) -> Result<SearchOutcome, SearchError> {
        if catalog.version() != self.version {
            return Err(SearchError::StaleIndex {
                index: self.version,
                catalog: catalog.version(),
            });
        }

        let tokens = self.tokens(query);
        if tokens.is_empty() {
            return Ok(SearchOutcome::Unfiltered);
        }

        let mut hits: Vec<ScoredMatch> = self
            .documents
            .par_iter()
            .enumerate()
            .filter_map(|(index, doc)| {
                self.relevance(doc, &tokens)
                    .map(|score| ScoredMatch { index, score })
            })
            .collect();

        // stable: equal scores keep catalog order
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));

        log::trace!("query '{query}' matched {} entries", hits.len());
        Ok(SearchOutcome::Ranked(hits))
    }

    fn relevance(&self, doc: &Document, tokens: &[Vec<char>]) -> Option<f64> {
        let mut total = 0.0;
        for token in tokens {
            total += self.token_score(doc, token)?;
        }
        #[allow(clippy::cast_precision_loss)]
        Some(total / tokens.len() as f64)
    }

    fn token_score(&self, doc: &Document, token: &[char]) -> Option<f64> {
        let weights = &self.options.weights;
        let matcher = self.matcher.as_ref();

        let best_tag = doc
            .tags
            .iter()
            .filter_map(|tag| matcher.similarity(token, tag))
            .max_by(f64::total_cmp);

        let fields = [
            (matcher.similarity(token, &doc.title), weights.title),
            (matcher.similarity(token, &doc.description), weights.description),
            (best_tag, weights.tags),
            (matcher.similarity(token, &doc.category), weights.category),
        ];

        let mut matched = false;
        let mut score = 0.0;
        for (similarity, weight) in fields {
            if let Some(similarity) = similarity {
                matched = true;
                score += similarity * weight;
            }
        }
        matched.then_some(score)
    }
}
