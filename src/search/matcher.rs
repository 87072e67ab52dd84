//! Approximate string matching used by the search index
//!
//! The index only depends on the [`FuzzyMatcher`] trait, so any edit-distance
//! or n-gram matcher can be swapped in. The default [`ApproximateMatcher`]
//! finds the substring of the text with the fewest edits (insertions,
//! deletions, substitutions) from the pattern, and accepts it when the error
//! ratio stays within the threshold.

/// Scores how well a pattern occurs somewhere inside a text
///
/// Both inputs are already case-folded by the caller.
pub trait FuzzyMatcher: Send + Sync {
    /// Similarity in `0.0..=1.0` (1.0 is an exact occurrence), or `None` when
    /// the best occurrence is outside the matcher's tolerance
    fn similarity(&self, pattern: &[char], text: &[char]) -> Option<f64>;
}

/// Default error ratio tolerated by [`ApproximateMatcher`]
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Edit-distance matcher over the best-matching substring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproximateMatcher {
    threshold: f64,
}

impl ApproximateMatcher {
    /// Create a matcher accepting up to `threshold` errors per pattern character
    #[must_use]
    pub const fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for ApproximateMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl FuzzyMatcher for ApproximateMatcher {
    fn similarity(&self, pattern: &[char], text: &[char]) -> Option<f64> {
        if pattern.is_empty() {
            return None;
        }

        #[allow(clippy::cast_precision_loss)]
        let ratio = substring_distance(pattern, text) as f64 / pattern.len() as f64;
        (ratio <= self.threshold).then(|| 1.0 - ratio)
    }
}

/// Fewest edits turning `pattern` into any substring of `text`
///
/// Sellers' variant of the Levenshtein recurrence: the first row is all
/// zeros so a match may start anywhere in the text, and the answer is the
/// minimum of the last row.
#[must_use]
pub fn substring_distance(pattern: &[char], text: &[char]) -> usize {
    let m = pattern.len();
    let mut column: Vec<usize> = (0..=m).collect();
    let mut best = m;

    for &tc in text {
        // column[0] stays 0: skipping a text prefix is free
        let mut diagonal = column[0];
        for i in 1..=m {
            let left = column[i];
            let substitution = diagonal + usize::from(pattern[i - 1] != tc);
            column[i] = substitution.min(left + 1).min(column[i - 1] + 1);
            diagonal = left;
        }
        best = best.min(column[m]);
        if best == 0 {
            break;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_exact_substring_has_no_errors() {
        assert_eq!(substring_distance(&chars("base"), &chars("supabase")), 0);
        assert_eq!(substring_distance(&chars("supa"), &chars("supabase")), 0);
    }

    #[test]
    fn test_single_insertion() {
        assert_eq!(substring_distance(&chars("suprabase"), &chars("supabase")), 1);
    }

    #[test]
    fn test_substitution_and_empty_text() {
        assert_eq!(substring_distance(&chars("vercal"), &chars("vercel")), 1);
        assert_eq!(substring_distance(&chars("abc"), &[]), 3);
    }

    #[test]
    fn test_similarity_threshold() {
        let matcher = ApproximateMatcher::default();
        let score = matcher
            .similarity(&chars("suprabase"), &chars("supabase"))
            .unwrap();
        assert!(score > 0.85 && score < 0.9);

        assert_eq!(matcher.similarity(&chars("zzz"), &chars("supabase")), None);
        assert_eq!(matcher.similarity(&[], &chars("supabase")), None);
    }

    #[test]
    fn test_short_patterns_must_be_exact() {
        let matcher = ApproximateMatcher::default();
        assert_eq!(matcher.similarity(&chars("ai"), &chars("openai")), Some(1.0));
        assert_eq!(matcher.similarity(&chars("ai"), &chars("api")), None);
    }
}
