//! Locale-aware title comparison
//!
//! Approximates the default collation of a browser's `localeCompare`:
//! letters compare by their base form first (case and common Latin accents
//! ignored), then accents break ties, then case (lowercase before
//! uppercase), and finally the raw code points.

use std::cmp::Ordering;

/// Compare two strings for alphabetical display order
#[must_use]
pub fn compare(a: &str, b: &str) -> Ordering {
    base_key(a)
        .cmp(base_key(b))
        .then_with(|| accent_key(a).cmp(accent_key(b)))
        .then_with(|| case_key(a).cmp(case_key(b)))
        .then_with(|| a.cmp(b))
}

fn base_key(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().flat_map(char::to_lowercase).map(fold_accent)
}

fn accent_key(s: &str) -> impl Iterator<Item = bool> + '_ {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| fold_accent(c) != c)
}

fn case_key(s: &str) -> impl Iterator<Item = bool> + '_ {
    s.chars().map(char::is_uppercase)
}

/// Strip the diacritic from common precomposed Latin letters
fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => 'a',
        'ç' | 'ć' | 'č' => 'c',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'ī' => 'i',
        'ñ' | 'ń' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => 'o',
        'ś' | 'š' => 's',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' => 'u',
        'ý' | 'ÿ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}
