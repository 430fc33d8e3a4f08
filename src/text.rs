//! Shared text utilities: Jaccard similarity, entity extraction, and
//! stopword-filtered keyword tokenization. Used by the dedup/contradiction
//! guard, the journal's entity extraction, and auto-context injection.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Lowercase, strip punctuation, split on whitespace, dedup into a set.
fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect()
}

/// `|A ∩ B| / |A ∪ B|` over lowercased alphanumeric word sets.
pub fn jaccard(a: &str, b: &str) -> f64 {
    let sa = word_set(a);
    let sb = word_set(b);
    if sa.is_empty() && sb.is_empty() {
        return 1.0;
    }
    let intersection = sa.intersection(&sb).count();
    let union = sa.union(&sb).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

fn file_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[\w./-]+\.[A-Za-z]{1,5}\b").unwrap())
}

fn function_call_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*\(\)").unwrap())
}

fn backtick_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"`([^`]+)`").unwrap())
}

fn capitalized_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z][A-Za-z0-9]{2,}\b").unwrap())
}

/// Extract entities from free text: filenames, `name()`-style calls,
/// backtick-quoted terms, and capitalized words of at least 3 characters.
/// Dedups while preserving first-seen order.
pub fn extract_entities(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut push = |s: String| {
        if seen.insert(s.clone()) {
            out.push(s);
        }
    };

    for m in file_path_re().find_iter(text) {
        push(m.as_str().to_string());
    }
    for m in function_call_re().find_iter(text) {
        push(m.as_str().to_string());
    }
    for cap in backtick_re().captures_iter(text) {
        push(cap[1].to_string());
    }
    for m in capitalized_re().find_iter(text) {
        push(m.as_str().to_string());
    }
    out
}

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "of", "to", "in", "on", "for",
    "with", "is", "are", "was", "were", "be", "been", "being", "this",
    "that", "it", "as", "at", "by", "from", "into", "about", "we", "i",
    "you", "your", "our", "do", "does", "did", "not", "can", "will",
];

/// Lowercase, split on non-alphanumeric, drop stopwords and tokens <3 chars.
pub fn keywords(text: &str) -> Vec<String> {
    let stop: HashSet<&str> = STOPWORDS.iter().copied().collect();
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .filter(|w| w.len() >= 3 && !stop.contains(w))
        .map(|w| w.to_string())
        .collect()
}
