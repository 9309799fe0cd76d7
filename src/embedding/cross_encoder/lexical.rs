//! Deterministic lexical relevance used when no model weights are configured.

use std::collections::HashSet;

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "may", "might", "must", "can", "to",
    "of", "in", "for", "on", "with", "at", "by", "from", "as", "into", "about", "i", "we", "you",
    "my", "our", "your", "me", "want", "need", "how", "what", "which", "who", "when", "where",
    "why", "and", "or", "but", "if", "so", "than", "too", "very", "just", "this", "that",
    "these", "those", "am", "it", "its", "there", "here", "all", "any", "some", "not", "no",
];

fn terms(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 1 && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Scores `passage` against `query` in `[0, 1]`.
///
/// Blends query-term recall with Jaccard overlap and squashes the blend
/// through a logistic curve so scores spread like a calibrated model's.
pub fn lexical_score(query: &str, passage: &str) -> f32 {
    let query_terms = terms(query);
    let passage_terms = terms(passage);

    if query_terms.is_empty() || passage_terms.is_empty() {
        return 0.0;
    }

    let matches = query_terms.intersection(&passage_terms).count() as f32;
    let recall = matches / query_terms.len() as f32;
    let union = query_terms.union(&passage_terms).count() as f32;
    let jaccard = matches / union;

    let blend = 0.7 * recall + 0.3 * jaccard;
    let squashed = 1.0 / (1.0 + (-8.0 * (blend - 0.4)).exp());

    if matches == 0.0 {
        // Logistic floor would otherwise hand unrelated passages ~0.04.
        return 0.0;
    }

    squashed.clamp(0.0, 1.0)
}
