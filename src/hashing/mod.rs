//! BLAKE3-derived keys for the reranker cache.

use blake3::Hasher;

/// Lowercases, trims and collapses internal whitespace.
///
/// Two queries that normalize to the same string share a cache slot.
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cache key for a rerank call: normalized query text plus candidate count.
///
/// Candidate *content* is deliberately not part of the key. Reranking the same
/// query against a different candidate set of equal size returns the cached
/// ranking until the entry is evicted or the cache is cleared.
#[inline]
pub fn rerank_cache_key(query: &str, candidate_count: usize) -> u64 {
    let normalized = normalize_query(query);

    let mut hasher = Hasher::new();
    hasher.update(normalized.as_bytes());
    hasher.update(b"|");
    hasher.update(&(candidate_count as u64).to_le_bytes());

    // First 64 bits of the BLAKE3 digest; a collision only surfaces as a
    // stale cache hit.
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_normalize_query() {
        assert_eq!(
            normalize_query("  Open a   Restaurant\tin Canggu "),
            "open a restaurant in canggu"
        );
        assert_eq!(normalize_query(""), "");
    }

    #[test]
    fn test_rerank_key_determinism() {
        let key1 = rerank_cache_key("PT PMA setup", 5);
        let key2 = rerank_cache_key("PT PMA setup", 5);
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_rerank_key_ignores_case_and_spacing() {
        assert_eq!(
            rerank_cache_key("PT PMA setup", 5),
            rerank_cache_key("  pt   pma SETUP", 5)
        );
    }

    #[test]
    fn test_rerank_key_count_sensitivity() {
        let keys: HashSet<_> = (1..=4).map(|n| rerank_cache_key("visa", n)).collect();
        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn test_rerank_key_query_sensitivity() {
        assert_ne!(
            rerank_cache_key("kitas renewal", 3),
            rerank_cache_key("kitas application", 3)
        );
    }
}
