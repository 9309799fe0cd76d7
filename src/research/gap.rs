//! Sufficiency heuristics and query expansion.
//!
//! Thresholds and lexicons are tuned for the business-advisory domain and
//! come from [`ResearchConfig`] and the routing table, so retargeting a
//! domain means changing data, not this code.

use serde::Serialize;

use crate::constants::MAX_QUERY_VARIANTS;
use crate::hashing::normalize_query;
use crate::routing::classifier::contains_at_word_start;

use super::config::ResearchConfig;

/// Reasons evidence may be insufficient, in detection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GapCause {
    InsufficientResults,
    LowRelevance,
    UncertaintyMarkers,
    NarrowCoverage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gap {
    /// Highest-priority cause; its rationale is the one recorded.
    pub cause: GapCause,
    /// Every cause detected, in priority order.
    pub causes: Vec<GapCause>,
    pub rationale: String,
}

/// What gap analysis looks at after a step.
#[derive(Debug, Clone, Copy)]
pub struct Evidence<'a> {
    pub step_results: usize,
    pub step_relevance: f32,
    /// Text of every candidate gathered so far.
    pub accumulated_text: &'a str,
    pub distinct_collections: usize,
}

/// Returns `None` when the evidence is sufficient.
pub fn analyze(evidence: Evidence<'_>, config: &ResearchConfig, uncertainty_markers: &[String]) -> Option<Gap> {
    let mut causes = Vec::new();
    let mut rationale = None;

    let mut flag = |cause: GapCause, why: String| {
        causes.push(cause);
        if rationale.is_none() {
            rationale = Some(why);
        }
    };

    if evidence.step_results < config.min_results {
        flag(
            GapCause::InsufficientResults,
            format!(
                "only {} results, need at least {}",
                evidence.step_results, config.min_results
            ),
        );
    }

    if evidence.step_relevance < config.low_relevance_threshold {
        flag(
            GapCause::LowRelevance,
            format!(
                "mean relevance {:.2} below {:.2}",
                evidence.step_relevance, config.low_relevance_threshold
            ),
        );
    }

    let text = normalize_query(evidence.accumulated_text);
    if let Some(marker) = uncertainty_markers
        .iter()
        .map(|m| normalize_query(m))
        .find(|m| !m.is_empty() && contains_at_word_start(&text, m))
    {
        flag(
            GapCause::UncertaintyMarkers,
            format!("findings hedge with \"{marker}\""),
        );
    }

    if evidence.distinct_collections < config.min_distinct_collections {
        flag(
            GapCause::NarrowCoverage,
            format!(
                "only {} of {} collections consulted",
                evidence.distinct_collections, config.min_distinct_collections
            ),
        );
    }

    let rationale = rationale?;
    Some(Gap {
        cause: causes[0],
        causes,
        rationale,
    })
}

/// Up to [`MAX_QUERY_VARIANTS`] queries; the original always comes first.
///
/// Each extra variant appends one domain term that appears in `findings`
/// but not in the original query.
pub fn expand_query(original: &str, findings: &[String], domain_terms: &[String]) -> Vec<String> {
    let mut variants = vec![original.to_string()];

    let query = normalize_query(original);
    let corpus = normalize_query(&findings.join(" "));

    let mut seen = Vec::new();
    for term in domain_terms.iter().map(|t| normalize_query(t)) {
        if variants.len() >= MAX_QUERY_VARIANTS {
            break;
        }
        if term.is_empty()
            || seen.contains(&term)
            || contains_at_word_start(&query, &term)
            || !contains_at_word_start(&corpus, &term)
        {
            continue;
        }
        variants.push(format!("{} {}", original.trim(), term));
        seen.push(term);
    }

    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> Vec<String> {
        vec!["unclear".to_string(), "may vary".to_string()]
    }

    fn evidence(results: usize, relevance: f32, text: &str, collections: usize) -> Evidence<'_> {
        Evidence {
            step_results: results,
            step_relevance: relevance,
            accumulated_text: text,
            distinct_collections: collections,
        }
    }

    #[test]
    fn test_no_gap() {
        let config = ResearchConfig::default();
        let gap = analyze(evidence(5, 0.8, "clear guidance", 3), &config, &markers());
        assert_eq!(gap, None);
    }

    #[test]
    fn test_first_cause_wins() {
        let config = ResearchConfig::default();

        let gap = analyze(evidence(1, 0.2, "rules may vary", 1), &config, &markers()).unwrap();

        assert_eq!(gap.cause, GapCause::InsufficientResults);
        assert_eq!(
            gap.causes,
            vec![
                GapCause::InsufficientResults,
                GapCause::LowRelevance,
                GapCause::UncertaintyMarkers,
                GapCause::NarrowCoverage
            ]
        );
        assert!(gap.rationale.contains("only 1 results"));
    }

    #[test]
    fn test_uncertainty_marker_only() {
        let config = ResearchConfig::default();

        let gap = analyze(evidence(5, 0.9, "Processing time is UNCLEAR", 4), &config, &markers()).unwrap();

        assert_eq!(gap.cause, GapCause::UncertaintyMarkers);
        assert_eq!(gap.causes.len(), 1);
    }

    #[test]
    fn test_narrow_coverage_only() {
        let config = ResearchConfig::default();

        let gap = analyze(evidence(5, 0.9, "", 2), &config, &markers()).unwrap();

        assert_eq!(gap.cause, GapCause::NarrowCoverage);
    }

    #[test]
    fn test_expansion_keeps_original_first() {
        let terms: Vec<String> = ["kitas", "npwp", "kbli", "nib"].iter().map(|s| s.to_string()).collect();
        let findings = vec![
            "A KITAS is required for foreign directors".to_string(),
            "Register for NPWP and NIB through OSS".to_string(),
        ];

        let variants = expand_query("work permit for director", &findings, &terms);

        assert_eq!(
            variants,
            vec![
                "work permit for director",
                "work permit for director kitas",
                "work permit for director npwp"
            ]
        );
    }

    #[test]
    fn test_expansion_skips_terms_already_in_query() {
        let terms = vec!["kitas".to_string()];
        let findings = vec!["KITAS sponsorship".to_string()];

        assert_eq!(expand_query("kitas renewal", &findings, &terms), vec!["kitas renewal"]);
        assert_eq!(expand_query("kitas renewal", &[], &terms), vec!["kitas renewal"]);
    }
}
