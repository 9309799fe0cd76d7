//! Context assembly, prompt text and the deterministic fallback answer.

use std::collections::BTreeMap;
use std::fmt::Write;

use tracing::warn;

use crate::constants::MAX_SNIPPET_CHARS;
use crate::generation::extract::truncate_chars;
use crate::generation::{ExtractedFields, TextGenerator, extract_fields, generate_with_timeout};
use crate::outcome::Outcome;
use crate::routing::{PlannedCollection, Priority};
use crate::scoring::Candidate;

use super::config::SynthesisConfig;

/// Snippets from one collection, in relevance order.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextSection {
    pub collection: String,
    pub priority: Priority,
    pub snippets: Vec<Candidate>,
}

/// Groups `candidates` by collection, keeping at most `per_collection`
/// snippets each.
///
/// Candidates are taken in the given (relevance) order. Sections are
/// ordered by plan priority, then by collection name, so the order in which
/// collections answered never matters. Collections missing from `plan`
/// rank as [`Priority::Fallback`].
pub fn build_sections(
    candidates: &[Candidate],
    plan: &[PlannedCollection],
    per_collection: usize,
) -> Vec<ContextSection> {
    let priority_of = |collection: &str| {
        plan.iter()
            .find(|p| p.collection == collection)
            .map_or(Priority::Fallback, |p| p.priority)
    };

    let mut groups: BTreeMap<(Priority, &str), Vec<Candidate>> = BTreeMap::new();
    for candidate in candidates {
        let collection = candidate.source_collection.as_str();
        let snippets = groups.entry((priority_of(collection), collection)).or_default();
        if snippets.len() < per_collection {
            snippets.push(candidate.clone());
        }
    }

    groups
        .into_iter()
        .map(|((priority, collection), snippets)| ContextSection {
            collection: collection.to_string(),
            priority,
            snippets,
        })
        .collect()
}

pub fn build_prompt(query: &str, sections: &[ContextSection]) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "Question: {}\n", query.trim());
    prompt.push_str("Context:\n");

    for section in sections {
        let _ = writeln!(prompt, "\n[{}]", section.collection);
        for snippet in &section.snippets {
            let _ = writeln!(prompt, "- {}", truncate_chars(snippet.text.trim(), MAX_SNIPPET_CHARS));
        }
    }

    prompt.push_str(
        "\nAnswer the question using only the context above. Structure the answer \
         under these markdown headers, in order: ## Recommendation, ## Timeline, \
         ## Cost, ## Requirements, ## Risks. Omit a header when the context says \
         nothing about it.\n",
    );
    prompt
}

/// Deterministic answer built from the top snippets, one block per
/// collection. Never empty.
pub fn fallback_text(query: &str, sections: &[ContextSection]) -> String {
    if sections.iter().all(|s| s.snippets.is_empty()) {
        return format!(
            "No relevant information was found for \"{}\". Try rephrasing the question \
             or naming the permit, tax or visa it concerns.",
            query.trim()
        );
    }

    let mut text = format!("Relevant sources for \"{}\":\n", query.trim());
    for section in sections.iter().filter(|s| !s.snippets.is_empty()) {
        let _ = writeln!(text, "\n[{}]", section.collection);
        for snippet in &section.snippets {
            let _ = writeln!(text, "- {}", truncate_chars(snippet.text.trim(), MAX_SNIPPET_CHARS));
        }
    }
    text
}

/// Answer text plus whatever sections could be parsed from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub text: String,
    pub fields: ExtractedFields,
}

/// Asks `generator` for an answer over `sections`.
///
/// Any generation failure, including a timeout, yields the
/// [`fallback_text`] as [`Outcome::Degraded`] with no extracted fields.
/// Without any snippets the generator is not called at all.
pub async fn compose(
    generator: &dyn TextGenerator,
    query: &str,
    sections: &[ContextSection],
    config: &SynthesisConfig,
) -> Outcome<Composition> {
    let fallback = |reason: String| {
        Outcome::degraded(
            Composition {
                text: fallback_text(query, sections),
                fields: ExtractedFields::default(),
            },
            reason,
        )
    };

    if sections.iter().all(|s| s.snippets.is_empty()) {
        return fallback("no candidates retrieved".to_string());
    }

    let prompt = build_prompt(query, sections);
    match generate_with_timeout(generator, &prompt, config.max_tokens, config.generation_timeout).await {
        Ok(generated) => Outcome::Ok(Composition {
            fields: extract_fields(&generated.text),
            text: generated.text,
        }),
        Err(e) => {
            warn!(model = generator.model_name(), error = %e, "Generation failed, using fallback synthesis");
            fallback(format!("generation failed: {e}"))
        }
    }
}
