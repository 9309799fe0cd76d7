use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::constants::KEYWORDS_FOR_FULL_CONFIDENCE;
use crate::hashing::normalize_query;

use super::error::RoutingError;
use super::table::{GENERAL_SCENARIO, RoutingTable, ScenarioSpec};

/// Scenario chosen for a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub scenario: String,
    /// `min(1.0, matched_keywords / 5)`.
    pub confidence: f32,
    pub matched_keywords: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Required = 1,
    Optional = 2,
    /// Not part of the scenario; reached through the fallback order.
    Fallback = 3,
}

impl Priority {
    pub fn rank(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedCollection {
    pub collection: String,
    pub priority: Priority,
    pub rationale: String,
}

/// Ordered collection plan for one query. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioPlan {
    pub scenario_type: String,
    pub confidence: f32,
    pub collections: Vec<PlannedCollection>,
}

impl ScenarioPlan {
    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.iter().map(|c| c.collection.as_str())
    }

    pub fn priority_of(&self, collection: &str) -> Option<Priority> {
        self.collections
            .iter()
            .find(|c| c.collection == collection)
            .map(|c| c.priority)
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

/// Deterministic keyword classifier over a [`RoutingTable`].
#[derive(Debug, Clone)]
pub struct ScenarioClassifier {
    table: Arc<RoutingTable>,
}

impl ScenarioClassifier {
    pub fn new(table: Arc<RoutingTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// Picks the scenario with the most keyword matches.
    ///
    /// Ties go to the scenario listed first in the table. No match yields
    /// `("general", 0.0)`.
    pub fn classify(&self, query: &str) -> Classification {
        let normalized = normalize_query(query);

        let mut best: Option<(&ScenarioSpec, Vec<String>)> = None;
        for spec in &self.table.scenarios {
            let matched = matched_keywords(&normalized, spec);
            let beats_best = match &best {
                Some((_, current)) => matched.len() > current.len(),
                None => !matched.is_empty(),
            };
            if beats_best {
                best = Some((spec, matched));
            }
        }

        let classification = match best {
            Some((spec, matched)) => Classification {
                scenario: spec.name.clone(),
                confidence: keyword_confidence(matched.len()),
                matched_keywords: matched,
            },
            None => Classification {
                scenario: GENERAL_SCENARIO.to_string(),
                confidence: 0.0,
                matched_keywords: Vec::new(),
            },
        };

        debug!(
            scenario = %classification.scenario,
            confidence = classification.confidence,
            matched = ?classification.matched_keywords,
            "Classified query"
        );

        classification
    }

    /// Required collections (priority 1) followed by optional ones
    /// (priority 2). An unknown scenario, including `"general"`, falls back
    /// to the single default collection.
    pub fn plan(&self, query: &str, scenario_type: &str) -> ScenarioPlan {
        match self.table.scenario(scenario_type) {
            Some(spec) => self.plan_for_spec(query, spec),
            None => {
                let collection = self.table.default_collection().to_string();
                ScenarioPlan {
                    scenario_type: scenario_type.to_string(),
                    confidence: 0.0,
                    collections: vec![PlannedCollection {
                        rationale: format!("default collection for '{}' queries", scenario_type),
                        collection,
                        priority: Priority::Required,
                    }],
                }
            }
        }
    }

    /// Like [`ScenarioClassifier::plan`] but rejects unknown scenarios.
    pub fn plan_strict(&self, query: &str, scenario_type: &str) -> Result<ScenarioPlan, RoutingError> {
        self.table
            .scenario(scenario_type)
            .map(|spec| self.plan_for_spec(query, spec))
            .ok_or_else(|| RoutingError::UnknownScenario {
                name: scenario_type.to_string(),
            })
    }

    /// Classifies and plans in one step.
    pub fn route(&self, query: &str) -> ScenarioPlan {
        let classification = self.classify(query);
        self.plan(query, &classification.scenario)
    }

    /// Every collection in the order the research loop should consider
    /// them: the routed plan first, then the table's fallback order.
    pub fn research_order(&self, query: &str) -> Vec<PlannedCollection> {
        let plan = self.route(query);
        let mut seen: HashSet<String> = plan.collection_names().map(str::to_string).collect();
        let mut order = plan.collections;

        for collection in &self.table.fallback_order {
            if seen.insert(collection.clone()) {
                order.push(PlannedCollection {
                    collection: collection.clone(),
                    priority: Priority::Fallback,
                    rationale: "next collection in fallback order".to_string(),
                });
            }
        }

        order
    }

    fn plan_for_spec(&self, query: &str, spec: &ScenarioSpec) -> ScenarioPlan {
        let matched = matched_keywords(&normalize_query(query), spec);

        let mut seen = HashSet::new();
        let required = spec.required.iter().map(|c| (c, Priority::Required));
        let optional = spec.optional.iter().map(|c| (c, Priority::Optional));

        let collections = required
            .chain(optional)
            .filter(|(c, _)| seen.insert(c.as_str()))
            .map(|(collection, priority)| PlannedCollection {
                collection: collection.clone(),
                priority,
                rationale: match priority {
                    Priority::Required => format!("required for {}", spec.name),
                    _ => format!("supporting context for {}", spec.name),
                },
            })
            .collect();

        ScenarioPlan {
            scenario_type: spec.name.clone(),
            confidence: keyword_confidence(matched.len()),
            collections,
        }
    }
}

fn keyword_confidence(matches: usize) -> f32 {
    (matches as f32 / KEYWORDS_FOR_FULL_CONFIDENCE).min(1.0)
}

fn matched_keywords(normalized_query: &str, spec: &ScenarioSpec) -> Vec<String> {
    spec.keywords
        .iter()
        .map(|k| normalize_query(k))
        .filter(|k| !k.is_empty() && contains_at_word_start(normalized_query, k))
        .collect()
}

/// Word endings accepted after a keyword.
const INFLECTIONS: [&str; 10] = ["", "s", "es", "d", "ed", "ing", "er", "ers", "ment", "ments"];

/// `true` when `needle` occurs in `haystack` as a whole word or an inflection
/// of one.
///
/// Matches "open" in "opening" and "tax" in "taxes", but not infixes ("tax"
/// in "syntax") or other words sharing the prefix ("tax" in "taxi").
pub(crate) fn contains_at_word_start(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(idx, _)| {
        let starts_word = haystack[..idx]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());

        let rest = &haystack[idx + needle.len()..];
        let word_end = rest.find(|c: char| !c.is_alphanumeric()).unwrap_or(rest.len());

        starts_word && INFLECTIONS.contains(&&rest[..word_end])
    })
}
