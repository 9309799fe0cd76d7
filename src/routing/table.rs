//! Scenario → collection routing data.
//!
//! The table is data, not control flow: new domains are added by editing a
//! JSON document and are checked against the gateway's collection registry
//! before the engine accepts them.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::RoutingError;

/// Scenario reported when no keyword matches.
pub const GENERAL_SCENARIO: &str = "general";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub name: String,
    /// Lowercase phrases matched at word starts in the query.
    pub keywords: Vec<String>,
    /// Collections always consulted for this scenario (priority 1).
    pub required: Vec<String>,
    /// Collections consulted after the required ones (priority 2).
    #[serde(default)]
    pub optional: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingTable {
    /// Evaluated in order; earlier scenarios win keyword-score ties.
    pub scenarios: Vec<ScenarioSpec>,

    /// Every collection, most generally useful first. The first entry is the
    /// default collection for unmatched queries.
    pub fallback_order: Vec<String>,

    /// Phrases that mark retrieved evidence as hedged or incomplete.
    #[serde(default)]
    pub uncertainty_markers: Vec<String>,

    /// Domain vocabulary harvested from findings to expand queries.
    #[serde(default)]
    pub domain_terms: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RoutingTable {
    /// Built-in table for the business-advisory domain.
    pub fn builtin() -> Self {
        let scenario = |name: &str, keywords: &[&str], required: &[&str], optional: &[&str]| {
            ScenarioSpec {
                name: name.to_string(),
                keywords: strings(keywords),
                required: strings(required),
                optional: strings(optional),
            }
        };

        Self {
            scenarios: vec![
                scenario(
                    "business_setup",
                    &[
                        "open", "start", "setup", "set up", "restaurant", "cafe", "company",
                        "business", "pt pma", "establish", "incorporate",
                    ],
                    &["kbli_unified", "legal_unified", "tax_genius"],
                    &["visa_oracle", "property_unified", "bali_zero_pricing"],
                ),
                scenario(
                    "visa_immigration",
                    &[
                        "visa", "kitas", "kitap", "voa", "immigration", "stay permit",
                        "work permit", "passport", "overstay", "sponsor", "retire",
                    ],
                    &["visa_oracle", "legal_unified"],
                    &["tax_genius", "bali_zero_pricing"],
                ),
                scenario(
                    "tax_compliance",
                    &[
                        "tax", "npwp", "vat", "ppn", "pph", "spt", "withholding", "filing",
                        "treaty", "deduction",
                    ],
                    &["tax_genius"],
                    &["legal_unified", "kbli_unified", "bali_zero_pricing"],
                ),
                scenario(
                    "property_investment",
                    &[
                        "villa", "land", "property", "lease", "freehold", "hak pakai",
                        "building permit", "pbg", "zoning",
                    ],
                    &["property_unified", "legal_unified"],
                    &["tax_genius", "kbli_unified"],
                ),
                scenario(
                    "legal_compliance",
                    &[
                        "contract", "lawsuit", "dispute", "compliance", "regulation", "law",
                        "notary", "court", "sanction",
                    ],
                    &["legal_unified"],
                    &["kbli_unified", "tax_genius"],
                ),
            ],
            fallback_order: strings(&[
                "legal_unified",
                "kbli_unified",
                "tax_genius",
                "visa_oracle",
                "property_unified",
                "bali_zero_pricing",
                "knowledge_base",
            ]),
            uncertainty_markers: strings(&[
                "unclear",
                "may vary",
                "depends on",
                "not sure",
                "uncertain",
                "case by case",
                "subject to change",
                "no information",
                "please consult",
            ]),
            domain_terms: strings(&[
                "kbli", "pt pma", "nib", "oss", "kitas", "kitap", "npwp", "ppn", "pph", "pbg",
                "slf", "hak pakai", "leasehold", "investment", "capital", "license",
            ]),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, RoutingError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON routing table from `path`.
    pub fn load(path: &Path) -> Result<Self, RoutingError> {
        let content = std::fs::read_to_string(path).map_err(|source| RoutingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_json_str(&content)?;

        info!(
            path = %path.display(),
            scenarios = table.scenarios.len(),
            collections = table.fallback_order.len(),
            "Loaded routing table"
        );

        Ok(table)
    }

    /// Checks internal consistency and that every referenced collection is
    /// in `registry`.
    pub fn validate<I, S>(&self, registry: I) -> Result<(), RoutingError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let registry: HashSet<String> = registry
            .into_iter()
            .map(|c| c.as_ref().to_string())
            .collect();

        if self.fallback_order.is_empty() {
            return Err(RoutingError::EmptyFallback);
        }

        let check = |scenario: &str, collection: &str| {
            if registry.contains(collection) {
                Ok(())
            } else {
                Err(RoutingError::UnknownCollection {
                    scenario: scenario.to_string(),
                    collection: collection.to_string(),
                })
            }
        };

        for collection in &self.fallback_order {
            check("<fallback>", collection)?;
        }

        let mut seen = HashSet::new();
        for spec in &self.scenarios {
            if spec.name == GENERAL_SCENARIO {
                return Err(RoutingError::ReservedScenario {
                    name: spec.name.clone(),
                });
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(RoutingError::DuplicateScenario {
                    name: spec.name.clone(),
                });
            }
            if spec.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(RoutingError::EmptyKeywords {
                    scenario: spec.name.clone(),
                });
            }
            if spec.required.is_empty() {
                return Err(RoutingError::EmptyRequired {
                    scenario: spec.name.clone(),
                });
            }
            for collection in spec.required.iter().chain(&spec.optional) {
                check(&spec.name, collection)?;
            }
        }

        Ok(())
    }

    pub fn scenario(&self, name: &str) -> Option<&ScenarioSpec> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    /// Collection used when nothing else applies.
    pub fn default_collection(&self) -> &str {
        self.fallback_order
            .first()
            .map(String::as_str)
            .unwrap_or("knowledge_base")
    }

    /// Every collection referenced anywhere in the table, in first-seen order.
    pub fn collections(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.fallback_order
            .iter()
            .chain(
                self.scenarios
                    .iter()
                    .flat_map(|s| s.required.iter().chain(&s.optional)),
            )
            .map(String::as_str)
            .filter(|c| seen.insert(*c))
            .collect()
    }

    pub fn knows_collection(&self, collection: &str) -> bool {
        self.collections().contains(&collection)
    }
}
