use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::gateway::CollectionGateway;
use crate::generation::TextGenerator;
use crate::research::{ResearchConfig, ResearchLoop};
use crate::routing::{RoutingTable, ScenarioClassifier};
use crate::scoring::RerankerHandle;
use crate::synthesis::{ScatterGatherSynthesizer, SynthesisConfig};

use super::Engine;
use super::error::EngineError;

/// Assembles an [`Engine`]. Gateway and generator are required; the rest
/// default to the built-in routing table, a lexical reranker and default
/// configs.
#[derive(Default)]
pub struct EngineBuilder {
    gateway: Option<Arc<dyn CollectionGateway>>,
    generator: Option<Arc<dyn TextGenerator>>,
    reranker: Option<RerankerHandle>,
    routing: Option<RoutingTable>,
    synthesis: SynthesisConfig,
    research: Option<ResearchConfig>,
    skip_registry_check: bool,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gateway(mut self, gateway: Arc<dyn CollectionGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn reranker(mut self, reranker: RerankerHandle) -> Self {
        self.reranker = Some(reranker);
        self
    }

    pub fn routing(mut self, table: RoutingTable) -> Self {
        self.routing = Some(table);
        self
    }

    pub fn synthesis_config(mut self, config: SynthesisConfig) -> Self {
        self.synthesis = config;
        self
    }

    /// Defaults to [`ResearchConfig::default`] carrying the synthesis config.
    pub fn research_config(mut self, config: ResearchConfig) -> Self {
        self.research = Some(config);
        self
    }

    /// Skips checking the routing table against the gateway registry.
    /// Collections are then only checked against the table itself.
    pub fn skip_registry_check(mut self) -> Self {
        self.skip_registry_check = true;
        self
    }

    /// Validates configs, checks every collection the routing table names
    /// against the gateway registry, and wires the orchestrators.
    pub async fn build(self) -> Result<Engine, EngineError> {
        let gateway = self.gateway.ok_or(EngineError::MissingComponent {
            component: "collection gateway",
        })?;
        let generator = self.generator.ok_or(EngineError::MissingComponent {
            component: "text generator",
        })?;
        let reranker = self.reranker.unwrap_or_else(RerankerHandle::stub);
        let table = self.routing.unwrap_or_else(RoutingTable::builtin);

        self.synthesis
            .validate()
            .map_err(|reason| EngineError::InvalidConfig { reason })?;
        let research_config = self
            .research
            .unwrap_or_else(|| ResearchConfig::default().with_synthesis(self.synthesis.clone()));
        research_config
            .validate()
            .map_err(|reason| EngineError::InvalidConfig { reason })?;

        let registry: BTreeSet<String> = if self.skip_registry_check {
            warn!("Skipping routing table check against gateway registry");
            table.validate(table.collections())?;
            table.collections().into_iter().map(str::to_string).collect()
        } else {
            let registry = gateway.collections().await?;
            table.validate(&registry)?;
            registry.into_iter().collect()
        };

        info!(
            scenarios = table.scenarios.len(),
            collections = registry.len(),
            model_loaded = reranker.reranker().is_model_loaded(),
            generator = generator.model_name(),
            "Engine ready"
        );

        let classifier = ScenarioClassifier::new(Arc::new(table));
        let synthesizer = ScatterGatherSynthesizer::new(
            classifier.clone(),
            Arc::clone(&gateway),
            reranker.clone(),
            Arc::clone(&generator),
            self.synthesis,
        );
        let research = ResearchLoop::new(
            classifier.clone(),
            gateway,
            reranker.clone(),
            generator,
            research_config,
        );

        Ok(Engine {
            classifier,
            synthesizer,
            research,
            reranker,
            registry,
        })
    }
}
