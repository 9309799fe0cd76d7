//! Sift command-line entrypoint.
//!
//! ```text
//! sift synthesize <query...>
//! sift research <query...>
//! sift stats
//! ```

use std::sync::Arc;

use anyhow::{Context, bail};
use mimalloc::MiMalloc;

use sift::config::Config;
use sift::engine::Engine;
use sift::gateway::HttpGateway;
use sift::generation::GenaiGenerator;
use sift::routing::RoutingTable;
use sift::scoring::{Reranker, RerankerHandle};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const USAGE: &str = "usage: sift <synthesize|research> <query...> | sift stats";

/// Query used to warm the reranker before printing stats.
const WARMUP_QUERY: &str = "How do I open a restaurant as a foreign investor?";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        bail!(USAGE);
    };
    let query = rest.join(" ");
    let user_level: u8 = std::env::var("SIFT_USER_LEVEL")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!(
        gateway = %config.gateway_url,
        model = %config.llm_model,
        reranker = ?config.reranker_path,
        "Sift starting"
    );

    let engine = build_engine(&config).await?;

    let output = match command.as_str() {
        "synthesize" if !query.trim().is_empty() => {
            serde_json::to_string_pretty(&engine.synthesize(&query, user_level).await)?
        }
        "research" if !query.trim().is_empty() => {
            serde_json::to_string_pretty(&engine.research(&query, user_level).await)?
        }
        "stats" => {
            engine.synthesize(WARMUP_QUERY, user_level).await;
            serde_json::to_string_pretty(&engine.get_stats().reranker)?
        }
        _ => bail!(USAGE),
    };

    println!("{output}");
    engine.shutdown();
    Ok(())
}

async fn build_engine(config: &Config) -> anyhow::Result<Engine> {
    let table = match &config.routing_path {
        Some(path) => RoutingTable::load(path)?,
        None => RoutingTable::builtin(),
    };

    if config.reranker_path.is_none() {
        tracing::warn!("No SIFT_RERANKER_PATH configured, reranking with the lexical scorer");
    }
    let reranker = Reranker::load(config.cross_encoder_config(), config.reranker_config())
        .context("failed to load reranker")?;

    let gateway = HttpGateway::new(config.gateway_config())?;
    let generator = GenaiGenerator::new(&config.llm_model);

    let engine = Engine::builder()
        .gateway(Arc::new(gateway))
        .generator(Arc::new(generator))
        .reranker(RerankerHandle::new(reranker))
        .routing(table)
        .synthesis_config(config.synthesis_config())
        .research_config(config.research_config())
        .build()
        .await
        .context("failed to build engine")?;

    Ok(engine)
}
