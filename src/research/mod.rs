//! Iterative research: search one collection at a time until the evidence
//! is confident, sufficient, or the iteration budget runs out, then answer
//! with a full reasoning trace.

pub mod config;
pub mod gap;
pub mod research_loop;
pub mod session;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::ResearchConfig;
pub use gap::{Gap, GapCause, analyze, expand_query};
pub use research_loop::{ResearchLoop, research_confidence};
pub use session::ResearchSession;
pub use state::{ResearchState, StopReason};
pub use types::{ResearchResult, ResearchStep};
