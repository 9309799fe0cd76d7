//! Query → scenario → ordered collection plan.

pub mod classifier;
pub mod error;
pub mod table;


pub use classifier::{Classification, PlannedCollection, Priority, ScenarioClassifier, ScenarioPlan};
pub use error::RoutingError;
pub use table::{GENERAL_SCENARIO, RoutingTable, ScenarioSpec};
