#![deny(warnings)]

//! Core domain model for the City Without Walls simulation.
//!
//! Defines the city state aggregate, the data-driven operator catalog, the
//! random event records, the snapshot schema consumed by dashboards and the
//! error taxonomy shared by every engine crate. Nothing here draws random
//! numbers; the stochastic systems live in `city-econ` and `city-runtime`.

pub mod agent;
pub mod catalog;
pub mod config;
pub mod effect;
pub mod error;
pub mod event;
pub mod operator;
pub mod registry;
pub mod role;
pub mod snapshot;
pub mod state;

pub use agent::{RoleAgent, Selection};
pub use config::{SimConfig, Tuning};
pub use effect::{apply_effects, AppliedDelta, Effect, Field};
pub use error::{ConfigError, SimError, ValidationError};
pub use event::RandomEvent;
pub use operator::{
    CostFormula, Ineligible, Operator, Outcome, OutcomeDistribution, Precondition,
    ProjectTemplate, RiskLevel,
};
pub use registry::{Availability, OperatorRegistry};
pub use role::Role;
pub use snapshot::{CatalogEntry, LastOutcome, Snapshot};
pub use state::{validate_state, CityState, ConstructionProject, GameStatus, RoleRotation, Season};
