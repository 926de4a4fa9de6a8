#![deny(warnings)]

//! Turn engine for the City Without Walls simulation.
//!
//! Composes the operator resolution engine, the influence-weighted role
//! scheduler and the win/loss evaluator with the background systems from
//! `city-econ`. A [`TurnEngine`] owns the city state and a seeded ChaCha8 RNG
//! for one session; given the same seed and the same selections it replays
//! bit for bit.

pub mod engine;
pub mod evaluator;
pub mod resolution;
pub mod scheduler;

pub use engine::{TurnEngine, TurnReport};
pub use evaluator::evaluate;
pub use resolution::{resolve, resolve_with_draw, ResolutionResult};
pub use scheduler::{next_role, next_role_with_draw, record_outcome};

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use city_core::CityState;

    pub fn state() -> CityState {
        CityState::initial(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
    }
}
