#![deny(warnings)]

//! Role agents: strategies that propose one selection per scheduled turn.
//!
//! Every agent implements [`city_core::RoleAgent`] and only ever sees the
//! state and the availability list the engine hands it.

mod greedy;
mod random;
mod scripted;

pub use greedy::GreedyAgent;
pub use random::RandomAgent;
pub use scripted::ScriptedAgent;

use city_core::{CityState, Field, Operator, Outcome, Tuning};
use city_econ::success_factor;
use rust_decimal::prelude::ToPrimitive;

/// Value of a unit change of `field`, given the current state.
///
/// Head counts are worth one point per person housed. Political metrics are
/// weighted up as they approach a losing threshold.
pub fn field_weight(field: Field, state: &CityState, tuning: &Tuning) -> f64 {
    match field {
        Field::HousingExits => 1.0,
        Field::MoveToShelter if state.free_beds() == 0 => 0.0,
        Field::MoveToShelter => 0.5,
        Field::Unsheltered => -1.0,
        Field::Sheltered => 0.5,
        Field::AtRiskPopulation => -0.1,
        Field::BedCapacity => 0.3,
        Field::PublicSupport if state.public_support < tuning.win_support - 15.0 => 40.0,
        Field::PublicSupport => 20.0,
        Field::LegalPressure if state.legal_pressure >= tuning.legal_limit * 0.7 => -75.0,
        Field::LegalPressure => -25.0,
        Field::PolicyFatigue => -10.0,
        Field::EconomyStrength => 400.0,
        Field::PolicyMomentum => 10.0,
    }
}

/// Expected value of taking `op` at nominal intensity, per thousand dollars.
///
/// Uses the same fatigue and momentum adjusted distribution the resolution
/// engine will draw from, dampens sheltering gains by the drift multiplier
/// and counts the legal penalty of a high-risk failure.
pub fn utility(op: &Operator, state: &CityState, tuning: &Tuning) -> f64 {
    let dist = op.outcomes.adjusted(success_factor(state, tuning));
    let nominal: f64 = op
        .effects
        .iter()
        .map(|e| {
            let dampen = if e.field.is_sheltering() && e.delta > 0.0 {
                state.sheltering_effectiveness
            } else {
                1.0
            };
            e.delta * dampen * field_weight(e.field, state, tuning)
        })
        .sum();
    let mut value = nominal * dist.expected_multiplier();

    if let Some(project) = &op.project {
        let built = dist.success + dist.partial * dist.multiplier(Outcome::Partial);
        value += project.capacity as f64 * built * field_weight(Field::BedCapacity, state, tuning);
    }
    if op.risk.is_high() {
        value += dist.failure
            * tuning.high_risk_legal_penalty
            * field_weight(Field::LegalPressure, state, tuning);
    }

    let cost = op.cost.cost(state, 1.0).to_f64().unwrap_or(f64::MAX).max(1.0);
    value / cost
}
