//! Monthly population pressure: support decay, at-risk churn and inflow.

use city_core::{CityState, Tuning};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What the monthly pressure update changed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PressureReport {
    /// Public support removed by decay, after clamping.
    pub support_lost: f64,
    /// Signed change of the at-risk population from the random fluctuation.
    pub at_risk_change: i64,
    /// At-risk people who became unsheltered this turn.
    pub inflow: u64,
}

/// Draw the at-risk fluctuation from `rng` and apply the monthly update.
pub fn apply_pressure<R>(state: &mut CityState, tuning: &Tuning, rng: &mut R) -> PressureReport
where
    R: Rng + ?Sized,
{
    let u: f64 = rng.gen();
    apply_pressure_with_draw(state, tuning, u)
}

/// Apply pressure using the uniform draw `u` in `[0, 1)` for the fluctuation.
///
/// Inflow is `at_risk × rate ÷ economy_strength`: a weak economy pushes more
/// people onto the street. The at-risk pool stays within the configured bounds.
pub fn apply_pressure_with_draw(state: &mut CityState, tuning: &Tuning, u: f64) -> PressureReport {
    let before_support = state.public_support;
    state.public_support -= tuning.support_decay;

    let (lo, hi) = tuning.at_risk_fluctuation;
    let change = lo + ((hi - lo) as f64 * u.clamp(0.0, 1.0)).floor() as i64;
    let (min_risk, max_risk) = tuning.at_risk_bounds;
    let churned = if change >= 0 {
        state.at_risk_population.saturating_add(change as u64)
    } else {
        state.at_risk_population.saturating_sub(change.unsigned_abs())
    };
    state.at_risk_population = churned.clamp(min_risk, max_risk);

    let economy = state.economy_strength.max(f64::EPSILON);
    let inflow = ((state.at_risk_population as f64) * tuning.at_risk_inflow_rate / economy).round() as u64;
    let inflow = inflow.min(state.at_risk_population);
    state.at_risk_population = (state.at_risk_population - inflow).max(min_risk);
    state.unsheltered = state.unsheltered.saturating_add(inflow);
    state.clamp();

    debug!(
        at_risk = state.at_risk_population,
        change,
        inflow,
        support = state.public_support,
        "population pressure"
    );
    PressureReport {
        support_lost: before_support - state.public_support,
        at_risk_change: change,
        inflow,
    }
}
