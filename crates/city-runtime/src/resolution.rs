//! Operator resolution: eligibility, cost, one outcome draw, scaled effects.

use city_core::{
    apply_effects, AppliedDelta, CityState, ConstructionProject, Effect, Field, Ineligible,
    Operator, Outcome, Role, SimError, Tuning,
};
use city_econ::{enqueue, record_risk, success_factor};
use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

/// Everything a resolution changed, for display and logging.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolutionResult {
    pub role: Role,
    pub operator: String,
    pub intensity: f64,
    pub cost: Decimal,
    /// Success probability after the fatigue and momentum adjustment.
    pub success_probability: f64,
    pub outcome: Outcome,
    /// Declared effects and risk side effects, in application order.
    pub deltas: Vec<AppliedDelta>,
    pub project: Option<ConstructionProject>,
}

/// Resolve `op` for `role`, drawing the outcome from `rng`.
///
/// Fails without touching `state` or consuming a draw when the operator is
/// not eligible or unaffordable.
pub fn resolve<R>(
    state: &mut CityState,
    role: Role,
    op: &Operator,
    intensity: f64,
    tuning: &Tuning,
    rng: &mut R,
) -> Result<ResolutionResult, SimError>
where
    R: Rng + ?Sized,
{
    check(state, role, op, intensity)?;
    let u: f64 = rng.gen();
    resolve_with_draw(state, role, op, intensity, tuning, u)
}

/// Resolve with a caller-supplied uniform draw `u` in `[0, 1)`.
pub fn resolve_with_draw(
    state: &mut CityState,
    role: Role,
    op: &Operator,
    intensity: f64,
    tuning: &Tuning,
    u: f64,
) -> Result<ResolutionResult, SimError> {
    let cost = check(state, role, op, intensity)?;
    state.adjust_budget(role, -cost);
    state.spent_this_turn += cost;

    let dist = op.outcomes.adjusted(success_factor(state, tuning));
    let outcome = dist.draw(u);
    let multiplier = dist.multiplier(outcome) * intensity;
    debug!(
        operator = %op.name,
        draw = u,
        success = dist.success,
        ?outcome,
        "outcome drawn"
    );

    let effects: Vec<Effect> = op
        .effects
        .iter()
        .map(|e| {
            let scaled = e.scaled(multiplier);
            if e.field.is_sheltering() && scaled.delta > 0.0 {
                scaled.scaled(state.sheltering_effectiveness)
            } else {
                scaled
            }
        })
        .collect();
    let mut deltas = apply_effects(state, &effects);
    deltas.extend(apply_effects(state, &side_effects(op, outcome, tuning)));

    let project = op.project.as_ref().and_then(|template| {
        let beds = (template.capacity as f64 * multiplier).round();
        (outcome != Outcome::Failure && beds >= 1.0).then(|| ConstructionProject {
            name: op.name.clone(),
            owning_role: role,
            remaining_turns: template.turns,
            capacity_delta: beds as u64,
            started_turn: state.turn_number,
        })
    });
    if let Some(p) = &project {
        enqueue(state, p.clone());
    }

    state.last_used.insert(op.name.clone(), state.turn_number);
    record_risk(state, op.risk, tuning);

    info!(
        role = %role,
        operator = %op.name,
        intensity,
        cost = %cost,
        ?outcome,
        "operator resolved"
    );
    Ok(ResolutionResult {
        role,
        operator: op.name.clone(),
        intensity,
        cost,
        success_probability: dist.success,
        outcome,
        deltas,
        project,
    })
}

/// Eligibility in the order role, preconditions, budget. Returns the cost.
fn check(state: &CityState, role: Role, op: &Operator, intensity: f64) -> Result<Decimal, SimError> {
    match op.eligibility(role, state, intensity) {
        Ok(()) => Ok(op.cost.cost(state, intensity)),
        Err(Ineligible::Budget { needed, available }) => Err(SimError::InsufficientBudget {
            role,
            operator: op.name.clone(),
            needed,
            available,
        }),
        Err(other) => Err(SimError::Precondition {
            operator: op.name.clone(),
            reason: other.to_string(),
        }),
    }
}

/// Momentum nudge for every risk tag; legal pressure for high-risk failures.
fn side_effects(op: &Operator, outcome: Outcome, tuning: &Tuning) -> Vec<Effect> {
    let nudge = op.risk.momentum_weight() * tuning.momentum_nudge;
    let mut effects = Vec::with_capacity(2);
    match outcome {
        Outcome::Success => effects.push(Effect::new(Field::PolicyMomentum, nudge)),
        Outcome::Partial => {}
        Outcome::Failure => {
            effects.push(Effect::new(Field::PolicyMomentum, -nudge));
            if op.risk.is_high() {
                effects.push(Effect::new(Field::LegalPressure, tuning.high_risk_legal_penalty));
            }
        }
    }
    effects
}
