//! Per-turn budget flows: grants in, shelter upkeep out.

use city_core::{CityState, Role, Tuning};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Result of one [`settle`] call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    /// Grant credited to each role after the economic modifier.
    pub grants: BTreeMap<Role, Decimal>,
    /// Upkeep owed for the current bed capacity.
    pub upkeep_due: Decimal,
    pub upkeep_paid: Decimal,
    /// Beds closed because upkeep could not be paid.
    pub beds_lost: u64,
}

/// Credit grants, then charge bed upkeep to the Shelters budget.
///
/// Grants scale with `economy_strength`. Unfunded upkeep never drives the
/// budget negative: the unpaid beds close instead, and anyone sleeping in
/// them returns to the street.
pub fn settle(state: &mut CityState, tuning: &Tuning) -> Settlement {
    let economy = Decimal::from_f64(state.economy_strength).unwrap_or(Decimal::ONE);
    let mut settlement = Settlement::default();
    for role in Role::ALL {
        let grant = (tuning.grant(role) * economy).round_dp(2);
        state.adjust_budget(role, grant);
        settlement.grants.insert(role, grant);
    }

    let due = (Decimal::from(state.bed_capacity) * tuning.per_bed_upkeep).round_dp(2);
    let available = state.budget(Role::Shelters);
    let paid = due.min(available);
    state.adjust_budget(Role::Shelters, -paid);
    settlement.upkeep_due = due;
    settlement.upkeep_paid = paid;

    let shortfall = due - paid;
    if shortfall > Decimal::ZERO && tuning.per_bed_upkeep > Decimal::ZERO {
        let unfunded = (shortfall / tuning.per_bed_upkeep)
            .ceil()
            .to_u64()
            .unwrap_or(u64::MAX)
            .min(state.bed_capacity);
        state.bed_capacity -= unfunded;
        state.clamp();
        settlement.beds_lost = unfunded;
        warn!(
            shortfall = %shortfall,
            beds_lost = unfunded,
            capacity = state.bed_capacity,
            "shelter upkeep unfunded, beds closed"
        );
    }
    debug!(upkeep = %paid, shelters_budget = %state.budget(Role::Shelters), "budgets settled");
    settlement
}
