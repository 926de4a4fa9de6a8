//! Serializable records consumed by dashboards, replay logs and UIs.

use crate::effect::AppliedDelta;
use crate::operator::{Outcome, RiskLevel};
use crate::state::{CityState, ConstructionProject, GameStatus, Season};
use crate::Role;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Catalog row describing one operator for action menus.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub role: Role,
    pub operator: String,
    pub cost_formula: String,
    pub risk_level: RiskLevel,
}

/// What the acting role did on the snapshot's turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LastOutcome {
    pub role: Role,
    pub operator: String,
    pub outcome: Outcome,
    pub deltas: Vec<AppliedDelta>,
}

/// Flat per-turn record mirroring CityState.
///
/// Readers must treat it as immutable; it is the only contract with the
/// visualization layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub turn_number: u64,
    pub date: NaiveDate,
    pub season: Season,
    pub homeless_total: u64,
    pub unsheltered: u64,
    pub sheltered: u64,
    pub chronic_unsheltered: u64,
    pub at_risk_population: u64,
    pub public_support: f64,
    pub legal_pressure: f64,
    pub policy_fatigue: f64,
    pub economy_strength: f64,
    pub policy_momentum: f64,
    pub sheltering_effectiveness: f64,
    pub budgets: BTreeMap<Role, Decimal>,
    pub bed_capacity: u64,
    pub construction_queue: Vec<ConstructionProject>,
    pub influence_weights: BTreeMap<Role, f64>,
    pub trend_history: Vec<u64>,
    pub last_outcome: Option<LastOutcome>,
    pub last_event: Option<String>,
    pub game_status: GameStatus,
}

impl Snapshot {
    pub fn capture(
        state: &CityState,
        game_status: GameStatus,
        last_outcome: Option<LastOutcome>,
        last_event: Option<String>,
    ) -> Self {
        Self {
            turn_number: state.turn_number,
            date: state.date,
            season: state.season(),
            homeless_total: state.homeless_total,
            unsheltered: state.unsheltered,
            sheltered: state.sheltered,
            chronic_unsheltered: state.chronic_unsheltered,
            at_risk_population: state.at_risk_population,
            public_support: state.public_support,
            legal_pressure: state.legal_pressure,
            policy_fatigue: state.policy_fatigue,
            economy_strength: state.economy_strength,
            policy_momentum: state.policy_momentum,
            sheltering_effectiveness: state.sheltering_effectiveness,
            budgets: state.budgets.clone(),
            bed_capacity: state.bed_capacity,
            construction_queue: state.construction_queue.clone(),
            influence_weights: state.role_rotation.influence_weights.clone(),
            trend_history: state.trend_history.iter().copied().collect(),
            last_outcome,
            last_event,
            game_status,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::Field;

    #[test]
    fn snapshot_json_roundtrip() {
        let state = CityState::initial(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        let snap = Snapshot::capture(
            &state,
            GameStatus::InProgress,
            Some(LastOutcome {
                role: Role::Medical,
                operator: "Deploy Mobile Clinics".into(),
                outcome: Outcome::Partial,
                deltas: vec![AppliedDelta {
                    field: Field::HousingExits,
                    requested: 60.0,
                    applied: 60.0,
                }],
            }),
            Some("Cold Snap".into()),
        );
        let text = snap.to_json().unwrap();
        let back: Snapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(back.homeless_total, snap.homeless_total);
        assert_eq!(back.last_outcome, snap.last_outcome);
        assert_eq!(back.game_status, GameStatus::InProgress);
        assert_eq!(back.date, snap.date);
        assert_eq!(back.budgets[&Role::Business], Decimal::new(900, 0));
    }
}
