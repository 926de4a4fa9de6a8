//! Named deltas over city state shared by operators and random events.

use crate::CityState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A mutable CityState quantity an effect can target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// People added to (or removed from) the unsheltered count.
    Unsheltered,
    /// People added to (or removed from) the sheltered count.
    Sheltered,
    /// Transfer from unsheltered into free beds; negative moves people out.
    MoveToShelter,
    /// People leaving homelessness; negative is displacement into the street.
    HousingExits,
    AtRiskPopulation,
    BedCapacity,
    PublicSupport,
    LegalPressure,
    PolicyFatigue,
    EconomyStrength,
    PolicyMomentum,
}

impl Field {
    /// Current value of the quantity this field measures.
    ///
    /// Housing exits are measured as the negated homeless total so that a
    /// successful exit reads as a positive applied delta.
    pub fn read(self, state: &CityState) -> f64 {
        match self {
            Field::Unsheltered => state.unsheltered as f64,
            Field::Sheltered | Field::MoveToShelter => state.sheltered as f64,
            Field::HousingExits => -(state.homeless_total as f64),
            Field::AtRiskPopulation => state.at_risk_population as f64,
            Field::BedCapacity => state.bed_capacity as f64,
            Field::PublicSupport => state.public_support,
            Field::LegalPressure => state.legal_pressure,
            Field::PolicyFatigue => state.policy_fatigue,
            Field::EconomyStrength => state.economy_strength,
            Field::PolicyMomentum => state.policy_momentum,
        }
    }

    /// Fields whose positive deltas are dampened by chronic drift.
    pub fn is_sheltering(self) -> bool {
        matches!(self, Field::MoveToShelter | Field::HousingExits)
    }

    pub fn key(self) -> &'static str {
        match self {
            Field::Unsheltered => "unsheltered",
            Field::Sheltered => "sheltered",
            Field::MoveToShelter => "move_to_shelter",
            Field::HousingExits => "housing_exits",
            Field::AtRiskPopulation => "at_risk_population",
            Field::BedCapacity => "bed_capacity",
            Field::PublicSupport => "public_support",
            Field::LegalPressure => "legal_pressure",
            Field::PolicyFatigue => "policy_fatigue",
            Field::EconomyStrength => "economy_strength",
            Field::PolicyMomentum => "policy_momentum",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A nominal delta to one field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub field: Field,
    pub delta: f64,
}

impl Effect {
    pub const fn new(field: Field, delta: f64) -> Self {
        Self { field, delta }
    }

    /// Same field, delta multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            field: self.field,
            delta: self.delta * factor,
        }
    }
}

/// What an effect asked for and what actually changed after clamping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppliedDelta {
    pub field: Field,
    pub requested: f64,
    pub applied: f64,
}

/// Apply effects in order, clamping after each, and report the realized deltas.
pub fn apply_effects(state: &mut CityState, effects: &[Effect]) -> Vec<AppliedDelta> {
    effects
        .iter()
        .map(|effect| {
            let before = effect.field.read(state);
            state.apply_effect(effect);
            AppliedDelta {
                field: effect.field,
                requested: effect.delta,
                applied: effect.field.read(state) - before,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn state() -> CityState {
        CityState::initial(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
    }

    #[test]
    fn applied_delta_reports_clamped_change() {
        let mut s = state();
        s.public_support = 95.0;
        let applied = apply_effects(&mut s, &[Effect::new(Field::PublicSupport, 10.0)]);
        assert_eq!(applied[0].requested, 10.0);
        assert!((applied[0].applied - 5.0).abs() < 1e-9);
        assert_eq!(s.public_support, 100.0);
    }

    #[test]
    fn housing_exits_read_as_positive() {
        let mut s = state();
        let before = s.homeless_total;
        let applied = apply_effects(&mut s, &[Effect::new(Field::HousingExits, 200.0)]);
        assert_eq!(s.homeless_total, before - 200);
        assert!((applied[0].applied - 200.0).abs() < 1e-9);
    }

    #[test]
    fn move_to_shelter_limited_by_free_beds() {
        let mut s = state();
        let free = s.bed_capacity - s.sheltered;
        let applied = apply_effects(&mut s, &[Effect::new(Field::MoveToShelter, 10_000.0)]);
        assert_eq!(applied[0].applied as u64, free);
        assert_eq!(s.sheltered, s.bed_capacity);
        assert_eq!(s.sheltered + s.unsheltered, s.homeless_total);
    }

    #[test]
    fn field_keys_match_serde() {
        let s = serde_json::to_string(&Field::MoveToShelter).unwrap();
        assert_eq!(s, format!("\"{}\"", Field::MoveToShelter.key()));
    }
}
