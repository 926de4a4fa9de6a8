//! Operator records: immutable data interpreted by the resolution engine.
//!
//! An operator bundles a cost formula, preconditions, a categorical outcome
//! distribution and a nominal effect vector. Adding an operator is a matter
//! of registering another record; no per-operator code exists.

use crate::effect::Effect;
use crate::error::SimError;
use crate::{CityState, Role};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance when checking that probabilities sum to one.
pub const PROBABILITY_EPSILON: f64 = 1e-6;

/// Risk tag biasing momentum and legal side effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    /// Enforcement-style policies; feed chronic homelessness drift.
    Punitive,
}

impl RiskLevel {
    pub fn is_punitive(self) -> bool {
        self == RiskLevel::Punitive
    }

    /// High-risk and punitive failures raise legal pressure.
    pub fn is_high(self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Punitive)
    }

    /// Scale of the momentum nudge applied after resolution.
    pub fn momentum_weight(self) -> f64 {
        match self {
            RiskLevel::Low => 0.25,
            RiskLevel::Moderate => 0.5,
            RiskLevel::High | RiskLevel::Punitive => 1.0,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
            RiskLevel::Punitive => "punitive",
        };
        f.write_str(s)
    }
}

/// Realized outcome of a resolved operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Partial,
    Failure,
}

fn default_partial_multiplier() -> f64 {
    0.5
}

/// Categorical split between success, partial and failure.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutcomeDistribution {
    pub success: f64,
    pub partial: f64,
    pub failure: f64,
    /// Multiplier for a partial outcome, in (0, 1).
    #[serde(default = "default_partial_multiplier")]
    pub partial_multiplier: f64,
    /// Multiplier for a failure: 0, or negative for backfiring operators.
    #[serde(default)]
    pub failure_multiplier: f64,
}

impl OutcomeDistribution {
    /// Distribution with the default partial multiplier and an inert failure.
    pub const fn new(success: f64, partial: f64, failure: f64) -> Self {
        Self {
            success,
            partial,
            failure,
            partial_multiplier: 0.5,
            failure_multiplier: 0.0,
        }
    }

    /// Same split, but failure applies the effect vector scaled by `multiplier` (< 0).
    pub const fn backfiring(self, multiplier: f64) -> Self {
        Self {
            failure_multiplier: multiplier,
            ..self
        }
    }

    /// Fail fast on malformed probabilities or multipliers.
    pub fn validate(&self, name: &str) -> Result<(), SimError> {
        let invalid = |reason: String| SimError::InvalidDistribution {
            name: name.to_string(),
            reason,
        };
        for (label, p) in [
            ("success", self.success),
            ("partial", self.partial),
            ("failure", self.failure),
        ] {
            if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                return Err(invalid(format!("{label} probability {p} outside [0,1]")));
            }
        }
        let sum = self.success + self.partial + self.failure;
        if (sum - 1.0).abs() > PROBABILITY_EPSILON {
            return Err(invalid(format!("probabilities sum to {sum}, expected 1.0")));
        }
        if !(self.partial_multiplier > 0.0 && self.partial_multiplier < 1.0) {
            return Err(invalid(format!(
                "partial multiplier {} outside (0,1)",
                self.partial_multiplier
            )));
        }
        if !self.failure_multiplier.is_finite() || self.failure_multiplier > 0.0 {
            return Err(invalid(format!(
                "failure multiplier {} must be <= 0",
                self.failure_multiplier
            )));
        }
        Ok(())
    }

    /// Scale the success probability by `factor`, moving the difference
    /// to or from failure. Partial mass is untouched.
    pub fn adjusted(&self, factor: f64) -> Self {
        let factor = if factor.is_finite() { factor.max(0.0) } else { 0.0 };
        let success = (self.success * factor).clamp(0.0, 1.0 - self.partial);
        Self {
            success,
            failure: (1.0 - success - self.partial).max(0.0),
            ..*self
        }
    }

    /// Map a uniform draw in [0, 1) onto the ordered bands
    /// `[0, success)`, `[success, success + partial)`, remainder failure.
    pub fn draw(&self, u: f64) -> Outcome {
        if u < self.success {
            Outcome::Success
        } else if u < self.success + self.partial {
            Outcome::Partial
        } else {
            Outcome::Failure
        }
    }

    pub fn multiplier(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Success => 1.0,
            Outcome::Partial => self.partial_multiplier,
            Outcome::Failure => self.failure_multiplier,
        }
    }

    /// Expected effect multiplier under this distribution.
    pub fn expected_multiplier(&self) -> f64 {
        self.success + self.partial * self.partial_multiplier + self.failure * self.failure_multiplier
    }
}

/// How an operator's cost is derived from state and intensity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CostFormula {
    /// Fixed price regardless of intensity.
    Flat { amount: Decimal },
    /// `base × intensity`.
    Scaled { base: Decimal },
    /// `base × intensity ÷ economy_strength`; dearer in a recession.
    EconomyIndexed { base: Decimal },
}

impl CostFormula {
    /// Cost in thousands of dollars, rounded to cents of a thousand. Never negative.
    pub fn cost(&self, state: &CityState, intensity: f64) -> Decimal {
        let raw = match self {
            CostFormula::Flat { amount } => *amount,
            CostFormula::Scaled { base } => *base * decimal(intensity),
            CostFormula::EconomyIndexed { base } => {
                let economy = state.economy_strength.max(f64::EPSILON);
                *base * decimal(intensity / economy)
            }
        };
        raw.round_dp(2).max(Decimal::ZERO)
    }

    /// Human-readable formula for the catalog export.
    pub fn describe(&self) -> String {
        match self {
            CostFormula::Flat { amount } => format!("${amount}k flat"),
            CostFormula::Scaled { base } => format!("${base}k x intensity"),
            CostFormula::EconomyIndexed { base } => {
                format!("${base}k x intensity / economy strength")
            }
        }
    }
}

/// Convert a finite multiplier to Decimal; non-representable input maps to zero.
pub(crate) fn decimal(x: f64) -> Decimal {
    Decimal::from_f64(x).unwrap_or(Decimal::ZERO)
}

/// A gate on operator eligibility beyond role and budget.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Precondition {
    /// Unavailable before the given turn number.
    MinTurn { turn: u64 },
    MinSupport { value: f64 },
    /// Only available while public support is below `value`.
    MaxSupport { value: f64 },
    MaxLegalPressure { value: f64 },
    /// Existing plus queued plus this operator's project capacity must stay within `max_beds`.
    BedCeiling { max_beds: u64 },
    /// Cannot be reselected until `turns` turns after its last use.
    Cooldown { turns: u64 },
}

impl Precondition {
    fn check(&self, op: &Operator, state: &CityState) -> Result<(), String> {
        match self {
            Precondition::MinTurn { turn } if state.turn_number < *turn => {
                Err(format!("available from turn {turn}"))
            }
            Precondition::MinSupport { value } if state.public_support < *value => Err(format!(
                "needs public support of at least {value:.0}% (now {:.1}%)",
                state.public_support
            )),
            Precondition::MaxSupport { value } if state.public_support >= *value => Err(format!(
                "only useful while public support is below {value:.0}%"
            )),
            Precondition::MaxLegalPressure { value } if state.legal_pressure >= *value => {
                Err(format!("legal pressure must be below {value:.0}"))
            }
            Precondition::BedCeiling { max_beds } => {
                let added = op.project.as_ref().map_or(0, |p| p.capacity);
                if state.committed_capacity().saturating_add(added) > *max_beds {
                    Err(format!("would exceed the {max_beds}-bed ceiling"))
                } else {
                    Ok(())
                }
            }
            Precondition::Cooldown { turns } => match state.last_used.get(&op.name) {
                Some(last) if state.turn_number < last.saturating_add(*turns) => Err(format!(
                    "cooling down until turn {}",
                    last.saturating_add(*turns)
                )),
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }
}

/// Construction started by an operator on success or partial success.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTemplate {
    pub turns: u32,
    /// Nominal beds added on completion, scaled by outcome and intensity.
    pub capacity: u64,
}

/// A discrete policy action owned by exactly one role.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    pub name: String,
    pub role: Role,
    pub cost: CostFormula,
    #[serde(default)]
    pub preconditions: Vec<Precondition>,
    pub outcomes: OutcomeDistribution,
    pub effects: Vec<Effect>,
    pub risk: RiskLevel,
    #[serde(default)]
    pub project: Option<ProjectTemplate>,
}

/// Why an operator cannot be taken right now.
#[derive(Clone, Debug, PartialEq)]
pub enum Ineligible {
    RoleMismatch { owner: Role, actor: Role },
    Blocked(String),
    Budget { needed: Decimal, available: Decimal },
}

impl fmt::Display for Ineligible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ineligible::RoleMismatch { owner, actor } => {
                write!(f, "owned by {owner}, not {actor}")
            }
            Ineligible::Blocked(reason) => f.write_str(reason),
            Ineligible::Budget { needed, available } => {
                write!(f, "costs ${needed}k, only ${available}k available")
            }
        }
    }
}

impl Operator {
    /// Check role, preconditions and budget, in that order. Pure.
    pub fn eligibility(&self, actor: Role, state: &CityState, intensity: f64) -> Result<(), Ineligible> {
        if actor != self.role {
            return Err(Ineligible::RoleMismatch {
                owner: self.role,
                actor,
            });
        }
        for pre in &self.preconditions {
            pre.check(self, state).map_err(Ineligible::Blocked)?;
        }
        let needed = self.cost.cost(state, intensity);
        let available = state.budget(actor);
        if needed > available {
            return Err(Ineligible::Budget { needed, available });
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SimError> {
        self.outcomes.validate(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::Field;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn state() -> CityState {
        CityState::initial(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
    }

    fn op(preconditions: Vec<Precondition>) -> Operator {
        Operator {
            name: "Test Op".into(),
            role: Role::Shelters,
            cost: CostFormula::Scaled {
                base: Decimal::new(100, 0),
            },
            preconditions,
            outcomes: OutcomeDistribution::new(0.6, 0.3, 0.1),
            effects: vec![Effect::new(Field::MoveToShelter, 100.0)],
            risk: RiskLevel::Low,
            project: Some(ProjectTemplate {
                turns: 2,
                capacity: 300,
            }),
        }
    }

    #[test]
    fn distribution_must_sum_to_one() {
        assert!(OutcomeDistribution::new(0.5, 0.3, 0.1).validate("x").is_err());
        assert!(OutcomeDistribution::new(0.5, 0.3, 0.2).validate("x").is_ok());
        let positive_failure = OutcomeDistribution::new(0.5, 0.3, 0.2).backfiring(0.5);
        assert!(positive_failure.validate("x").is_err());
    }

    #[test]
    fn draw_uses_ordered_bands() {
        let d = OutcomeDistribution::new(0.5, 0.3, 0.2);
        assert_eq!(d.draw(0.0), Outcome::Success);
        assert_eq!(d.draw(0.4999), Outcome::Success);
        assert_eq!(d.draw(0.5), Outcome::Partial);
        assert_eq!(d.draw(0.79), Outcome::Partial);
        assert_eq!(d.draw(0.8), Outcome::Failure);
        assert_eq!(d.draw(0.9999), Outcome::Failure);
    }

    #[test]
    fn adjusted_moves_mass_to_failure() {
        let d = OutcomeDistribution::new(0.6, 0.3, 0.1).adjusted(0.5);
        assert!((d.success - 0.3).abs() < 1e-12);
        assert!((d.failure - 0.4).abs() < 1e-12);
        assert!(d.validate("adj").is_ok());
        let boosted = OutcomeDistribution::new(0.6, 0.3, 0.1).adjusted(3.0);
        assert!((boosted.success - 0.7).abs() < 1e-12);
        assert!(boosted.failure.abs() < 1e-12);
    }

    #[test]
    fn cost_scales_with_intensity_and_economy() {
        let s = state();
        let scaled = CostFormula::Scaled {
            base: Decimal::new(100, 0),
        };
        assert_eq!(scaled.cost(&s, 1.5), Decimal::new(150, 0));
        let mut weak = s.clone();
        weak.economy_strength = 0.5;
        let indexed = CostFormula::EconomyIndexed {
            base: Decimal::new(100, 0),
        };
        assert_eq!(indexed.cost(&weak, 1.0), Decimal::new(200, 0));
    }

    #[test]
    fn role_checked_before_budget() {
        let s = state();
        let o = op(vec![]);
        assert!(matches!(
            o.eligibility(Role::Business, &s, 1.0),
            Err(Ineligible::RoleMismatch { .. })
        ));
        assert!(o.eligibility(Role::Shelters, &s, 1.0).is_ok());
        assert!(matches!(
            o.eligibility(Role::Shelters, &s, 10.0),
            Err(Ineligible::Budget { .. })
        ));
    }

    #[test]
    fn cooldown_blocks_recent_use() {
        let mut s = state();
        let o = op(vec![Precondition::Cooldown { turns: 3 }]);
        s.turn_number = 5;
        s.last_used.insert(o.name.clone(), 4);
        assert!(matches!(
            o.eligibility(Role::Shelters, &s, 1.0),
            Err(Ineligible::Blocked(_))
        ));
        s.turn_number = 7;
        assert!(o.eligibility(Role::Shelters, &s, 1.0).is_ok());
    }

    #[test]
    fn bed_ceiling_counts_queued_projects() {
        let mut s = state();
        let o = op(vec![Precondition::BedCeiling { max_beds: 4_500 }]);
        assert!(o.eligibility(Role::Shelters, &s, 1.0).is_ok());
        s.construction_queue.push(crate::ConstructionProject {
            name: "queued".into(),
            owning_role: Role::Shelters,
            remaining_turns: 2,
            capacity_delta: 300,
            started_turn: 0,
        });
        assert!(matches!(
            o.eligibility(Role::Shelters, &s, 1.0),
            Err(Ineligible::Blocked(_))
        ));
    }

    #[test]
    fn operator_yaml_roundtrip() {
        let o = op(vec![Precondition::MinTurn { turn: 3 }]);
        let text = serde_yaml::to_string(&o).unwrap();
        let back: Operator = serde_yaml::from_str(&text).unwrap();
        assert_eq!(back, o);
    }

    proptest! {
        #[test]
        fn adjusted_distribution_stays_valid(
            s in 0.0f64..=1.0, p_frac in 0.0f64..=1.0, factor in 0.0f64..4.0
        ) {
            let partial = (1.0 - s) * p_frac;
            let d = OutcomeDistribution::new(s, partial, 1.0 - s - partial);
            prop_assume!(d.validate("p").is_ok());
            prop_assert!(d.adjusted(factor).validate("p").is_ok());
        }
    }
}
