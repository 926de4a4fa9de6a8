//! Simulation configuration and balance parameters.
//!
//! Every tunable rate lives in [`Tuning`]; structural bounds are constants in
//! [`crate::state`]. Both structs deserialize with `#[serde(default)]`, so a
//! YAML file only needs to name the values it overrides.

use crate::error::ConfigError;
use crate::Role;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Session configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for the session's single deterministic RNG.
    pub rng_seed: u64,
    /// Calendar date of turn 0; each turn is one month.
    pub start_date: NaiveDate,
    pub tuning: Tuning,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rng_seed: 42,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
            tuning: Tuning::default(),
        }
    }
}

impl SimConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: SimConfig = serde_yaml::from_str(text)?;
        cfg.tuning.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

/// Balance parameters for every background system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // Selection
    /// Lowest intensity a selection may request.
    pub min_intensity: f64,
    /// Highest intensity a selection may request.
    pub max_intensity: f64,

    // Policy fatigue
    /// Fatigue added per thousand dollars spent in a turn.
    pub fatigue_per_k_spent: f64,
    /// Fraction of fatigue that decays each turn.
    pub fatigue_decay: f64,
    /// Success probability is divided by `1 + fatigue_penalty * fatigue`.
    pub fatigue_penalty: f64,
    /// Success probability is multiplied by `1 + momentum_bonus * momentum`.
    pub momentum_bonus: f64,

    // Risk side effects
    /// Momentum moved per unit of risk weight on success or failure.
    pub momentum_nudge: f64,
    /// Legal pressure added when a high-risk or punitive operator fails.
    pub high_risk_legal_penalty: f64,

    // Chronic drift
    /// Number of recent operators inspected for punitive dominance.
    pub drift_window: usize,
    /// Share of punitive operators in the window that triggers drift.
    pub drift_punitive_share: f64,
    /// Fraction of the sheltered population pushed into chronic street homelessness.
    pub drift_rate: f64,
    /// Sheltering effectiveness lost per drift episode.
    pub drift_effectiveness_loss: f64,
    /// Per-turn recovery of sheltering effectiveness while no drift occurs.
    pub drift_recovery: f64,

    // Scheduling
    /// Fractional influence gained by a role after a success.
    pub influence_gain: f64,
    /// Fractional influence lost by a role after a failure.
    pub influence_loss: f64,
    /// No role's normalized weight falls below this.
    pub influence_floor: f64,

    // Budget ledger
    /// Per-turn grant for each role before the economic modifier, in k$.
    pub baseline_grants: BTreeMap<Role, Decimal>,
    /// Shelter operating cost per bed per turn, in k$.
    pub per_bed_upkeep: Decimal,

    // Population pressure
    /// Public support lost every turn regardless of policy.
    pub support_decay: f64,
    /// Fraction of the at-risk population that becomes unsheltered each turn.
    pub at_risk_inflow_rate: f64,
    /// Half-open range of the monthly at-risk change, `(low, high)`.
    pub at_risk_fluctuation: (i64, i64),
    /// The at-risk population is held within `(min, max)`.
    pub at_risk_bounds: (u64, u64),

    // Win/loss thresholds
    /// Fractional reduction of homelessness required to win.
    pub win_reduction: f64,
    /// Public support must exceed this to win.
    pub win_support: f64,
    /// Legal pressure at or above this loses the game.
    pub legal_limit: f64,
    /// Fractional rise of homelessness over baseline that loses the game.
    pub regression_threshold: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            min_intensity: 0.5,
            max_intensity: 2.0,
            fatigue_per_k_spent: 0.01,
            fatigue_decay: 0.15,
            fatigue_penalty: 0.02,
            momentum_bonus: 0.02,
            momentum_nudge: 0.5,
            high_risk_legal_penalty: 2.0,
            drift_window: 4,
            drift_punitive_share: 0.5,
            drift_rate: 0.03,
            drift_effectiveness_loss: 0.05,
            drift_recovery: 0.01,
            influence_gain: 0.10,
            influence_loss: 0.10,
            influence_floor: 0.02,
            baseline_grants: BTreeMap::from([
                (Role::Neighborhoods, Decimal::new(60, 0)),
                (Role::Business, Decimal::new(70, 0)),
                (Role::Medical, Decimal::new(60, 0)),
                (Role::Shelters, Decimal::new(110, 0)),
                (Role::University, Decimal::new(40, 0)),
            ]),
            per_bed_upkeep: Decimal::new(2, 2),
            support_decay: 0.5,
            at_risk_inflow_rate: 0.002,
            at_risk_fluctuation: (-200, 300),
            at_risk_bounds: (30_000, 45_000),
            win_reduction: 0.30,
            win_support: 50.0,
            legal_limit: 20.0,
            regression_threshold: 0.25,
        }
    }
}

impl Tuning {
    /// Reject parameter combinations the engine cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        if !(self.min_intensity > 0.0 && self.min_intensity <= self.max_intensity) {
            return invalid("intensity range must satisfy 0 < min <= max");
        }
        for (name, v) in [
            ("fatigue_decay", self.fatigue_decay),
            ("drift_punitive_share", self.drift_punitive_share),
            ("drift_rate", self.drift_rate),
            ("drift_effectiveness_loss", self.drift_effectiveness_loss),
            ("influence_loss", self.influence_loss),
            ("win_reduction", self.win_reduction),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(ConfigError::Invalid(format!("{name} must be within [0,1]")));
            }
        }
        if !(self.influence_floor > 0.0 && self.influence_floor * (Role::ALL.len() as f64) < 1.0) {
            return invalid("influence_floor must be positive and leave room for weighting");
        }
        if self.drift_window == 0 {
            return invalid("drift_window must be at least 1");
        }
        if self.per_bed_upkeep < Decimal::ZERO {
            return invalid("per_bed_upkeep must be non-negative");
        }
        if self.at_risk_fluctuation.0 > self.at_risk_fluctuation.1
            || self.at_risk_bounds.0 > self.at_risk_bounds.1
        {
            return invalid("ranges must be ordered (low, high)");
        }
        Ok(())
    }

    pub fn grant(&self, role: Role) -> Decimal {
        self.baseline_grants.get(&role).copied().unwrap_or(Decimal::ZERO)
    }
}
