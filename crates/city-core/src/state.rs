//! The single mutable record of city simulation data.

use crate::effect::{Effect, Field};
use crate::error::ValidationError;
use crate::operator::RiskLevel;
use crate::Role;
use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

/// Upper bound for percentage metrics.
pub const PERCENT_MAX: f64 = 100.0;
/// Lowest economy multiplier a recession can push the city to.
pub const ECONOMY_MIN: f64 = 0.25;
/// Highest economy multiplier a boom can push the city to.
pub const ECONOMY_MAX: f64 = 2.0;
/// Policy momentum is held within `[-MOMENTUM_LIMIT, MOMENTUM_LIMIT]`.
pub const MOMENTUM_LIMIT: f64 = 25.0;
/// Chronic drift never reduces sheltering effectiveness below this.
pub const EFFECTIVENESS_FLOOR: f64 = 0.3;
/// Number of end-of-turn homeless totals kept for trend display.
pub const TREND_LEN: usize = 10;

/// Starting population, taken from the 2025 point-in-time count.
pub const INITIAL_SHELTERED: u64 = 3_800;
pub const INITIAL_UNSHELTERED: u64 = 6_900;
pub const INITIAL_AT_RISK: u64 = 38_000;
pub const INITIAL_BED_CAPACITY: u64 = 4_000;

/// Starting budgets in thousands of dollars.
pub fn initial_budgets() -> BTreeMap<Role, Decimal> {
    BTreeMap::from([
        (Role::Neighborhoods, Decimal::new(750, 0)),
        (Role::Business, Decimal::new(900, 0)),
        (Role::Medical, Decimal::new(600, 0)),
        (Role::Shelters, Decimal::new(500, 0)),
        (Role::University, Decimal::new(400, 0)),
    ])
}

/// Starting political influence, normalized to weights summing to 1.
pub fn initial_influence() -> BTreeMap<Role, f64> {
    let raw = [
        (Role::Neighborhoods, 65.0),
        (Role::Business, 70.0),
        (Role::Medical, 55.0),
        (Role::Shelters, 50.0),
        (Role::University, 45.0),
    ];
    let total: f64 = raw.iter().map(|(_, w)| w).sum();
    raw.into_iter().map(|(r, w)| (r, w / total)).collect()
}

/// Calendar season; each turn is one month.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    pub fn of(date: NaiveDate) -> Season {
        match date.month() {
            1..=3 => Season::Winter,
            4..=6 => Season::Spring,
            7..=9 => Season::Summer,
            _ => Season::Fall,
        }
    }
}

/// Terminal and non-terminal game statuses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    InProgress,
    Won,
    LostSupport,
    LostLegal,
    LostHomelessness,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        self != GameStatus::InProgress
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GameStatus::InProgress => "in progress",
            GameStatus::Won => "won",
            GameStatus::LostSupport => "lost: public support collapsed",
            GameStatus::LostLegal => "lost: legal pressure",
            GameStatus::LostHomelessness => "lost: homelessness regressed",
        };
        f.write_str(s)
    }
}

/// A multi-turn housing or shelter project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionProject {
    /// Name of the operator that started the project.
    pub name: String,
    pub owning_role: Role,
    /// Turns left; the project completes when this reaches 0.
    pub remaining_turns: u32,
    /// Beds added to `bed_capacity` on completion.
    pub capacity_delta: u64,
    pub started_turn: u64,
}

/// Scheduling bookkeeping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoleRotation {
    /// Role scheduled for the turn in progress, if any.
    pub current: Option<Role>,
    /// Per-role influence, normalized to sum to 1.
    pub influence_weights: BTreeMap<Role, f64>,
}

/// Aggregate city state, mutated in place by every engine component.
///
/// Invariants restored by [`CityState::clamp`]:
/// - `sheltered + unsheltered == homeless_total`
/// - `sheltered <= bed_capacity`
/// - percentages in `[0, 100]`, budgets `>= 0`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CityState {
    /// Turns completed so far; 0 during the first turn.
    pub turn_number: u64,
    /// Calendar month of the turn in progress.
    pub date: NaiveDate,

    /// Everyone experiencing homelessness, sheltered or not.
    pub homeless_total: u64,
    /// People sleeping rough.
    pub unsheltered: u64,
    /// People in shelter beds; never above `bed_capacity`.
    pub sheltered: u64,
    /// Subset of `unsheltered` pushed there by chronic drift.
    pub chronic_unsheltered: u64,
    /// Housed but precarious residents feeding monthly inflow.
    pub at_risk_population: u64,
    /// Homeless total at game start; win/loss thresholds are relative to it.
    pub baseline_homeless: u64,

    /// Approval of the city's approach, 0 to 100; collapse at 0 loses.
    pub public_support: f64,
    /// Litigation and court scrutiny, 0 to 100; the legal limit loses.
    pub legal_pressure: f64,
    /// Accumulated spending fatigue, dampening success odds.
    pub policy_fatigue: f64,
    /// Scales role grants; 1.0 is a neutral economy.
    pub economy_strength: f64,
    /// Signed reform momentum, raising success odds when positive.
    pub policy_momentum: f64,
    /// Multiplier on operator sheltering deltas, eroded by punitive drift.
    pub sheltering_effectiveness: f64,

    /// Available budget per role in thousands of dollars.
    pub budgets: BTreeMap<Role, Decimal>,
    /// Total spent by operators during the current turn.
    pub spent_this_turn: Decimal,

    /// Shelter beds currently open.
    pub bed_capacity: u64,
    /// Insertion order is start order.
    pub construction_queue: Vec<ConstructionProject>,

    pub role_rotation: RoleRotation,
    /// Turn number each operator was last resolved, for cooldowns.
    pub last_used: BTreeMap<String, u64>,
    /// Risk tags of the most recently resolved operators, oldest first.
    pub recent_risks: VecDeque<RiskLevel>,
    /// End-of-turn homeless totals, oldest first.
    pub trend_history: VecDeque<u64>,
}

impl CityState {
    /// Starting city conditions.
    pub fn initial(date: NaiveDate) -> Self {
        let homeless_total = INITIAL_SHELTERED + INITIAL_UNSHELTERED;
        Self {
            turn_number: 0,
            date,
            homeless_total,
            unsheltered: INITIAL_UNSHELTERED,
            sheltered: INITIAL_SHELTERED,
            chronic_unsheltered: 0,
            at_risk_population: INITIAL_AT_RISK,
            baseline_homeless: homeless_total,
            public_support: 52.0,
            legal_pressure: 10.0,
            policy_fatigue: 0.0,
            economy_strength: 1.0,
            policy_momentum: 0.0,
            sheltering_effectiveness: 1.0,
            budgets: initial_budgets(),
            spent_this_turn: Decimal::ZERO,
            bed_capacity: INITIAL_BED_CAPACITY,
            construction_queue: Vec::new(),
            role_rotation: RoleRotation {
                current: None,
                influence_weights: initial_influence(),
            },
            last_used: BTreeMap::new(),
            recent_risks: VecDeque::new(),
            trend_history: VecDeque::from([homeless_total]),
        }
    }

    pub fn season(&self) -> Season {
        Season::of(self.date)
    }

    pub fn budget(&self, role: Role) -> Decimal {
        self.budgets.get(&role).copied().unwrap_or(Decimal::ZERO)
    }

    /// Change a role's budget by `delta`, flooring the result at zero.
    pub fn adjust_budget(&mut self, role: Role, delta: Decimal) {
        let entry = self.budgets.entry(role).or_insert(Decimal::ZERO);
        *entry = (*entry + delta).max(Decimal::ZERO);
    }

    /// Beds not yet occupied.
    pub fn free_beds(&self) -> u64 {
        self.bed_capacity.saturating_sub(self.sheltered)
    }

    /// Capacity that will exist once every queued project completes.
    pub fn committed_capacity(&self) -> u64 {
        self.construction_queue
            .iter()
            .fold(self.bed_capacity, |acc, p| acc.saturating_add(p.capacity_delta))
    }

    /// Apply one raw delta and restore invariants.
    pub fn apply_effect(&mut self, effect: &Effect) {
        let d = effect.delta;
        if !d.is_finite() {
            return;
        }
        let n = d.round() as i64;
        match effect.field {
            Field::Unsheltered => self.unsheltered = add_signed(self.unsheltered, n),
            Field::Sheltered => self.sheltered = add_signed(self.sheltered, n),
            Field::MoveToShelter => {
                if n >= 0 {
                    let moved = (n as u64).min(self.unsheltered).min(self.free_beds());
                    self.unsheltered -= moved;
                    self.sheltered += moved;
                } else {
                    let moved = n.unsigned_abs().min(self.sheltered);
                    self.sheltered -= moved;
                    self.unsheltered += moved;
                }
            }
            Field::HousingExits => {
                if n >= 0 {
                    let want = n as u64;
                    let from_shelter = want.min(self.sheltered);
                    self.sheltered -= from_shelter;
                    let from_street = (want - from_shelter).min(self.unsheltered);
                    self.unsheltered -= from_street;
                } else {
                    self.unsheltered = self.unsheltered.saturating_add(n.unsigned_abs());
                }
            }
            Field::AtRiskPopulation => {
                self.at_risk_population = add_signed(self.at_risk_population, n)
            }
            Field::BedCapacity => self.bed_capacity = add_signed(self.bed_capacity, n),
            Field::PublicSupport => self.public_support += d,
            Field::LegalPressure => self.legal_pressure += d,
            Field::PolicyFatigue => self.policy_fatigue += d,
            Field::EconomyStrength => self.economy_strength += d,
            Field::PolicyMomentum => self.policy_momentum += d,
        }
        self.clamp();
    }

    /// Restore every bound. Idempotent.
    pub fn clamp(&mut self) {
        self.public_support = bounded(self.public_support, 0.0, PERCENT_MAX);
        self.legal_pressure = bounded(self.legal_pressure, 0.0, PERCENT_MAX);
        self.policy_fatigue = bounded(self.policy_fatigue, 0.0, f64::MAX);
        self.economy_strength = bounded(self.economy_strength, ECONOMY_MIN, ECONOMY_MAX);
        self.policy_momentum = bounded(self.policy_momentum, -MOMENTUM_LIMIT, MOMENTUM_LIMIT);
        self.sheltering_effectiveness = bounded(self.sheltering_effectiveness, EFFECTIVENESS_FLOOR, 1.0);

        if self.sheltered > self.bed_capacity {
            let overflow = self.sheltered - self.bed_capacity;
            self.sheltered = self.bed_capacity;
            self.unsheltered = self.unsheltered.saturating_add(overflow);
        }
        self.chronic_unsheltered = self.chronic_unsheltered.min(self.unsheltered);
        self.homeless_total = self.sheltered + self.unsheltered;

        for budget in self.budgets.values_mut() {
            if *budget < Decimal::ZERO {
                *budget = Decimal::ZERO;
            }
        }
        if self.spent_this_turn < Decimal::ZERO {
            self.spent_this_turn = Decimal::ZERO;
        }
    }

    /// Close out a turn: bump the counter, advance the calendar one month
    /// and record the homeless total in the trend window.
    pub fn advance_clock(&mut self) {
        self.turn_number += 1;
        self.date = self
            .date
            .checked_add_months(Months::new(1))
            .unwrap_or(self.date);
        self.trend_history.push_back(self.homeless_total);
        while self.trend_history.len() > TREND_LEN {
            self.trend_history.pop_front();
        }
        self.spent_this_turn = Decimal::ZERO;
        self.role_rotation.current = None;
    }

    /// Fractional change of the homeless total relative to game start.
    /// Negative means homelessness fell.
    pub fn homeless_change_ratio(&self) -> f64 {
        if self.baseline_homeless == 0 {
            return 0.0;
        }
        (self.homeless_total as f64 - self.baseline_homeless as f64) / self.baseline_homeless as f64
    }
}

fn add_signed(value: u64, delta: i64) -> u64 {
    if delta >= 0 {
        value.saturating_add(delta as u64)
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}

fn bounded(x: f64, lo: f64, hi: f64) -> f64 {
    if x.is_nan() {
        lo
    } else {
        x.clamp(lo, hi)
    }
}

/// Check the invariants every reachable state must satisfy.
pub fn validate_state(state: &CityState) -> Result<(), ValidationError> {
    if state.sheltered + state.unsheltered != state.homeless_total {
        return Err(ValidationError::PopulationMismatch {
            sheltered: state.sheltered,
            unsheltered: state.unsheltered,
            total: state.homeless_total,
        });
    }
    if state.sheltered > state.bed_capacity {
        return Err(ValidationError::OverCapacity {
            sheltered: state.sheltered,
            capacity: state.bed_capacity,
        });
    }
    for (name, v) in [
        ("public_support", state.public_support),
        ("legal_pressure", state.legal_pressure),
    ] {
        if !(0.0..=PERCENT_MAX).contains(&v) {
            return Err(ValidationError::OutOfRange(name));
        }
    }
    if !state.policy_fatigue.is_finite() || state.policy_fatigue < 0.0 {
        return Err(ValidationError::OutOfRange("policy_fatigue"));
    }
    if let Some((role, _)) = state.budgets.iter().find(|(_, b)| **b < Decimal::ZERO) {
        return Err(ValidationError::NegativeBudget(*role));
    }
    let weight_sum: f64 = state.role_rotation.influence_weights.values().sum();
    if (weight_sum - 1.0).abs() > 1e-6 {
        return Err(ValidationError::OutOfRange("influence_weights"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn start() -> CityState {
        CityState::initial(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
    }

    #[test]
    fn initial_state_is_valid() {
        let s = start();
        validate_state(&s).unwrap();
        assert_eq!(s.homeless_total, 10_700);
        assert_eq!(s.season(), Season::Winter);
    }

    #[test]
    fn clamp_is_idempotent() {
        let mut s = start();
        s.public_support = 140.0;
        s.legal_pressure = -3.0;
        s.sheltered = s.bed_capacity + 25;
        s.clamp();
        let once = s.clone();
        s.clamp();
        assert_eq!(s, once);
        assert_eq!(s.public_support, 100.0);
        assert_eq!(s.legal_pressure, 0.0);
        assert_eq!(s.sheltered, s.bed_capacity);
        validate_state(&s).unwrap();
    }

    #[test]
    fn bed_loss_pushes_overflow_to_street() {
        let mut s = start();
        s.sheltered = s.bed_capacity;
        s.clamp();
        let total = s.homeless_total;
        s.apply_effect(&Effect::new(Field::BedCapacity, -500.0));
        assert_eq!(s.sheltered, s.bed_capacity);
        assert_eq!(s.homeless_total, total);
    }

    #[test]
    fn budgets_floor_at_zero() {
        let mut s = start();
        s.adjust_budget(Role::University, Decimal::new(-10_000, 0));
        assert_eq!(s.budget(Role::University), Decimal::ZERO);
    }

    #[test]
    fn clock_advances_month_and_trend() {
        let mut s = start();
        for _ in 0..12 {
            s.advance_clock();
        }
        assert_eq!(s.turn_number, 12);
        assert_eq!(s.date, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(s.trend_history.len(), TREND_LEN);
    }

    fn field() -> impl Strategy<Value = Field> {
        prop_oneof![
            Just(Field::Unsheltered),
            Just(Field::Sheltered),
            Just(Field::MoveToShelter),
            Just(Field::HousingExits),
            Just(Field::AtRiskPopulation),
            Just(Field::BedCapacity),
            Just(Field::PublicSupport),
            Just(Field::LegalPressure),
            Just(Field::PolicyFatigue),
            Just(Field::EconomyStrength),
            Just(Field::PolicyMomentum),
        ]
    }

    proptest! {
        #[test]
        fn invariants_hold_after_any_effect(
            effects in proptest::collection::vec((field(), -20_000.0f64..20_000.0), 1..40)
        ) {
            let mut s = start();
            for (f, d) in effects {
                s.apply_effect(&Effect::new(f, d));
                prop_assert!(validate_state(&s).is_ok());
            }
        }
    }
}
