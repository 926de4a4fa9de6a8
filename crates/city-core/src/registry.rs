//! Operator registry: the static catalog of operators grouped by role.

use crate::catalog;
use crate::error::SimError;
use crate::event::{validate_events, RandomEvent};
use crate::operator::Operator;
use crate::snapshot::CatalogEntry;
use crate::{CityState, Role};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// One row of [`OperatorRegistry::available`].
#[derive(Clone, Debug)]
pub struct Availability<'a> {
    pub operator: &'a Operator,
    pub eligible: bool,
    /// Empty when eligible.
    pub reason: String,
}

/// Validated, read-only catalog of operators and random events.
///
/// Built once per session; distributions are checked at construction so an
/// invalid one can never surface mid-game.
#[derive(Clone, Debug)]
pub struct OperatorRegistry {
    operators: Vec<Operator>,
    by_role: BTreeMap<Role, Vec<usize>>,
    by_name: BTreeMap<String, usize>,
    events: Vec<RandomEvent>,
}

impl OperatorRegistry {
    /// Validate and index a catalog.
    pub fn new(operators: Vec<Operator>, events: Vec<RandomEvent>) -> Result<Self, SimError> {
        validate_events(&events)?;
        let mut by_role: BTreeMap<Role, Vec<usize>> = BTreeMap::new();
        let mut by_name = BTreeMap::new();
        for (idx, op) in operators.iter().enumerate() {
            op.validate()?;
            if by_name.insert(op.name.clone(), idx).is_some() {
                return Err(SimError::DuplicateOperator(op.name.clone()));
            }
            by_role.entry(op.role).or_default().push(idx);
        }
        debug!(
            operators = operators.len(),
            events = events.len(),
            "operator registry loaded"
        );
        Ok(Self {
            operators,
            by_role,
            by_name,
            events,
        })
    }

    /// The built-in catalog.
    pub fn standard() -> Result<Self, SimError> {
        Self::new(catalog::standard_operators(), catalog::standard_events())
    }

    /// Rebuild with extra operators and events appended, revalidating the result.
    pub fn extended(
        &self,
        operators: Vec<Operator>,
        events: Vec<RandomEvent>,
    ) -> Result<Self, SimError> {
        let mut ops = self.operators.clone();
        ops.extend(operators);
        let mut evs = self.events.clone();
        evs.extend(events);
        Self::new(ops, evs)
    }

    /// Operators owned by `role`, in registration order.
    pub fn operators_for(&self, role: Role) -> Vec<&Operator> {
        self.by_role
            .get(&role)
            .map(|idxs| idxs.iter().map(|&i| &self.operators[i]).collect())
            .unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<&Operator> {
        self.by_name.get(name).map(|&i| &self.operators[i])
    }

    /// Evaluate each of the role's operators against `state` at nominal intensity.
    pub fn available(&self, role: Role, state: &CityState) -> Vec<Availability<'_>> {
        self.operators_for(role)
            .into_iter()
            .map(|operator| match operator.eligibility(role, state, 1.0) {
                Ok(()) => Availability {
                    operator,
                    eligible: true,
                    reason: String::new(),
                },
                Err(why) => Availability {
                    operator,
                    eligible: false,
                    reason: why.to_string(),
                },
            })
            .collect()
    }

    pub fn events(&self) -> &[RandomEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// Role → exclusively owned operator names.
    pub fn role_map(&self) -> BTreeMap<Role, BTreeSet<String>> {
        self.by_role
            .iter()
            .map(|(role, idxs)| {
                let names = idxs.iter().map(|&i| self.operators[i].name.clone()).collect();
                (*role, names)
            })
            .collect()
    }

    /// Read-only listing for UI display.
    pub fn catalog(&self) -> Vec<CatalogEntry> {
        Role::ALL
            .into_iter()
            .flat_map(|role| self.operators_for(role))
            .map(|op| CatalogEntry {
                role: op.role,
                operator: op.name.clone(),
                cost_formula: op.cost.describe(),
                risk_level: op.risk,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{Effect, Field};
    use crate::operator::{CostFormula, OutcomeDistribution, RiskLevel};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn state() -> CityState {
        CityState::initial(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
    }

    fn op(name: &str, role: Role, cost: i64) -> Operator {
        Operator {
            name: name.into(),
            role,
            cost: CostFormula::Flat {
                amount: Decimal::new(cost, 0),
            },
            preconditions: vec![],
            outcomes: OutcomeDistribution::new(0.7, 0.2, 0.1),
            effects: vec![Effect::new(Field::PublicSupport, 1.0)],
            risk: RiskLevel::Low,
            project: None,
        }
    }

    #[test]
    fn standard_catalog_loads() {
        let reg = OperatorRegistry::standard().unwrap();
        for role in Role::ALL {
            assert!(!reg.operators_for(role).is_empty(), "{role} has no operators");
        }
        assert_eq!(reg.catalog().len(), reg.len());
    }

    #[test]
    fn invalid_distribution_aborts_load() {
        let mut bad = op("Bad", Role::Business, 10);
        bad.outcomes = OutcomeDistribution::new(0.5, 0.5, 0.5);
        let err = OperatorRegistry::new(vec![bad], vec![]).unwrap_err();
        assert!(matches!(err, SimError::InvalidDistribution { .. }));
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = OperatorRegistry::new(
            vec![op("Same", Role::Business, 10), op("Same", Role::Medical, 10)],
            vec![],
        )
        .unwrap_err();
        assert_eq!(err, SimError::DuplicateOperator("Same".into()));
    }

    #[test]
    fn available_reports_reasons_without_mutating() {
        let reg = OperatorRegistry::new(
            vec![op("Cheap", Role::University, 10), op("Dear", Role::University, 10_000)],
            vec![],
        )
        .unwrap();
        let s = state();
        let before = s.clone();
        let avail = reg.available(Role::University, &s);
        assert_eq!(avail.len(), 2);
        assert!(avail[0].eligible);
        assert!(avail[0].reason.is_empty());
        assert!(!avail[1].eligible);
        assert!(avail[1].reason.contains("10000"));
        assert_eq!(s, before);
        assert!(reg.available(Role::Medical, &s).is_empty());
    }

    #[test]
    fn role_map_partitions_operators() {
        let reg = OperatorRegistry::standard().unwrap();
        let map = reg.role_map();
        let total: usize = map.values().map(|s| s.len()).sum();
        assert_eq!(total, reg.len());
    }
}
