//! Built-in operators (four per role) and random events.

use crate::effect::{Effect, Field};
use crate::event::RandomEvent;
use crate::operator::{
    CostFormula, Operator, OutcomeDistribution, Precondition, ProjectTemplate, RiskLevel,
};
use crate::{Role, Season};
use rust_decimal::Decimal;

/// Hard cap on total shelter beds, existing plus under construction.
pub const MAX_BEDS: u64 = 6_500;

fn scaled(k: i64) -> CostFormula {
    CostFormula::Scaled {
        base: Decimal::new(k, 0),
    }
}

fn flat(k: i64) -> CostFormula {
    CostFormula::Flat {
        amount: Decimal::new(k, 0),
    }
}

fn indexed(k: i64) -> CostFormula {
    CostFormula::EconomyIndexed {
        base: Decimal::new(k, 0),
    }
}

fn fx(field: Field, delta: f64) -> Effect {
    Effect::new(field, delta)
}

#[allow(clippy::too_many_arguments)]
fn op(
    name: &str,
    role: Role,
    cost: CostFormula,
    preconditions: Vec<Precondition>,
    outcomes: OutcomeDistribution,
    effects: Vec<Effect>,
    risk: RiskLevel,
    project: Option<ProjectTemplate>,
) -> Operator {
    Operator {
        name: name.to_string(),
        role,
        cost,
        preconditions,
        outcomes,
        effects,
        risk,
        project,
    }
}

const STEADY: OutcomeDistribution = OutcomeDistribution::new(0.7, 0.2, 0.1);
const EVEN: OutcomeDistribution = OutcomeDistribution::new(0.6, 0.3, 0.1);
const RISKY: OutcomeDistribution = OutcomeDistribution::new(0.5, 0.3, 0.2);

/// The standard operator catalog.
pub fn standard_operators() -> Vec<Operator> {
    use Field::*;
    use Role::*;

    vec![
        // Neighborhoods Coalition
        op(
            "Media Campaign",
            Neighborhoods,
            scaled(120),
            vec![
                Precondition::MaxSupport { value: 70.0 },
                Precondition::Cooldown { turns: 2 },
            ],
            EVEN,
            vec![fx(PublicSupport, 6.0), fx(LegalPressure, -1.0)],
            RiskLevel::Moderate,
            None,
        ),
        op(
            "Civic Forum",
            Neighborhoods,
            scaled(30),
            vec![],
            STEADY,
            vec![fx(LegalPressure, -2.0), fx(PublicSupport, 1.0)],
            RiskLevel::Low,
            None,
        ),
        op(
            "Local Voucher Matching Fund",
            Neighborhoods,
            indexed(180),
            vec![Precondition::MinSupport { value: 40.0 }],
            OutcomeDistribution::new(0.55, 0.3, 0.15),
            vec![
                fx(HousingExits, 180.0),
                fx(PolicyMomentum, 0.8),
                fx(PublicSupport, 2.0),
            ],
            RiskLevel::Moderate,
            None,
        ),
        op(
            "Fund Private Security",
            Neighborhoods,
            flat(90),
            vec![Precondition::Cooldown { turns: 2 }],
            OutcomeDistribution::new(0.6, 0.25, 0.15).backfiring(-0.5),
            vec![fx(PublicSupport, 3.0), fx(EconomyStrength, 0.01)],
            RiskLevel::Punitive,
            None,
        ),
        // Business District
        op(
            "Tax Incentives for Affordable Housing",
            Business,
            scaled(200),
            vec![Precondition::BedCeiling { max_beds: MAX_BEDS }],
            EVEN,
            vec![fx(EconomyStrength, 0.02), fx(PublicSupport, 1.0)],
            RiskLevel::Moderate,
            Some(ProjectTemplate {
                turns: 3,
                capacity: 120,
            }),
        ),
        op(
            "Fund Job Readiness Programs",
            Business,
            scaled(150),
            vec![Precondition::MinTurn { turn: 3 }],
            EVEN,
            vec![
                fx(HousingExits, 150.0),
                fx(AtRiskPopulation, -800.0),
                fx(PublicSupport, 2.0),
            ],
            RiskLevel::Low,
            None,
        ),
        op(
            "Volunteer Street Ambassadors",
            Business,
            scaled(80),
            vec![],
            STEADY,
            vec![fx(MoveToShelter, 80.0), fx(PublicSupport, 1.5)],
            RiskLevel::Low,
            None,
        ),
        op(
            "Lobby for Restrictive Ordinances",
            Business,
            flat(100),
            vec![Precondition::Cooldown { turns: 2 }],
            OutcomeDistribution::new(0.55, 0.25, 0.2).backfiring(-0.75),
            vec![fx(PublicSupport, 4.0), fx(EconomyStrength, 0.02)],
            RiskLevel::Punitive,
            None,
        ),
        // Medical Quarter
        op(
            "Deploy Mobile Clinics",
            Medical,
            scaled(160),
            vec![],
            OutcomeDistribution::new(0.65, 0.25, 0.1),
            vec![fx(HousingExits, 120.0), fx(PublicSupport, 2.8)],
            RiskLevel::Low,
            None,
        ),
        op(
            "Substance Use Treatment Expansion",
            Medical,
            indexed(260),
            vec![Precondition::MinTurn { turn: 4 }],
            OutcomeDistribution::new(0.45, 0.35, 0.2),
            vec![
                fx(HousingExits, 300.0),
                fx(PublicSupport, -1.0),
                fx(PolicyMomentum, 2.8),
            ],
            RiskLevel::High,
            None,
        ),
        op(
            "Medical Respite & Recovery Beds",
            Medical,
            scaled(220),
            vec![Precondition::BedCeiling { max_beds: MAX_BEDS }],
            EVEN,
            vec![fx(MoveToShelter, 40.0)],
            RiskLevel::Moderate,
            Some(ProjectTemplate {
                turns: 2,
                capacity: 80,
            }),
        ),
        op(
            "Create Medical-Legal Partnerships",
            Medical,
            scaled(90),
            vec![],
            STEADY,
            vec![fx(LegalPressure, -1.5), fx(PolicyMomentum, 0.7)],
            RiskLevel::Low,
            None,
        ),
        // Shelters & Services
        op(
            "Emergency Expansion",
            Shelters,
            scaled(300),
            vec![
                Precondition::BedCeiling { max_beds: MAX_BEDS },
                Precondition::Cooldown { turns: 3 },
            ],
            STEADY,
            vec![fx(PublicSupport, -1.0)],
            RiskLevel::Moderate,
            Some(ProjectTemplate {
                turns: 3,
                capacity: 300,
            }),
        ),
        op(
            "Rapid Rehousing Boost",
            Shelters,
            scaled(200),
            vec![],
            OutcomeDistribution::new(0.55, 0.3, 0.15),
            vec![fx(HousingExits, 220.0), fx(PolicyMomentum, 1.2)],
            RiskLevel::Moderate,
            None,
        ),
        op(
            "Intensify Case Management",
            Shelters,
            scaled(120),
            vec![],
            OutcomeDistribution::new(0.65, 0.25, 0.1),
            vec![
                fx(MoveToShelter, 150.0),
                fx(HousingExits, 60.0),
                fx(PolicyMomentum, 0.9),
            ],
            RiskLevel::Low,
            None,
        ),
        op(
            "Sanction Encampment",
            Shelters,
            scaled(150),
            vec![Precondition::BedCeiling { max_beds: MAX_BEDS }],
            RISKY,
            vec![
                fx(BedCapacity, 80.0),
                fx(MoveToShelter, 80.0),
                fx(PublicSupport, -1.0),
                fx(LegalPressure, -2.5),
            ],
            RiskLevel::High,
            None,
        ),
        // University Consortium
        op(
            "Research & Program Evaluation",
            University,
            scaled(80),
            vec![Precondition::Cooldown { turns: 2 }],
            OutcomeDistribution::new(0.75, 0.2, 0.05),
            vec![fx(PolicyMomentum, 1.5)],
            RiskLevel::Low,
            None,
        ),
        op(
            "Housing Innovation Lab",
            University,
            indexed(200),
            vec![
                Precondition::MinTurn { turn: 4 },
                Precondition::BedCeiling { max_beds: MAX_BEDS },
            ],
            OutcomeDistribution::new(0.45, 0.35, 0.2),
            vec![fx(PolicyMomentum, 2.0)],
            RiskLevel::High,
            Some(ProjectTemplate {
                turns: 4,
                capacity: 150,
            }),
        ),
        op(
            "Student Outreach & Volunteer Corps",
            University,
            scaled(70),
            vec![],
            STEADY,
            vec![fx(MoveToShelter, 60.0), fx(PublicSupport, 1.0)],
            RiskLevel::Low,
            None,
        ),
        op(
            "Student-led Rapid Rehousing Pilot",
            University,
            scaled(100),
            vec![],
            OutcomeDistribution::new(0.55, 0.3, 0.15),
            vec![fx(HousingExits, 100.0)],
            RiskLevel::Moderate,
            None,
        ),
    ]
}

/// Recession, boom, weather and scandal events.
pub fn standard_events() -> Vec<RandomEvent> {
    use Field::*;

    let event = |name: &str, probability: f64, effects: Vec<Effect>, season: Option<Season>| {
        RandomEvent {
            name: name.to_string(),
            probability,
            effects,
            season,
        }
    };
    vec![
        event(
            "Recession",
            0.05,
            vec![
                fx(EconomyStrength, -0.15),
                fx(AtRiskPopulation, 2_500.0),
                fx(Unsheltered, 150.0),
                fx(PublicSupport, -2.0),
            ],
            None,
        ),
        event(
            "Economic Boom",
            0.05,
            vec![
                fx(EconomyStrength, 0.1),
                fx(AtRiskPopulation, -1_500.0),
                fx(PublicSupport, 1.0),
            ],
            None,
        ),
        event(
            "Cold Snap",
            0.08,
            vec![
                fx(MoveToShelter, 100.0),
                fx(PublicSupport, 2.0),
                fx(LegalPressure, 1.5),
            ],
            Some(Season::Winter),
        ),
        event(
            "Heat Wave",
            0.06,
            vec![fx(LegalPressure, 1.0), fx(PublicSupport, -1.0)],
            Some(Season::Summer),
        ),
        event(
            "Political Scandal",
            0.04,
            vec![
                fx(PublicSupport, -6.0),
                fx(LegalPressure, 2.0),
                fx(PolicyMomentum, -1.0),
            ],
            None,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn four_operators_per_role() {
        let ops = standard_operators();
        for role in Role::ALL {
            assert_eq!(ops.iter().filter(|o| o.role == role).count(), 4, "{role}");
        }
        let names: BTreeSet<_> = ops.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names.len(), ops.len());
    }

    #[test]
    fn punitive_operators_backfire() {
        for op in standard_operators().iter().filter(|o| o.risk.is_punitive()) {
            assert!(op.outcomes.failure_multiplier < 0.0, "{}", op.name);
        }
    }

    #[test]
    fn every_standard_distribution_is_valid() {
        for op in standard_operators() {
            op.validate().unwrap();
        }
        crate::event::validate_events(&standard_events()).unwrap();
    }
}
