use crate::utility;
use city_core::{Availability, CityState, Role, RoleAgent, Selection, Tuning};
use tracing::debug;

/// Picks the eligible operator with the highest expected utility per k$.
#[derive(Clone, Debug)]
pub struct GreedyAgent {
    tuning: Tuning,
    /// Added to the score of punitive operators.
    punitive_bias: f64,
    label: &'static str,
}

impl GreedyAgent {
    pub fn new(tuning: Tuning) -> Self {
        Self {
            tuning,
            punitive_bias: 0.0,
            label: "greedy",
        }
    }

    /// A hard-line variant that takes a punitive operator whenever one is
    /// eligible. Useful for exercising chronic drift.
    pub fn punitive(tuning: Tuning) -> Self {
        Self {
            tuning,
            punitive_bias: 1_000.0,
            label: "punitive",
        }
    }

    fn score(&self, a: &Availability<'_>, state: &CityState) -> f64 {
        let base = utility(a.operator, state, &self.tuning);
        if a.operator.risk.is_punitive() {
            base + self.punitive_bias
        } else {
            base
        }
    }
}

impl RoleAgent for GreedyAgent {
    fn propose_selection(
        &mut self,
        state: &CityState,
        role: Role,
        options: &[Availability<'_>],
    ) -> Option<Selection> {
        let (best, score) = options
            .iter()
            .filter(|a| a.eligible)
            .map(|a| (a, self.score(a, state)))
            .fold(None::<(&Availability<'_>, f64)>, |acc, (a, s)| match acc {
                Some((_, best)) if best >= s => acc,
                _ => Some((a, s)),
            })?;
        debug!(agent = self.label, role = %role, operator = %best.operator.name, score, "greedy pick");
        Some(Selection::new(role, best.operator.name.clone(), 1.0))
    }

    fn name(&self) -> &str {
        self.label
    }
}
