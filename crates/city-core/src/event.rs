//! Exogenous random events.

use crate::effect::Effect;
use crate::error::SimError;
use crate::operator::PROBABILITY_EPSILON;
use crate::Season;
use serde::{Deserialize, Serialize};

/// An event that may fire at the end of a turn.
///
/// At most one event fires per turn; the probability mass not claimed by any
/// event is the "no event" outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RandomEvent {
    pub name: String,
    /// Per-turn trigger probability.
    pub probability: f64,
    pub effects: Vec<Effect>,
    /// Restrict the event to one season; its mass folds into "no event" otherwise.
    #[serde(default)]
    pub season: Option<Season>,
}

impl RandomEvent {
    pub fn is_active(&self, season: Season) -> bool {
        self.season.map_or(true, |s| s == season)
    }
}

/// Probabilities must be in [0, 1] and leave a non-negative "no event" remainder.
pub fn validate_events(events: &[RandomEvent]) -> Result<(), SimError> {
    let mut total = 0.0;
    for e in events {
        if !e.probability.is_finite() || !(0.0..=1.0).contains(&e.probability) {
            return Err(SimError::InvalidDistribution {
                name: e.name.clone(),
                reason: format!("probability {} outside [0,1]", e.probability),
            });
        }
        total += e.probability;
    }
    if total > 1.0 + PROBABILITY_EPSILON {
        return Err(SimError::InvalidDistribution {
            name: "random events".into(),
            reason: format!("event probabilities sum to {total}, leaving no room for 'no event'"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::Field;

    fn ev(name: &str, p: f64) -> RandomEvent {
        RandomEvent {
            name: name.into(),
            probability: p,
            effects: vec![Effect::new(Field::PublicSupport, -1.0)],
            season: None,
        }
    }

    #[test]
    fn rejects_oversubscribed_events() {
        assert!(validate_events(&[ev("a", 0.6), ev("b", 0.5)]).is_err());
        assert!(validate_events(&[ev("a", 0.6), ev("b", 0.4)]).is_ok());
        assert!(validate_events(&[ev("neg", -0.1)]).is_err());
    }

    #[test]
    fn seasonal_events_only_active_in_season() {
        let mut e = ev("cold", 0.1);
        e.season = Some(Season::Winter);
        assert!(e.is_active(Season::Winter));
        assert!(!e.is_active(Season::Summer));
    }
}
