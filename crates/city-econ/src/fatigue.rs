//! Policy fatigue and chronic homelessness drift.

use city_core::{CityState, RiskLevel, Tuning};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Global multiplier on every operator's success probability this turn.
///
/// Momentum raises it, fatigue divides it down. Never negative.
pub fn success_factor(state: &CityState, tuning: &Tuning) -> f64 {
    let boost = (1.0 + tuning.momentum_bonus * state.policy_momentum).max(0.0);
    boost / (1.0 + tuning.fatigue_penalty * state.policy_fatigue.max(0.0))
}

/// Decay fatigue by a fixed fraction, then add fatigue for this turn's spend.
/// Returns the net change.
pub fn update_fatigue(state: &mut CityState, tuning: &Tuning) -> f64 {
    let before = state.policy_fatigue;
    let spent = state.spent_this_turn.to_f64().unwrap_or(0.0);
    state.policy_fatigue = before * (1.0 - tuning.fatigue_decay) + spent * tuning.fatigue_per_k_spent;
    state.clamp();
    let delta = state.policy_fatigue - before;
    debug!(fatigue = state.policy_fatigue, delta, spent, "policy fatigue updated");
    delta
}

/// Remember the risk tag of a resolved operator for the drift window.
pub fn record_risk(state: &mut CityState, risk: RiskLevel, tuning: &Tuning) {
    state.recent_risks.push_back(risk);
    while state.recent_risks.len() > tuning.drift_window {
        state.recent_risks.pop_front();
    }
}

/// A drift episode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Drift {
    /// People moved from shelter into chronic street homelessness.
    pub converted: u64,
    pub effectiveness: f64,
}

/// Convert sheltered people to chronic unsheltered when punitive operators
/// dominate the recent window; otherwise let sheltering effectiveness recover.
///
/// The punitive share is measured against the full window length, so a
/// single punitive operator early in the game cannot trigger drift alone.
pub fn apply_drift(state: &mut CityState, tuning: &Tuning) -> Option<Drift> {
    let punitive = state.recent_risks.iter().filter(|r| r.is_punitive()).count();
    let share = punitive as f64 / tuning.drift_window.max(1) as f64;
    if punitive == 0 || share < tuning.drift_punitive_share {
        state.sheltering_effectiveness += tuning.drift_recovery;
        state.clamp();
        return None;
    }

    let converted = ((state.sheltered as f64) * tuning.drift_rate).round() as u64;
    let converted = converted.min(state.sheltered);
    state.sheltered -= converted;
    state.unsheltered += converted;
    state.chronic_unsheltered += converted;
    state.sheltering_effectiveness -= tuning.drift_effectiveness_loss;
    state.clamp();
    warn!(
        converted,
        punitive,
        effectiveness = state.sheltering_effectiveness,
        "chronic homelessness drift"
    );
    Some(Drift {
        converted,
        effectiveness: state.sheltering_effectiveness,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::state;
    use city_core::state::EFFECTIVENESS_FLOOR;
    use city_core::validate_state;
    use rust_decimal::Decimal;

    #[test]
    fn fatigue_rises_with_spend_and_decays() {
        let tuning = Tuning::default();
        let mut s = state();
        s.spent_this_turn = Decimal::new(400, 0);
        assert!((update_fatigue(&mut s, &tuning) - 4.0).abs() < 1e-9);
        s.spent_this_turn = Decimal::ZERO;
        let delta = update_fatigue(&mut s, &tuning);
        assert!((s.policy_fatigue - 3.4).abs() < 1e-9);
        assert!(delta < 0.0);
    }

    #[test]
    fn fatigue_lowers_success_factor() {
        let tuning = Tuning::default();
        let mut s = state();
        assert!((success_factor(&s, &tuning) - 1.0).abs() < 1e-12);
        s.policy_fatigue = 50.0;
        assert!((success_factor(&s, &tuning) - 0.5).abs() < 1e-12);
        s.policy_momentum = -100.0;
        assert_eq!(success_factor(&s, &tuning), 0.0);
    }

    #[test]
    fn punitive_window_triggers_drift() {
        let tuning = Tuning::default();
        let mut s = state();
        record_risk(&mut s, RiskLevel::Punitive, &tuning);
        assert!(apply_drift(&mut s, &tuning).is_none());
        record_risk(&mut s, RiskLevel::Low, &tuning);
        record_risk(&mut s, RiskLevel::Punitive, &tuning);
        let total = s.homeless_total;
        let drift = apply_drift(&mut s, &tuning).unwrap();
        assert_eq!(drift.converted, 114);
        assert_eq!(s.chronic_unsheltered, 114);
        assert_eq!(s.homeless_total, total);
        assert!((s.sheltering_effectiveness - 0.95).abs() < 1e-9);
        validate_state(&s).unwrap();
    }

    #[test]
    fn window_forgets_old_operators() {
        let tuning = Tuning::default();
        let mut s = state();
        record_risk(&mut s, RiskLevel::Punitive, &tuning);
        record_risk(&mut s, RiskLevel::Punitive, &tuning);
        for _ in 0..tuning.drift_window {
            record_risk(&mut s, RiskLevel::Moderate, &tuning);
        }
        assert_eq!(s.recent_risks.len(), tuning.drift_window);
        s.sheltering_effectiveness = 0.9;
        assert!(apply_drift(&mut s, &tuning).is_none());
        assert!((s.sheltering_effectiveness - 0.91).abs() < 1e-9);
    }

    #[test]
    fn effectiveness_never_below_floor() {
        let tuning = Tuning::default();
        let mut s = state();
        for _ in 0..tuning.drift_window {
            record_risk(&mut s, RiskLevel::Punitive, &tuning);
        }
        for _ in 0..40 {
            apply_drift(&mut s, &tuning);
        }
        assert_eq!(s.sheltering_effectiveness, EFFECTIVENESS_FLOOR);
    }
}
