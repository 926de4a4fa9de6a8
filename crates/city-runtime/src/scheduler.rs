//! Role scheduler: who acts this turn, weighted by political influence.

use city_core::{CityState, Outcome, Role, Tuning};
use rand::Rng;
use tracing::debug;

/// Draw the role for the turn in progress and record it in `role_rotation`.
pub fn next_role<R>(state: &mut CityState, rng: &mut R) -> Role
where
    R: Rng + ?Sized,
{
    let u: f64 = rng.gen();
    next_role_with_draw(state, u)
}

/// Turn 0 picks uniformly among the roles; later turns draw over the
/// normalized influence weights, in canonical role order.
pub fn next_role_with_draw(state: &mut CityState, u: f64) -> Role {
    let role = if state.turn_number == 0 {
        let idx = ((u * Role::ALL.len() as f64) as usize).min(Role::ALL.len() - 1);
        Role::ALL[idx]
    } else {
        weighted_pick(state, u)
    };
    state.role_rotation.current = Some(role);
    debug!(turn = state.turn_number, role = %role, draw = u, "role scheduled");
    role
}

fn weighted_pick(state: &CityState, u: f64) -> Role {
    let weights = &state.role_rotation.influence_weights;
    let total: f64 = Role::ALL.iter().map(|r| weight_of(weights.get(r))).sum();
    if total <= 0.0 {
        let idx = ((u * Role::ALL.len() as f64) as usize).min(Role::ALL.len() - 1);
        return Role::ALL[idx];
    }
    let target = u * total;
    let mut upper = 0.0;
    for role in Role::ALL {
        upper += weight_of(weights.get(&role));
        if target < upper {
            return role;
        }
    }
    // Rounding can leave `target` a hair above the final bound.
    Role::ALL[Role::ALL.len() - 1]
}

fn weight_of(w: Option<&f64>) -> f64 {
    w.copied().filter(|w| w.is_finite()).unwrap_or(0.0).max(0.0)
}

/// Raise the acting role's influence on success, lower it on failure, then
/// renormalize so weights sum to 1 and none falls below the floor.
pub fn record_outcome(state: &mut CityState, role: Role, outcome: Outcome, tuning: &Tuning) {
    let factor = match outcome {
        Outcome::Success => 1.0 + tuning.influence_gain,
        Outcome::Partial => 1.0,
        Outcome::Failure => 1.0 - tuning.influence_loss,
    };
    let weights = &mut state.role_rotation.influence_weights;
    if let Some(w) = weights.get_mut(&role) {
        *w *= factor;
    }
    normalize(weights, tuning.influence_floor);
}

fn normalize(weights: &mut std::collections::BTreeMap<Role, f64>, floor: f64) {
    for role in Role::ALL {
        weights.entry(role).or_insert(0.0);
    }
    let total: f64 = weights.values().map(|w| weight_of(Some(w))).sum();
    let n = weights.len() as f64;
    for w in weights.values_mut() {
        *w = if total > 0.0 { weight_of(Some(&*w)) / total } else { 1.0 / n };
    }
    if weights.values().any(|w| *w < floor) {
        let spare = 1.0 - n * floor;
        for w in weights.values_mut() {
            *w = floor + spare * *w;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::state;
    use city_core::validate_state;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    #[test]
    fn first_turn_is_uniform() {
        let mut s = state();
        assert_eq!(next_role_with_draw(&mut s, 0.0), Role::Neighborhoods);
        assert_eq!(next_role_with_draw(&mut s, 0.59), Role::Medical);
        assert_eq!(next_role_with_draw(&mut s, 0.999), Role::University);
        assert_eq!(s.role_rotation.current, Some(Role::University));
    }

    #[test]
    fn later_turns_follow_influence() {
        let mut s = state();
        s.turn_number = 3;
        s.role_rotation.influence_weights = BTreeMap::from([
            (Role::Neighborhoods, 0.0),
            (Role::Business, 0.9),
            (Role::Medical, 0.0),
            (Role::Shelters, 0.1),
            (Role::University, 0.0),
        ]);
        assert_eq!(next_role_with_draw(&mut s, 0.5), Role::Business);
        assert_eq!(next_role_with_draw(&mut s, 0.95), Role::Shelters);
    }

    #[test]
    fn success_raises_weight_failure_lowers() {
        let tuning = Tuning::default();
        let mut s = state();
        let w0 = s.role_rotation.influence_weights[&Role::Medical];
        record_outcome(&mut s, Role::Medical, Outcome::Success, &tuning);
        let w1 = s.role_rotation.influence_weights[&Role::Medical];
        assert!(w1 > w0);
        record_outcome(&mut s, Role::Medical, Outcome::Failure, &tuning);
        record_outcome(&mut s, Role::Medical, Outcome::Failure, &tuning);
        assert!(s.role_rotation.influence_weights[&Role::Medical] < w1);
        validate_state(&s).unwrap();
    }

    #[test]
    fn no_role_excluded_forever() {
        let tuning = Tuning::default();
        let mut s = state();
        for _ in 0..500 {
            record_outcome(&mut s, Role::University, Outcome::Failure, &tuning);
        }
        let w = s.role_rotation.influence_weights[&Role::University];
        assert!(w >= tuning.influence_floor - 1e-12);
        validate_state(&s).unwrap();
    }

    proptest! {
        #[test]
        fn weights_stay_normalized(
            outcomes in proptest::collection::vec((0usize..5, 0u8..3), 0..200)
        ) {
            let tuning = Tuning::default();
            let mut s = state();
            for (r, o) in outcomes {
                let outcome = match o {
                    0 => Outcome::Success,
                    1 => Outcome::Partial,
                    _ => Outcome::Failure,
                };
                record_outcome(&mut s, Role::ALL[r], outcome, &tuning);
                let sum: f64 = s.role_rotation.influence_weights.values().sum();
                prop_assert!((sum - 1.0).abs() < 1e-9);
                for w in s.role_rotation.influence_weights.values() {
                    prop_assert!(*w >= tuning.influence_floor - 1e-12);
                }
            }
        }
    }
}
