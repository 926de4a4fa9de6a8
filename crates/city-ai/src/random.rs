use city_core::{Availability, CityState, Role, RoleAgent, Selection, Tuning};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Uniform choice among eligible operators with a random intensity.
///
/// Owns its own seeded RNG so that agent draws never perturb the engine's
/// stream.
#[derive(Clone, Debug)]
pub struct RandomAgent {
    rng: ChaCha8Rng,
    tuning: Tuning,
}

impl RandomAgent {
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            tuning,
        }
    }
}

impl RoleAgent for RandomAgent {
    fn propose_selection(
        &mut self,
        state: &CityState,
        role: Role,
        options: &[Availability<'_>],
    ) -> Option<Selection> {
        let eligible: Vec<_> = options.iter().filter(|a| a.eligible).collect();
        if eligible.is_empty() {
            return None;
        }
        let chosen = eligible[self.rng.gen_range(0..eligible.len())].operator;
        let wanted = self
            .rng
            .gen_range(self.tuning.min_intensity..=self.tuning.max_intensity);
        // Eligibility was checked at nominal intensity; fall back if the
        // drawn intensity is unaffordable.
        let intensity = if chosen.eligibility(role, state, wanted).is_ok() {
            wanted
        } else {
            1.0
        };
        Some(Selection::new(role, chosen.name.clone(), intensity))
    }

    fn name(&self) -> &str {
        "random"
    }
}
