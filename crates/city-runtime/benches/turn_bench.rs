use city_core::{Availability, CityState, OperatorRegistry, Role, RoleAgent, Selection, SimConfig};
use city_runtime::TurnEngine;
use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

struct FirstEligible;

impl RoleAgent for FirstEligible {
    fn propose_selection(
        &mut self,
        _state: &CityState,
        role: Role,
        options: &[Availability<'_>],
    ) -> Option<Selection> {
        options
            .iter()
            .find(|a| a.eligible)
            .map(|a| Selection::new(role, a.operator.name.clone(), 1.0))
    }
}

fn bench_turns(c: &mut Criterion) {
    let registry = Arc::new(OperatorRegistry::standard().unwrap());
    let config = SimConfig::default();
    c.bench_function("city 24 turns", |b| {
        b.iter(|| {
            let mut engine = TurnEngine::new(&config, Arc::clone(&registry));
            let mut agent = FirstEligible;
            for _ in 0..24 {
                if engine.play_turn(&mut agent, 3).is_err() {
                    break;
                }
            }
            engine.snapshot()
        })
    });
}

criterion_group!(benches, bench_turns);
criterion_main!(benches);
