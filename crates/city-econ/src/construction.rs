//! Multi-turn bed construction.

use city_core::{CityState, ConstructionProject};
use tracing::info;

/// Append a project to the queue. Only operators that create projects call this.
pub fn enqueue(state: &mut CityState, project: ConstructionProject) {
    state.construction_queue.push(project);
}

/// Step every queued project one turn and complete those that reach zero.
///
/// Completed projects are removed and their capacity added to
/// `bed_capacity`. Additions commute, so completion order does not affect
/// the result. An empty queue is a no-op.
pub fn advance(state: &mut CityState) -> Vec<ConstructionProject> {
    if state.construction_queue.is_empty() {
        return Vec::new();
    }
    for project in &mut state.construction_queue {
        project.remaining_turns = project.remaining_turns.saturating_sub(1);
    }
    let (done, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut state.construction_queue)
        .into_iter()
        .partition(|p| p.remaining_turns == 0);
    state.construction_queue = pending;
    for project in &done {
        state.bed_capacity = state.bed_capacity.saturating_add(project.capacity_delta);
        info!(
            project = %project.name,
            role = %project.owning_role,
            beds = project.capacity_delta,
            capacity = state.bed_capacity,
            "construction completed"
        );
    }
    done
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::state;
    use city_core::Role;
    use proptest::prelude::*;

    fn project(name: &str, turns: u32, beds: u64) -> ConstructionProject {
        ConstructionProject {
            name: name.into(),
            owning_role: Role::Shelters,
            remaining_turns: turns,
            capacity_delta: beds,
            started_turn: 0,
        }
    }

    #[test]
    fn empty_queue_is_noop() {
        let mut s = state();
        let before = s.clone();
        assert!(advance(&mut s).is_empty());
        assert_eq!(s, before);
    }

    #[test]
    fn project_completes_after_exactly_its_turns() {
        let mut s = state();
        let beds = s.bed_capacity;
        enqueue(&mut s, project("Annex", 3, 50));
        assert!(advance(&mut s).is_empty());
        assert!(advance(&mut s).is_empty());
        let done = advance(&mut s);
        assert_eq!(done.len(), 1);
        assert_eq!(s.bed_capacity, beds + 50);
        assert!(s.construction_queue.is_empty());
        advance(&mut s);
        assert_eq!(s.bed_capacity, beds + 50);
    }

    #[test]
    fn simultaneous_completions_all_apply() {
        let mut s = state();
        let beds = s.bed_capacity;
        enqueue(&mut s, project("b", 2, 30));
        enqueue(&mut s, project("a", 1, 20));
        enqueue(&mut s, project("c", 2, 10));
        assert_eq!(advance(&mut s).len(), 1);
        let done: Vec<_> = advance(&mut s).into_iter().map(|p| p.name).collect();
        assert_eq!(done, vec!["b".to_string(), "c".to_string()]);
        assert_eq!(s.bed_capacity, beds + 60);
    }

    proptest! {
        #[test]
        fn each_project_adds_capacity_once(
            specs in proptest::collection::vec((1u32..8, 0u64..500), 0..12)
        ) {
            let mut s = state();
            let beds = s.bed_capacity;
            for (i, (turns, cap)) in specs.iter().enumerate() {
                enqueue(&mut s, project(&format!("p{i}"), *turns, *cap));
            }
            let mut completed = 0;
            for _ in 0..10 {
                completed += advance(&mut s).len();
            }
            let total: u64 = specs.iter().map(|(_, c)| c).sum();
            prop_assert_eq!(completed, specs.len());
            prop_assert_eq!(s.bed_capacity, beds + total);
        }
    }
}
