use crate::GreedyAgent;
use city_core::{Availability, CityState, ConfigError, Role, RoleAgent, Selection};
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use tracing::debug;

/// Replays a fixed list of selections, one queue per role.
///
/// Each proposal consumes queued entries for the scheduled role until one is
/// eligible at its scripted intensity; unusable entries are dropped. Once the
/// role's queue is exhausted the fallback strategy decides, or the first
/// eligible operator at nominal intensity when none is set. The agent only
/// passes when nothing is eligible.
#[derive(Clone, Debug, Default)]
pub struct ScriptedAgent {
    queues: BTreeMap<Role, VecDeque<Selection>>,
    fallback: Option<GreedyAgent>,
}

impl ScriptedAgent {
    pub fn new(script: impl IntoIterator<Item = Selection>) -> Self {
        let mut queues: BTreeMap<Role, VecDeque<Selection>> = BTreeMap::new();
        for sel in script {
            queues.entry(sel.role).or_default().push_back(sel);
        }
        Self {
            queues,
            fallback: None,
        }
    }

    /// Load a YAML list of `{role, operator, intensity}` entries.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let script: Vec<Selection> = serde_yaml::from_str(text)?;
        Ok(Self::new(script))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Hand turns to `agent` once a role's script runs out.
    pub fn with_fallback(mut self, agent: GreedyAgent) -> Self {
        self.fallback = Some(agent);
        self
    }

    /// Entries not yet replayed.
    pub fn remaining(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }

    fn next_scripted(
        &mut self,
        state: &CityState,
        role: Role,
        options: &[Availability<'_>],
    ) -> Option<Selection> {
        let queue = self.queues.get_mut(&role)?;
        while let Some(sel) = queue.pop_front() {
            let usable = options.iter().any(|a| {
                a.eligible
                    && a.operator.name == sel.operator
                    && a.operator.eligibility(role, state, sel.intensity).is_ok()
            });
            if usable {
                return Some(sel);
            }
            debug!(role = %role, operator = %sel.operator, "dropping ineligible scripted entry");
        }
        None
    }
}

impl RoleAgent for ScriptedAgent {
    fn propose_selection(
        &mut self,
        state: &CityState,
        role: Role,
        options: &[Availability<'_>],
    ) -> Option<Selection> {
        if let Some(sel) = self.next_scripted(state, role, options) {
            debug!(role = %role, operator = %sel.operator, "scripted pick");
            return Some(sel);
        }
        match self.fallback.as_mut() {
            Some(agent) => agent.propose_selection(state, role, options),
            None => options
                .iter()
                .find(|a| a.eligible)
                .map(|a| Selection::new(role, a.operator.name.clone(), 1.0)),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
