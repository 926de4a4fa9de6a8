//! Capability interface for whatever chooses a role's action each turn.

use crate::registry::Availability;
use crate::{CityState, Role};
use serde::{Deserialize, Serialize};

/// One operator selection: the only input a turn accepts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub role: Role,
    pub operator: String,
    pub intensity: f64,
}

impl Selection {
    pub fn new(role: Role, operator: impl Into<String>, intensity: f64) -> Self {
        Self {
            role,
            operator: operator.into(),
            intensity,
        }
    }
}

/// A human prompt, script or learned policy acting for a scheduled role.
///
/// Returning `None` passes the turn. The engine re-prompts after a
/// recoverable error, so implementations should not assume the first
/// proposal is accepted.
pub trait RoleAgent {
    fn propose_selection(
        &mut self,
        state: &CityState,
        role: Role,
        options: &[Availability<'_>],
    ) -> Option<Selection>;

    /// Label used in logs and CLI output.
    fn name(&self) -> &str {
        "agent"
    }
}
