//! Turn orchestration.

use crate::evaluator::evaluate;
use crate::resolution::{resolve, ResolutionResult};
use crate::scheduler::{next_role, record_outcome};
use city_core::{
    Availability, CityState, ConstructionProject, GameStatus, LastOutcome, OperatorRegistry,
    Role, RoleAgent, Selection, SimConfig, SimError, Snapshot, Tuning,
};
use city_econ::{
    advance, apply_drift, apply_pressure, maybe_trigger, settle, update_fatigue, Drift,
    PressureReport, Settlement,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything that happened during one completed turn.
#[derive(Clone, Debug, Serialize)]
pub struct TurnReport {
    /// Turn number the report describes (before the clock advanced).
    pub turn: u64,
    pub role: Role,
    /// `None` when the role passed.
    pub resolution: Option<ResolutionResult>,
    pub completed: Vec<ConstructionProject>,
    pub settlement: Settlement,
    pub event: Option<String>,
    pub pressure: PressureReport,
    pub fatigue_delta: f64,
    pub drift: Option<Drift>,
    pub status: GameStatus,
}

/// Owns the city state and the session RNG for one game.
///
/// A turn is `begin_turn`, then either `submit` with a selection or `pass`
/// when nothing is eligible. Recoverable errors leave the turn open so the
/// caller can try again.
pub struct TurnEngine {
    state: CityState,
    registry: Arc<OperatorRegistry>,
    tuning: Tuning,
    rng: ChaCha8Rng,
    status: GameStatus,
    last_outcome: Option<LastOutcome>,
    last_event: Option<String>,
}

impl TurnEngine {
    pub fn new(config: &SimConfig, registry: Arc<OperatorRegistry>) -> Self {
        Self::with_state(config, registry, CityState::initial(config.start_date))
    }

    /// Start from an arbitrary state, e.g. a scenario fixture.
    pub fn with_state(config: &SimConfig, registry: Arc<OperatorRegistry>, state: CityState) -> Self {
        info!(
            seed = config.rng_seed,
            start = %config.start_date,
            operators = registry.len(),
            "session started"
        );
        Self {
            state,
            registry,
            tuning: config.tuning.clone(),
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            status: GameStatus::InProgress,
            last_outcome: None,
            last_event: None,
        }
    }

    pub fn state(&self) -> &CityState {
        &self.state
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Role scheduled for the open turn, if any.
    pub fn current_role(&self) -> Option<Role> {
        self.state.role_rotation.current
    }

    /// Schedule the acting role. Calling it again before the turn completes
    /// returns the same role without drawing.
    pub fn begin_turn(&mut self) -> Result<Role, SimError> {
        self.ensure_running()?;
        if let Some(role) = self.state.role_rotation.current {
            return Ok(role);
        }
        let role = next_role(&mut self.state, &mut self.rng);
        info!(turn = self.state.turn_number, role = %role, "turn begins");
        Ok(role)
    }

    /// Operators of the scheduled role with eligibility and reasons.
    pub fn options(&self) -> Vec<Availability<'_>> {
        match self.state.role_rotation.current {
            Some(role) => self.registry.available(role, &self.state),
            None => Vec::new(),
        }
    }

    /// Resolve the selection and run the rest of the turn.
    pub fn submit(&mut self, selection: &Selection) -> Result<TurnReport, SimError> {
        self.ensure_running()?;
        let role = self.scheduled()?;
        if selection.role != role {
            return Err(SimError::InvalidSelection(format!(
                "{} is not scheduled this turn ({} is)",
                selection.role, role
            )));
        }
        let registry = Arc::clone(&self.registry);
        let op = registry
            .get(&selection.operator)
            .filter(|op| op.role == role)
            .ok_or_else(|| {
                SimError::InvalidSelection(format!(
                    "'{}' is not offered to {}",
                    selection.operator, role
                ))
            })?;
        let intensity = selection.intensity;
        if !intensity.is_finite()
            || intensity < self.tuning.min_intensity
            || intensity > self.tuning.max_intensity
        {
            return Err(SimError::InvalidSelection(format!(
                "intensity {intensity} outside [{}, {}]",
                self.tuning.min_intensity, self.tuning.max_intensity
            )));
        }

        let result = resolve(
            &mut self.state,
            role,
            op,
            intensity,
            &self.tuning,
            &mut self.rng,
        )?;
        record_outcome(&mut self.state, role, result.outcome, &self.tuning);
        self.last_outcome = Some(LastOutcome {
            role,
            operator: result.operator.clone(),
            outcome: result.outcome,
            deltas: result.deltas.clone(),
        });
        Ok(self.finish_turn(role, Some(result)))
    }

    /// Skip the scheduled role's action. Allowed only when nothing is eligible.
    pub fn pass(&mut self) -> Result<TurnReport, SimError> {
        self.ensure_running()?;
        let role = self.scheduled()?;
        if self.options().iter().any(|a| a.eligible) {
            return Err(SimError::InvalidSelection(format!(
                "{role} has eligible operators and cannot pass"
            )));
        }
        info!(turn = self.state.turn_number, role = %role, "role passes");
        self.last_outcome = None;
        Ok(self.finish_turn(role, None))
    }

    /// Run one full turn with `agent` choosing, re-prompting after
    /// recoverable errors up to `attempts` times.
    pub fn play_turn(
        &mut self,
        agent: &mut dyn RoleAgent,
        attempts: usize,
    ) -> Result<TurnReport, SimError> {
        let role = self.begin_turn()?;
        let mut last_err = None;
        for attempt in 0..attempts.max(1) {
            let proposal = {
                let options = self.options();
                agent.propose_selection(&self.state, role, &options)
            };
            let outcome = match proposal {
                Some(selection) => self.submit(&selection),
                None => self.pass(),
            };
            match outcome {
                Ok(report) => return Ok(report),
                Err(err) if err.is_recoverable() => {
                    warn!(agent = agent.name(), attempt, error = %err, "selection rejected");
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            SimError::InvalidSelection(format!("{} produced no selection", agent.name()))
        }))
    }

    /// Current state in the dashboard schema.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(
            &self.state,
            self.status,
            self.last_outcome.clone(),
            self.last_event.clone(),
        )
    }

    fn ensure_running(&self) -> Result<(), SimError> {
        if self.status.is_terminal() {
            Err(SimError::GameOver(self.status))
        } else {
            Ok(())
        }
    }

    fn scheduled(&self) -> Result<Role, SimError> {
        self.state.role_rotation.current.ok_or_else(|| {
            SimError::InvalidSelection("no role scheduled; call begin_turn first".into())
        })
    }

    /// Background systems, evaluation and the clock. Cannot fail.
    fn finish_turn(&mut self, role: Role, resolution: Option<ResolutionResult>) -> TurnReport {
        let turn = self.state.turn_number;
        let completed = advance(&mut self.state);
        let settlement = settle(&mut self.state, &self.tuning);
        let registry = Arc::clone(&self.registry);
        let event = maybe_trigger(&mut self.state, registry.events(), &mut self.rng)
            .map(|fired| fired.event.name.clone());
        let pressure = apply_pressure(&mut self.state, &self.tuning, &mut self.rng);
        let fatigue_delta = update_fatigue(&mut self.state, &self.tuning);
        let drift = apply_drift(&mut self.state, &self.tuning);

        self.status = evaluate(&self.state, &self.tuning);
        self.last_event = event.clone();
        self.state.advance_clock();

        info!(
            turn,
            homeless = self.state.homeless_total,
            support = self.state.public_support,
            legal = self.state.legal_pressure,
            status = %self.status,
            "turn complete"
        );
        if self.status.is_terminal() {
            info!(turn, status = %self.status, "game over");
        }
        TurnReport {
            turn,
            role,
            resolution,
            completed,
            settlement,
            event,
            pressure,
            fatigue_delta,
            drift,
            status: self.status,
        }
    }
}
