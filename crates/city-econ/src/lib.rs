#![deny(warnings)]

//! Background systems that run automatically at the end of every turn.
//!
//! Each module mutates a borrowed [`CityState`](city_core::CityState) and
//! restores its invariants before returning. None of them can fail: they are
//! unconditionally applicable once an operator has resolved (or the role
//! passed). Stochastic systems take any `rand::Rng` and consume exactly one
//! uniform draw per call so that a seeded session replays bit for bit.

pub mod budget;
pub mod construction;
pub mod events;
pub mod fatigue;
pub mod pressure;

pub use budget::{settle, Settlement};
pub use construction::{advance, enqueue};
pub use events::{maybe_trigger, trigger_with_draw, FiredEvent};
pub use fatigue::{apply_drift, record_risk, success_factor, update_fatigue, Drift};
pub use pressure::{apply_pressure, apply_pressure_with_draw, PressureReport};

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use city_core::CityState;

    pub fn state() -> CityState {
        CityState::initial(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
    }
}
