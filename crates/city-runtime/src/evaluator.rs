//! Win/loss evaluation, run once per turn after background systems settle.

use city_core::{CityState, GameStatus, Tuning};

/// Absolute head count for a fractional threshold of the baseline.
fn threshold(baseline: u64, fraction: f64) -> u64 {
    (baseline as f64 * fraction - 1e-9).ceil().max(0.0) as u64
}

/// First matching condition wins:
/// support collapse, legal pressure, homelessness regression, victory.
///
/// Regression and victory are relative to `baseline_homeless`; with a zero
/// baseline neither can be measured and only the absolute losses apply.
pub fn evaluate(state: &CityState, tuning: &Tuning) -> GameStatus {
    let baseline = state.baseline_homeless;
    if state.public_support <= 0.0 {
        GameStatus::LostSupport
    } else if state.legal_pressure >= tuning.legal_limit {
        GameStatus::LostLegal
    } else if baseline == 0 {
        GameStatus::InProgress
    } else if state.homeless_total
        >= baseline.saturating_add(threshold(baseline, tuning.regression_threshold))
    {
        GameStatus::LostHomelessness
    } else if baseline.saturating_sub(state.homeless_total) >= threshold(baseline, tuning.win_reduction)
        && state.public_support > tuning.win_support
        && state.legal_pressure < tuning.legal_limit
    {
        GameStatus::Won
    } else {
        GameStatus::InProgress
    }
}
