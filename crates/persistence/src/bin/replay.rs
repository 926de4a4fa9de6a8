#![deny(warnings)]

use anyhow::Context;
use persistence::{default_log_path, SessionSummary, SnapshotLog};

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| default_log_path().to_string());
    let snaps = SnapshotLog::read_all(&path).with_context(|| format!("reading {path}"))?;
    let Some(summary) = SessionSummary::from_snapshots(&snaps) else {
        println!("{path}: empty session log");
        return Ok(());
    };

    for s in &snaps {
        println!(
            "turn {:>3} | {} | homeless {:>6} (sheltered {:>5}) | support {:>5.1} | legal {:>4.1} | beds {:>5}{}",
            s.turn_number,
            s.date,
            s.homeless_total,
            s.sheltered,
            s.public_support,
            s.legal_pressure,
            s.bed_capacity,
            s.last_event
                .as_deref()
                .map(|e| format!(" | event: {e}"))
                .unwrap_or_default()
        );
    }
    println!(
        "Session | turns: {} | homeless: {} -> {} | min support: {:.1} | max legal: {:.1} | events: {} | status: {}",
        summary.turns,
        summary.homeless_start,
        summary.homeless_end,
        summary.min_support,
        summary.max_legal_pressure,
        summary.events.len(),
        summary.final_status
    );
    Ok(())
}
