#![deny(warnings)]

//! Persistence layer: append-only per-turn snapshot log for replay.
//!
//! One JSON object per line, written in turn order. The log is the only
//! thing persisted; a session is reconstructed for display by reading it
//! back, never by re-running the engine.

use city_core::{GameStatus, Snapshot};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("snapshot log I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot log line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Default location for session logs.
pub fn default_log_path() -> &'static str {
    "./saves/session.jsonl"
}

/// Append-only JSON-lines writer.
pub struct SnapshotLog {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl SnapshotLog {
    /// Create (or truncate) a log, creating parent directories as needed.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        Self::open_with(path.as_ref(), false)
    }

    /// Open an existing log for appending, creating it if missing.
    pub fn open_append(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        Self::open_with(path.as_ref(), true)
    }

    fn open_with(path: &Path, append: bool) -> Result<Self, PersistError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn append(&mut self, snapshot: &Snapshot) -> Result<(), PersistError> {
        serde_json::to_writer(&mut self.writer, snapshot)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        debug!(turn = snapshot.turn_number, path = %self.path.display(), "snapshot appended");
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), PersistError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Snapshots appended through this handle.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every snapshot in a log, in order. Blank lines are skipped.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<Snapshot>, PersistError> {
        let reader = BufReader::new(File::open(path)?);
        let mut out = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let snap = serde_json::from_str(&line).map_err(|source| PersistError::Json {
                line: idx + 1,
                source,
            })?;
            out.push(snap);
        }
        Ok(out)
    }
}

impl Drop for SnapshotLog {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Headline numbers of a recorded session.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSummary {
    pub turns: usize,
    pub first_turn: u64,
    pub last_turn: u64,
    pub homeless_start: u64,
    pub homeless_end: u64,
    pub min_support: f64,
    pub max_legal_pressure: f64,
    pub events: Vec<(u64, String)>,
    pub final_status: GameStatus,
}

impl SessionSummary {
    /// `None` for an empty log.
    pub fn from_snapshots(snaps: &[Snapshot]) -> Option<Self> {
        let first = snaps.first()?;
        let last = snaps.last()?;
        Some(Self {
            turns: snaps.len(),
            first_turn: first.turn_number,
            last_turn: last.turn_number,
            homeless_start: first.trend_history.first().copied().unwrap_or(first.homeless_total),
            homeless_end: last.homeless_total,
            min_support: snaps.iter().map(|s| s.public_support).fold(f64::INFINITY, f64::min),
            max_legal_pressure: snaps.iter().map(|s| s.legal_pressure).fold(0.0, f64::max),
            events: snaps
                .iter()
                .filter_map(|s| s.last_event.clone().map(|e| (s.turn_number, e)))
                .collect(),
            final_status: last.game_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use city_core::CityState;
    use proptest::prelude::*;

    fn snap(turn: u64, homeless: u64, status: GameStatus, event: Option<&str>) -> Snapshot {
        let mut state = CityState::initial(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        state.turn_number = turn;
        state.unsheltered = homeless - state.sheltered;
        state.public_support = 50.0 - turn as f64;
        state.clamp();
        Snapshot::capture(&state, status, None, event.map(String::from))
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("city-persistence-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn default_path_is_jsonl() {
        assert!(default_log_path().ends_with(".jsonl"));
    }

    #[test]
    fn append_then_read_back_in_order() {
        let path = temp_path("roundtrip.jsonl");
        {
            let mut log = SnapshotLog::create(&path).unwrap();
            log.append(&snap(1, 10_800, GameStatus::InProgress, None)).unwrap();
            log.append(&snap(2, 10_900, GameStatus::InProgress, Some("Cold Snap"))).unwrap();
            assert_eq!(log.written(), 2);
        }
        {
            let mut log = SnapshotLog::open_append(&path).unwrap();
            log.append(&snap(3, 11_000, GameStatus::LostSupport, None)).unwrap();
        }
        let snaps = SnapshotLog::read_all(&path).unwrap();
        let turns: Vec<_> = snaps.iter().map(|s| s.turn_number).collect();
        assert_eq!(turns, vec![1, 2, 3]);
        assert_eq!(snaps[1].last_event.as_deref(), Some("Cold Snap"));

        let summary = SessionSummary::from_snapshots(&snaps).unwrap();
        assert_eq!(summary.turns, 3);
        assert_eq!(summary.homeless_end, 11_000);
        assert_eq!(summary.final_status, GameStatus::LostSupport);
        assert_eq!(summary.events, vec![(2, "Cold Snap".to_string())]);
        assert_eq!(summary.min_support, 47.0);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn corrupt_line_reports_its_number() {
        let path = temp_path("corrupt.jsonl");
        {
            let mut log = SnapshotLog::create(&path).unwrap();
            log.append(&snap(1, 10_700, GameStatus::InProgress, None)).unwrap();
        }
        {
            let mut f = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(f, "{{not json").unwrap();
        }
        match SnapshotLog::read_all(&path) {
            Err(PersistError::Json { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {other:?}"),
        }
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn empty_log_has_no_summary() {
        assert!(SessionSummary::from_snapshots(&[]).is_none());
    }

    proptest! {
        #[test]
        fn summary_spans_the_whole_log(
            rows in proptest::collection::vec((4_000u64..20_000, any::<bool>()), 1..30)
        ) {
            let snaps: Vec<Snapshot> = rows
                .iter()
                .enumerate()
                .map(|(i, (homeless, fired))| {
                    let event = fired.then_some("Recession");
                    snap(i as u64 + 1, *homeless, GameStatus::InProgress, event)
                })
                .collect();
            let summary = SessionSummary::from_snapshots(&snaps).unwrap();
            prop_assert_eq!(summary.turns, rows.len());
            prop_assert_eq!(summary.first_turn, 1);
            prop_assert_eq!(summary.last_turn, rows.len() as u64);
            prop_assert_eq!(summary.homeless_end, snaps[snaps.len() - 1].homeless_total);
            prop_assert_eq!(
                summary.events.len(),
                rows.iter().filter(|(_, fired)| *fired).count()
            );
            for s in &snaps {
                prop_assert!(summary.min_support <= s.public_support);
                prop_assert!(summary.max_legal_pressure >= s.legal_pressure);
            }
        }
    }
}
