#![deny(warnings)]

//! Headless CLI: play a seeded session with an AI strategy driving every role.

use anyhow::{bail, Context, Result};
use city_ai::{GreedyAgent, RandomAgent, ScriptedAgent};
use city_core::{OperatorRegistry, RoleAgent, SimConfig};
use city_runtime::TurnEngine;
use modkit::ModLoader;
use persistence::SnapshotLog;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    seed: Option<u64>,
    turns: Option<u32>,
    agent: Option<String>,
    script: Option<String>,
    config: Option<String>,
    mods: Option<String>,
    log: Option<String>,
    catalog: bool,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--turns" => args.turns = it.next().and_then(|s| s.parse().ok()),
            "--agent" => args.agent = it.next(),
            "--script" => args.script = it.next(),
            "--config" => args.config = it.next(),
            "--mods" => args.mods = it.next(),
            "--log" => args.log = it.next(),
            "--catalog" => args.catalog = true,
            other => warn!(arg = other, "ignoring unknown argument"),
        }
    }
    args
}

fn build_agent(args: &Args, config: &SimConfig) -> Result<Box<dyn RoleAgent>> {
    let name = args.agent.as_deref().unwrap_or("greedy");
    let agent: Box<dyn RoleAgent> = match name {
        "greedy" => Box::new(GreedyAgent::new(config.tuning.clone())),
        "punitive" => Box::new(GreedyAgent::punitive(config.tuning.clone())),
        "random" => Box::new(RandomAgent::new(
            config.rng_seed.wrapping_add(1),
            config.tuning.clone(),
        )),
        "scripted" => {
            let path = args
                .script
                .as_deref()
                .context("--agent scripted requires --script <file.yaml>")?;
            let script =
                ScriptedAgent::from_path(path).with_context(|| format!("loading {path}"))?;
            Box::new(script.with_fallback(GreedyAgent::new(config.tuning.clone())))
        }
        other => bail!("unknown agent '{other}' (greedy, punitive, random, scripted)"),
    };
    Ok(agent)
}

/// `RUST_LOG` directives when present and parseable, `info` otherwise.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn main() -> Result<()> {
    let filter = log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    let args = parse_args();
    info!(?args, build = env!("GIT_SHA"), built = env!("BUILD_DATE"), "starting CLI");

    let mut config = match &args.config {
        Some(path) => SimConfig::from_path(path).with_context(|| format!("loading {path}"))?,
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.rng_seed = seed;
    }

    let mut registry = OperatorRegistry::standard()?;
    if let Some(dir) = &args.mods {
        let mut loader = ModLoader::new(dir);
        let n = loader.load_all().with_context(|| format!("loading mods from {dir}"))?;
        registry = loader.apply(&registry)?;
        for m in loader.mods() {
            println!("Mod | {} | {}", m.label(), m.dir.display());
        }
        info!(mods = n, operators = registry.len(), "mods applied");
    }

    if args.catalog {
        for entry in registry.catalog() {
            println!(
                "{:<24} | {:<40} | {:<38} | {}",
                entry.role.display_name(),
                entry.operator,
                entry.cost_formula,
                entry.risk_level
            );
        }
        return Ok(());
    }

    let mut agent = build_agent(&args, &config)?;
    let mut log = match &args.log {
        Some(path) => Some(SnapshotLog::create(path).with_context(|| format!("creating {path}"))?),
        None => None,
    };

    let turns = args.turns.unwrap_or(24);
    let mut engine = TurnEngine::new(&config, Arc::new(registry));
    let start = engine.snapshot();
    let mut played = 0;
    for _ in 0..turns {
        let report = engine.play_turn(agent.as_mut(), 3)?;
        played += 1;
        if let Some(log) = log.as_mut() {
            log.append(&engine.snapshot())?;
        }
        if report.status.is_terminal() {
            break;
        }
    }
    if let Some(log) = log.as_mut() {
        log.flush()?;
    }

    let end = engine.snapshot();
    println!(
        "KPI | agent: {} | seed: {} | turns: {} | homeless: {} -> {} ({:+.1}%) | sheltered: {} | beds: {} | support: {:.1} | legal: {:.1} | fatigue: {:.1} | chronic: {}",
        agent.name(),
        config.rng_seed,
        played,
        start.homeless_total,
        end.homeless_total,
        engine.state().homeless_change_ratio() * 100.0,
        end.sheltered,
        end.bed_capacity,
        end.public_support,
        end.legal_pressure,
        end.policy_fatigue,
        end.chronic_unsheltered,
    );
    println!("Status | {}", end.game_status);
    if std::env::var_os("CITY_PRINT_SNAPSHOT").is_some() {
        println!("{}", serde_json::to_string_pretty(&end)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn log_level_defaults_to_info() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn rust_log_directives_govern_the_level() {
        assert_eq!(log_filter(Some("warn")).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(
            log_filter(Some("city_runtime=debug")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
    }
}
