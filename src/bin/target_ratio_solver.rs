// src/bin/target_ratio_solver.rs

use anyhow::{Context, Result};
use credit_mev::{
    config::{Config, PoolConfig},
    curve::{ConstantProduct, Percent},
    error::CreditError,
    execution::{plan_borrow, ExecutionParams},
    math::{serde_u256, PriceFeed, U256},
    monitoring::logging,
    strategies::TargetRatio,
};
use serde::Deserialize;
use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info, warn};

/// Une entrée du fichier de jobs.
#[derive(Deserialize, Debug, Clone)]
struct SolveJob {
    name: String,
    pool: PoolConfig,
    state: ConstantProduct,
    prices: PriceFeed,
    target_ratio: u64,
    #[serde(with = "serde_u256")]
    increment: U256,
    #[serde(default)]
    percent: Option<u32>,
    #[serde(default)]
    now: Option<u64>,
}

fn load_jobs(path: &str) -> Result<Vec<SolveJob>> {
    let data = fs::read_to_string(path).with_context(|| format!("Impossible de lire le fichier de jobs {path}"))?;
    serde_json::from_str(&data).with_context(|| format!("Fichier de jobs invalide : {path}"))
}

fn unix_now() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH).context("Horloge système avant 1970")?.as_secs())
}

fn solve(job: &SolveJob, config: &Config, now: u64) -> std::result::Result<ExecutionParams, CreditError> {
    let target = TargetRatio {
        target_ratio: job.target_ratio,
        margin_percent: config.margin_percent,
        prices: job.prices,
    };
    let percent = Percent(job.percent.unwrap_or(config.percent));
    plan_borrow(&job.pool, &job.state, &target, job.increment, percent, job.now.unwrap_or(now))
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    logging::setup_logging(config.json_logs);

    let jobs = load_jobs(&config.jobs_path)?;
    let now = unix_now()?;
    info!(jobs = jobs.len(), path = %config.jobs_path, "starting target ratio solves");

    // Résolutions pures et indépendantes : une tâche bloquante par job.
    let handles: Vec<_> = jobs
        .into_iter()
        .map(|job| {
            let config = config.clone();
            tokio::task::spawn_blocking(move || {
                let result = solve(&job, &config, now);
                (job.name, result)
            })
        })
        .collect();

    let mut failures = 0usize;
    for handle in handles {
        let (name, result) = handle.await.context("Une tâche de résolution a paniqué")?;
        match result {
            Ok(params) => {
                println!("{}", serde_json::to_string(&serde_json::json!({ "name": name, "params": params }))?);
            }
            Err(CreditError::SolutionNotFound) => {
                warn!(job = %name, "no borrow size reaches the target, retry with another margin or increment");
            }
            Err(e) => {
                error!(job = %name, error = %e, "solve failed");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} job(s) failed");
    }
    Ok(())
}
