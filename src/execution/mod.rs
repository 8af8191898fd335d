// src/execution/mod.rs

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::PoolConfig;
use crate::curve::credit_math::borrow;
use crate::curve::{ConstantProduct, Percent};
use crate::error::Result;
use crate::math::{serde_u256, U256};
use crate::strategies::{find_asset_out, BorrowDelta, TargetRatio};

/// Proposition d'emprunt remise à la couche de règlement. Elle transporte le
/// snapshot exact qui a servi au calcul : toute divergence sera refusée.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionParams {
    pub maturity: u64,
    #[serde(with = "serde_u256")]
    pub asset_out: U256,
    #[serde(with = "serde_u256")]
    pub max_debt: U256,
    #[serde(with = "serde_u256")]
    pub max_collateral: U256,
    pub snapshot: ConstantProduct,
    pub delta: BorrowDelta,
}

/// Solveur, puis emprunt complet sur le même snapshot : `max_debt` et
/// `max_collateral` sont exactement la `Due` calculée.
#[instrument(name = "plan_borrow", skip_all, fields(maturity = pool.maturity, percent = percent.0))]
pub fn plan_borrow(
    pool: &PoolConfig,
    state: &ConstantProduct,
    target: &TargetRatio,
    increment: U256,
    percent: Percent,
    now: u64,
) -> Result<ExecutionParams> {
    let solution = find_asset_out(pool, state, target, increment, percent, now)?;
    let delta = solution.delta;
    let outcome = borrow(pool, state, delta.x_decrease, delta.y_increase, delta.z_increase, now)?;

    info!(
        asset_out = %outcome.asset_out,
        max_debt = %outcome.due_out.debt,
        max_collateral = %outcome.due_out.collateral,
        cdp = %solution.cdp,
        "borrow planned"
    );

    Ok(ExecutionParams {
        maturity: pool.maturity,
        asset_out: outcome.asset_out,
        max_debt: outcome.due_out.debt,
        max_collateral: outcome.due_out.collateral,
        snapshot: *state,
        delta,
    })
}
