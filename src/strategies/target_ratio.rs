// src/strategies/target_ratio.rs

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::PoolConfig;
use crate::curve::{ConstantProduct, Percent};
use crate::error::{CreditError, Result};
use crate::math::full_math::{checked_add, checked_mul, checked_sub};
use crate::math::{calculate_cdp, PriceFeed, U256};
use crate::strategies::borrow_math::{borrow_limit, given_percent, BorrowDelta};

/// Objectif du solveur : un CDP (en pourcent) à `margin_percent` près.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRatio {
    pub target_ratio: u64,
    pub margin_percent: u64,
    pub prices: PriceFeed,
}

/// Taille d'emprunt retenue et le CDP qu'elle produit sur la courbe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Solution {
    pub asset_out: U256,
    pub delta: BorrowDelta,
    pub cdp: U256,
    pub iterations: u32,
}

// CDP de la courbe après un emprunt de `asset_out`.
fn cdp_after(
    pool: &PoolConfig,
    state: &ConstantProduct,
    asset_out: U256,
    percent: Percent,
    now: u64,
    prices: &PriceFeed,
) -> Result<(BorrowDelta, U256)> {
    let delta = given_percent(pool, state, asset_out, percent, now)?;
    let cdp = calculate_cdp(
        checked_sub(state.x, delta.x_decrease)?,
        checked_add(state.z, delta.z_increase)?,
        prices,
    )?;
    Ok((delta, cdp))
}

/// Recherche dichotomique d'un `asset_out = k * increment`, `k >= 1`, dans `]0, borrow_limit]`
/// dont le CDP tombe dans `[target * (1 - margin), target * (1 + margin)]`.
///
/// Le CDP croît avec la taille de l'emprunt (x baisse, z monte) : un CDP trop bas
/// envoie la recherche vers la moitié haute. Un emprunt nul n'est pas une transaction :
/// une cible déjà atteinte par la courbe intacte donne `SolutionNotFound`.
#[instrument(
    name = "target_ratio_solve",
    skip_all,
    fields(target = target.target_ratio, margin = target.margin_percent, percent = percent.0, increment = %increment)
)]
pub fn find_asset_out(
    pool: &PoolConfig,
    state: &ConstantProduct,
    target: &TargetRatio,
    increment: U256,
    percent: Percent,
    now: u64,
) -> Result<Solution> {
    if target.margin_percent > 100 {
        return Err(CreditError::InvalidParameter("margin above 100 percent"));
    }
    if increment.is_zero() {
        return Err(CreditError::ZeroAmount("increment"));
    }

    let hundred = U256::from(100u8);
    let target_ratio = U256::from(target.target_ratio);
    let lower = checked_mul(target_ratio, U256::from(100 - target.margin_percent))?;
    let upper = checked_mul(target_ratio, U256::from(100 + target.margin_percent))?;

    let limit = borrow_limit(pool, state, now)?;
    let mut left = U256::one();
    let mut right = limit / increment;
    let mut iterations = 0u32;

    while left <= right {
        iterations += 1;
        let mid = (left + right) >> 1;
        let asset_out = checked_mul(mid, increment)?;
        let (delta, cdp) = cdp_after(pool, state, asset_out, percent, now, &target.prices)?;
        debug!(%asset_out, %cdp, "bisection step");

        let scaled = checked_mul(cdp, hundred)?;
        if scaled >= lower && scaled <= upper {
            info!(%asset_out, %cdp, iterations, "target ratio reached");
            return Ok(Solution { asset_out, delta, cdp, iterations });
        }
        if cdp < target_ratio {
            left = mid + U256::one();
        } else {
            right = mid - U256::one();
        }
    }

    warn!(%limit, iterations, "search range exhausted without reaching the target");
    Err(CreditError::SolutionNotFound)
}
