// src/strategies/borrow_math.rs

use serde::{Deserialize, Serialize};

use crate::config::PoolConfig;
use crate::curve::credit_math::{borrow, BorrowOutcome};
use crate::curve::fees::{borrow_fee, gross_up};
use crate::curve::{ConstantProduct, Percent};
use crate::error::{CreditError, Result};
use crate::math::full_math::{
    checked_add, checked_mul, checked_sub, mul3_div_up, mul_div, mul_div_up, shift_right_up, sqrt_up_wide,
};
use crate::math::{serde_u256, U256};

// Marge de sécurité sur la limite d'emprunt : 99.5 %.
const LIMIT_NUMERATOR: u64 = 995;
const LIMIT_DENOMINATOR: u64 = 1_000;
const PERCENT_SHIFT: u32 = 31;

/// Deltas de réserves d'un emprunt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowDelta {
    #[serde(with = "serde_u256")]
    pub x_decrease: U256,
    #[serde(with = "serde_u256")]
    pub y_increase: U256,
    #[serde(with = "serde_u256")]
    pub z_increase: U256,
}

// sqrtUp(r^2 * x / xr) - r : mouvement de r qui conserve le produit, l'autre réserve fixe.
// Le carré passe par 512 bits : r peut dépasser 2^128.
fn curve_midpoint(reserve: U256, x: U256, x_reserve: U256) -> Result<U256> {
    let squared = mul3_div_up(reserve, reserve, x, x_reserve)?;
    checked_sub(sqrt_up_wide(squared)?, reserve)
}

// Réserve `other` telle que x * y * z soit conservé, arrondie vers le haut.
fn balancing_reserve(state: &ConstantProduct, x_reserve: U256, fixed: U256, fixed_increase: U256, other: U256) -> Result<U256> {
    mul_div_up(
        checked_mul(state.x, fixed)?,
        other,
        checked_mul(x_reserve, checked_add(fixed, fixed_increase)?)?,
    )
}

/// Interpolateur : pour un `asset_out` voulu, place l'emprunt entre le mouvement
/// minimal de y (`percent = 0`) et le mouvement minimal de z (`percent = MAX`).
///
/// Sous le pivot, y est interpolé entre `yMin` et `yMid` puis z en découle.
/// Au-dessus, z est interpolé entre 0 et `zMid` avec `2^32 - percent` et y en découle,
/// sans jamais repasser de l'autre côté du pivot.
pub fn given_percent(
    pool: &PoolConfig,
    state: &ConstantProduct,
    asset_out: U256,
    percent: Percent,
    now: u64,
) -> Result<BorrowDelta> {
    if asset_out.is_zero() {
        return Err(CreditError::ZeroAmount("asset_out"));
    }
    let x_decrease = gross_up(pool, asset_out, now)?;
    if x_decrease >= state.x {
        return Err(CreditError::InvariantViolation("borrow exhausts the asset reserve"));
    }
    let x_reserve = state.x - x_decrease;

    // Point pivot (yMid, zPivot), commun aux deux régimes.
    let y_mid = curve_midpoint(state.y, state.x, x_reserve)?;
    let z_pivot = checked_sub(balancing_reserve(state, x_reserve, state.y, y_mid, state.z)?, state.z)?;

    if percent <= Percent::PIVOT {
        let y_min = shift_right_up(mul_div_up(x_decrease, state.y, x_reserve)?, 4);
        if y_mid < y_min {
            return Err(CreditError::RateBoundTooLow("interest"));
        }
        let y_increase = checked_add(
            shift_right_up(checked_mul(y_mid - y_min, U256::from(percent.0))?, PERCENT_SHIFT),
            y_min,
        )?;
        let z_reserve = balancing_reserve(state, x_reserve, state.y, y_increase, state.z)?;
        let z_increase = checked_sub(z_reserve, state.z)?;
        Ok(BorrowDelta { x_decrease, y_increase, z_increase })
    } else {
        // Bornés par le pivot : les arrondis des deux régimes ne se croisent pas.
        let fraction = U256::from((1u64 << 32) - u64::from(percent.0));
        let z_mid = curve_midpoint(state.z, state.x, x_reserve)?;
        let z_increase = shift_right_up(checked_mul(z_mid, fraction)?, PERCENT_SHIFT).min(z_pivot);
        let y_reserve = balancing_reserve(state, x_reserve, state.z, z_increase, state.y)?;
        let y_increase = checked_sub(y_reserve, state.y)?.max(y_mid);
        Ok(BorrowDelta { x_decrease, y_increase, z_increase })
    }
}

/// Interpole puis exécute l'emprunt complet (contrôle d'invariant compris).
pub fn borrow_given_percent(
    pool: &PoolConfig,
    state: &ConstantProduct,
    asset_out: U256,
    percent: Percent,
    now: u64,
) -> Result<(BorrowDelta, BorrowOutcome)> {
    let delta = given_percent(pool, state, asset_out, percent, now)?;
    let outcome = borrow(pool, state, delta.x_decrease, delta.y_increase, delta.z_increase, now)?;
    Ok((delta, outcome))
}

/// Plus gros `asset_out` que le solveur explore : réserve nette des frais, moins 0.5 %.
pub fn borrow_limit(pool: &PoolConfig, state: &ConstantProduct, now: u64) -> Result<U256> {
    let fee = borrow_fee(pool, state.x, now)?;
    mul_div(checked_sub(state.x, fee)?, U256::from(LIMIT_NUMERATOR), U256::from(LIMIT_DENOMINATOR))
}
