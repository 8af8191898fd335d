// src/curve/fees.rs

use crate::config::{FeeParameters, PoolConfig};
use crate::error::Result;
use crate::math::full_math::{checked_add, checked_mul, checked_sub, mul_div, mul_div_up};
use crate::math::U256;

// duration * totalFee + BASE
fn fee_numerator(fees: &FeeParameters, duration: u64) -> Result<U256> {
    checked_add(checked_mul(U256::from(duration), fees.total_fee())?, U256::from(fees.base))
}

/// Montant majoré des frais jusqu'à maturité : `ceil(amount * (duration * totalFee + BASE) / BASE)`.
pub fn gross_up(pool: &PoolConfig, amount: U256, now: u64) -> Result<U256> {
    let duration = pool.duration(now)?;
    mul_div_up(amount, fee_numerator(&pool.fees, duration)?, U256::from(pool.fees.base))
}

/// Frais payés en plus d'un prêt de `x_increase`.
pub fn lend_fee(pool: &PoolConfig, x_increase: U256, now: u64) -> Result<U256> {
    let adjusted = gross_up(pool, x_increase, now)?;
    checked_sub(adjusted, x_increase)
}

/// Frais retenus sur un emprunt de `x_decrease` :
/// `x_decrease - floor(x_decrease * BASE / (duration * totalFee + BASE))`.
pub fn borrow_fee(pool: &PoolConfig, x_decrease: U256, now: u64) -> Result<U256> {
    let duration = pool.duration(now)?;
    let adjusted = mul_div(x_decrease, U256::from(pool.fees.base), fee_numerator(&pool.fees, duration)?)?;
    checked_sub(x_decrease, adjusted)
}

/// Répartition d'un montant de frais entre LP, protocole et staking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeeSplit {
    pub lp: U256,
    pub protocol: U256,
    pub staking: U256,
}

/// Parts protocole et staking arrondies à l'inférieur, le reste va aux LP.
pub fn split_fee(fees: &FeeParameters, amount: U256) -> Result<FeeSplit> {
    let total = fees.total_fee();
    if total.is_zero() {
        return Ok(FeeSplit { lp: amount, ..FeeSplit::default() });
    }
    let protocol = mul_div(amount, U256::from(fees.protocol_fee), total)?;
    let staking = mul_div(amount, U256::from(fees.staking_fee), total)?;
    let lp = checked_sub(checked_sub(amount, protocol)?, staking)?;
    Ok(FeeSplit { lp, protocol, staking })
}
