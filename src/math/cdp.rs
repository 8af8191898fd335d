// src/math/cdp.rs

use serde::{Deserialize, Serialize};

use crate::error::{CreditError, Result};
use crate::math::full_math::{checked_mul, U256};
use crate::math::serde_u256;

// 10^77 est la plus grande puissance de dix représentable sur 256 bits.
const MAX_DECIMALS: u8 = 77;

/// Prix externes (déjà récupérés, ex : quote d'un DEX) dans une unité commune.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFeed {
    #[serde(with = "serde_u256")]
    pub asset_price: U256,
    #[serde(with = "serde_u256")]
    pub collateral_price: U256,
    pub asset_decimals: u8,
    pub collateral_decimals: u8,
}

fn pow10(decimals: u8) -> Result<U256> {
    if decimals > MAX_DECIMALS {
        return Err(CreditError::InvalidParameter("token decimals above 77"));
    }
    Ok(U256::exp10(decimals as usize))
}

/// Ratio de collatéralisation en pourcent, tronqué :
/// `100 * z * pc * 10^da / (x * pa * 10^dc)`.
pub fn calculate_cdp(x: U256, z: U256, prices: &PriceFeed) -> Result<U256> {
    let numerator = checked_mul(
        checked_mul(checked_mul(U256::from(100u8), z)?, prices.collateral_price)?,
        pow10(prices.asset_decimals)?,
    )?;
    let denominator = checked_mul(
        checked_mul(x, prices.asset_price)?,
        pow10(prices.collateral_decimals)?,
    )?;
    if denominator.is_zero() {
        return Err(CreditError::DivisionByZero);
    }
    Ok(numerator / denominator)
}
