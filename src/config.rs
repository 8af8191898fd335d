use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::curve::Percent;
use crate::error::CreditError;
use crate::math::U256;

/// Base des taux de frais : 2^40.
pub const DEFAULT_FEE_BASE: u64 = 1 << 40;

fn default_fee_base() -> u64 {
    DEFAULT_FEE_BASE
}

/// Taux de frais par seconde jusqu'à maturité, immuables pour la vie d'un pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeParameters {
    pub lp_fee: u64,
    pub protocol_fee: u64,
    pub staking_fee: u64,
    #[serde(default = "default_fee_base")]
    pub base: u64,
}

impl FeeParameters {
    pub fn new(lp_fee: u64, protocol_fee: u64, staking_fee: u64) -> Self {
        Self { lp_fee, protocol_fee, staking_fee, base: DEFAULT_FEE_BASE }
    }

    pub fn total_fee(&self) -> U256 {
        U256::from(self.lp_fee) + U256::from(self.protocol_fee) + U256::from(self.staking_fee)
    }
}

/// Paramètres d'un pool pour un bucket de maturité. Passés explicitement
/// à chaque appel du moteur : plusieurs pools peuvent partager le même code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub fees: FeeParameters,
    pub maturity: u64,
}

impl PoolConfig {
    pub fn new(fees: FeeParameters, maturity: u64) -> Self {
        Self { fees, maturity }
    }

    /// Durée restante `maturity - now`, refusée à partir de la maturité.
    pub fn duration(&self, now: u64) -> std::result::Result<u64, CreditError> {
        if now >= self.maturity {
            return Err(CreditError::PoolMatured { now, maturity: self.maturity });
        }
        Ok(self.maturity - now)
    }

    pub fn ensure_matured(&self, now: u64) -> std::result::Result<(), CreditError> {
        if now < self.maturity {
            return Err(CreditError::PoolActive { now, maturity: self.maturity });
        }
        Ok(())
    }
}

fn default_margin_percent() -> u64 {
    1
}

fn default_percent() -> u32 {
    Percent::PIVOT.0
}

/// Configuration du processus, lue depuis l'environnement (et un éventuel `.env`).
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub jobs_path: String,
    #[serde(default = "default_margin_percent")]
    pub margin_percent: u64,
    #[serde(default = "default_percent")]
    pub percent: u32,
    #[serde(default)]
    pub json_logs: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>().context("Failed to read solver configuration from environment")?;
        Ok(config)
    }
}
