// src/curve/mod.rs

pub mod credit_math;
pub mod fees;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::math::full_math::{checked_add, checked_sub, product3};
use crate::math::{serde_u256, U256, U768};

/// Réserves de la courbe pour une maturité : actif échangeable (x),
/// taux d'intérêt implicite par seconde (y), taux de collatéral implicite par seconde (z).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantProduct {
    #[serde(with = "serde_u256")]
    pub x: U256,
    #[serde(with = "serde_u256")]
    pub y: U256,
    #[serde(with = "serde_u256")]
    pub z: U256,
}

impl ConstantProduct {
    pub fn new(x: U256, y: U256, z: U256) -> Self {
        Self { x, y, z }
    }

    pub fn from_u128(x: u128, y: u128, z: u128) -> Self {
        Self::new(U256::from(x), U256::from(y), U256::from(z))
    }

    /// `x * y * z`, exact.
    pub fn product(&self) -> U768 {
        product3(self.x, self.y, self.z)
    }
}

/// Obligation d'un emprunteur, déjà ramenée à maturité.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Due {
    #[serde(with = "serde_u256")]
    pub debt: U256,
    #[serde(with = "serde_u256")]
    pub collateral: U256,
}

/// Créance d'un prêteur. Le pool suit aussi le total de toutes les créances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(with = "serde_u256")]
    pub loan_principal: U256,
    #[serde(with = "serde_u256")]
    pub loan_interest: U256,
    #[serde(with = "serde_u256")]
    pub coverage_principal: U256,
    #[serde(with = "serde_u256")]
    pub coverage_interest: U256,
}

impl Claims {
    /// Total dû aux prêteurs en actif (les "bonds").
    pub fn total_loan(&self) -> Result<U256> {
        checked_add(self.loan_principal, self.loan_interest)
    }

    /// Total de couverture payable en collatéral en cas de déficit.
    pub fn total_coverage(&self) -> Result<U256> {
        checked_add(self.coverage_principal, self.coverage_interest)
    }

    pub fn checked_add(&self, other: &Claims) -> Result<Claims> {
        Ok(Claims {
            loan_principal: checked_add(self.loan_principal, other.loan_principal)?,
            loan_interest: checked_add(self.loan_interest, other.loan_interest)?,
            coverage_principal: checked_add(self.coverage_principal, other.coverage_principal)?,
            coverage_interest: checked_add(self.coverage_interest, other.coverage_interest)?,
        })
    }

    pub fn checked_sub(&self, other: &Claims) -> Result<Claims> {
        Ok(Claims {
            loan_principal: checked_sub(self.loan_principal, other.loan_principal)?,
            loan_interest: checked_sub(self.loan_interest, other.loan_interest)?,
            coverage_principal: checked_sub(self.coverage_principal, other.coverage_principal)?,
            coverage_interest: checked_sub(self.coverage_interest, other.coverage_interest)?,
        })
    }

    pub fn is_zero(&self) -> bool {
        self.loan_principal.is_zero()
            && self.loan_interest.is_zero()
            && self.coverage_principal.is_zero()
            && self.coverage_interest.is_zero()
    }
}

/// Soldes réels détenus par le pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reserves {
    #[serde(with = "serde_u256")]
    pub asset: U256,
    #[serde(with = "serde_u256")]
    pub collateral: U256,
}

/// Point sur le continuum entre les deux formes d'emprunt canoniques,
/// en virgule fixe sur 32 bits. `PIVOT` (2^31) sépare les deux régimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Percent(pub u32);

impl Percent {
    /// Mouvement minimal de y : l'emprunt se paie surtout en collatéral.
    pub const ZERO: Percent = Percent(0);
    pub const PIVOT: Percent = Percent(0x8000_0000);
    /// Mouvement minimal de z : l'emprunt se paie surtout en intérêt.
    pub const MAX: Percent = Percent(u32::MAX);
}
