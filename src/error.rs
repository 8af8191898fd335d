// src/error.rs

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CreditError>;

/// Erreurs du moteur de courbe, du solveur et du ledger de règlement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreditError {
    #[error("pool matured: now {now} >= maturity {maturity}")]
    PoolMatured { now: u64, maturity: u64 },

    #[error("pool still active: now {now} < maturity {maturity}")]
    PoolActive { now: u64, maturity: u64 },

    #[error("{0} must be non-zero")]
    ZeroAmount(&'static str),

    #[error("invariant violation: {0}")]
    InvariantViolation(&'static str),

    #[error("{0} reserve increase exceeds the curve bound")]
    RateBoundExceeded(&'static str),

    #[error("{0} reserve increase below the minimum bound")]
    RateBoundTooLow(&'static str),

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("division by zero")]
    DivisionByZero,

    #[error("liquidity in exceeds total liquidity")]
    InsufficientLiquidity,

    #[error("repayment exceeds outstanding debt")]
    ExcessRepayment,

    #[error("slippage exceeded: {0}")]
    SlippageExceeded(&'static str),

    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("no borrow size within the search range reaches the target ratio")]
    SolutionNotFound,

    #[error("pool state changed since the snapshot was taken")]
    StateChanged,
}

impl CreditError {
    /// `true` pour les issues attendues que l'appelant peut retenter
    /// (autre marge, autre incrément, nouveau snapshot).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CreditError::SolutionNotFound | CreditError::StateChanged)
    }
}
