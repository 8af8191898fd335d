// src/state/pool_ledger.rs

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{info, warn};

use crate::config::PoolConfig;
use crate::curve::credit_math::{borrow, BorrowOutcome};
use crate::curve::ConstantProduct;
use crate::error::{CreditError, Result};
use crate::execution::ExecutionParams;

/// État faisant autorité d'un pool, côté règlement. Les lectures sont sans verrou ;
/// une écriture n'aboutit que si les réserves n'ont pas bougé depuis le snapshot.
#[derive(Clone)]
pub struct PoolLedger {
    pool: PoolConfig,
    state: Arc<ArcSwap<ConstantProduct>>,
}

impl PoolLedger {
    pub fn new(pool: PoolConfig, initial: ConstantProduct) -> Self {
        Self { pool, state: Arc::new(ArcSwap::from_pointee(initial)) }
    }

    pub fn pool(&self) -> &PoolConfig {
        &self.pool
    }

    /// Retourne un instantané (`Arc`) des réserves courantes.
    pub fn snapshot(&self) -> Arc<ConstantProduct> {
        self.state.load_full()
    }

    /// Compare-and-swap : `StateChanged` si les réserves diffèrent de `expected`
    /// ou sont remplacées entre la lecture et l'écriture.
    pub fn commit(&self, expected: &ConstantProduct, next: ConstantProduct) -> Result<()> {
        let current = self.state.load_full();
        if *current != *expected {
            warn!(expected_x = %expected.x, current_x = %current.x, "stale snapshot rejected");
            return Err(CreditError::StateChanged);
        }
        let previous = self.state.compare_and_swap(&current, Arc::new(next));
        if !Arc::ptr_eq(&previous, &current) {
            warn!("concurrent write detected, commit rejected");
            return Err(CreditError::StateChanged);
        }
        Ok(())
    }

    /// Rejoue une proposition d'emprunt sur les réserves courantes puis la valide.
    /// Le moteur ne réessaie jamais : recalculer et resoumettre revient à l'appelant.
    pub fn apply_borrow(&self, params: &ExecutionParams, now: u64) -> Result<BorrowOutcome> {
        if params.maturity != self.pool.maturity {
            return Err(CreditError::InvalidParameter("proposal targets another maturity"));
        }
        let current = self.snapshot();
        if *current != params.snapshot {
            warn!(
                snapshot_x = %params.snapshot.x,
                current_x = %current.x,
                "proposal computed on a stale snapshot"
            );
            return Err(CreditError::StateChanged);
        }

        let delta = &params.delta;
        let outcome = borrow(&self.pool, &current, delta.x_decrease, delta.y_increase, delta.z_increase, now)?;
        if outcome.due_out.debt > params.max_debt {
            return Err(CreditError::SlippageExceeded("debt"));
        }
        if outcome.due_out.collateral > params.max_collateral {
            return Err(CreditError::SlippageExceeded("collateral"));
        }

        self.commit(&current, outcome.state)?;
        info!(asset_out = %outcome.asset_out, debt = %outcome.due_out.debt, "borrow settled");
        Ok(outcome)
    }
}
