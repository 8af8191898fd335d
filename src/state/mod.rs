// src/state/mod.rs

// Frontière de règlement : état faisant autorité et barrière de fraîcheur.
pub mod pool_ledger;

pub use pool_ledger::PoolLedger;
