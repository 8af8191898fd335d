// src/strategies/mod.rs

// Interpolation des formes d'emprunt et solveur de ratio cible.
pub mod borrow_math;
pub mod target_ratio;

pub use borrow_math::{borrow_given_percent, borrow_limit, given_percent, BorrowDelta};
pub use target_ratio::{find_asset_out, Solution, TargetRatio};
