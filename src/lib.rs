// src/lib.rs

// Moteur de courbe d'un pool de crédit à maturité fixe, solveur de ratio cible
// et frontière de règlement. Utilisés par le binaire `target_ratio_solver`.
pub mod config;
pub mod curve;
pub mod error;
pub mod execution;
pub mod math;
pub mod monitoring;
pub mod state;
pub mod strategies;

pub use error::{CreditError, Result};
