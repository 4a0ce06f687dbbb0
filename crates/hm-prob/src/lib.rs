//! Probability building blocks for HistoMap.
//!
//! This crate hosts the statistical functions histograms are scored and resampled with:
//! - the Poisson log-pmf for real-valued counts
//! - per-bin log-likelihood and chi-square metrics
//! - seeded Poisson fluctuation of expected bin contents

pub mod metrics;
pub mod poisson;
pub mod toys;

pub use metrics::{Metric, SMALL_POS, chi2, llh};
pub use toys::poisson_fluctuate;
