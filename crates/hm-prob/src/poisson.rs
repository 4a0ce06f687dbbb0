//! Poisson distribution utilities.

use hm_core::{Error, Result};
use statrs::function::gamma::ln_gamma;

/// Log-PMF of a Poisson distribution with mean `lambda` at count `k`.
///
/// `k` is real-valued: histogram contents are weighted sums and need not be integers, so
/// `k!` is continued through `Γ(k + 1)`.
pub fn logpmf(k: f64, lambda: f64) -> Result<f64> {
    if !lambda.is_finite() || lambda < 0.0 {
        return Err(Error::Validation(format!("lambda must be finite and >= 0, got {}", lambda)));
    }
    if !k.is_finite() || k < 0.0 {
        return Err(Error::Validation(format!("k must be finite and >= 0, got {}", k)));
    }
    if lambda == 0.0 {
        return Ok(if k == 0.0 { 0.0 } else { f64::NEG_INFINITY });
    }
    Ok(k * lambda.ln() - lambda - ln_gamma(k + 1.0))
}
