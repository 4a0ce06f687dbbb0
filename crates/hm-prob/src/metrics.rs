//! Per-bin goodness-of-fit metrics between observed and expected histogram contents.

use std::fmt;
use std::str::FromStr;

use hm_core::{Error, Result};

use crate::poisson;

/// Floor applied to expectations so empty bins do not produce `ln(0)` or division by zero.
pub const SMALL_POS: f64 = 1e-10;

/// Which metric to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Poisson log-likelihood (larger is better).
    Llh,
    /// Pearson chi-square (smaller is better).
    Chi2,
}

impl Metric {
    /// Lower-case identifier (`"llh"` / `"chi2"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Llh => "llh",
            Metric::Chi2 => "chi2",
        }
    }

    /// Evaluate the metric bin by bin.
    pub fn per_bin(&self, actual: &[f64], expected: &[f64]) -> Result<Vec<f64>> {
        match self {
            Metric::Llh => llh(actual, expected),
            Metric::Chi2 => chi2(actual, expected),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "llh" => Ok(Metric::Llh),
            "chi2" => Ok(Metric::Chi2),
            _ => Err(Error::Validation(format!(
                "metric \"{}\" not recognized; use either \"chi2\" or \"llh\"",
                s
            ))),
        }
    }
}

fn check_lengths(actual: &[f64], expected: &[f64]) -> Result<()> {
    if actual.len() != expected.len() {
        return Err(Error::Validation(format!(
            "actual/expected length mismatch: {} vs {}",
            actual.len(),
            expected.len()
        )));
    }
    Ok(())
}

/// Per-bin Poisson log-likelihood `k ln(λ) - λ - ln Γ(k + 1)`.
///
/// Expectations are clamped below at [`SMALL_POS`]. Negative observed contents are treated
/// as zero counts. Infinite contents on either side are rejected by [`poisson::logpmf`].
pub fn llh(actual: &[f64], expected: &[f64]) -> Result<Vec<f64>> {
    check_lengths(actual, expected)?;
    actual
        .iter()
        .zip(expected)
        .map(|(&k, &lam)| poisson::logpmf(k.max(0.0), lam.max(SMALL_POS)))
        .collect()
}

/// Per-bin Pearson chi-square `(actual - expected)² / expected`.
///
/// Expectations are clamped below at [`SMALL_POS`].
pub fn chi2(actual: &[f64], expected: &[f64]) -> Result<Vec<f64>> {
    check_lengths(actual, expected)?;
    Ok(actual
        .iter()
        .zip(expected)
        .map(|(&a, &e)| {
            let e = e.max(SMALL_POS);
            let d = a - e;
            d * d / e
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_llh_matches_poisson_logpmf() {
        let actual = [0.0, 3.0, 7.0];
        let expected = [1.5, 2.5, 8.0];
        let per_bin = llh(&actual, &expected).unwrap();
        for i in 0..3 {
            let lp = poisson::logpmf(actual[i], expected[i]).unwrap();
            assert_relative_eq!(per_bin[i], lp, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_llh_clamps_empty_expectation() {
        let per_bin = llh(&[0.0], &[0.0]).unwrap();
        assert!(per_bin[0].is_finite());
        assert!((per_bin[0] + SMALL_POS).abs() < 1e-12);
    }

    #[test]
    fn test_llh_clamps_before_poisson_logpmf() {
        let per_bin = llh(&[-2.0, 0.0, 4.0], &[0.0, -3.0, 0.0]).unwrap();
        let empty = poisson::logpmf(0.0, SMALL_POS).unwrap();
        assert_eq!(per_bin[0], empty);
        assert_eq!(per_bin[1], empty);
        assert_eq!(per_bin[2], poisson::logpmf(4.0, SMALL_POS).unwrap());
        assert!(per_bin[2] < per_bin[0]);
    }

    #[test]
    fn test_llh_rejects_infinite_contents() {
        assert!(matches!(llh(&[1.0], &[f64::INFINITY]), Err(Error::Validation(_))));
        assert!(matches!(llh(&[f64::INFINITY], &[1.0]), Err(Error::Validation(_))));
    }

    #[test]
    fn test_chi2() {
        let per_bin = chi2(&[3.0, 4.0], &[2.0, 4.0]).unwrap();
        assert_relative_eq!(per_bin[0], 0.5, epsilon = 1e-12);
        assert_eq!(per_bin[1], 0.0);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(llh(&[1.0, 2.0], &[1.0]).is_err());
        assert!(chi2(&[1.0], &[]).is_err());
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("LLH".parse::<Metric>().unwrap(), Metric::Llh);
        assert_eq!("chi2".parse::<Metric>().unwrap(), Metric::Chi2);
        assert!(matches!("mse".parse::<Metric>(), Err(Error::Validation(_))));
        assert_eq!(Metric::Chi2.to_string(), "chi2");
    }
}
