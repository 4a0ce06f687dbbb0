//! Poisson fluctuation of expected bin contents.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Poisson};

/// Draw one Poisson sample per expectation.
///
/// With a seed the draw is deterministic; without one the generator is seeded from the OS.
/// Expectations that are not finite and positive draw `0` (the `λ → 0` limit).
pub fn poisson_fluctuate(expected: &[f64], seed: Option<u64>) -> Vec<f64> {
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };
    let degenerate = expected.iter().filter(|&&lam| !lam.is_finite() || lam < 0.0).count();
    if degenerate > 0 {
        log::warn!(
            "poisson_fluctuate: {} bins with negative or non-finite mean drawn as 0",
            degenerate
        );
    }
    expected
        .iter()
        .map(|&lam| {
            if !lam.is_finite() || lam <= 0.0 {
                return 0.0;
            }
            match Poisson::new(lam) {
                Ok(pois) => pois.sample(&mut rng),
                Err(_) => 0.0,
            }
        })
        .collect()
}
