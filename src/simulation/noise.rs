//! Complex AWGN for synthetic captures

use num::complex::Complex64;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use snafu::ResultExt;

use crate::error::{NoiseModelSnafu, Result};

/// Mean power `E|x|^2` of a signal (0 for an empty slice)
pub fn mean_power(signal: &[Complex64]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    signal.iter().map(|c| c.norm_sqr()).sum::<f64>() / signal.len() as f64
}

/// Noise power giving `snr_db` against a signal of power `signal_power`
pub fn noise_power_for_snr(signal_power: f64, snr_db: f64) -> f64 {
    signal_power / 10f64.powf(snr_db / 10.0)
}

/// Add circular complex Gaussian noise of total power `noise_power`
pub fn add_awgn<R: Rng + ?Sized>(samples: &mut [Complex64], noise_power: f64, rng: &mut R) -> Result<()> {
    // Power is split evenly between I and Q
    let normal = Normal::new(0.0, (noise_power / 2.0).sqrt()).context(NoiseModelSnafu)?;
    for s in samples.iter_mut() {
        *s += Complex64::new(normal.sample(rng), normal.sample(rng));
    }
    Ok(())
}
