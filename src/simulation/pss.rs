//! NR primary synchronization sequence synthesis
//!
//! `d(n) = 1 - 2 x((n + 43 * NID2) mod 127)` with the length-127 m-sequence
//! `x(i + 7) = (x(i + 4) + x(i)) mod 2`, `[x(6) .. x(0)] = [1 1 1 0 1 1 0]`.
//!
//! The sequence sits on subcarriers 56..=182 of the SS block, which is centered
//! in the carrier grid; the time-domain reference is one `nfft`-point OFDM
//! symbol without cyclic prefix.

use num::complex::Complex64;
use rustfft::FftPlanner;
use snafu::ensure;

use crate::config::CarrierConfig;
use crate::error::{InvalidConfigSnafu, Result};
use crate::reference::{ReferenceSequenceBank, NUM_GROUPS};

/// PSS length in subcarriers
pub const PSS_LENGTH: usize = 127;

/// First PSS subcarrier within the SS block
pub const PSS_FIRST_SUBCARRIER: usize = 56;

/// Cyclic shift between NID2 values
const NID2_SHIFT: usize = 43;

/// BPSK PSS symbols for `nid2` (values +1 / -1)
pub fn pss_symbols(nid2: u8) -> Vec<f64> {
    let mut x = [0u8; PSS_LENGTH];
    x[..7].copy_from_slice(&[0, 1, 1, 0, 1, 1, 1]);
    for i in 0..PSS_LENGTH - 7 {
        x[i + 7] = (x[i + 4] + x[i]) % 2;
    }

    (0..PSS_LENGTH)
        .map(|n| {
            let m = (n + NID2_SHIFT * usize::from(nid2)) % PSS_LENGTH;
            1.0 - 2.0 * f64::from(x[m])
        })
        .collect()
}

/// Time-domain PSS reference for `nid2` at `nfft` samples per symbol
///
/// Scaled by `1/sqrt(nfft)` so the sequence energy is 127.
pub fn pss_time_domain(nid2: u8, carrier: &CarrierConfig, nfft: usize) -> Result<Vec<Complex64>> {
    let n_sc = carrier.n_subcarriers() as usize;
    ensure!(
        nid2 < NUM_GROUPS as u8,
        InvalidConfigSnafu { reason: format!("NID2 {nid2} out of range") }
    );
    ensure!(
        n_sc >= PSS_FIRST_SUBCARRIER + PSS_LENGTH && n_sc <= nfft,
        InvalidConfigSnafu {
            reason: format!("grid of {n_sc} subcarriers cannot hold the PSS in a {nfft}-point FFT"),
        }
    );

    let mut grid = vec![Complex64::new(0.0, 0.0); nfft];
    let center = n_sc as isize / 2;
    for (i, &d) in pss_symbols(nid2).iter().enumerate() {
        let k = (PSS_FIRST_SUBCARRIER + i) as isize - center;
        grid[k.rem_euclid(nfft as isize) as usize] = Complex64::new(d, 0.0);
    }

    FftPlanner::new().plan_fft_inverse(nfft).process(&mut grid);

    let scale = 1.0 / (nfft as f64).sqrt();
    for s in grid.iter_mut() {
        *s *= scale;
    }
    Ok(grid)
}

/// Reference bank holding the three PSS sequences
pub fn generate_reference_bank(carrier: &CarrierConfig, nfft: usize) -> Result<ReferenceSequenceBank> {
    ReferenceSequenceBank::new([
        pss_time_domain(0, carrier, nfft)?,
        pss_time_domain(1, carrier, nfft)?,
        pss_time_domain(2, carrier, nfft)?,
    ])
}
