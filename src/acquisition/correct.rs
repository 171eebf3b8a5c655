///! Frequency offset correction
///!
///! De-rotates a waveform by a candidate carrier offset:
///! `w'[n] = w[n] * exp(-j*2*pi*fshift*n/fs)`

use core::f64::consts::PI;

use num::complex::Complex64;
use snafu::ensure;

use super::FrequencyHypothesis;
use crate::error::{InvalidHypothesisSnafu, Result};
use crate::waveform::Waveform;

/// Return a copy of `waveform` shifted down by `fshift`
///
/// The input is left untouched. A zero shift reproduces the input exactly.
pub fn frequency_shift(waveform: &Waveform, fshift: FrequencyHypothesis) -> Result<Waveform> {
    let df = fshift.hz();
    ensure!(df.is_finite(), InvalidHypothesisSnafu { fshift: df });

    let fs = waveform.sample_rate();
    let corrected: Vec<Complex64> = waveform
        .samples()
        .iter()
        .enumerate()
        .map(|(n, &x)| {
            // Phase from the absolute sample time, no accumulated drift
            let t = n as f64 / fs;
            x * Complex64::cis(-2.0 * PI * df * t)
        })
        .collect();

    Waveform::new(corrected, fs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f64, fs: f64, len: usize) -> Waveform {
        let samples = (0..len)
            .map(|n| Complex64::cis(2.0 * PI * freq * n as f64 / fs))
            .collect();
        Waveform::new(samples, fs).unwrap()
    }

    #[test]
    fn test_zero_shift_is_identity() {
        let fs = 15.36e6;
        let w = tone(1234.5, fs, 2048);
        let out = frequency_shift(&w, FrequencyHypothesis(0.0)).unwrap();
        assert_eq!(out.len(), w.len());
        assert_eq!(out.sample_rate(), fs);
        for (a, b) in out.samples().iter().zip(w.samples()) {
            assert!((a - b).norm() < 1e-9);
        }
    }

    #[test]
    fn test_shift_removes_matching_tone() {
        let fs = 7.68e6;
        let w = tone(30_000.0, fs, 4096);
        let out = frequency_shift(&w, FrequencyHypothesis(30_000.0)).unwrap();
        // Tone mixed down to DC
        for s in out.samples() {
            assert!((s - Complex64::new(1.0, 0.0)).norm() < 1e-9, "sample {s}");
        }
    }

    #[test]
    fn test_shift_preserves_magnitude() {
        let fs = 15.36e6;
        let samples = (0..512).map(|n| Complex64::new(n as f64, -(n as f64) / 2.0)).collect();
        let w = Waveform::new(samples, fs).unwrap();
        let out = frequency_shift(&w, FrequencyHypothesis(45_000.0)).unwrap();
        for (a, b) in out.samples().iter().zip(w.samples()) {
            assert!((a.norm() - b.norm()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rejects_non_finite_shift() {
        let w = tone(0.0, 1e6, 8);
        assert!(frequency_shift(&w, FrequencyHypothesis(f64::NAN)).is_err());
    }
}
