///! Valid-mode cross-correlation against the PSS references
///!
///! `c[k] = sum_{l=0}^{L-1} conj(r[l]) * w[k+l]` for `k` in `0..=M-L`.
///!
///! Long signals are correlated through one zero-padded FFT whose signal
///! spectrum is shared by all three references; small problems use the
///! direct sum.

use num::complex::Complex64;
use rustfft::FftPlanner;
use snafu::ensure;
use tracing::trace;

use super::CorrelationResult;
use crate::error::{DimensionSnafu, Result};
use crate::reference::{ReferenceSequenceBank, NUM_GROUPS};

/// Output-length * reference-length product below which the direct sum is used
const DIRECT_WORK_LIMIT: usize = 1 << 16;

/// Correlation engine holding a reusable FFT planner
///
/// One per worker; planners are not shared across threads.
pub struct Correlator {
    planner: FftPlanner<f64>,
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}

impl Correlator {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Full valid-mode correlation of `signal` with `reference`
    pub fn correlate(&mut self, signal: &[Complex64], reference: &[Complex64]) -> Result<Vec<Complex64>> {
        let out_len = valid_len(signal.len(), reference.len())?;
        if out_len * reference.len() <= DIRECT_WORK_LIMIT {
            return correlate_direct(signal, reference);
        }

        let nfft = fft_len(signal.len(), reference.len());
        let spectrum = self.signal_spectrum(signal, nfft);
        Ok(self.correlate_spectrum(&spectrum, reference, out_len))
    }

    /// Correlation peak of `signal` against each reference in `bank`
    ///
    /// Results are indexed by group id.
    pub fn correlate_bank(
        &mut self,
        signal: &[Complex64],
        bank: &ReferenceSequenceBank,
    ) -> Result<[CorrelationResult; NUM_GROUPS]> {
        let ref_len = bank.sequence_len();
        let out_len = valid_len(signal.len(), ref_len)?;

        let use_fft = out_len * ref_len > DIRECT_WORK_LIMIT;
        let nfft = fft_len(signal.len(), ref_len);
        let spectrum = if use_fft { self.signal_spectrum(signal, nfft) } else { Vec::new() };

        let mut results = [CorrelationResult { group_id: 0, peak_index: 0, magnitude: 0.0 }; NUM_GROUPS];
        for (group_id, reference) in bank.iter() {
            let corr = if use_fft {
                self.correlate_spectrum(&spectrum, reference, out_len)
            } else {
                correlate_direct(signal, reference)?
            };

            // Finite input with out_len >= 1 always has a peak
            let (peak_index, magnitude) = peak_of(&corr).unwrap_or((0, 0.0));
            trace!(group_id, peak_index, magnitude, "correlation peak");

            results[usize::from(group_id)] = CorrelationResult {
                group_id,
                peak_index,
                magnitude,
            };
        }

        Ok(results)
    }

    fn signal_spectrum(&mut self, signal: &[Complex64], nfft: usize) -> Vec<Complex64> {
        let mut buf = vec![Complex64::new(0.0, 0.0); nfft];
        buf[..signal.len()].copy_from_slice(signal);
        self.planner.plan_fft_forward(nfft).process(&mut buf);
        buf
    }

    fn correlate_spectrum(
        &mut self,
        spectrum: &[Complex64],
        reference: &[Complex64],
        out_len: usize,
    ) -> Vec<Complex64> {
        let nfft = spectrum.len();

        let mut buf = vec![Complex64::new(0.0, 0.0); nfft];
        buf[..reference.len()].copy_from_slice(reference);
        self.planner.plan_fft_forward(nfft).process(&mut buf);

        // W * conj(R) -> circular cross-correlation; no wrap for k <= M-L
        for (b, s) in buf.iter_mut().zip(spectrum) {
            *b = s * b.conj();
        }
        self.planner.plan_fft_inverse(nfft).process(&mut buf);

        let scale = 1.0 / nfft as f64;
        buf.truncate(out_len);
        for v in buf.iter_mut() {
            *v *= scale;
        }
        buf
    }
}

/// Valid-mode correlation with a throwaway [`Correlator`]
pub fn correlate_valid(signal: &[Complex64], reference: &[Complex64]) -> Result<Vec<Complex64>> {
    Correlator::new().correlate(signal, reference)
}

/// Valid-mode correlation by direct summation
pub fn correlate_direct(signal: &[Complex64], reference: &[Complex64]) -> Result<Vec<Complex64>> {
    let out_len = valid_len(signal.len(), reference.len())?;

    let corr: Vec<Complex64> = (0..out_len)
        .map(|k| {
            signal[k..k + reference.len()]
                .iter()
                .zip(reference)
                .map(|(w, r)| r.conj() * w)
                .sum::<Complex64>()
        })
        .collect();

    Ok(corr)
}

/// Index and magnitude of the largest-magnitude value
///
/// The first index wins ties. NaN values are skipped; `None` when nothing
/// else is left.
pub fn peak_of(corr: &[Complex64]) -> Option<(usize, f64)> {
    let mut peak: Option<(usize, f64)> = None;
    for (i, c) in corr.iter().enumerate() {
        let mag = c.norm();
        if mag.is_nan() {
            continue;
        }
        match peak {
            Some((_, best)) if mag <= best => {}
            _ => peak = Some((i, mag)),
        }
    }
    peak
}

fn valid_len(signal_len: usize, reference_len: usize) -> Result<usize> {
    ensure!(
        reference_len > 0 && signal_len >= reference_len,
        DimensionSnafu { signal_len, reference_len }
    );
    Ok(signal_len - reference_len + 1)
}

fn fft_len(signal_len: usize, reference_len: usize) -> usize {
    (signal_len + reference_len - 1).next_power_of_two()
}
