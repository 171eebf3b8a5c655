//! Synthetic captures for exercising the search
//!
//! A capture is built at the search rate with one PSS burst, resampled to
//! the capture rate, offset in frequency by `+fshift` and optionally buried in
//! AWGN. Searching it with hypothesis `fshift` undoes the offset.

use num::complex::Complex64;
use rand::rngs::StdRng;
use rand::SeedableRng;
use snafu::{ensure, OptionExt};
use tracing::debug;

use super::noise::{add_awgn, noise_power_for_snr};
use crate::acquisition::{frequency_shift, FrequencyHypothesis, Resampler};
use crate::config::SearchConfig;
use crate::error::{DimensionSnafu, InvalidConfigSnafu, Result};
use crate::reference::ReferenceSequenceBank;
use crate::waveform::Waveform;

/// Parameters of one synthetic capture
#[derive(Debug, Clone)]
pub struct CaptureSpec {
    /// NID2 of the embedded PSS
    pub group_id: u8,
    /// Burst start, in samples at the search rate
    pub offset: usize,
    /// Capture length, in samples at the search rate
    pub len: usize,
    /// Carrier offset applied to the capture (Hz)
    pub fshift: f64,
    /// Burst-power to noise-power ratio; `None` for a clean capture
    pub snr_db: Option<f64>,
    pub seed: u64,
}

impl Default for CaptureSpec {
    fn default() -> Self {
        Self {
            group_id: 0,
            offset: 1000,
            len: 20_000,
            fshift: 0.0,
            snr_db: None,
            seed: 1,
        }
    }
}

/// Zero buffer of `len` samples with reference `group_id` at `offset`
pub fn place_reference(
    bank: &ReferenceSequenceBank,
    group_id: u8,
    offset: usize,
    len: usize,
) -> Result<Vec<Complex64>> {
    let reference = bank.get(group_id).context(InvalidConfigSnafu {
        reason: format!("no reference for NID2 {group_id}"),
    })?;
    ensure!(
        offset + reference.len() <= len,
        DimensionSnafu { signal_len: len, reference_len: offset + reference.len() }
    );

    let mut samples = vec![Complex64::new(0.0, 0.0); len];
    samples[offset..offset + reference.len()].copy_from_slice(reference);
    Ok(samples)
}

/// Build a capture at `config.input_sample_rate` following `spec`
pub fn synthesize_capture(
    bank: &ReferenceSequenceBank,
    config: &SearchConfig,
    spec: &CaptureSpec,
) -> Result<Waveform> {
    let baseband = Waveform::new(
        place_reference(bank, spec.group_id, spec.offset, spec.len)?,
        config.search_sample_rate(),
    )?;

    let upsampled = Resampler::new(config.search_sample_rate(), config.input_sample_rate)?
        .process(&baseband)?;

    // De-rotating by -fshift rotates the capture up by +fshift
    let shifted = frequency_shift(&upsampled, FrequencyHypothesis(-spec.fshift))?;

    let Some(snr_db) = spec.snr_db else {
        return Ok(shifted);
    };

    // Burst power at the search rate; resampling keeps the per-sample power
    let burst_power = bank.energy(spec.group_id).unwrap_or(0.0) / bank.sequence_len() as f64;
    let noise_power = noise_power_for_snr(burst_power, snr_db);

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let rate = shifted.sample_rate();
    let mut samples = shifted.samples().to_vec();
    add_awgn(&mut samples, noise_power, &mut rng)?;

    debug!(noise_power, snr_db, "added AWGN to synthetic capture");
    Waveform::new(samples, rate)
}
