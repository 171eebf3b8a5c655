//! Search configuration
//!
//! All operating parameters of a search live in one immutable [`SearchConfig`]
//! that is passed explicitly into the pipeline.

use std::time::Duration;
use snafu::ensure;

use crate::acquisition::FrequencyHypothesis;
use crate::error::{InvalidConfigSnafu, InvalidSampleRateSnafu, Result};

/// Base subcarrier spacing for numerology 0 (Hz)
pub const BASE_SCS_HZ: f64 = 15_000.0;

/// Highest numerology defined for NR
pub const MAX_NUMEROLOGY: u8 = 6;

/// Subcarriers per resource block
pub const SUBCARRIERS_PER_RB: u32 = 12;

/// Carrier / resource grid parameters
///
/// Only used to derive the subcarrier spacing and to annotate output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarrierConfig {
    /// Grid size in resource blocks
    pub n_size_grid: u32,
    /// Numerology index (subcarrier spacing = 15 kHz * 2^numerology)
    pub numerology: u8,
}

impl CarrierConfig {
    /// Subcarrier spacing in Hz
    pub fn subcarrier_spacing(&self) -> f64 {
        BASE_SCS_HZ * f64::from(1u32 << self.numerology)
    }

    /// Number of subcarriers in the grid
    pub fn n_subcarriers(&self) -> u32 {
        self.n_size_grid * SUBCARRIERS_PER_RB
    }
}

impl Default for CarrierConfig {
    fn default() -> Self {
        Self {
            n_size_grid: 20,
            numerology: 1,
        }
    }
}

/// Configuration for one acquisition search
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Sample rate of the captured waveform (Hz)
    pub input_sample_rate: f64,
    /// Frequency offsets to test (Hz)
    pub hypotheses: Vec<FrequencyHypothesis>,
    /// FFT size covering the SS burst; search rate = sync_nfft * scs
    pub sync_nfft: usize,
    pub carrier: CarrierConfig,
    /// Upper bound on the wait for all hypothesis workers
    pub worker_timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            input_sample_rate: 15.36e6,
            hypotheses: [0.0, 15_000.0, 30_000.0, 45_000.0]
                .into_iter()
                .map(FrequencyHypothesis)
                .collect(),
            sync_nfft: 256,
            carrier: CarrierConfig::default(),
            worker_timeout: Duration::from_secs(120),
        }
    }
}

impl SearchConfig {
    /// Sample rate used for correlation (Hz)
    pub fn search_sample_rate(&self) -> f64 {
        self.sync_nfft as f64 * self.carrier.subcarrier_spacing()
    }

    /// Check the configuration before any work is dispatched
    pub fn validate(&self) -> Result<()> {
        let rate = self.input_sample_rate;
        ensure!(rate.is_finite() && rate > 0.0, InvalidSampleRateSnafu { rate });

        ensure!(
            self.carrier.numerology <= MAX_NUMEROLOGY,
            InvalidConfigSnafu {
                reason: format!(
                    "numerology {} exceeds {}",
                    self.carrier.numerology, MAX_NUMEROLOGY
                ),
            }
        );
        ensure!(
            self.sync_nfft > 0,
            InvalidConfigSnafu { reason: "sync FFT size must be non-zero" }
        );
        ensure!(
            !self.hypotheses.is_empty(),
            InvalidConfigSnafu { reason: "no frequency hypotheses" }
        );
        ensure!(
            !self.worker_timeout.is_zero(),
            InvalidConfigSnafu { reason: "worker timeout must be non-zero" }
        );

        for (i, h) in self.hypotheses.iter().enumerate() {
            ensure!(
                h.hz().is_finite(),
                InvalidConfigSnafu { reason: format!("hypothesis {} is not finite", h.hz()) }
            );
            // Outcomes are keyed by hypothesis, duplicates would collide
            ensure!(
                !self.hypotheses[..i].contains(h),
                InvalidConfigSnafu { reason: format!("duplicate hypothesis {} Hz", h.hz()) }
            );
        }

        Ok(())
    }
}
