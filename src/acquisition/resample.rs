///! Rational polyphase resampling
///!
///! Converts a capture to the sync search rate with a Kaiser-windowed sinc
///! anti-aliasing filter, evaluated polyphase so only the non-zero taps of the
///! upsampled stream are ever touched.
///!
///! **Filter design** (matching scipy `resample_poly` defaults):
///! - ratio `up/down` reduced by gcd
///! - cutoff `1/max(up, down)` of Nyquist
///! - `2 * 10 * max(up, down) + 1` taps, Kaiser window beta = 5
///! - unity DC gain, scaled by `up`
///!
///! Output sample `k` is aligned with input time `k * down / up` (zero delay).

use num::complex::Complex64;
use num::integer::gcd;
use snafu::ensure;

use crate::config::SearchConfig;
use crate::error::{InvalidSampleRateSnafu, Result};
use crate::waveform::Waveform;

/// Half filter length per unit of max(up, down)
const HALF_LEN_FACTOR: usize = 10;

/// Kaiser window shape parameter
const KAISER_BETA: f64 = 5.0;

/// Resampler between two integer sample rates
///
/// Taps are designed once; [`Resampler::process`] only allocates its output.
#[derive(Debug, Clone)]
pub struct Resampler {
    input_rate: f64,
    output_rate: f64,
    up: usize,
    down: usize,
    half_len: usize,
    taps: Vec<f64>,
}

impl Resampler {
    /// Design a resampler from `input_rate` to `output_rate` (both in Hz)
    pub fn new(input_rate: f64, output_rate: f64) -> Result<Self> {
        let fs_in = integer_rate(input_rate)?;
        let fs_out = integer_rate(output_rate)?;

        let g = gcd(fs_in, fs_out);
        let up = (fs_out / g) as usize;
        let down = (fs_in / g) as usize;

        let max_rate = up.max(down);
        let half_len = HALF_LEN_FACTOR * max_rate;
        let taps = design_lowpass(2 * half_len + 1, 1.0 / max_rate as f64, up as f64);

        Ok(Self {
            input_rate,
            output_rate,
            up,
            down,
            half_len,
            taps,
        })
    }

    /// Resampler from the configured capture rate to the search rate
    pub fn for_search(config: &SearchConfig) -> Result<Self> {
        Self::new(config.input_sample_rate, config.search_sample_rate())
    }

    /// Reduced `(up, down)` ratio
    pub fn ratio(&self) -> (usize, usize) {
        (self.up, self.down)
    }

    pub fn taps(&self) -> &[f64] {
        &self.taps
    }

    pub fn output_rate(&self) -> f64 {
        self.output_rate
    }

    /// Number of output samples for `input_len` input samples
    pub fn output_len(&self, input_len: usize) -> usize {
        (input_len * self.up).div_ceil(self.down)
    }

    /// Resample `waveform`, which must be at this resampler's input rate
    pub fn process(&self, waveform: &Waveform) -> Result<Waveform> {
        let rate = waveform.sample_rate();
        ensure!(rate == self.input_rate, InvalidSampleRateSnafu { rate });

        let x = waveform.samples();
        if self.up == 1 && self.down == 1 {
            return Waveform::new(x.to_vec(), self.output_rate);
        }

        let n_taps = self.taps.len();
        let n_out = self.output_len(x.len());
        let mut out = Vec::with_capacity(n_out);

        for k in 0..n_out {
            // Position of output k on the upsampled grid, shifted by the filter delay
            let t = k * self.down + self.half_len;

            // Input samples whose upsampled position falls under the filter
            let n_first = if t >= n_taps { (t - n_taps + 1).div_ceil(self.up) } else { 0 };
            let n_last = (t / self.up).min(x.len() - 1);

            let mut acc = Complex64::new(0.0, 0.0);
            for n in n_first..=n_last {
                acc += x[n] * self.taps[t - n * self.up];
            }
            out.push(acc);
        }

        Waveform::new(out, self.output_rate)
    }
}

/// Resample a capture to the search rate described by `config`
pub fn resample_to_search_rate(waveform: &Waveform, config: &SearchConfig) -> Result<Waveform> {
    Resampler::new(waveform.sample_rate(), config.search_sample_rate())?.process(waveform)
}

fn integer_rate(rate: f64) -> Result<u64> {
    ensure!(
        rate.is_finite() && rate >= 1.0 && rate.fract() == 0.0 && rate <= u32::MAX as f64,
        InvalidSampleRateSnafu { rate }
    );
    Ok(rate as u64)
}

/// Kaiser-windowed sinc low-pass, `cutoff` relative to Nyquist
fn design_lowpass(n_taps: usize, cutoff: f64, gain: f64) -> Vec<f64> {
    let center = (n_taps - 1) as f64 / 2.0;
    let i0_beta = bessel_i0(KAISER_BETA);

    let mut taps: Vec<f64> = (0..n_taps)
        .map(|n| {
            let m = n as f64 - center;
            let r = if center > 0.0 { m / center } else { 0.0 };
            let window = bessel_i0(KAISER_BETA * libm::sqrt((1.0 - r * r).max(0.0))) / i0_beta;
            cutoff * sinc(cutoff * m) * window
        })
        .collect();

    let sum: f64 = taps.iter().sum();
    for h in taps.iter_mut() {
        *h *= gain / sum;
    }
    taps
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = core::f64::consts::PI * x;
        libm::sin(px) / px
    }
}

/// Modified Bessel function of the first kind, order zero (power series)
fn bessel_i0(x: f64) -> f64 {
    let half = x / 2.0;
    let mut term = 1.0;
    let mut sum = 1.0;
    let mut k = 1.0;
    while term > 1e-17 * sum {
        term *= (half / k) * (half / k);
        sum += term;
        k += 1.0;
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::PI;

    fn tone(freq: f64, fs: f64, len: usize) -> Waveform {
        let samples = (0..len)
            .map(|n| Complex64::cis(2.0 * PI * freq * n as f64 / fs))
            .collect();
        Waveform::new(samples, fs).unwrap()
    }

    #[test]
    fn test_capture_ratio() {
        let r = Resampler::new(15.36e6, 7.68e6).unwrap();
        assert_eq!(r.ratio(), (1, 2));
        assert_eq!(r.taps().len(), 41);
        assert_eq!(r.output_len(1001), 501);
    }

    #[test]
    fn test_taps_unity_dc_gain() {
        let r = Resampler::new(3.0, 2.0).unwrap();
        let sum: f64 = r.taps().iter().sum();
        // DC gain of the filter is `up`
        assert!((sum - 2.0).abs() < 1e-12);
        // Symmetric (linear phase)
        let taps = r.taps();
        for i in 0..taps.len() / 2 {
            assert!((taps[i] - taps[taps.len() - 1 - i]).abs() < 1e-15);
        }
    }

    #[test]
    fn test_bessel_i0_known_values() {
        assert!((bessel_i0(0.0) - 1.0).abs() < 1e-15);
        assert!((bessel_i0(1.0) - 1.266_065_877_752_008_4).abs() < 1e-12);
        assert!((bessel_i0(5.0) - 27.239_871_823_604_45).abs() < 1e-9);
    }

    #[test]
    fn test_equal_rates_copy_input() {
        let w = tone(1000.0, 7.68e6, 300);
        let r = Resampler::new(7.68e6, 7.68e6).unwrap();
        let out = r.process(&w).unwrap();
        assert_eq!(out.samples(), w.samples());
    }

    #[test]
    fn test_downsample_passes_in_band_tone() {
        let fs = 15.36e6;
        let w = tone(100_000.0, fs, 8192);
        let r = Resampler::new(fs, 7.68e6).unwrap();
        let out = r.process(&w).unwrap();
        assert_eq!(out.len(), 4096);
        assert_eq!(out.sample_rate(), 7.68e6);

        // Away from the edges the output is the same tone at the new rate
        for k in 100..out.len() - 100 {
            let expected = Complex64::cis(2.0 * PI * 100_000.0 * k as f64 / 7.68e6);
            assert!((out.samples()[k] - expected).norm() < 1e-2, "k={k}");
        }
    }

    #[test]
    fn test_downsample_rejects_alias_band() {
        let fs = 15.36e6;
        // 5 MHz is above the new Nyquist (3.84 MHz) and would alias
        let w = tone(5.0e6, fs, 8192);
        let r = Resampler::new(fs, 7.68e6).unwrap();
        let out = r.process(&w).unwrap();
        let mid = &out.samples()[100..out.len() - 100];
        let peak = mid.iter().map(|s| s.norm()).fold(0.0, f64::max);
        assert!(peak < 0.05, "alias leak {peak}");
    }

    #[test]
    fn test_upsample_interpolates() {
        let w = tone(50_000.0, 7.68e6, 1024);
        let r = Resampler::new(7.68e6, 15.36e6).unwrap();
        let out = r.process(&w).unwrap();
        assert_eq!(out.len(), 2048);
        for k in 100..out.len() - 100 {
            let expected = Complex64::cis(2.0 * PI * 50_000.0 * k as f64 / 15.36e6);
            assert!((out.samples()[k] - expected).norm() < 1e-2, "k={k}");
        }
    }

    #[test]
    fn test_rejects_fractional_or_mismatched_rate() {
        assert!(Resampler::new(1.5, 2.0).is_err());
        assert!(Resampler::new(0.0, 2.0).is_err());
        let r = Resampler::new(4.0, 2.0).unwrap();
        let w = tone(0.0, 8.0, 16);
        assert!(r.process(&w).is_err());
    }
}
