//! Captured waveforms and their text file format
//!
//! Captures are stored one complex sample per line. The first comma-separated
//! field of each line is a complex literal such as `0.125-0.5i` (MATLAB style)
//! or `(0.125-0.5j)` (Python style), optionally wrapped in double quotes. Any
//! other fields are ignored.
//!
//! Parsing is all-or-nothing: a single malformed record aborts the load. Only
//! trailing blank lines are skipped; a blank line between records is malformed.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use num::complex::Complex64;
use snafu::{ensure, ResultExt};
use tracing::{debug, instrument};

use crate::error::{
    EmptyWaveformSnafu, InvalidSampleRateSnafu, IoSnafu, NonFiniteSampleSnafu, ParseSnafu, Result,
};

/// Immutable complex baseband waveform tagged with its sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<Complex64>,
    sample_rate: f64,
}

impl Waveform {
    /// Wrap samples captured at `sample_rate` Hz
    ///
    /// Every sample must be finite.
    pub fn new(samples: Vec<Complex64>, sample_rate: f64) -> Result<Self> {
        ensure!(
            sample_rate.is_finite() && sample_rate > 0.0,
            InvalidSampleRateSnafu { rate: sample_rate }
        );
        if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
            return NonFiniteSampleSnafu { index }.fail();
        }
        Ok(Self { samples, sample_rate })
    }

    pub fn samples(&self) -> &[Complex64] {
        &self.samples
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Capture duration in seconds
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate
    }
}

/// Parse one complex literal
///
/// The imaginary unit may be written `i` or `j`; `j` is translated to `i`
/// before handing the text to `num`'s complex parser. Whitespace and one pair
/// of surrounding parentheses are ignored. Non-finite values are rejected.
pub fn parse_complex_literal(text: &str) -> Option<Complex64> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(trimmed);

    let normalized: String = inner
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == 'j' || c == 'J' { 'i' } else { c })
        .collect();

    if normalized.is_empty() {
        return None;
    }

    let value = Complex64::from_str(&normalized).ok()?;
    value.is_finite().then_some(value)
}

/// First comma-separated field of a record
///
/// A field wrapped in double quotes is unquoted; commas inside the quotes do
/// not split it.
fn first_field(record: &str) -> &str {
    let trimmed = record.trim_start();
    if let Some(rest) = trimmed.strip_prefix('"') {
        if let Some(end) = rest.find('"') {
            return &rest[..end];
        }
    }
    record.split(',').next().unwrap_or(record)
}

/// Parse the text of a whole capture file
///
/// Every line up to the last non-blank one is a record, so an interior blank
/// line is a malformed record. Trailing blank lines are ignored. `path` is
/// only used for error reporting.
pub fn parse_samples(text: &str, path: &Path) -> Result<Vec<Complex64>> {
    let lines: Vec<&str> = text.lines().collect();
    let n_records = lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map_or(0, |last| last + 1);

    let mut samples = Vec::with_capacity(n_records);
    for (idx, line) in lines[..n_records].iter().enumerate() {
        match parse_complex_literal(first_field(line)) {
            Some(sample) => samples.push(sample),
            None => {
                return ParseSnafu {
                    path,
                    line: idx + 1,
                    record: line.trim(),
                }
                .fail();
            }
        }
    }

    ensure!(!samples.is_empty(), EmptyWaveformSnafu { path });
    Ok(samples)
}

/// Read complex samples from a text file
pub fn load_samples(path: impl AsRef<Path>) -> Result<Vec<Complex64>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).context(IoSnafu { path })?;
    parse_samples(&text, path)
}

/// Load a captured waveform recorded at `sample_rate` Hz
#[instrument(skip(path), fields(path = %path.as_ref().display()))]
pub fn load_waveform(path: impl AsRef<Path>, sample_rate: f64) -> Result<Waveform> {
    let samples = load_samples(path)?;
    let waveform = Waveform::new(samples, sample_rate)?;

    debug!(
        samples = waveform.len(),
        duration_ms = waveform.duration() * 1e3,
        "loaded waveform"
    );

    Ok(waveform)
}

/// Format a sample as a MATLAB-style literal (`re+imi`)
pub fn format_complex_literal(sample: Complex64) -> String {
    // {:e} is lossless for f64 and always parses back
    let sign = if sample.im.is_sign_negative() { '-' } else { '+' };
    format!("{:e}{}{:e}i", sample.re, sign, sample.im.abs())
}

/// Generate the text of a capture file
pub fn generate_waveform_text(samples: &[Complex64]) -> String {
    let mut text = String::with_capacity(samples.len() * 48);
    for &sample in samples {
        // Writing to a String cannot fail
        let _ = writeln!(text, "{}", format_complex_literal(sample));
    }
    text
}

/// Write samples to a capture file readable by [`load_samples`]
pub fn write_waveform_file(path: impl AsRef<Path>, samples: &[Complex64]) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, generate_waveform_text(samples)).context(IoSnafu { path })
}
