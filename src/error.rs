//! Error types for the acquisition search
//!
//! Every failure is fatal to the current search and is returned to the caller.

use std::path::PathBuf;
use snafu::Snafu;

/// Errors raised while loading inputs or running a search
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SearchError {
    /// A waveform or reference file could not be read
    #[snafu(display("Failed to read '{}': {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A record was not a valid complex literal; the whole load is aborted
    #[snafu(display("Invalid complex literal {record:?} at {}:{line}", path.display()))]
    Parse {
        path: PathBuf,
        line: usize,
        record: String,
    },

    /// A sample handed to a waveform was NaN or infinite
    #[snafu(display("Non-finite sample at index {index}"))]
    NonFiniteSample { index: usize },

    /// A file contained no samples at all
    #[snafu(display("No samples found in '{}'", path.display()))]
    EmptyWaveform { path: PathBuf },

    /// Downsampled waveform is shorter than the reference sequence
    #[snafu(display(
        "Signal of {signal_len} samples is shorter than reference of {reference_len} samples"
    ))]
    Dimension {
        signal_len: usize,
        reference_len: usize,
    },

    /// Fewer outcomes than hypotheses arrived before the deadline
    #[snafu(display("Expected {expected} hypothesis outcomes, received {received}"))]
    IncompleteResults { expected: usize, received: usize },

    /// A worker pipeline reported a failure for its hypothesis
    #[snafu(display("Search for fshift {fshift} Hz failed: {source}"))]
    WorkerFailed {
        fshift: f64,
        #[snafu(source(from(SearchError, Box::new)))]
        source: Box<SearchError>,
    },

    /// A worker pipeline panicked before publishing
    #[snafu(display("Search worker for fshift {fshift} Hz panicked"))]
    WorkerPanicked { fshift: f64 },

    #[snafu(display("Invalid sample rate {rate} Hz"))]
    InvalidSampleRate { rate: f64 },

    #[snafu(display("Invalid frequency hypothesis {fshift} Hz"))]
    InvalidHypothesis { fshift: f64 },

    #[snafu(display("Invalid search configuration: {reason}"))]
    InvalidConfig { reason: String },

    #[snafu(display("Failed to build search thread pool: {source}"))]
    ThreadPool { source: rayon::ThreadPoolBuildError },

    #[snafu(display("Invalid noise model: {source}"))]
    NoiseModel { source: rand_distr::NormalError },
}

pub type Result<T, E = SearchError> = std::result::Result<T, E>;
