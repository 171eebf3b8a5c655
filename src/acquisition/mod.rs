//! PSS acquisition search
//!
//! Finds which carrier frequency offset hypothesis and which NID2 group id
//! best explain a captured waveform, and where the PSS starts.
//!
//! **Per-hypothesis pipeline** (one worker each, run in parallel):
//! 1. `correct` - de-rotate the capture by the hypothesis frequency
//! 2. `resample` - polyphase resample to the sync search rate (Nsync * scs)
//! 3. `correlate` - valid-mode cross-correlation against the 3 PSS references
//! 4. `evaluate` - pick the strongest group id for this hypothesis
//!
//! **Fan-in**:
//! - `coordinator` - dispatches the workers and collects their reports
//! - `aggregate` - waits for every report and selects the global best

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

mod correct;
mod resample;
mod correlate;
mod evaluate;
pub mod aggregate;
pub mod coordinator;

pub use correct::frequency_shift;
pub use resample::{resample_to_search_rate, Resampler};
pub use correlate::{correlate_direct, correlate_valid, peak_of, Correlator};
pub use evaluate::select_group;
pub use aggregate::{aggregate, select_global, WorkerReport};
pub use coordinator::{run_search, search_hypothesis};

/// Candidate carrier frequency offset in Hz
///
/// Ordered with `f64::total_cmp` so it can key ordered maps.
#[derive(Debug, Clone, Copy)]
pub struct FrequencyHypothesis(pub f64);

impl FrequencyHypothesis {
    pub fn hz(self) -> f64 {
        self.0
    }
}

impl PartialEq for FrequencyHypothesis {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrequencyHypothesis {}

impl PartialOrd for FrequencyHypothesis {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrequencyHypothesis {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for FrequencyHypothesis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}

/// Correlation peak for one (hypothesis, group id) pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationResult {
    pub group_id: u8,
    /// Index into the valid-mode correlation output
    pub peak_index: usize,
    /// Peak magnitude (non-negative)
    pub magnitude: f64,
}

/// Best group id for one frequency hypothesis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HypothesisOutcome {
    pub fshift: FrequencyHypothesis,
    pub group_id: u8,
    pub peak_index: usize,
    pub magnitude: f64,
}

/// Single best outcome across all hypotheses
pub type GlobalResult = HypothesisOutcome;

/// Everything a completed search produces
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// One outcome per dispatched hypothesis
    pub outcomes: BTreeMap<FrequencyHypothesis, HypothesisOutcome>,
    pub best: GlobalResult,
}
