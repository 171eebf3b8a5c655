///! Per-hypothesis group id selection

use super::{CorrelationResult, FrequencyHypothesis, HypothesisOutcome};
use crate::reference::NUM_GROUPS;

/// Pick the group id with the largest correlation magnitude
///
/// Exact ties go to the lowest group id.
pub fn select_group(
    fshift: FrequencyHypothesis,
    results: &[CorrelationResult; NUM_GROUPS],
) -> HypothesisOutcome {
    let mut best = &results[0];
    for candidate in &results[1..] {
        if candidate.magnitude > best.magnitude {
            best = candidate;
        }
    }

    HypothesisOutcome {
        fshift,
        group_id: best.group_id,
        peak_index: best.peak_index,
        magnitude: best.magnitude,
    }
}
