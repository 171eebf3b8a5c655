//! Cross-hypothesis aggregation
//!
//! Collects exactly one report per dispatched hypothesis and selects the
//! global best. Nothing is selected from a partial set: a missing report
//! (deadline elapsed or all workers gone) or a failed report ends the search
//! with an error.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crossbeam::channel::{Receiver, RecvTimeoutError};
use snafu::{ensure, OptionExt};
use tracing::{info, instrument, warn};

use super::{FrequencyHypothesis, GlobalResult, HypothesisOutcome, SearchReport};
use crate::error::{IncompleteResultsSnafu, InvalidConfigSnafu, Result, SearchError};

/// Message each worker publishes exactly once
#[derive(Debug)]
pub struct WorkerReport {
    pub fshift: FrequencyHypothesis,
    pub result: Result<HypothesisOutcome>,
}

/// Wait for `expected` reports on `rx` and select the global best
///
/// Gives up once `timeout` has elapsed or every sender has been dropped.
/// A failed worker is surfaced as [`SearchError::WorkerFailed`] and a
/// crashed one as [`SearchError::WorkerPanicked`] (lowest failing frequency
/// first); missing reports as [`SearchError::IncompleteResults`].
#[instrument(skip(rx))]
pub fn aggregate(rx: &Receiver<WorkerReport>, expected: usize, timeout: Duration) -> Result<SearchReport> {
    ensure!(expected > 0, InvalidConfigSnafu { reason: "no hypotheses to aggregate" });

    let deadline = Instant::now() + timeout;
    let mut outcomes = BTreeMap::new();
    let mut failures: Vec<(FrequencyHypothesis, SearchError)> = Vec::new();
    let mut received = 0;

    while received < expected {
        match rx.recv_deadline(deadline) {
            Ok(WorkerReport { fshift, result }) => {
                received += 1;
                match result {
                    Ok(outcome) => {
                        outcomes.insert(fshift, outcome);
                    }
                    Err(e) => {
                        warn!(%fshift, error = %e, "worker reported failure");
                        failures.push((fshift, e));
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(received, expected, "timed out waiting for hypothesis workers");
                break;
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn!(received, expected, "all hypothesis workers gone");
                break;
            }
        }
    }

    if let Some((fshift, source)) = failures.into_iter().min_by(|a, b| a.0.cmp(&b.0)) {
        return Err(match source {
            panicked @ SearchError::WorkerPanicked { .. } => panicked,
            source => SearchError::WorkerFailed {
                fshift: fshift.hz(),
                source: Box::new(source),
            },
        });
    }

    ensure!(
        outcomes.len() == expected,
        IncompleteResultsSnafu { expected, received: outcomes.len() }
    );

    for outcome in outcomes.values() {
        info!(
            fshift = %outcome.fshift,
            nid2 = outcome.group_id,
            peak_index = outcome.peak_index,
            magnitude = outcome.magnitude,
            "hypothesis outcome"
        );
    }

    let best = select_global(&outcomes).context(IncompleteResultsSnafu { expected, received: 0usize })?;
    info!(
        fshift = %best.fshift,
        nid2 = best.group_id,
        peak_index = best.peak_index,
        magnitude = best.magnitude,
        "selected global result"
    );

    Ok(SearchReport { outcomes, best })
}

/// Outcome with the largest magnitude; equal magnitudes go to the lowest frequency
pub fn select_global(outcomes: &BTreeMap<FrequencyHypothesis, HypothesisOutcome>) -> Option<GlobalResult> {
    let mut best: Option<&HypothesisOutcome> = None;
    for outcome in outcomes.values() {
        match best {
            Some(b) if outcome.magnitude <= b.magnitude => {}
            _ => best = Some(outcome),
        }
    }
    best.copied()
}
