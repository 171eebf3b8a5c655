//! Parallel search over frequency hypotheses
//!
//! One worker per hypothesis on a dedicated rayon pool. Each worker runs the
//! full correct -> resample -> correlate -> evaluate pipeline and publishes
//! exactly one [`WorkerReport`], success or failure, so the aggregator can
//! always tell a finished worker from a missing one.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crossbeam::channel::{self, Sender};
use snafu::{ensure, ResultExt};
use tracing::{debug, info, instrument, trace, warn};

use super::aggregate::{aggregate, WorkerReport};
use super::correlate::Correlator;
use super::{frequency_shift, select_group, FrequencyHypothesis, HypothesisOutcome, Resampler, SearchReport};
use crate::config::SearchConfig;
use crate::error::{InvalidSampleRateSnafu, Result, SearchError, ThreadPoolSnafu};
use crate::reference::ReferenceSequenceBank;
use crate::waveform::Waveform;

/// Lifecycle of one hypothesis worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerStage {
    Idle,
    Correcting,
    Resampling,
    Correlating,
    Evaluated,
    Published,
}

/// Run the whole pipeline for a single frequency hypothesis
///
/// `resampler` must take the waveform's rate to the search rate.
pub fn search_hypothesis(
    waveform: &Waveform,
    bank: &ReferenceSequenceBank,
    resampler: &Resampler,
    fshift: FrequencyHypothesis,
) -> Result<HypothesisOutcome> {
    let mut stage = WorkerStage::Idle;
    let mut advance = |next: WorkerStage| {
        trace!(%fshift, from = ?stage, to = ?next, "worker stage");
        stage = next;
    };

    advance(WorkerStage::Correcting);
    let corrected = frequency_shift(waveform, fshift)?;

    advance(WorkerStage::Resampling);
    let downsampled = resampler.process(&corrected)?;

    advance(WorkerStage::Correlating);
    let results = Correlator::new().correlate_bank(downsampled.samples(), bank)?;

    let outcome = select_group(fshift, &results);
    advance(WorkerStage::Evaluated);

    debug!(
        %fshift,
        nid2 = outcome.group_id,
        peak_index = outcome.peak_index,
        magnitude = outcome.magnitude,
        "hypothesis evaluated"
    );
    Ok(outcome)
}

/// Search all configured hypotheses in parallel and return the global best
///
/// The configuration is validated and the resampler designed before any
/// worker is dispatched. Aggregation only selects a result once every worker
/// has published; otherwise an error is returned within `worker_timeout`.
#[instrument(skip_all, fields(samples = waveform.len(), hypotheses = config.hypotheses.len()))]
pub fn run_search(
    waveform: Arc<Waveform>,
    bank: Arc<ReferenceSequenceBank>,
    config: &SearchConfig,
) -> Result<SearchReport> {
    config.validate()?;
    let rate = waveform.sample_rate();
    ensure!(rate == config.input_sample_rate, InvalidSampleRateSnafu { rate });
    let resampler = Resampler::for_search(config)?;

    info!(
        search_rate = config.search_sample_rate(),
        ratio = ?resampler.ratio(),
        n_size_grid = config.carrier.n_size_grid,
        numerology = config.carrier.numerology,
        "dispatching hypothesis workers"
    );

    dispatch(config, move |fshift| search_hypothesis(&waveform, &bank, &resampler, fshift))
}

/// Run `pipeline` once per configured hypothesis on a dedicated pool and
/// aggregate the reports
fn dispatch<F>(config: &SearchConfig, pipeline: F) -> Result<SearchReport>
where
    F: Fn(FrequencyHypothesis) -> Result<HypothesisOutcome> + Send + Sync + 'static,
{
    let n_workers = config.hypotheses.len();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(n_workers)
        .thread_name(|i| format!("pss-search-{i}"))
        .build()
        .context(ThreadPoolSnafu)?;

    let pipeline = Arc::new(pipeline);
    let (tx, rx) = channel::bounded(n_workers);
    for &fshift in &config.hypotheses {
        let tx = tx.clone();
        let pipeline = Arc::clone(&pipeline);

        pool.spawn(move || run_worker(fshift, &tx, || (*pipeline)(fshift)));
    }
    // Only workers hold senders now; the channel disconnects once all are done
    drop(tx);

    aggregate(&rx, n_workers, config.worker_timeout)
}

fn run_worker<F>(fshift: FrequencyHypothesis, tx: &Sender<WorkerReport>, pipeline: F)
where
    F: FnOnce() -> Result<HypothesisOutcome>,
{
    let result = panic::catch_unwind(AssertUnwindSafe(pipeline))
        .unwrap_or_else(|_| Err(SearchError::WorkerPanicked { fshift: fshift.hz() }));

    if tx.send(WorkerReport { fshift, result }).is_err() {
        warn!(%fshift, "aggregator gone, outcome dropped");
        return;
    }
    trace!(%fshift, to = ?WorkerStage::Published, "worker stage");
}
