//! Aggregation contract through the public API

use std::time::{Duration, Instant};

use crossbeam::channel::unbounded;
use rustypss::acquisition::{aggregate, WorkerReport};
use rustypss::{FrequencyHypothesis, HypothesisOutcome, SearchError};

fn report(fshift: f64, group_id: u8, magnitude: f64) -> WorkerReport {
    WorkerReport {
        fshift: FrequencyHypothesis(fshift),
        result: Ok(HypothesisOutcome {
            fshift: FrequencyHypothesis(fshift),
            group_id,
            peak_index: 212_347,
            magnitude,
        }),
    }
}

#[test]
fn test_highest_magnitude_wins() {
    let (tx, rx) = unbounded();
    let fshifts = [0.0, 15_000.0, 30_000.0, 45_000.0];
    let magnitudes = [1.0, 5.0, 3.0, 2.0];
    for (f, m) in fshifts.into_iter().zip(magnitudes) {
        tx.send(report(f, 1, m)).unwrap();
    }

    let result = aggregate(&rx, 4, Duration::from_secs(5)).unwrap();
    assert_eq!(result.best.fshift.hz(), 15_000.0);
    assert_eq!(result.best.magnitude, 5.0);
}

#[test]
fn test_three_of_four_is_incomplete() {
    let (tx, rx) = unbounded();
    for (f, m) in [(0.0, 1.0), (15_000.0, 5.0), (30_000.0, 3.0)] {
        tx.send(report(f, 0, m)).unwrap();
    }

    let start = Instant::now();
    let err = aggregate(&rx, 4, Duration::from_millis(250)).unwrap_err();
    assert!(matches!(err, SearchError::IncompleteResults { expected: 4, received: 3 }), "{err}");
    assert!(start.elapsed() >= Duration::from_millis(250));
    assert!(start.elapsed() < Duration::from_secs(10));

    // Sender alive for the whole wait
    drop(tx);
}
