//! End-to-end searches over synthetic captures
//!
//! Captures are built from the generated PSS references, so the expected
//! answer (fshift, NID2, peak index) is known exactly.

use std::sync::Arc;

use rustypss::simulation::{place_reference, synthesize_capture, CaptureSpec};
use rustypss::{run_search, FrequencyHypothesis, SearchConfig, Waveform};

#[path = "../test_utils.rs"]
mod test_utils;
use test_utils::{default_bank, search_rate_config};

#[test]
fn test_reference_in_zero_buffer_at_search_rate() {
    let bank = default_bank();
    let config = search_rate_config();
    let energy = bank.energy(1).unwrap();

    let samples = place_reference(&bank, 1, 1000, 8000).unwrap();
    let waveform = Waveform::new(samples, config.input_sample_rate).unwrap();

    let report = run_search(Arc::new(waveform), Arc::new(bank), &config).unwrap();
    let best = report.best;
    assert_eq!(best.fshift, FrequencyHypothesis(0.0));
    assert_eq!(best.group_id, 1);
    assert_eq!(best.peak_index, 1000);
    assert!((best.magnitude - energy).abs() < 1e-9 * energy);

    // Every dispatched hypothesis is reported
    assert_eq!(report.outcomes.len(), 4);
    for outcome in report.outcomes.values() {
        assert!(outcome.magnitude <= best.magnitude);
        assert!(outcome.peak_index < 8000 - 256 + 1);
    }
}

#[test]
fn test_recovers_frequency_offset_at_capture_rate() {
    let bank = default_bank();
    let config = SearchConfig::default();
    let energy = bank.energy(2).unwrap();

    let spec = CaptureSpec {
        group_id: 2,
        offset: 3000,
        len: 10_000,
        fshift: 30_000.0,
        snr_db: None,
        seed: 1,
    };
    let capture = synthesize_capture(&bank, &config, &spec).unwrap();
    assert_eq!(capture.sample_rate(), 15.36e6);

    let report = run_search(Arc::new(capture), Arc::new(bank), &config).unwrap();
    let best = report.best;
    assert_eq!(best.fshift, FrequencyHypothesis(30_000.0));
    assert_eq!(best.group_id, 2);
    assert_eq!(best.peak_index, 3000);
    // Up- and down-sampling filters only ripple the passband slightly
    assert!((best.magnitude - energy).abs() < 0.02 * energy, "magnitude {}", best.magnitude);

    // A 15 kHz residual costs a large share of the coherent gain
    let off_by_one = report.outcomes[&FrequencyHypothesis(15_000.0)].magnitude;
    assert!(off_by_one < 0.8 * best.magnitude);
}

#[test]
fn test_noisy_capture() {
    let bank = default_bank();
    let config = SearchConfig::default();

    let spec = CaptureSpec {
        group_id: 0,
        offset: 4321,
        len: 12_000,
        fshift: 45_000.0,
        snr_db: Some(0.0),
        seed: 2024,
    };
    let capture = synthesize_capture(&bank, &config, &spec).unwrap();

    let report = run_search(Arc::new(capture), Arc::new(bank), &config).unwrap();
    let best = report.best;
    assert_eq!(best.fshift, FrequencyHypothesis(45_000.0));
    assert_eq!(best.group_id, 0);
    assert!(best.peak_index.abs_diff(4321) <= 1, "peak {}", best.peak_index);
}

#[test]
fn test_negative_offset_hypotheses() {
    let bank = default_bank();
    let config = SearchConfig {
        hypotheses: [-30_000.0, -15_000.0, 0.0, 15_000.0]
            .into_iter()
            .map(FrequencyHypothesis)
            .collect(),
        ..SearchConfig::default()
    };

    let spec = CaptureSpec {
        group_id: 1,
        offset: 2000,
        len: 6000,
        fshift: -15_000.0,
        ..CaptureSpec::default()
    };
    let capture = synthesize_capture(&bank, &config, &spec).unwrap();

    let report = run_search(Arc::new(capture), Arc::new(bank), &config).unwrap();
    assert_eq!(report.best.fshift, FrequencyHypothesis(-15_000.0));
    assert_eq!(report.best.group_id, 1);
    assert_eq!(report.best.peak_index, 2000);
}
