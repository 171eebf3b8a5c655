//! Loading captures and reference files from disk

use std::fs;
use std::sync::Arc;

use num::complex::Complex64;
use rustypss::reference::reference_file_name;
use rustypss::simulation::place_reference;
use rustypss::waveform::{load_samples, write_waveform_file};
use rustypss::{load_waveform, run_search, FrequencyHypothesis, ReferenceSequenceBank, SearchError};

#[path = "../test_utils.rs"]
mod test_utils;
use test_utils::{default_bank, scratch_dir, search_rate_config};

#[test]
fn test_reference_bank_save_and_load() {
    let dir = scratch_dir("bank");
    let bank = default_bank();

    let written = bank.save(&dir).unwrap();
    assert_eq!(written.len(), 3);
    assert!(dir.join("NID2_0.csv").exists());

    let loaded = ReferenceSequenceBank::load(&dir).unwrap();
    assert_eq!(loaded, bank);
}

#[test]
fn test_python_style_reference_file() {
    let dir = scratch_dir("python");
    for g in 0u8..3 {
        let text = format!("({g}+1j)\n(0.5-{g}j)\n");
        fs::write(dir.join(reference_file_name(g)), text).unwrap();
    }

    let bank = ReferenceSequenceBank::load(&dir).unwrap();
    assert_eq!(bank.sequence_len(), 2);
    assert_eq!(bank.get(2).unwrap()[0], Complex64::new(2.0, 1.0));
    assert_eq!(bank.get(2).unwrap()[1], Complex64::new(0.5, -2.0));
}

#[test]
fn test_missing_reference_file_aborts() {
    let dir = scratch_dir("missing");
    let bank = default_bank();
    bank.save(&dir).unwrap();
    fs::remove_file(dir.join("NID2_2.csv")).unwrap();

    let err = ReferenceSequenceBank::load(&dir).unwrap_err();
    assert!(matches!(err, SearchError::Io { .. }), "{err}");
}

#[test]
fn test_malformed_capture_record_aborts_load() {
    let dir = scratch_dir("malformed");
    let path = dir.join("capture.csv");
    fs::write(&path, "0.1+0.2i\n0.3-0.4i\n0.5+x\n0.7+0.8i\n").unwrap();

    match load_waveform(&path, 15.36e6).unwrap_err() {
        SearchError::Parse { line, record, .. } => {
            assert_eq!(line, 3);
            assert_eq!(record, "0.5+x");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_capture_file_round_trip_search() {
    let dir = scratch_dir("capture");
    let bank = default_bank();
    bank.save(&dir).unwrap();

    let config = search_rate_config();
    let samples = place_reference(&bank, 2, 640, 5000).unwrap();
    let path = dir.join("capture.csv");
    write_waveform_file(&path, &samples).unwrap();
    assert_eq!(load_samples(&path).unwrap(), samples);

    let waveform = load_waveform(&path, config.input_sample_rate).unwrap();
    let bank = ReferenceSequenceBank::load(&dir).unwrap();
    let report = run_search(Arc::new(waveform), Arc::new(bank), &config).unwrap();

    assert_eq!(report.best.fshift, FrequencyHypothesis(0.0));
    assert_eq!(report.best.group_id, 2);
    assert_eq!(report.best.peak_index, 640);
}

#[test]
fn test_blank_line_between_records_aborts_load() {
    let dir = scratch_dir("gap");
    let path = dir.join("capture.csv");
    fs::write(&path, "1+1i\n\n2+2i\n").unwrap();

    match load_waveform(&path, 15.36e6).unwrap_err() {
        SearchError::Parse { line, .. } => assert_eq!(line, 2),
        other => panic!("unexpected error: {other}"),
    }

    // Trailing blank lines are not records
    fs::write(&path, "1+1i\n2+2i\n\n\n").unwrap();
    assert_eq!(load_waveform(&path, 15.36e6).unwrap().len(), 2);
}
