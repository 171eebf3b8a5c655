//! PSS Acquisition Search
//!
//! Loads a captured waveform and the three PSS reference files, then searches
//! every frequency offset hypothesis in parallel for the best NID2 match.
//!
//! **Usage**:
//! ```bash
//! cargo run --release --bin pss_search -- capture.csv --refs ./PSS_Seq
//! cargo run --release --bin pss_search -- capture.csv -f 0 -f 15000 -f 30000 -f 45000
//! ```
//!
//! **Output**:
//! One line per hypothesis (fshift, NID2, peak index, magnitude) and the
//! selected global result. Set `RUST_LOG=rustypss=debug` for pipeline details.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use rustypss::tracing_init::init_tracing;
use rustypss::{
    load_waveform, run_search, CarrierConfig, FrequencyHypothesis, ReferenceSequenceBank,
    SearchConfig,
};

#[derive(Parser, Debug)]
#[command(about = "Search a capture for the PSS across carrier offset hypotheses")]
struct Args {
    /// Capture file, one complex sample per line
    capture: PathBuf,

    /// Directory holding NID2_0.csv, NID2_1.csv, NID2_2.csv
    #[arg(short, long, default_value = "./PSS_Seq")]
    refs: PathBuf,

    /// Capture sample rate in Hz
    #[arg(short = 's', long, default_value_t = 15.36e6)]
    sample_rate: f64,

    /// Frequency offset hypothesis in Hz (repeatable)
    #[arg(short = 'f', long = "fshift", allow_negative_numbers = true)]
    fshifts: Vec<f64>,

    /// Sync FFT size covering the SS burst
    #[arg(long, default_value_t = 256)]
    sync_nfft: usize,

    /// Numerology (subcarrier spacing = 15 kHz * 2^mu)
    #[arg(short, long, default_value_t = 1)]
    mu: u8,

    /// Grid size in resource blocks
    #[arg(long, default_value_t = 20)]
    nrb: u32,

    /// Seconds to wait for all hypothesis workers
    #[arg(short, long, default_value_t = 120)]
    timeout: u64,
}

impl Args {
    fn search_config(&self) -> SearchConfig {
        let defaults = SearchConfig::default();
        let hypotheses = if self.fshifts.is_empty() {
            defaults.hypotheses
        } else {
            self.fshifts.iter().copied().map(FrequencyHypothesis).collect()
        };

        SearchConfig {
            input_sample_rate: self.sample_rate,
            hypotheses,
            sync_nfft: self.sync_nfft,
            carrier: CarrierConfig {
                n_size_grid: self.nrb,
                numerology: self.mu,
            },
            worker_timeout: Duration::from_secs(self.timeout),
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();
    let config = args.search_config();

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    println!("Loading capture: {}", args.capture.display());
    let waveform = match load_waveform(&args.capture, config.input_sample_rate) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error loading capture: {}", e);
            return ExitCode::FAILURE;
        }
    };
    println!("  Samples: {}", waveform.len());
    println!("  Duration: {:.3} ms", waveform.duration() * 1e3);

    println!("Loading PSS references: {}", args.refs.display());
    let bank = match ReferenceSequenceBank::load(&args.refs) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error loading references: {}", e);
            return ExitCode::FAILURE;
        }
    };
    println!("  Sequence length: {}", bank.sequence_len());

    println!();
    println!("Searching {} hypotheses:", config.hypotheses.len());
    println!("  Search rate: {:.3} MHz", config.search_sample_rate() / 1e6);
    println!(
        "  Carrier: {} RB, SCS {} kHz",
        config.carrier.n_size_grid,
        config.carrier.subcarrier_spacing() / 1e3
    );
    println!();

    let start = Instant::now();
    let report = match run_search(Arc::new(waveform), Arc::new(bank), &config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Search failed: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let elapsed = start.elapsed();

    println!("{:>10}  {:>4}  {:>10}  {:>14}", "fshift Hz", "NID2", "peak", "magnitude");
    for outcome in report.outcomes.values() {
        println!(
            "{:>10}  {:>4}  {:>10}  {:>14.6e}",
            outcome.fshift.hz(),
            outcome.group_id,
            outcome.peak_index,
            outcome.magnitude
        );
    }

    let best = report.best;
    println!();
    println!(
        "Selected: fshift {} Hz, NID2 {}, peak index {}, magnitude {:.6e}",
        best.fshift.hz(),
        best.group_id,
        best.peak_index,
        best.magnitude
    );
    println!("Search time: {:.1} ms", elapsed.as_secs_f64() * 1e3);

    ExitCode::SUCCESS
}
