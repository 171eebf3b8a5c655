//! PSS Capture Simulator
//!
//! Writes the three PSS reference files and a synthetic capture containing
//! one PSS burst with a carrier offset and optional AWGN, in the same text
//! format the search reads.
//!
//! Usage:
//!   pss_sim [OPTIONS] <output.csv>
//!
//! Examples:
//!   # NID2 1 at offset 1000, +30 kHz offset, 0 dB SNR
//!   pss_sim -g 1 -o 1000 -f 30000 -s 0 capture.csv --refs ./PSS_Seq
//!
//!   # Clean capture, references not written
//!   pss_sim capture.csv

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rustypss::simulation::{generate_reference_bank, synthesize_capture, CaptureSpec};
use rustypss::tracing_init::init_tracing;
use rustypss::waveform::write_waveform_file;
use rustypss::SearchConfig;

#[derive(Parser, Debug)]
#[command(about = "Generate PSS reference files and a synthetic capture")]
struct Args {
    /// Output capture file
    output: PathBuf,

    /// Also write NID2_{0,1,2}.csv into this directory
    #[arg(long)]
    refs: Option<PathBuf>,

    /// NID2 of the embedded PSS
    #[arg(short, long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..3))]
    group: u8,

    /// Burst start in samples at the search rate
    #[arg(short, long, default_value_t = 1000)]
    offset: usize,

    /// Capture length in samples at the search rate
    #[arg(short, long, default_value_t = 20_000)]
    len: usize,

    /// Carrier frequency offset in Hz
    #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
    fshift: f64,

    /// Burst SNR in dB; omit for a noiseless capture
    #[arg(short, long, allow_negative_numbers = true)]
    snr: Option<f64>,

    /// RNG seed for the noise
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

fn run(args: &Args) -> rustypss::Result<()> {
    let config = SearchConfig::default();
    let bank = generate_reference_bank(&config.carrier, config.sync_nfft)?;

    if let Some(dir) = &args.refs {
        if let Err(e) = fs::create_dir_all(dir) {
            return Err(rustypss::SearchError::Io { path: dir.clone(), source: e });
        }
        for path in bank.save(dir)? {
            println!("Wrote reference: {}", path.display());
        }
    }

    let spec = CaptureSpec {
        group_id: args.group,
        offset: args.offset,
        len: args.len,
        fshift: args.fshift,
        snr_db: args.snr,
        seed: args.seed,
    };
    let capture = synthesize_capture(&bank, &config, &spec)?;
    write_waveform_file(&args.output, capture.samples())?;

    println!("Wrote capture: {}", args.output.display());
    println!("  Samples: {} at {:.2} MHz", capture.len(), capture.sample_rate() / 1e6);
    println!("  NID2: {}", spec.group_id);
    println!("  Offset: {} samples at search rate", spec.offset);
    println!("  Frequency offset: {} Hz", spec.fshift);
    match spec.snr_db {
        Some(snr) => println!("  SNR: {} dB", snr),
        None => println!("  SNR: noiseless"),
    }

    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
