//! Synthetic PSS references and captures
//!
//! Stand-ins for the radio capture scripts: everything needed to produce
//! reference files and test captures without hardware.

pub mod capture;
pub mod noise;
pub mod pss;

pub use capture::{place_reference, synthesize_capture, CaptureSpec};
pub use pss::{generate_reference_bank, pss_symbols, pss_time_domain};
