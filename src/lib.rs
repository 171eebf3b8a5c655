pub mod acquisition;
pub mod config;
pub mod error;
pub mod reference;
pub mod simulation;
pub mod tracing_init;
pub mod waveform;

pub use acquisition::{run_search, FrequencyHypothesis, GlobalResult, HypothesisOutcome, SearchReport};
pub use config::{CarrierConfig, SearchConfig};
pub use error::{Result, SearchError};
pub use reference::ReferenceSequenceBank;
pub use waveform::{load_waveform, Waveform};
