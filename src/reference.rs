//! PSS reference sequences, one per NID2 group id

use std::path::{Path, PathBuf};

use num::complex::Complex64;
use snafu::ensure;
use tracing::info;

use crate::error::{InvalidConfigSnafu, Result};
use crate::waveform::{load_samples, write_waveform_file};

/// Number of NID2 group-id hypotheses
pub const NUM_GROUPS: usize = 3;

/// File name holding the reference for `group_id`
pub fn reference_file_name(group_id: u8) -> String {
    format!("NID2_{group_id}.csv")
}

/// The three PSS reference sequences, indexed by group id
///
/// All sequences share one length so correlation magnitudes are comparable
/// across group ids.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSequenceBank {
    sequences: [Vec<Complex64>; NUM_GROUPS],
}

impl ReferenceSequenceBank {
    pub fn new(sequences: [Vec<Complex64>; NUM_GROUPS]) -> Result<Self> {
        let len = sequences[0].len();
        ensure!(
            len > 0,
            InvalidConfigSnafu { reason: "reference sequences must not be empty" }
        );
        ensure!(
            sequences.iter().all(|s| s.len() == len),
            InvalidConfigSnafu {
                reason: format!(
                    "reference lengths differ: {:?}",
                    sequences.iter().map(Vec::len).collect::<Vec<_>>()
                ),
            }
        );
        Ok(Self { sequences })
    }

    /// Load `NID2_0.csv`, `NID2_1.csv` and `NID2_2.csv` from `base_path`
    ///
    /// All three files must load before the bank exists.
    pub fn load(base_path: impl AsRef<Path>) -> Result<Self> {
        let base = base_path.as_ref();
        let [s0, s1, s2] = [0u8, 1, 2].map(|g| base.join(reference_file_name(g)));
        let bank = Self::new([load_samples(s0)?, load_samples(s1)?, load_samples(s2)?])?;

        info!(base = %base.display(), len = bank.sequence_len(), "loaded PSS references");
        Ok(bank)
    }

    /// Write the bank as three reference files under `base_path`
    pub fn save(&self, base_path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let base = base_path.as_ref();
        let mut written = Vec::with_capacity(NUM_GROUPS);
        for (group_id, sequence) in self.iter() {
            let path = base.join(reference_file_name(group_id));
            write_waveform_file(&path, sequence)?;
            written.push(path);
        }
        Ok(written)
    }

    /// Reference for `group_id`, if it is one of 0, 1, 2
    pub fn get(&self, group_id: u8) -> Option<&[Complex64]> {
        self.sequences.get(usize::from(group_id)).map(Vec::as_slice)
    }

    /// Iterate `(group_id, sequence)` in ascending group order
    pub fn iter(&self) -> impl Iterator<Item = (u8, &[Complex64])> {
        (0u8..).zip(self.sequences.iter().map(Vec::as_slice))
    }

    /// Common length of the sequences
    pub fn sequence_len(&self) -> usize {
        self.sequences[0].len()
    }

    /// Energy `sum |r|^2` of one sequence
    pub fn energy(&self, group_id: u8) -> Option<f64> {
        self.get(group_id).map(|s| s.iter().map(|c| c.norm_sqr()).sum())
    }
}
