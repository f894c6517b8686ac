//! Melody/Chord Corpus Filter
//!
//! Cleans a corpus of two-track MIDI files (melody + chords) for use as
//! training data. Each file is decoded, its tracks are trimmed to a common
//! end time, and a fixed sequence of musical checks decides whether the
//! aligned copy is kept.

pub mod aligner;
pub mod batch;
pub mod config;
pub mod error;
pub mod midi;
pub mod report;
pub mod sequence;
pub mod validator;

pub use aligner::Alignment;
pub use batch::BatchRunner;
pub use config::Config;
pub use error::{FilterError, Result as FilterResult};
pub use report::{BatchReport, RunSummary};
pub use sequence::{NoteEvent, Sequence, Track, TrackRole};
pub use validator::{RejectReason, Validator, VerdictRecord};

use serde::Serialize;
use std::path::Path;

/// An aligned sequence with its verdict
#[derive(Debug, Clone, Serialize)]
pub struct Classified {
    pub sequence: Sequence,
    pub alignment: Alignment,
    pub verdict: VerdictRecord,
}

/// Align-and-validate pipeline for single sequences
#[derive(Debug, Clone)]
pub struct SequenceFilter {
    config: Config,
    validator: Validator,
}

impl SequenceFilter {
    /// Create a new filter with the given configuration
    pub fn new(config: Config) -> Self {
        let validator = Validator::from_config(&config);
        Self { config, validator }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Decode a file, then align and validate it
    pub fn classify<P: AsRef<Path>>(&self, path: P) -> FilterResult<Classified> {
        let path = path.as_ref();
        let tracks = midi::read_tracks(path)?;
        self.classify_tracks(midi::file_name(path), tracks)
    }

    /// Align and validate already-decoded tracks.
    ///
    /// The track count is checked first; alignment and validation only run
    /// on exactly two tracks.
    pub fn classify_tracks(
        &self,
        name: impl Into<String>,
        tracks: Vec<Track>,
    ) -> FilterResult<Classified> {
        let sequence = Sequence::from_tracks(name, tracks)?;
        self.classify_sequence(sequence)
    }

    /// Align and validate a two-track sequence
    pub fn classify_sequence(&self, mut sequence: Sequence) -> FilterResult<Classified> {
        let alignment = aligner::align(&mut sequence)?;
        let verdict = self.validator.validate(&sequence);
        Ok(Classified {
            sequence,
            alignment,
            verdict,
        })
    }

    /// Write an accepted sequence into `output_dir` under its own name
    pub fn write<P: AsRef<Path>>(&self, sequence: &Sequence, output_dir: P) -> FilterResult<()> {
        let path = output_dir.as_ref().join(&sequence.name);
        midi::write_sequence(sequence, path, &self.config.output)
    }
}

/// Validate configuration and input location before a run
pub fn validate_input<P: AsRef<Path>>(input_dir: P, config: &Config) -> FilterResult<()> {
    let input_dir = input_dir.as_ref();
    if !input_dir.is_dir() {
        return Err(FilterError::InputDirMissing(input_dir.display().to_string()));
    }

    config::validate_config(config)?;

    Ok(())
}
