//! Error taxonomy for the transcription engine.
//!
//! Engine-internal invariants (contiguity, length, deletion) are programming
//! errors and are never caught by the pipeline; caller-facing conditions
//! (empty query, no results, missing index files) are ordinary variants the
//! caller is expected to match on.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhoneticsError {
    /// A mapping span lost contiguity with its neighbour mid-pipeline.
    #[error(
        "mapping invariant violated: span {index} ends at {end} but the next span starts at {next_start}"
    )]
    InvariantViolated {
        index: usize,
        end: u32,
        next_start: u32,
    },

    /// The merger received an empty step mapping for a non-empty accumulator.
    #[error("step mapping is empty but the accumulated mapping has {acc_len} entries")]
    EmptyStepMapping { acc_len: usize },

    /// Loaded index row count disagrees with the normalized phoneme corpus.
    #[error("index is corrupt: {rows} rows but {codepoints} reference codepoints")]
    IndexCorrupt { rows: usize, codepoints: usize },

    #[error("index file not found: {0}")]
    IndexMissing(PathBuf),

    #[error("search query is empty")]
    QueryEmpty,

    #[error("error ratio {0} is outside [0, 1]")]
    ErrorRatioOutOfRange(f32),

    /// The search finished but matched nothing; raise the error ratio.
    #[error("no results found for the query")]
    NoResults,

    #[error("invalid tag `{tag}` for rule `{rule}`; allowed: {allowed}")]
    TagInvalid {
        rule: &'static str,
        tag: String,
        allowed: &'static str,
    },

    /// An operation table row failed to compile.
    #[error("operation `{operation}` row {row} has a bad pattern: {source}")]
    BadPattern {
        operation: &'static str,
        row: usize,
        #[source]
        source: regex::Error,
    },

    #[error("corpus error: {0}")]
    CorpusError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PhoneticsError>;
