/*!
 * Error types for the subalign library.
 *
 * Parsing problems are mostly non-fatal: the parser logs them and drops the
 * offending block. Alignment errors abort the run for one film.
 */

use thiserror::Error;

/// Errors that can occur while reading caption blocks
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubtitleError {
    /// The timing line of a block does not match `HH:MM:SS,mmm --> HH:MM:SS,mmm`
    #[error("Malformed timecode: {line}")]
    MalformedTimecode {
        /// The offending line, trimmed
        line: String,
    },

    /// The first line of a block is not an integer index
    #[error("Invalid caption index in block: {block}")]
    InvalidIndex {
        /// First line of the rejected block
        block: String,
    },

    /// A block without a timing line
    #[error("Caption block has no timing line")]
    EmptyBlock,

    /// A track produced no usable caption units
    #[error("No caption units found in track {label}")]
    EmptyTrack {
        /// Track label (usually the file stem)
        label: String,
    },
}

/// Errors raised by the alignment engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlignmentError {
    /// The source track has nothing to align
    #[error("Nothing to align: the source track has no caption units")]
    EmptyInput,

    /// Too few alignments to sample a drift window
    #[error("Insufficient alignments to estimate drift: found {found}, need at least {required}")]
    InsufficientAlignments {
        /// Number of alignments available
        found: usize,
        /// Minimum number required
        required: usize,
    },

    /// The sample window held no pair with both sides present
    #[error("No aligned pair in the sample window has both a source and a target")]
    NoUsableSamples,

    /// Equal-size partitioning asked for zero groups
    #[error("Invalid partition count: {0}")]
    InvalidPartitionCount(usize),

    /// An edit referenced a pair that does not exist
    #[error("Alignment index {index} out of range ({len} pairs)")]
    PairOutOfRange {
        /// Requested position
        index: usize,
        /// Number of pairs
        len: usize,
    },

    /// Join found no later pair with a target
    #[error("No aligned pair after position {index} to join with")]
    NothingToJoin {
        /// Position of the pair being joined
        index: usize,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from caption parsing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from the alignment engine
    #[error("Alignment error: {0}")]
    Alignment(#[from] AlignmentError),
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
