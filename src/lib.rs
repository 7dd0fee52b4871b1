/*!
 * # subalign - sentence alignment of subtitle tracks
 *
 * A Rust library that matches the captions of two languages for the same film
 * into sentence-level pairs, suitable as parallel-corpus training data.
 *
 * ## Features
 *
 * - SRT parsing with microsecond timecodes
 * - Rule-based caption cleanup and speaker splitting
 * - Sentence assembly across caption units
 * - Candidate matching by time overlap with greedy conflict resolution
 * - Timeline partitioning by overlap components or silence gaps
 * - Drift estimation and correction between tracks
 * - Sentence, index, overlap and split-file export
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `timecode`: Interval model and SRT timestamps
 * - `subtitle_processor`: Caption units and tracks
 * - `text_filter`: Text cleanup, speaker splitting, sentence predicates
 * - `alignment`: The alignment engine:
 *   - `alignment::utterance`: Sentence assembly
 *   - `alignment::matcher`: Candidate lookup
 *   - `alignment::resolver`: Conflict resolution and pair editing
 *   - `alignment::partition`: Timeline partitioning
 *   - `alignment::offset`: Drift estimation
 * - `export`: Output layouts
 * - `app_config`: Configuration management
 * - `app_controller`: Workflows behind the command line
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod alignment;
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod export;
pub mod file_utils;
pub mod language_utils;
pub mod subtitle_processor;
pub mod text_filter;
pub mod timecode;

// Re-export main types for easier usage
pub use alignment::{align, Alignment, AlignmentPair, CandidateSet, Partition, TrackAligner, Utterance, UtteranceSet};
pub use app_config::Config;
pub use errors::{AlignmentError, AppError, SubtitleError};
pub use language_utils::{get_language_name, language_codes_match, normalize_code};
pub use subtitle_processor::{CaptionTrack, CaptionUnit, TrackSide, UnitId};
pub use text_filter::TextPipeline;
pub use timecode::{TimeSpan, Timed};
