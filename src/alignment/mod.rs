/*!
 * Alignment engine.
 *
 * This module turns two caption tracks into sentence-level pairs:
 * - `utterance`: sentence assembly across caption units
 * - `matcher`: candidate lookup by time overlap
 * - `resolver`: greedy conflict resolution and pair editing
 * - `partition`: splitting the collated timeline into sections
 * - `offset`: drift estimation between the tracks
 */

// Re-export main components
pub use self::matcher::{find_candidates, CandidateSet};
pub use self::offset::{estimate_drift, DriftEstimate, DEFAULT_SAMPLE_WINDOW};
pub use self::partition::{
    gap_sections, merge_ellipsized, partition_by_components, partition_by_gaps, partition_equal_size,
    split_by_source_gaps, split_equal_by_source, Partition, PartitionSide, SplitGroup,
};
pub use self::resolver::{align, Alignment, AlignmentPair};
pub use self::utterance::{Utterance, UtteranceSet};

// Submodules
pub mod matcher;
pub mod offset;
pub mod partition;
pub mod resolver;
pub mod utterance;

use log::{debug, warn};

use crate::app_config::{AlignmentConfig, PartitionConfig, PartitionStrategy};
use crate::errors::{AlignmentError, SubtitleError};
use crate::subtitle_processor::{collate, CaptionTrack};
use crate::timecode::seconds_to_micros;

/// Aligns one film's tracks with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct TrackAligner {
    config: AlignmentConfig,
}

impl TrackAligner {
    pub fn new(config: AlignmentConfig) -> Self {
        TrackAligner { config }
    }

    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    /// Assemble a whole track's utterances
    pub fn utterances(&self, track: &CaptionTrack) -> UtteranceSet {
        UtteranceSet::assemble(&track.units, self.config.find_sentence_boundaries)
    }

    /// Align every source utterance with zero or one target utterance
    pub fn align(&self, source: &CaptionTrack, target: &CaptionTrack) -> Result<Alignment, AlignmentError> {
        if source.is_empty() {
            return Err(AlignmentError::EmptyInput);
        }
        if target.is_empty() {
            warn!("Target track {} has no caption units; every pair will be unaligned", target.label());
        }

        let source_utterances = self.utterances(source);
        let target_utterances = self.utterances(target);
        Ok(align(&source_utterances, &target_utterances))
    }

    /// Align, then estimate drift around the middle of the film
    pub fn estimate_drift(&self, source: &CaptionTrack, target: &CaptionTrack) -> Result<DriftEstimate, AlignmentError> {
        let alignment = self.align(source, target)?;
        estimate_drift(&alignment, self.config.offset_sample_size)
    }

    /// Partition both tracks with the configured strategy
    pub fn partition(&self, source: &CaptionTrack, target: &CaptionTrack, config: &PartitionConfig) -> Vec<Partition> {
        let collated = collate(source, target);
        let find_boundaries = self.config.find_sentence_boundaries;

        let partitions = match config.strategy {
            PartitionStrategy::Components => {
                partition_by_components(&collated, &self.utterances(source), &self.utterances(target))
            }
            PartitionStrategy::Gaps => {
                partition_by_gaps(&collated, seconds_to_micros(config.gap_threshold_secs), find_boundaries)
            }
        };
        debug!("{} strategy produced {} partitions", config.strategy, partitions.len());

        merge_ellipsized(partitions, seconds_to_micros(config.merge_ellipsized_secs), find_boundaries)
    }

    /// Pairs worth exporting: aligned and longer than the configured minimum
    pub fn exportable<'a>(&self, alignment: &'a Alignment) -> impl Iterator<Item = &'a AlignmentPair> + 'a {
        let limit = self.config.min_pair_length;
        alignment.iter().filter(move |pair| limit == 0 || pair.is_longer_than(limit))
    }
}

/// Reject a track that produced no caption units
pub fn ensure_not_empty(track: &CaptionTrack) -> Result<(), SubtitleError> {
    if track.is_empty() {
        return Err(SubtitleError::EmptyTrack { label: track.label() });
    }
    Ok(())
}
