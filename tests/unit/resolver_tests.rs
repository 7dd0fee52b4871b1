/*!
 * Tests for candidate matching, conflict resolution and pair editing
 */

use subalign::alignment::{align, Alignment, TrackAligner, UtteranceSet};
use subalign::errors::AlignmentError;
use subalign::subtitle_processor::TrackSide;
use crate::common;

fn utterances(blocks: &[(f64, f64, &str)], side: TrackSide) -> UtteranceSet {
    let track = common::parse_track(&common::srt_from(blocks), side, "en");
    UtteranceSet::assemble(&track.units, true)
}

/// A target claimed by three sources ends with the one overlapping it most
#[test]
fn test_align_withThreeClaimants_shouldKeepLargestOverlap() {
    let source = utterances(
        &[(0.0, 2.0, "One."), (2.0, 6.0, "Two."), (6.0, 7.0, "Three.")],
        TrackSide::Source,
    );
    let target = utterances(&[(1.0, 6.5, "Uno dos tres.")], TrackSide::Target);

    let alignment = align(&source, &target);

    let owners: Vec<usize> = alignment
        .iter()
        .enumerate()
        .filter(|(_, pair)| pair.has_target())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(owners, vec![1]);
    assert_eq!(alignment.pairs()[1].target_text(), "Uno dos tres.");
}

/// Equal overlaps go to the earlier pair
#[test]
fn test_align_withTiedOverlap_shouldFavourEarlierPair() {
    let source = utterances(&[(0.0, 2.0, "First."), (2.0, 4.0, "Second.")], TrackSide::Source);
    let target = utterances(&[(1.0, 3.0, "Medio.")], TrackSide::Target);

    let alignment = align(&source, &target);
    assert!(alignment.pairs()[0].has_target());
    assert!(!alignment.pairs()[1].has_target());
}

/// After alignment no target appears in two pairs and each pair holds at most one
#[test]
fn test_align_onScene_shouldUseEachTargetOnce() {
    let source = common::parse_track(&common::scene_source_srt(), TrackSide::Source, "en");
    let target = common::parse_track(&common::scene_target_srt(), TrackSide::Target, "es");
    let alignment = TrackAligner::default().align(&source, &target).unwrap();

    assert_eq!(alignment.len(), 4);
    assert!(alignment.iter().all(|pair| pair.candidates.len() <= 1));

    let mut used: Vec<_> = alignment
        .iter()
        .filter_map(|pair| pair.target())
        .flat_map(|target| target.units.iter().copied())
        .collect();
    let total = used.len();
    used.sort();
    used.dedup();
    assert_eq!(used.len(), total);

    assert_eq!(alignment.pairs()[2].target_text(), "¿Quién anda ahí? Yo.");
    assert_eq!(alignment.aligned_count(), 3);
}

/// Unaligned pairs can be absorbed into their predecessor
#[test]
fn test_joinWithNext_shouldFoldUpToNextAlignedPair() {
    let source = utterances(
        &[(0.0, 1.0, "Wait."), (10.0, 11.0, "Listen."), (20.0, 21.0, "Go.")],
        TrackSide::Source,
    );
    let target = utterances(&[(20.0, 21.0, "Vete.")], TrackSide::Target);
    let mut alignment = align(&source, &target);

    alignment.join_with_next(0).unwrap();

    assert_eq!(alignment.len(), 1);
    assert_eq!(alignment.pairs()[0].source.text, "Wait. Listen. Go.");
    assert_eq!(alignment.pairs()[0].target_text(), "Vete.");
    assert_eq!(alignment.join_with_next(0), Err(AlignmentError::NothingToJoin { index: 0 }));
}

/// Duplicating inserts an unaligned copy right after the original
#[test]
fn test_duplicate_shouldInsertCopyWithoutTarget() {
    let source = utterances(&[(0.0, 1.0, "Wait."), (5.0, 6.0, "Go.")], TrackSide::Source);
    let target = utterances(&[(0.0, 1.0, "Espera.")], TrackSide::Target);
    let mut alignment = align(&source, &target);

    let inserted = alignment.duplicate(0).unwrap();

    assert_eq!(inserted, 1);
    assert_eq!(alignment.len(), 3);
    assert_eq!(alignment.pairs()[1].source.text, "Wait.");
    assert!(!alignment.pairs()[1].has_target());
    assert_eq!(alignment.next(0), Some(1));
    assert_eq!(alignment.previous(0), None);
}

/// Editing past the end reports the index
#[test]
fn test_clearTarget_withBadIndex_shouldFail() {
    let mut alignment = Alignment::default();
    assert_eq!(
        alignment.clear_target(3),
        Err(AlignmentError::PairOutOfRange { index: 3, len: 0 })
    );
}
