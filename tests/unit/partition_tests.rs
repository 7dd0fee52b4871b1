/*!
 * Tests for timeline partitioning
 */

use subalign::alignment::{
    gap_sections, merge_ellipsized, partition_by_components, partition_by_gaps, partition_equal_size,
    split_by_source_gaps, TrackAligner,
};
use subalign::app_config::{PartitionConfig, PartitionStrategy};
use subalign::errors::AlignmentError;
use subalign::subtitle_processor::{collate, TrackSide};
use subalign::timecode::{TimeSpan, Timed};
use crate::common;

fn spans(seconds: &[(i64, i64)]) -> Vec<TimeSpan> {
    seconds
        .iter()
        .map(|(start, end)| TimeSpan::new(start * 1_000_000, end * 1_000_000))
        .collect()
}

/// A sentence cut by a silence is rejoined when its first part trails off
#[test]
fn test_mergeEllipsized_withTrailingSentence_shouldJoinPartitions() {
    let source = common::parse_track(
        &common::srt_from(&[(0.0, 2.0, "I was going to..."), (5.0, 7.0, "say something.")]),
        TrackSide::Source,
        "en",
    );
    let target = common::parse_track(
        &common::srt_from(&[(0.0, 2.0, "Iba a decir algo."), (5.0, 7.0, "Nada.")]),
        TrackSide::Target,
        "es",
    );
    let collated = collate(&source, &target);

    let split = partition_by_gaps(&collated, 3_000_000, true);
    assert_eq!(split.len(), 2);
    assert!(split[0].source.trails_off());

    let merged = merge_ellipsized(split.clone(), 4_000_000, true);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].index, 0);
    assert_eq!(merged[0].source.texts(), vec!["I was going to... say something."]);
    assert_eq!(merged[0].target.texts(), vec!["Iba a decir algo.", "Nada."]);

    assert_eq!(merge_ellipsized(split.clone(), 0, true).len(), 2);
    assert_eq!(merge_ellipsized(split, 2_000_000, true).len(), 2);
}

/// Units joined only through a shared utterance land in one component
#[test]
fn test_partitionByComponents_withSharedUtterance_shouldUnion() {
    let source = common::parse_track(
        &common::srt_from(&[(0.0, 2.0, "Hello there, my"), (5.0, 7.0, "friend."), (20.0, 21.0, "Bye.")]),
        TrackSide::Source,
        "en",
    );
    let target = common::parse_track(
        &common::srt_from(&[(0.5, 2.0, "Hola."), (5.5, 7.0, "Amigo.")]),
        TrackSide::Target,
        "es",
    );
    let aligner = TrackAligner::default();
    let collated = collate(&source, &target);

    let partitions = partition_by_components(&collated, &aligner.utterances(&source), &aligner.utterances(&target));

    assert_eq!(partitions.len(), 2);
    assert_eq!(partitions[0].unit_count(), 4);
    assert_eq!(partitions[0].source.utterances.len(), 1);
    assert_eq!(partitions[1].unit_count(), 1);
    assert!(partitions[1].target.is_empty());
}

/// No unit is lost or repeated, and partitions follow each other in time
#[test]
fn test_partition_onScene_shouldCoverEveryUnitOnce() {
    let source = common::parse_track(&common::scene_source_srt(), TrackSide::Source, "en");
    let target = common::parse_track(&common::scene_target_srt(), TrackSide::Target, "es");

    for strategy in [PartitionStrategy::Gaps, PartitionStrategy::Components] {
        let config = PartitionConfig { strategy, ..PartitionConfig::default() };
        let partitions = TrackAligner::default().partition(&source, &target, &config);

        let mut ids: Vec<_> = partitions.iter().flat_map(|p| p.unit_ids()).collect();
        assert_eq!(ids.len(), source.len() + target.len(), "{} strategy", strategy);
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), source.len() + target.len(), "{} strategy", strategy);
        assert!(partitions.windows(2).all(|w| w[0].start() <= w[1].start()));
    }
}

/// A long unit covers the shorter ones inside it when measuring silence
#[test]
fn test_gapSections_withLongItem_shouldMeasureFromLatestEnd() {
    let items = spans(&[(0, 10), (2, 3), (11, 12), (20, 21)]);
    let sections = gap_sections(&items, 3_000_000);

    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0].len(), 3);
    assert_eq!(sections[1].len(), 1);

    for pair in sections.windows(2) {
        let latest_end = pair[0].iter().map(|s| s.end).max().unwrap_or_default();
        assert!(pair[1][0].start - latest_end >= 3_000_000);
    }
    assert!(gap_sections::<TimeSpan>(&[], 3_000_000).is_empty());
}

/// Equal-size groups grow until they reach a silence
#[test]
fn test_partitionEqualSize_shouldGrowToGaps() {
    let items = spans(&[(0, 1), (2, 3), (4, 5), (10, 11), (12, 13), (14, 15)]);
    let groups = partition_equal_size(&items, 3, 4_000_000).unwrap();

    let sizes: Vec<usize> = groups.iter().map(|g| g.len()).collect();
    assert_eq!(sizes, vec![3, 2, 1]);
    assert_eq!(groups.iter().map(|g| g.len()).sum::<usize>(), items.len());
    assert_eq!(partition_equal_size(&items, 0, 0), Err(AlignmentError::InvalidPartitionCount(0)));
}

/// Target units follow the source section they start in
#[test]
fn test_splitBySourceGaps_shouldAssignTargetsByStart() {
    let source = common::parse_track(
        &common::srt_from(&[(0.0, 1.0, "A."), (2.0, 3.0, "B."), (20.0, 21.0, "C.")]),
        TrackSide::Source,
        "en",
    );
    let target = common::parse_track(
        &common::srt_from(&[(0.5, 1.5, "a."), (19.0, 20.0, "b."), (22.0, 23.0, "c.")]),
        TrackSide::Target,
        "es",
    );

    let groups = split_by_source_gaps(&source.units, &target.units, 10_000_000);

    let sizes: Vec<(usize, usize)> = groups.iter().map(|(s, t)| (s.len(), t.len())).collect();
    assert_eq!(sizes, vec![(2, 2), (1, 1)]);
}
