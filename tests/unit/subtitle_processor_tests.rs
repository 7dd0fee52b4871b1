/*!
 * Tests for caption parsing and serialization
 */

use subalign::language_utils::language_from_path;
use subalign::subtitle_processor::{collate, CaptionTrack, TrackSide, UnitId};
use subalign::text_filter::TextPipeline;
use subalign::timecode::TimeSpan;
use crate::common;

/// Sound descriptions leave a unit with no fragments but keep it in the track
#[test]
fn test_parse_withSoundDescription_shouldKeepEmptyUnit() {
    let track = common::parse_track(&common::scene_source_srt(), TrackSide::Source, "en");

    assert_eq!(track.len(), 5);
    assert!(track.units[3].fragments.is_empty());
    assert_eq!(track.units[4].fragments, vec!["Who's there?", "Me."]);
    assert_eq!(track.units[2].span, TimeSpan::new(15_200_000, 17_000_000));
}

/// Units out of time order are sorted and their positions reassigned
#[test]
fn test_parse_withOutOfOrderBlocks_shouldSortByStart() {
    let content = "2\n00:00:05,000 --> 00:00:06,000\nSecond.\n\n1\n00:00:01,000 --> 00:00:02,000\nFirst.\n";
    let track = common::parse_track(content, TrackSide::Target, "es");

    assert_eq!(track.units[0].index, 1);
    assert_eq!(track.units[1].index, 2);
    for (position, unit) in track.units.iter().enumerate() {
        assert_eq!(unit.id, UnitId::new(TrackSide::Target, position));
    }
}

/// Serialization keeps the file indices and raw text
#[test]
fn test_toSrtString_shouldReproduceBlocks() {
    let content = "7\n00:00:01,000 --> 00:00:02,500\n<i>Hello.</i>\n\n9\n00:00:03,000 --> 00:00:04,000\nBye.\n";
    let track = common::parse_track(content, TrackSide::Source, "en");
    assert_eq!(track.to_srt_string(), content);

    let reparsed = common::parse_track(&track.to_srt_string(), TrackSide::Source, "en");
    assert_eq!(reparsed.units[0].fragments, vec!["Hello."]);
}

/// Subsets are renumbered from one
#[test]
fn test_unitsToSrtString_shouldRenumber() {
    let content = "7\n00:00:01,000 --> 00:00:02,000\nA.\n\n9\n00:00:03,000 --> 00:00:04,000\nB.\n";
    let track = common::parse_track(content, TrackSide::Source, "en");
    let output = CaptionTrack::units_to_srt_string(track.units.iter().skip(1));
    assert_eq!(output, "1\n00:00:03,000 --> 00:00:04,000\nB.\n");
}

/// Shifting earlier than zero clamps at the start of the film
#[test]
fn test_shift_withNegativeOffset_shouldSaturateAtZero() {
    let content = "1\n00:00:01,000 --> 00:00:05,000\nA.\n";
    let mut track = common::parse_track(content, TrackSide::Source, "en");
    track.shift(-2_000_000);
    assert_eq!(track.units[0].span, TimeSpan::new(0, 3_000_000));
}

/// Collation interleaves both sides by start time
#[test]
fn test_collate_shouldOrderBothSidesByStart() {
    let source = common::parse_track(&common::scene_source_srt(), TrackSide::Source, "en");
    let target = common::parse_track(&common::scene_target_srt(), TrackSide::Target, "es");
    let collated = collate(&source, &target);

    assert_eq!(collated.len(), source.len() + target.len());
    assert!(collated.windows(2).all(|w| w[0].span.start <= w[1].span.start));
    assert_eq!(collated[0].id, UnitId::new(TrackSide::Source, 0));
    assert_eq!(collated[1].id, UnitId::new(TrackSide::Target, 0));
}

/// The passthrough pipeline leaves markup in place
#[test]
fn test_parse_withPassthroughPipeline_shouldKeepMarkup() {
    let content = "1\n00:00:01,000 --> 00:00:02,000\n<i>[door slams]</i>\n";
    let track = CaptionTrack::parse(content, TrackSide::Source, "en", &TextPipeline::passthrough());
    assert_eq!(track.units[0].fragments, vec!["<i>[door slams]</i>"]);
}

/// Track language is read from the last segment of the file stem
#[test]
fn test_languageFromPath_shouldReadTrailingCode() {
    assert_eq!(language_from_path("films/heat.en.srt").as_deref(), Some("en"));
    assert_eq!(language_from_path("films/heat_spa.srt").as_deref(), Some("es"));
    assert_eq!(language_from_path("films/heat.srt"), None);
}
