/*!
 * Integration tests for the file-level alignment workflows
 */

use std::fs;
use anyhow::Result;

use subalign::app_config::Config;
use subalign::app_controller::{Controller, OffsetOutcome};
use crate::common;

/// Align two files and write the pair blocks next to the source
#[test]
fn test_runAlign_withSceneFiles_shouldWriteAlignedPairs() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "film.en.srt", &common::scene_source_srt())?;
    let target = common::create_test_file(temp_dir.path(), "film.es.srt", &common::scene_target_srt())?;

    let controller = Controller::new_for_test()?;
    let output = controller.run_align(&source, &target, None)?;

    assert_eq!(output, temp_dir.path().join("film.en.aligned"));
    let content = fs::read_to_string(&output)?;
    assert!(content.starts_with("Where were you last night?\n¿Dónde estabas anoche?\n\n"));
    assert!(content.contains("It will look like a... heart attack.\nParecerá un infarto.\n"));
    assert!(content.ends_with("Me.\n***\n"));
    Ok(())
}

/// A minimum length drops short pairs from the output
#[test]
fn test_runAlign_withMinimumLength_shouldSkipShortPairs() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "film.en.srt", &common::scene_source_srt())?;
    let target = common::create_test_file(temp_dir.path(), "film.es.srt", &common::scene_target_srt())?;
    let requested = temp_dir.path().join("out/pairs.txt");

    let mut config = Config::default();
    config.alignment.min_pair_length = 15;
    let controller = Controller::with_config(config)?;
    let output = controller.run_align(&source, &target, Some(requested.clone()))?;

    assert_eq!(output, requested);
    let content = fs::read_to_string(&output)?;
    assert_eq!(content.matches("\n\n").count(), 1);
    assert!(content.contains("Parecerá un infarto."));
    assert!(!content.contains("Me."));
    Ok(())
}

/// Sentence, index and overlap files are written for both sides
#[test]
fn test_runOverlaps_withGapStrategy_shouldWriteFilesPerSide() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "film.en.srt", &common::scene_source_srt())?;
    let target = common::create_test_file(temp_dir.path(), "film.es.srt", &common::scene_target_srt())?;

    let partitions = Controller::new_for_test()?.run_overlaps(&source, &target)?;
    assert_eq!(partitions, 2);

    let sentences = fs::read_to_string(temp_dir.path().join("film.en.sent"))?;
    assert_eq!(sentences, "Where were you last night?\nIt will look like a... heart attack.\nWho's there?\nMe.\n");

    let indices = fs::read_to_string(temp_dir.path().join("film.en.sent-index"))?;
    assert_eq!(indices, "[1]\n[2, 3]\n[5]\n[5]\n");

    let overlaps = fs::read_to_string(temp_dir.path().join("film.en.overlap"))?;
    assert_eq!(overlaps.lines().count(), 6);
    assert!(overlaps.lines().any(|line| line == "Who's there? Me."));
    assert!(!overlaps.contains("heart attack. Who's there?"));

    assert!(temp_dir.path().join("film.es.sent").exists());
    assert!(temp_dir.path().join("film.es.overlap").exists());
    Ok(())
}

/// Both files are cut at the long silence of the source
#[test]
fn test_runSplit_shouldWriteNumberedFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "film.en.srt", &common::scene_source_srt())?;
    let target = common::create_test_file(temp_dir.path(), "film.es.srt", &common::scene_target_srt())?;

    let sections = Controller::new_for_test()?.run_split(&source, &target, Some(10.0), None)?;
    assert_eq!(sections, 2);

    let second_target = fs::read_to_string(temp_dir.path().join("film.es-002.srt"))?;
    assert!(second_target.starts_with("1\n00:00:30,600 --> 00:00:33,200\n"));
    let first_source = fs::read_to_string(temp_dir.path().join("film.en-001.srt"))?;
    assert_eq!(first_source.matches(" --> ").count(), 3);
    Ok(())
}

/// Equal parts follow the source unit count when every silence is long enough
#[test]
fn test_runSplit_withParts_shouldWriteEqualSections() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "film.en.srt", &common::regular_srt(12, 3.0, 2.0, 0.0, "Line"))?;
    let target = common::create_test_file(temp_dir.path(), "film.es.srt", &common::regular_srt(12, 3.0, 2.0, 0.2, "Línea"))?;
    let controller = Controller::new_for_test()?;

    assert_eq!(controller.run_split(&source, &target, Some(0.5), Some(2))?, 2);
    let first = fs::read_to_string(temp_dir.path().join("film.en-001.srt"))?;
    assert_eq!(first.matches(" --> ").count(), 6);
    let second = fs::read_to_string(temp_dir.path().join("film.es-002.srt"))?;
    assert_eq!(second.matches(" --> ").count(), 6);

    assert!(controller.run_split(&source, &target, None, Some(0)).is_err());
    Ok(())
}

/// The early track is delayed in place; a second run finds nothing to fix
#[test]
fn test_runFixOffset_withLateTarget_shouldDelaySource() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let source_srt = common::regular_srt(40, 5.0, 4.0, 0.0, "Line");
    let source = common::create_test_file(temp_dir.path(), "film.en.srt", &source_srt)?;
    let target = common::create_test_file(
        temp_dir.path(),
        "film.es.srt",
        &common::regular_srt(40, 5.0, 4.0, 2.2, "Línea"),
    )?;
    let controller = Controller::new_for_test()?;

    match controller.run_fix_offset(&source, &target, true)? {
        OffsetOutcome::DryRun { file, estimate } => {
            assert_eq!(file, source);
            assert_eq!(estimate.offset_micros, 2_200_000);
            assert!(estimate.source_is_early());
            assert_eq!(estimate.samples, 40);
        }
        other => panic!("Expected a dry run, got {:?}", other),
    }
    assert_eq!(fs::read_to_string(&source)?, source_srt);

    let outcome = controller.run_fix_offset(&source, &target, false)?;
    assert!(matches!(outcome, OffsetOutcome::Corrected { ref file, .. } if *file == source));
    let corrected = fs::read_to_string(&source)?;
    assert!(corrected.starts_with("1\n00:00:02,200 --> 00:00:06,200\nLine number 1.\n"));

    let outcome = controller.run_fix_offset(&source, &target, false)?;
    assert!(matches!(outcome, OffsetOutcome::WithinTolerance(estimate) if estimate.offset_micros == 0));
    Ok(())
}

/// A drift exactly at the configured minimum is left alone
#[test]
fn test_runFixOffset_withDriftEqualToMinimum_shouldLeaveFilesUntouched() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source_srt = common::regular_srt(40, 5.0, 4.0, 0.0, "Line");
    let source = common::create_test_file(temp_dir.path(), "film.en.srt", &source_srt)?;
    let target = common::create_test_file(
        temp_dir.path(),
        "film.es.srt",
        &common::regular_srt(40, 5.0, 4.0, 2.2, "Línea"),
    )?;

    let mut config = Config::default();
    config.alignment.min_offset_secs = 2.2;
    let outcome = Controller::with_config(config)?.run_fix_offset(&source, &target, false)?;

    assert!(matches!(outcome, OffsetOutcome::WithinTolerance(estimate) if estimate.offset_micros == 2_200_000));
    assert_eq!(fs::read_to_string(&source)?, source_srt);
    Ok(())
}

/// Too few pairs to sample a drift window is an error
#[test]
fn test_runFixOffset_withShortFilm_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "film.en.srt", &common::scene_source_srt())?;
    let target = common::create_test_file(temp_dir.path(), "film.es.srt", &common::scene_target_srt())?;

    let result = Controller::new_for_test()?.run_fix_offset(&source, &target, false);
    assert!(result.is_err());
    assert_eq!(fs::read_to_string(&source)?, common::scene_source_srt());
    Ok(())
}

/// Missing and empty inputs are rejected before any output is written
#[test]
fn test_runAlign_withBadInputs_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "film.en.srt", &common::scene_source_srt())?;
    let empty = common::create_test_file(temp_dir.path(), "empty.es.srt", "\n\n")?;
    let controller = Controller::new_for_test()?;

    assert!(controller.run_align(&source, &temp_dir.path().join("missing.srt"), None).is_err());
    assert!(controller.run_align(&source, &empty, None).is_err());
    assert!(!temp_dir.path().join("film.en.aligned").exists());
    Ok(())
}

/// Invalid configurations are refused by the controller
#[test]
fn test_controller_withInvalidConfig_shouldFail() {
    let mut config = Config::default();
    config.alignment.offset_sample_size = 0;
    assert!(Controller::with_config(config).is_err());
}
