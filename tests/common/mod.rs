/*!
 * Common test utilities for the subalign test suite
 */

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use anyhow::Result;
use tempfile::TempDir;

use subalign::subtitle_processor::{CaptionTrack, TrackSide};
use subalign::text_filter::TextPipeline;
use subalign::timecode::format_timestamp;

/// Route library logs to the test harness; safe to call from every test
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Render `(start_secs, end_secs, text)` blocks as SRT, numbered from 1
pub fn srt_from(blocks: &[(f64, f64, &str)]) -> String {
    blocks
        .iter()
        .enumerate()
        .map(|(i, (start, end, text))| {
            format!(
                "{}\n{} --> {}\n{}\n",
                i + 1,
                format_timestamp((start * 1_000_000.0).round() as i64),
                format_timestamp((end * 1_000_000.0).round() as i64),
                text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A regular track: unit `i` runs from `i * period + delay` for `duration` seconds
pub fn regular_srt(count: usize, period: f64, duration: f64, delay: f64, label: &str) -> String {
    let texts: Vec<String> = (0..count).map(|i| format!("{} number {}.", label, i + 1)).collect();
    let blocks: Vec<(f64, f64, &str)> = texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let start = i as f64 * period + delay;
            (start, start + duration, text.as_str())
        })
        .collect();
    srt_from(&blocks)
}

/// Parse SRT text with the default pipeline
pub fn parse_track(content: &str, side: TrackSide, language: &str) -> CaptionTrack {
    CaptionTrack::parse(content, side, language, &TextPipeline::default())
}

/// English side of a short scene, with a sentence running across two units
pub fn scene_source_srt() -> String {
    srt_from(&[
        (10.0, 12.0, "Where were you last night?"),
        (13.0, 15.0, "It will look like a..."),
        (15.2, 17.0, "heart attack."),
        (30.0, 32.0, "<i>[door slams]</i>"),
        (30.5, 33.0, "- Who's there?\n- Me."),
    ])
}

/// Spanish side of the same scene
pub fn scene_target_srt() -> String {
    srt_from(&[
        (10.2, 12.1, "¿Dónde estabas anoche?"),
        (13.1, 17.0, "Parecerá un infarto."),
        (30.6, 33.2, "- ¿Quién anda ahí?\n- Yo."),
    ])
}
