use anyhow::{Result, Context, anyhow};
use log::{error, warn, info, debug};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};

use crate::alignment::{
    ensure_not_empty, split_by_source_gaps, split_equal_by_source, Alignment, DriftEstimate, TrackAligner,
};
use crate::app_config::Config;
use crate::export::{self, OverlapCollector};
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::subtitle_processor::{CaptionTrack, TrackSide};
use crate::text_filter::TextPipeline;
use crate::timecode::{micros_to_seconds, seconds_to_micros};

// @module: Application controller for the alignment workflows

/// Outcome of a drift correction run
#[derive(Debug, Clone, PartialEq)]
pub enum OffsetOutcome {
    /// Drift at or below the configured minimum; nothing rewritten
    WithinTolerance(DriftEstimate),
    /// The named file was delayed by the estimated drift
    Corrected { file: PathBuf, estimate: DriftEstimate },
    /// Correction needed but not written
    DryRun { file: PathBuf, estimate: DriftEstimate },
}

/// Main application controller for caption alignment
pub struct Controller {
    // @field: App configuration
    config: Arc<Config>,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config: Arc::new(config) })
    }

    /// Controller with the default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn aligner(&self) -> TrackAligner {
        TrackAligner::new(self.config.alignment.clone())
    }

    /// Read and parse one caption file; the language comes from the file name when it carries one
    pub fn load_track(config: &Config, path: &Path, side: TrackSide) -> Result<CaptionTrack> {
        let fallback = match side {
            TrackSide::Source => &config.source_language,
            TrackSide::Target => &config.target_language,
        };
        let language = language_utils::language_from_path(path).unwrap_or_else(|| fallback.clone());

        let content = FileManager::read_subtitle_text(path)?;
        let pipeline = TextPipeline::from_config(&config.alignment);
        let track = CaptionTrack::parse(&content, side, &language, &pipeline).with_source_file(path);
        ensure_not_empty(&track)?;

        debug!("Loaded {} {} units from {:?} ({})", track.len(), side, path, language);
        Ok(track)
    }

    fn load_pair(&self, source: &Path, target: &Path) -> Result<(CaptionTrack, CaptionTrack)> {
        let source_track = Self::load_track(&self.config, source, TrackSide::Source)?;
        let target_track = Self::load_track(&self.config, target, TrackSide::Target)?;
        Ok((source_track, target_track))
    }

    /// Align two caption files in memory
    pub fn align_files(&self, source: &Path, target: &Path) -> Result<Alignment> {
        let (source_track, target_track) = self.load_pair(source, target)?;
        let alignment = self
            .aligner()
            .align(&source_track, &target_track)
            .with_context(|| format!("Failed to align {:?} with {:?}", source, target))?;
        Ok(alignment)
    }

    /// Align two files and write the pair blocks; returns the output path
    pub fn run_align(&self, source: &Path, target: &Path, output: Option<PathBuf>) -> Result<PathBuf> {
        let start_time = Instant::now();
        let alignment = self.align_files(source, target)?;
        let aligner = self.aligner();

        let output_path = output.unwrap_or_else(|| export::sibling_path(source, export::ALIGNED_EXTENSION));
        let exported: Vec<_> = aligner.exportable(&alignment).collect();
        FileManager::write_to_file(&output_path, &export::format_alignment(exported.iter().copied()))?;

        info!(
            "Aligned {} of {} source sentences ({} written) in {:.2}s -> {}",
            alignment.aligned_count(),
            alignment.len(),
            exported.len(),
            start_time.elapsed().as_secs_f64(),
            output_path.display()
        );
        Ok(output_path)
    }

    /// Write `.sent` and `.sent-index` for one caption file; returns the sentence count
    pub fn export_sentences(config: &Config, path: &Path, with_index: bool) -> Result<usize> {
        let track = Self::load_track(config, path, TrackSide::Source)?;
        let utterances = TrackAligner::new(config.alignment.clone()).utterances(&track);

        FileManager::write_to_file(
            export::sibling_path(path, export::SENT_EXTENSION),
            &export::format_sentences(&utterances),
        )?;
        if with_index {
            FileManager::write_to_file(
                export::sibling_path(path, export::SENT_INDEX_EXTENSION),
                &export::format_sentence_index(&utterances, &track.units),
            )?;
        }
        Ok(utterances.len())
    }

    /// Sentence export for a file, or for every `.srt` under a directory with `jobs` films at a time
    pub async fn run_sentences(&self, input: PathBuf, with_index: bool, jobs: usize) -> Result<usize> {
        if FileManager::file_exists(&input) {
            let count = Self::export_sentences(&self.config, &input, with_index)?;
            info!("Wrote {} sentences for {}", count, input.display());
            return Ok(1);
        }
        if !FileManager::dir_exists(&input) {
            return Err(anyhow!("Input path does not exist: {:?}", input));
        }

        let files = FileManager::find_files(&input, "srt")?;
        if files.is_empty() {
            return Err(anyhow!("No subtitle files found in directory: {:?}", input));
        }

        let progress = ProgressBar::new(files.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} films ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress.set_style(style.progress_chars("█▓▒░"));
        progress.set_message("Extracting sentences");

        let results: Vec<(PathBuf, Result<usize>)> = stream::iter(files)
            .map(|file| {
                let config = Arc::clone(&self.config);
                let progress = progress.clone();
                async move {
                    let task_file = file.clone();
                    let result = tokio::task::spawn_blocking(move || {
                        Self::export_sentences(&config, &task_file, with_index)
                    })
                    .await
                    .context("Sentence export task panicked")
                    .and_then(|r| r);
                    progress.inc(1);
                    (file, result)
                }
            })
            .buffer_unordered(jobs.max(1))
            .collect()
            .await;

        progress.finish_with_message("Sentence extraction complete");

        let mut success_count = 0;
        for (file, result) in results {
            match result {
                Ok(count) => {
                    debug!("{}: {} sentences", file.display(), count);
                    success_count += 1;
                }
                Err(e) => error!("Error processing file {}: {}", file.display(), e),
            }
        }
        info!("Sentence extraction finished: {} films processed", success_count);
        Ok(success_count)
    }

    /// Partition both tracks and write sentences, indices and overlap lines per side
    pub fn run_overlaps(&self, source: &Path, target: &Path) -> Result<usize> {
        let (source_track, target_track) = self.load_pair(source, target)?;
        let partitioning = &self.config.partitioning;
        info!(
            "Overlap size: {}, gap length: {}s, strategy: {}",
            partitioning.num_overlaps, partitioning.gap_threshold_secs, partitioning.strategy
        );

        let partitions = self.aligner().partition(&source_track, &target_track, partitioning);

        for (side, track, path) in [
            (TrackSide::Source, &source_track, source),
            (TrackSide::Target, &target_track, target),
        ] {
            let mut sentences = String::new();
            let mut indices = String::new();
            let mut overlaps = OverlapCollector::new();

            for partition in &partitions {
                let part = partition.side(side);
                sentences.push_str(&export::format_sentences(&part.utterances));
                indices.push_str(&export::format_sentence_index(&part.utterances, &track.units));
                overlaps.add(&part.texts(), partitioning.num_overlaps);
            }

            FileManager::write_to_file(export::sibling_path(path, export::SENT_EXTENSION), &sentences)?;
            FileManager::write_to_file(export::sibling_path(path, export::SENT_INDEX_EXTENSION), &indices)?;
            FileManager::write_to_file(export::sibling_path(path, export::OVERLAP_EXTENSION), &overlaps.render())?;
            debug!("{} side: {} overlap lines", side, overlaps.len());
        }

        info!("Wrote overlap files for {} partitions", partitions.len());
        Ok(partitions.len())
    }

    /// Cut both files at long silences of the source track; returns the number of sections.
    /// With `parts`, the source is cut into that many near-equal groups ending at silences instead.
    pub fn run_split(&self, source: &Path, target: &Path, gap_secs: Option<f64>, parts: Option<usize>) -> Result<usize> {
        let (source_track, target_track) = self.load_pair(source, target)?;
        let partitioning = &self.config.partitioning;

        let groups = match parts {
            Some(parts) => {
                let gap_secs = gap_secs.unwrap_or(partitioning.equal_gap_threshold_secs);
                info!("Splitting into {} parts, extended to gaps of {}s", parts, gap_secs);
                split_equal_by_source(&source_track.units, &target_track.units, parts, seconds_to_micros(gap_secs))?
            }
            None => {
                let gap_secs = gap_secs.unwrap_or(partitioning.split_gap_secs);
                info!("Splitting at gaps of {}s", gap_secs);
                split_by_source_gaps(&source_track.units, &target_track.units, seconds_to_micros(gap_secs))
            }
        };

        for (i, (source_units, target_units)) in groups.iter().enumerate() {
            let number = i + 1;
            FileManager::write_to_file(
                export::split_file_path(source, number),
                &CaptionTrack::units_to_srt_string(source_units.iter().copied()),
            )?;
            FileManager::write_to_file(
                export::split_file_path(target, number),
                &CaptionTrack::units_to_srt_string(target_units.iter().copied()),
            )?;
        }

        info!("Wrote {} sections per side", groups.len());
        Ok(groups.len())
    }

    /// Estimate drift and delay whichever track runs early
    pub fn run_fix_offset(&self, source: &Path, target: &Path, dry_run: bool) -> Result<OffsetOutcome> {
        let (source_track, target_track) = self.load_pair(source, target)?;
        let estimate = self.aligner().estimate_drift(&source_track, &target_track)?;

        let minimum = seconds_to_micros(self.config.alignment.min_offset_secs);
        if estimate.offset_micros <= minimum {
            info!(
                "Drift of {:.3}s does not exceed the {:.3}s minimum; nothing to do",
                estimate.offset_secs(),
                micros_to_seconds(minimum)
            );
            return Ok(OffsetOutcome::WithinTolerance(estimate));
        }

        let (mut early_track, file) = if estimate.source_is_early() {
            (source_track, source.to_path_buf())
        } else {
            (target_track, target.to_path_buf())
        };

        if dry_run {
            warn!("Dry run: {} would be delayed by {:.3}s", file.display(), estimate.offset_secs());
            return Ok(OffsetOutcome::DryRun { file, estimate });
        }

        early_track.shift(estimate.offset_micros);
        FileManager::atomic_rewrite(&file, &early_track.to_srt_string())?;
        info!("Delayed {} by {:.3}s", file.display(), estimate.offset_secs());
        Ok(OffsetOutcome::Corrected { file, estimate })
    }
}
