use std::fmt;
use std::path::{Path, PathBuf};
use regex::Regex;
use once_cell::sync::Lazy;
use log::{warn, debug};
use serde::{Deserialize, Serialize};

use crate::errors::SubtitleError;
use crate::text_filter::TextPipeline;
use crate::timecode::{TimeSpan, Timed};

// @module: Caption tracks and their timed units

// @const: Blocks are separated by one or more blank lines
static BLOCK_SEPARATOR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

/// Which side of the language pair a track belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackSide {
    Source,
    Target,
}

impl TrackSide {
    pub fn is_source(&self) -> bool {
        matches!(self, TrackSide::Source)
    }
}

impl fmt::Display for TrackSide {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TrackSide::Source => write!(f, "source"),
            TrackSide::Target => write!(f, "target"),
        }
    }
}

/// Identity of a caption unit across both tracks: side plus position in its track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId {
    pub side: TrackSide,
    pub position: usize,
}

impl UnitId {
    pub fn new(side: TrackSide, position: usize) -> Self {
        UnitId { side, position }
    }
}

// @struct: One timed text block from a caption track
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionUnit {
    // @field: Position in the owning track (also its neighbour link)
    pub id: UnitId,

    // @field: Index from the file, 1-based
    pub index: usize,

    // @field: Display interval
    pub span: TimeSpan,

    // @field: Language label of the track
    pub language: String,

    // @field: Raw text lines joined with newlines
    pub raw_text: String,

    // @field: Filtered utterance fragments, one or more per speaker
    pub fragments: Vec<String>,
}

impl CaptionUnit {
    /// Build a unit and derive its fragments through the text pipeline
    pub fn new(id: UnitId, index: usize, span: TimeSpan, language: &str, raw_text: &str, pipeline: &TextPipeline) -> Self {
        CaptionUnit {
            id,
            index,
            span,
            language: language.to_string(),
            raw_text: raw_text.to_string(),
            fragments: pipeline.fragments(raw_text),
        }
    }

    pub fn is_source(&self) -> bool {
        self.id.side.is_source()
    }

    /// Filtered text of all fragments
    pub fn text(&self) -> String {
        self.fragments.join(" ")
    }

    /// Render as an SRT block with a given index
    pub fn to_srt_block(&self, index: usize) -> String {
        format!("{}\n{}\n{}\n", index, self.span.timestring(), self.raw_text)
    }
}

impl Timed for CaptionUnit {
    fn span(&self) -> TimeSpan {
        self.span
    }
}

impl fmt::Display for CaptionUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_srt_block(self.index))
    }
}

/// One language's caption units, in file order
#[derive(Debug, Clone)]
pub struct CaptionTrack {
    /// File the track was read from, if any
    pub source_file: Option<PathBuf>,

    /// Language label
    pub language: String,

    /// Source or target side
    pub side: TrackSide,

    /// Units, sorted by start time; `units[i].id.position == i`
    pub units: Vec<CaptionUnit>,
}

impl CaptionTrack {
    /// Parse SRT content; malformed blocks are logged and dropped
    pub fn parse(content: &str, side: TrackSide, language: &str, pipeline: &TextPipeline) -> Self {
        let normalized = content.replace('\r', "");
        let normalized = normalized.trim_start_matches('\u{feff}').trim();

        let mut units = Vec::new();
        if !normalized.is_empty() {
            for block in BLOCK_SEPARATOR_REGEX.split(normalized) {
                match Self::parse_block(block) {
                    Ok((index, span, text)) => {
                        let id = UnitId::new(side, units.len());
                        units.push(CaptionUnit::new(id, index, span, language, &text, pipeline));
                    }
                    Err(e) => warn!("Skipping caption block ({} track, {}): {}", side, language, e),
                }
            }
        }

        let mut track = CaptionTrack {
            source_file: None,
            language: language.to_string(),
            side,
            units,
        };
        track.sort_units();
        track
    }

    /// Attach the originating file path
    pub fn with_source_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Split one block into (index, span, raw text)
    pub fn parse_block(block: &str) -> Result<(usize, TimeSpan, String), SubtitleError> {
        let mut lines = block.trim().lines();
        let index_line = lines.next().ok_or(SubtitleError::EmptyBlock)?.trim();
        let index = index_line
            .trim_start_matches('\u{feff}')
            .parse::<usize>()
            .map_err(|_| SubtitleError::InvalidIndex { block: index_line.to_string() })?;

        let timing_line = lines.next().ok_or(SubtitleError::EmptyBlock)?;
        let span = TimeSpan::parse(timing_line)?;

        let text = lines.map(str::trim).collect::<Vec<_>>().join("\n");
        Ok((index, span, text))
    }

    fn sort_units(&mut self) {
        let out_of_order = self.units.windows(2).filter(|w| w[1].span.start < w[0].span.start).count();
        if out_of_order > 0 {
            debug!("Reordering {} out-of-order caption units in {} track", out_of_order, self.side);
            self.units.sort_by_key(|unit| (unit.span.start, unit.index));
        }
        for (position, unit) in self.units.iter_mut().enumerate() {
            unit.id = UnitId::new(self.side, position);
        }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn get(&self, id: UnitId) -> Option<&CaptionUnit> {
        if id.side != self.side {
            return None;
        }
        self.units.get(id.position)
    }

    /// Track label: file stem when known, language otherwise
    pub fn label(&self) -> String {
        self.source_file
            .as_ref()
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.language.clone())
    }

    /// Move every unit by a constant offset (negative moves earlier)
    pub fn shift(&mut self, offset_micros: i64) {
        for unit in &mut self.units {
            unit.span = unit.span.shifted(offset_micros);
        }
    }

    /// Serialize back to SRT, keeping the original indices
    pub fn to_srt_string(&self) -> String {
        self.units
            .iter()
            .map(|unit| unit.to_srt_block(unit.index))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Serialize a subset of units to SRT, renumbered from 1
    pub fn units_to_srt_string<'a, I>(units: I) -> String
    where
        I: IntoIterator<Item = &'a CaptionUnit>,
    {
        units
            .into_iter()
            .enumerate()
            .map(|(i, unit)| unit.to_srt_block(i + 1))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Merge both tracks' units into one list sorted by start time
pub fn collate<'a>(source: &'a CaptionTrack, target: &'a CaptionTrack) -> Vec<&'a CaptionUnit> {
    let mut collated: Vec<&CaptionUnit> = source.units.iter().chain(target.units.iter()).collect();
    collated.sort_by_key(|unit| (unit.span.start, unit.id));
    collated
}
