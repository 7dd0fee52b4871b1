use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::alignment::{AlignmentPair, Utterance};
use crate::subtitle_processor::CaptionUnit;

// @module: Text layouts written next to the caption files

// @const: One utterance per line
pub const SENT_EXTENSION: &str = "sent";

// @const: Contributing unit indices per line
pub const SENT_INDEX_EXTENSION: &str = "sent-index";

// @const: Concatenations of consecutive utterances
pub const OVERLAP_EXTENSION: &str = "overlap";

// @const: Aligned pair blocks
pub const ALIGNED_EXTENSION: &str = "aligned";

// @const: Padding used when one side of a pair is empty
pub const PADDING_CHAR: char = '*';

/// One utterance text per line
pub fn format_sentences<'a, I>(utterances: I) -> String
where
    I: IntoIterator<Item = &'a Utterance>,
{
    utterances
        .into_iter()
        .map(|utterance| format!("{}\n", utterance.text))
        .collect()
}

/// One bracketed list of file indices per line, e.g. `[3, 4]`
pub fn format_sentence_index<'a, I>(utterances: I, units: &[CaptionUnit]) -> String
where
    I: IntoIterator<Item = &'a Utterance>,
{
    utterances
        .into_iter()
        .map(|utterance| {
            let indices: Vec<String> = utterance
                .unit_indices(units)
                .iter()
                .map(|index| index.to_string())
                .collect();
            format!("[{}]\n", indices.join(", "))
        })
        .collect()
}

/// Two-line block; an empty side is replaced by `*` repeated to the other side's length
pub fn format_pair_block(source: &str, target: &str) -> Option<String> {
    let source = source.trim();
    let target = target.trim();
    let pad = |partner: &str| PADDING_CHAR.to_string().repeat(partner.chars().count());

    match (source.is_empty(), target.is_empty()) {
        (true, true) => None,
        (true, false) => Some(format!("{}\n{}\n", pad(target), target)),
        (false, true) => Some(format!("{}\n{}\n", source, pad(source))),
        (false, false) => Some(format!("{}\n{}\n", source, target)),
    }
}

/// Pair blocks separated by blank lines
pub fn format_alignment<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = &'a AlignmentPair>,
{
    pairs
        .into_iter()
        .filter_map(|pair| format_pair_block(&pair.source.text, &pair.target_text()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Every join of `1..=max_run` consecutive texts, shortest runs first
pub fn overlap_lines(texts: &[String], max_run: usize) -> Vec<String> {
    (1..=max_run)
        .flat_map(|run| texts.windows(run).map(|window| window.join(" ")))
        .collect()
}

/// Collects overlap lines from many partitions, deduplicated and sorted
#[derive(Debug, Default)]
pub struct OverlapCollector {
    lines: BTreeSet<String>,
}

impl OverlapCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, texts: &[String], max_run: usize) {
        self.lines.extend(overlap_lines(texts, max_run));
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn render(&self) -> String {
        self.lines.iter().map(|line| format!("{}\n", line)).collect()
    }
}

/// Sibling path with a different extension: `film.srt` -> `film.sent`
pub fn sibling_path<P: AsRef<Path>>(path: P, extension: &str) -> PathBuf {
    path.as_ref().with_extension(extension)
}

/// Numbered split file: `film.srt` -> `film-001.srt`
pub fn split_file_path<P: AsRef<Path>>(path: P, number: usize) -> PathBuf {
    let path = path.as_ref();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "srt".to_string());
    path.with_file_name(format!("{}-{:03}.{}", stem, number, extension))
}
