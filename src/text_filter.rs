/*!
 * Text handling applied to caption text before utterance assembly.
 *
 * - `TextFilter`: pure `text -> text` cleanup; an empty result discards the text
 * - `SterilizeFilter`: ordered list of independent `FilterRule`s
 * - speaker splitting on line-initial hyphens
 * - sentence-boundary predicates used by the assembler and the partitioner
 * - `SentenceTokenizer`: optional splitting of a fragment into sentences
 */

use regex::Regex;
use once_cell::sync::Lazy;

use crate::app_config::AlignmentConfig;

/// Placeholder for line breaks while the rules run, so that `^` only anchors at the start of the block
const LINE_JOIN: &str = "||";

const MUSICAL_NOTE: &str = "♪";

static SPEAKER_SPLIT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\n)-\s*").unwrap());

/// Titles that end with a period without ending the sentence
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "st", "sr", "jr", "sra", "srta", "mme", "mlle", "vs",
];

/// Cleans raw caption text; returning an empty string discards the text
pub trait TextFilter: Send + Sync {
    fn filter(&self, text: &str) -> String;
}

/// Filter that leaves text untouched apart from trimming
#[derive(Debug, Clone, Default)]
pub struct NoopFilter;

impl TextFilter for NoopFilter {
    fn filter(&self, text: &str) -> String {
        text.trim().to_string()
    }
}

/// One step of the sterilization pipeline
#[derive(Debug, Clone)]
pub enum FilterRule {
    /// Discard the whole text when it contains the needle
    RejectContaining {
        name: &'static str,
        needle: &'static str,
    },
    /// Discard the whole text when the pattern matches
    RejectMatching {
        name: &'static str,
        pattern: Regex,
    },
    /// Replace every match of the pattern
    Replace {
        name: &'static str,
        pattern: Regex,
        replacement: &'static str,
    },
}

impl FilterRule {
    fn replace(name: &'static str, pattern: &str, replacement: &'static str) -> Self {
        FilterRule::Replace {
            name,
            pattern: Regex::new(pattern).unwrap(),
            replacement,
        }
    }

    fn reject(name: &'static str, pattern: &str) -> Self {
        FilterRule::RejectMatching {
            name,
            pattern: Regex::new(pattern).unwrap(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FilterRule::RejectContaining { name, .. }
            | FilterRule::RejectMatching { name, .. }
            | FilterRule::Replace { name, .. } => name,
        }
    }

    /// Apply this rule alone; `None` means the text is rejected
    pub fn apply(&self, text: &str) -> Option<String> {
        match self {
            FilterRule::RejectContaining { needle, .. } => {
                if text.contains(needle) { None } else { Some(text.to_string()) }
            }
            FilterRule::RejectMatching { pattern, .. } => {
                if pattern.is_match(text) { None } else { Some(text.to_string()) }
            }
            FilterRule::Replace { pattern, replacement, .. } => {
                Some(pattern.replace_all(text, *replacement).into_owned())
            }
        }
    }
}

/// Rule-based cleanup of captions: music, URLs, markup, speaker labels, sound descriptions
#[derive(Debug, Clone)]
pub struct SterilizeFilter {
    rules: Vec<FilterRule>,
}

impl SterilizeFilter {
    pub fn new() -> Self {
        Self::with_rules(default_rules())
    }

    pub fn with_rules(rules: Vec<FilterRule>) -> Self {
        SterilizeFilter { rules }
    }

    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }
}

impl Default for SterilizeFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl TextFilter for SterilizeFilter {
    fn filter(&self, text: &str) -> String {
        let mut current = text.trim().replace('\n', LINE_JOIN);
        for rule in &self.rules {
            match rule.apply(&current) {
                Some(next) => current = next,
                None => return String::new(),
            }
        }
        current.replace(LINE_JOIN, "\n").trim().to_string()
    }
}

/// The sterilization rules, in the order they must run
pub fn default_rules() -> Vec<FilterRule> {
    vec![
        FilterRule::RejectContaining { name: "music", needle: MUSICAL_NOTE },
        FilterRule::reject("leading_pound", r"^#"),
        FilterRule::reject(
            "url",
            r"\b((http|https)://)?[a-zA-Z0-9-]+(\.[a-zA-Z0-9-]+)*\.[a-zA-Z]{2,6}\b[a-zA-Z0-9.&/?:@\-_=#]*",
        ),
        FilterRule::replace("capitals", r"[A-Z,]{2,}( [A-Z0-9,]{2,})+", ""),
        FilterRule::replace("italics", r"</?[iI]>", ""),
        FilterRule::replace("html", r"<.*>", ""),
        FilterRule::replace("character_marker", r"^([\w.,#'-]+\s?){1,3}: ", ""),
        FilterRule::replace("capitals_after_marker", r"[A-Z,]{2,}( [A-Z0-9,]{2,})+", ""),
        FilterRule::replace("parentheses", r"\(.*\)", ""),
        FilterRule::replace("curly_brackets", r"\{[^{]+?\}\s?", ""),
        FilterRule::replace("square_brackets", r"\[[^\[]+?\]\s?", ""),
        FilterRule::replace("leading_hyphen", r"^-", ""),
        FilterRule::replace("whitespace", r"\s+", " "),
    ]
}

/// Split a block at hyphens that open a line (one part per speaker), joining each part's lines
pub fn split_speakers(text: &str) -> Vec<String> {
    SPEAKER_SPLIT_REGEX
        .split(text)
        .map(|part| part.replace('\n', " ").trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

/// True if the text has something other than punctuation and whitespace
pub fn has_words(text: &str) -> bool {
    text.chars().any(|c| !c.is_ascii_punctuation() && !c.is_whitespace())
}

fn ends_with_ellipsis(text: &str) -> bool {
    text.ends_with("..") || text.ends_with('…')
}

/// Ends with sentence-final punctuation (`.`, `!`, `?`); a trailing `...` counts
pub fn ends_sentence(text: &str) -> bool {
    text.trim_end().ends_with(['.', '!', '?'])
}

/// Starts with an uppercase letter or sentence-initial punctuation (`¿`, `¡`, `-`)
pub fn starts_sentence(text: &str) -> bool {
    match text.trim_start().chars().next() {
        Some(c) => c.is_uppercase() || matches!(c, '¿' | '¡' | '-'),
        None => false,
    }
}

/// The sentence visibly continues past this text (ellipsis or dangling dash)
pub fn trails_off(text: &str) -> bool {
    let trimmed = text.trim_end();
    ends_with_ellipsis(trimmed) || trimmed.ends_with(['-', '–', '—'])
}

/// Splits one fragment into sentences
pub trait SentenceTokenizer: Send + Sync {
    fn split(&self, text: &str) -> Vec<String>;
}

/// Leaves fragments whole
#[derive(Debug, Clone, Default)]
pub struct NoTokenizer;

impl SentenceTokenizer for NoTokenizer {
    fn split(&self, text: &str) -> Vec<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() { Vec::new() } else { vec![trimmed.to_string()] }
    }
}

/// Splits after `. ! ?` when whitespace and a sentence start follow
#[derive(Debug, Clone, Default)]
pub struct PunctuationTokenizer;

impl PunctuationTokenizer {
    fn is_abbreviation(head: &str) -> bool {
        let word = head
            .rsplit(|c: char| c.is_whitespace())
            .next()
            .unwrap_or("")
            .trim_end_matches('.')
            .to_lowercase();
        ABBREVIATIONS.contains(&word.as_str())
    }
}

impl SentenceTokenizer for PunctuationTokenizer {
    fn split(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut start = 0;
        let chars: Vec<(usize, char)> = text.char_indices().collect();

        for (i, &(pos, c)) in chars.iter().enumerate() {
            if !matches!(c, '.' | '!' | '?') {
                continue;
            }
            let end = pos + c.len_utf8();
            let head = &text[start..end];
            if ends_with_ellipsis(head) || chars.get(i + 1).is_some_and(|&(_, n)| n == '.') {
                continue;
            }
            if !chars.get(i + 1).is_some_and(|&(_, n)| n.is_whitespace()) {
                continue;
            }
            if c == '.' && Self::is_abbreviation(head) {
                continue;
            }
            if starts_sentence(&text[end..]) {
                let sentence = head.trim();
                if !sentence.is_empty() {
                    sentences.push(sentence.to_string());
                }
                start = end;
            }
        }

        let rest = text[start..].trim();
        if !rest.is_empty() {
            sentences.push(rest.to_string());
        }
        sentences
    }
}

/// Filter, speaker splitting and tokenization composed in sequence
pub struct TextPipeline {
    filter: Box<dyn TextFilter>,
    tokenizer: Box<dyn SentenceTokenizer>,
}

impl TextPipeline {
    pub fn new(filter: Box<dyn TextFilter>, tokenizer: Box<dyn SentenceTokenizer>) -> Self {
        TextPipeline { filter, tokenizer }
    }

    /// No cleanup and no sentence splitting
    pub fn passthrough() -> Self {
        Self::new(Box::new(NoopFilter), Box::new(NoTokenizer))
    }

    pub fn from_config(config: &AlignmentConfig) -> Self {
        let filter: Box<dyn TextFilter> = if config.sterilize {
            Box::new(SterilizeFilter::new())
        } else {
            Box::new(NoopFilter)
        };
        let tokenizer: Box<dyn SentenceTokenizer> = if config.split_sentences {
            Box::new(PunctuationTokenizer)
        } else {
            Box::new(NoTokenizer)
        };
        Self::new(filter, tokenizer)
    }

    /// Candidate utterance texts for one caption block; fragments without words are dropped
    pub fn fragments(&self, raw_text: &str) -> Vec<String> {
        let filtered = self.filter.filter(raw_text);
        if filtered.is_empty() {
            return Vec::new();
        }
        split_speakers(&filtered)
            .iter()
            .flat_map(|part| self.tokenizer.split(part))
            .filter(|fragment| has_words(fragment))
            .collect()
    }
}

impl Default for TextPipeline {
    fn default() -> Self {
        Self::new(Box::new(SterilizeFilter::new()), Box::new(PunctuationTokenizer))
    }
}
