use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs;
use std::path::Path;
use log::info;

use crate::errors::AppError;

/// Application configuration module
/// This module handles loading, validating and saving the alignment settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    pub source_language: String,

    /// Target language code (ISO)
    pub target_language: String,

    /// Utterance assembly and alignment settings
    #[serde(default)]
    pub alignment: AlignmentConfig,

    /// Partitioning settings
    #[serde(default)]
    pub partitioning: PartitionConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Alignment settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AlignmentConfig {
    // @field: Use the rule-based filter instead of the no-op filter
    #[serde(default = "default_true")]
    pub sterilize: bool,

    // @field: Merge fragments across caption units into sentences
    #[serde(default = "default_true")]
    pub find_sentence_boundaries: bool,

    // @field: Split fragments on sentence punctuation
    #[serde(default = "default_true")]
    pub split_sentences: bool,

    // @field: Pairs whose texts are not longer than this are not exported
    #[serde(default)]
    pub min_pair_length: usize,

    // @field: Pairs sampled on each side of the midpoint for drift estimation
    #[serde(default = "default_offset_sample_size")]
    pub offset_sample_size: usize,

    // @field: Drift of at most this many seconds is left alone
    #[serde(default = "default_min_offset_secs")]
    pub min_offset_secs: f64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            sterilize: true,
            find_sentence_boundaries: true,
            split_sentences: true,
            min_pair_length: 0,
            offset_sample_size: default_offset_sample_size(),
            min_offset_secs: default_min_offset_secs(),
        }
    }
}

/// How the collated timeline is cut into independent sections
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PartitionStrategy {
    // @strategy: Cut wherever the silence exceeds the gap threshold
    #[default]
    Gaps,
    // @strategy: Connected components of overlapping units
    Components,
}

impl std::fmt::Display for PartitionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gaps => write!(f, "gaps"),
            Self::Components => write!(f, "components"),
        }
    }
}

impl std::str::FromStr for PartitionStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gaps" => Ok(Self::Gaps),
            "components" => Ok(Self::Components),
            _ => Err(AppError::Config(format!("Invalid partition strategy: {}", s))),
        }
    }
}

/// Partitioning settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PartitionConfig {
    /// Partitioning strategy
    #[serde(default)]
    pub strategy: PartitionStrategy,

    /// Minimum silence between sections, in seconds
    #[serde(default = "default_gap_threshold_secs")]
    pub gap_threshold_secs: f64,

    /// Merge a partition into the next when its last utterance trails off and the gap is below this (0 disables)
    #[serde(default)]
    pub merge_ellipsized_secs: f64,

    /// Longest run of consecutive utterances joined in the overlap export
    #[serde(default = "default_num_overlaps")]
    pub num_overlaps: usize,

    /// Gap used when splitting tracks into separate files, in seconds
    #[serde(default = "default_split_gap_secs")]
    pub split_gap_secs: f64,

    /// Preferred cut gap for equal-size partitioning, in seconds
    #[serde(default = "default_equal_gap_threshold_secs")]
    pub equal_gap_threshold_secs: f64,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            strategy: PartitionStrategy::default(),
            gap_threshold_secs: default_gap_threshold_secs(),
            merge_ellipsized_secs: 0.0,
            num_overlaps: default_num_overlaps(),
            split_gap_secs: default_split_gap_secs(),
            equal_gap_threshold_secs: default_equal_gap_threshold_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_offset_sample_size() -> usize {
    20
}

fn default_min_offset_secs() -> f64 {
    2.0
}

fn default_gap_threshold_secs() -> f64 {
    3.0
}

fn default_num_overlaps() -> usize {
    6
}

fn default_split_gap_secs() -> f64 {
    10.0
}

fn default_equal_gap_threshold_secs() -> f64 {
    5.0
}

impl Config {
    /// Load the configuration file, writing the defaults first when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let path = path.as_ref();
        if !path.exists() {
            let config = Config::default();
            config.save(path)?;
            info!("Created default configuration at {}", path.display());
            return Ok(config);
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), AppError> {
        crate::language_utils::get_language_name(&self.source_language)
            .map_err(|e| AppError::Config(e.to_string()))?;
        crate::language_utils::get_language_name(&self.target_language)
            .map_err(|e| AppError::Config(e.to_string()))?;

        let thresholds = [
            ("partitioning.gap_threshold_secs", self.partitioning.gap_threshold_secs),
            ("partitioning.merge_ellipsized_secs", self.partitioning.merge_ellipsized_secs),
            ("partitioning.split_gap_secs", self.partitioning.split_gap_secs),
            ("partitioning.equal_gap_threshold_secs", self.partitioning.equal_gap_threshold_secs),
            ("alignment.min_offset_secs", self.alignment.min_offset_secs),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::Config(format!("{} must be a non-negative number, got {}", name, value)));
            }
        }

        if self.alignment.offset_sample_size == 0 {
            return Err(AppError::Config("alignment.offset_sample_size must be greater than zero".to_string()));
        }
        if self.partitioning.num_overlaps == 0 {
            return Err(AppError::Config("partitioning.num_overlaps must be at least 1".to_string()));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "en".to_string(),
            target_language: "es".to_string(),
            alignment: AlignmentConfig::default(),
            partitioning: PartitionConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
