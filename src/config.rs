//! User configuration
//!
//! **Why**: Parsing defaults (extension filters, padding rule, recursion) and output
//! options live in one plain value. It is loaded once by the binary and handed to the
//! [`Parser`](crate::parser::Parser) explicitly; nothing reads a global.
//!
//! **Used by**: main (CLI overrides), Parser (via `ParseOptions`), report (output options)
//!
//! Stored as JSON (`useq.json`) in the config dir, see [`crate::paths`].
//! Missing fields fall back to defaults, so a partial file is valid:
//!
//! ```json
//! { "include_exts": ["exr", "dpx"], "recurse": true }
//! ```

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::entities::file_entry::{
    DEFAULT_FRAME_GROUP, DEFAULT_FRAME_PATTERN, DEFAULT_HEAD_GROUP, DEFAULT_TAIL_GROUP,
};
use crate::entities::{FrameExtractor, SeqFormat, DEFAULT_FORMAT};
use crate::paths::{self, PathConfig, CONFIG_FILE};

/// Invalid frame pattern or config file
#[derive(Debug)]
pub enum ConfigError {
    /// `frame_extract.pattern` doesn't compile
    BadPattern(regex::Error),
    /// A capture group index the pattern doesn't have
    BadGroup { group: usize, groups: usize },
    /// Config file isn't valid JSON for [`Config`]
    Malformed { path: PathBuf, source: serde_json::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::BadPattern(e) => write!(f, "Bad frame pattern: {}", e),
            ConfigError::BadGroup { group, groups } => {
                write!(f, "Capture group {} out of range (pattern has {})", group, groups)
            }
            ConfigError::Malformed { path, source } => {
                write!(f, "Malformed config {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::BadPattern(e) => Some(e),
            ConfigError::BadGroup { .. } => None,
            ConfigError::Malformed { source, .. } => Some(source),
        }
    }
}

impl From<regex::Error> for ConfigError {
    fn from(e: regex::Error) -> Self {
        ConfigError::BadPattern(e)
    }
}

/// Frame field regex and the capture groups holding head, frame and tail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameExtractConfig {
    pub pattern: String,
    pub head_group: usize,
    pub frame_group: usize,
    pub tail_group: usize,
}

impl Default for FrameExtractConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_FRAME_PATTERN.to_string(),
            head_group: DEFAULT_HEAD_GROUP,
            frame_group: DEFAULT_FRAME_GROUP,
            tail_group: DEFAULT_TAIL_GROUP,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Parsing
    pub include_exts: Vec<String>, // empty = everything
    pub exclude_exts: Vec<String>,
    pub get_stats: bool,
    pub ignore_padding: bool, // merge file_1 / file_001 into one sequence
    pub recurse: bool,
    pub frame_extract: FrameExtractConfig,

    // Output
    pub format: String,
    pub stat_order: Vec<String>,
    pub csv: bool,
    pub csv_sep: String,
    pub date_format: String, // chrono strftime
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include_exts: Vec::new(),
            exclude_exts: Vec::new(),
            get_stats: false,
            ignore_padding: false,
            recurse: false,
            frame_extract: FrameExtractConfig::default(),
            format: DEFAULT_FORMAT.to_string(),
            stat_order: Vec::new(),
            csv: false,
            csv_sep: "\t".to_string(),
            date_format: "%a %b %d %H:%M:%S %Y".to_string(),
        }
    }
}

/// Options the parser reads at construction; a snapshot of [`Config`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOptions {
    pub include_exts: Vec<String>,
    pub exclude_exts: Vec<String>,
    pub get_stats: bool,
    pub ignore_padding: bool,
    pub recurse: bool,
}

impl Config {
    /// Load user config, or defaults when the file doesn't exist
    pub fn load(path_config: &PathConfig) -> Result<Self> {
        let path = paths::config_file(CONFIG_FILE, path_config);
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = serde_json::from_str(&json)
            .map_err(|source| ConfigError::Malformed { path: path.clone(), source })?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write a default config file, returns its path
    pub fn write_user_config(path_config: &PathConfig) -> Result<std::path::PathBuf> {
        let path = paths::config_file(CONFIG_FILE, path_config);
        paths::ensure_parent(&path)?;

        let json = serde_json::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;

        Ok(path)
    }

    /// Parser options with normalized extension lists
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            include_exts: normalize_exts(&self.include_exts),
            exclude_exts: normalize_exts(&self.exclude_exts),
            get_stats: self.get_stats,
            ignore_padding: self.ignore_padding,
            recurse: self.recurse,
        }
    }

    /// Compile the configured frame pattern
    pub fn frame_extractor(&self) -> Result<FrameExtractor> {
        let fx = &self.frame_extract;
        FrameExtractor::new(&fx.pattern, fx.head_group, fx.frame_group, fx.tail_group)
            .with_context(|| format!("Invalid frame_extract pattern: {}", fx.pattern))
    }

    /// Compile the configured sequence format
    pub fn seq_format(&self) -> Result<SeqFormat> {
        SeqFormat::parse(&self.format).with_context(|| format!("Invalid format: {}", self.format))
    }
}

/// Lower-case, strip leading dots, drop blanks: `[".EXR", " "]` → `["exr"]`
pub fn normalize_exts(exts: &[String]) -> Vec<String> {
    exts.iter()
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}
