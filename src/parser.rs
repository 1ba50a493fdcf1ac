//! Sequence parser
//!
//! **Why**: Turns a stream of filenames into sequences and leftovers. Each name is
//! classified as it arrives; grouping is settled once the stream ends.
//!
//! **Used by**: main (CLI), library users
//!
//! # Classification
//!
//! Per filename, first match wins:
//!
//! 1. Extension not in `include_exts` (when set) or in `exclude_exts` → `excluded`
//! 2. No frame number → `non_sequences`
//! 3. Key already in the working map → append; a taken frame number sends the
//!    *incoming* entry to `collisions` and leaves the sequence as it was
//! 4. Otherwise → new working sequence under the key
//!
//! Filtering runs before frame detection, so excluded files never seed a sequence.
//!
//! # Finalize
//!
//! The working map is drained in first-seen order. One-member sequences become
//! `single_frames`, the rest go to `sequences`. Results are only visible after this
//! step, and every parse entry point resets the previous run first.
//!
//! Classification mutates shared state and is strictly sequential.

use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{normalize_exts, Config, ParseOptions};
use crate::entities::{EntryError, FileEntry, FileSequence, FrameExtractor, SeqKey, SequenceError, Stat};
use crate::paths;
use crate::scan;

/// Top-level input errors. The parser stays empty and unparsed when one is returned.
#[derive(Debug)]
pub enum ParseError {
    InvalidRoot(PathBuf),
    InvalidListingFile(PathBuf, String),
    InvalidGlob(String, String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidRoot(p) => write!(f, "{} is not an available directory", p.display()),
            ParseError::InvalidListingFile(p, e) => write!(f, "{} is not a valid listing file: {}", p.display(), e),
            ParseError::InvalidGlob(p, e) => write!(f, "Invalid glob pattern '{}': {}", p, e),
        }
    }
}

impl std::error::Error for ParseError {}

/// Where `classify_one` routed an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// Added to a working sequence (new or existing)
    Grouped,
    NonSequence,
    Excluded,
    Collision,
}

/// Output of a finished parse.
///
/// Every accepted input lands in exactly one of the five buckets; inputs that
/// could not be decomposed at all, or whose name isn't valid UTF-8, are listed
/// in `invalid`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseResults {
    pub sequences: Vec<FileSequence>,
    pub single_frames: Vec<FileEntry>,
    pub non_sequences: Vec<FileEntry>,
    pub excluded: Vec<FileEntry>,
    pub collisions: Vec<FileEntry>,
    pub invalid: Vec<String>,
}

impl ParseResults {
    /// Number of files across the five buckets (sequence members counted individually)
    pub fn file_count(&self) -> usize {
        self.sequences.iter().map(|s| s.frame_count()).sum::<usize>()
            + self.single_frames.len()
            + self.non_sequences.len()
            + self.excluded.len()
            + self.collisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_count() == 0 && self.invalid.is_empty()
    }
}

/// Groups filenames into sequences
#[derive(Debug)]
pub struct Parser {
    include_exts: HashSet<String>, // lower-case, no dot
    exclude_exts: HashSet<String>,
    get_stats: bool,
    ignore_padding: bool,
    recurse: bool,
    extractor: FrameExtractor,

    working: IndexMap<SeqKey, FileSequence>, // in-progress, drained by finalize
    pending: ParseResults,                   // leftovers of the current run
    results: ParseResults,                   // filled by finalize
    parsed: bool,
}

impl Parser {
    /// Parser with the default frame pattern
    pub fn new(options: ParseOptions) -> Self {
        Self {
            include_exts: normalize_exts(&options.include_exts).into_iter().collect(),
            exclude_exts: normalize_exts(&options.exclude_exts).into_iter().collect(),
            get_stats: options.get_stats,
            ignore_padding: options.ignore_padding,
            recurse: options.recurse,
            extractor: FrameExtractor::default(),
            working: IndexMap::new(),
            pending: ParseResults::default(),
            results: ParseResults::default(),
            parsed: false,
        }
    }

    /// Parser configured from a [`Config`], including its frame pattern
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(config.parse_options()).with_extractor(config.frame_extractor()?))
    }

    /// Replace the frame pattern
    pub fn with_extractor(mut self, extractor: FrameExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Clear all results and in-progress state
    pub fn reset(&mut self) {
        self.working.clear();
        self.pending = ParseResults::default();
        self.results = ParseResults::default();
        self.parsed = false;
    }

    fn is_excluded(&self, ext: &str) -> bool {
        (!self.include_exts.is_empty() && !self.include_exts.contains(ext)) || self.exclude_exts.contains(ext)
    }

    /// Classify one filename into the current run.
    ///
    /// Calling this on a finalized parser starts a new run. An `InvalidFilename`
    /// error is returned to the caller and nothing is recorded.
    pub fn classify_one(&mut self, path: impl Into<String>, stats: Option<Stat>) -> Result<Bucket, EntryError> {
        if self.parsed {
            debug!("Parser already finalized, starting a new run");
            self.reset();
        }

        let entry = FileEntry::with_extractor(path, stats, &self.extractor)?;

        if self.is_excluded(&entry.ext_lower()) {
            self.pending.excluded.push(entry);
            return Ok(Bucket::Excluded);
        }

        if entry.frame_number().is_none() {
            self.pending.non_sequences.push(entry);
            return Ok(Bucket::NonSequence);
        }

        let key = entry.seq_key(self.ignore_padding);
        match self.working.get_mut(&key) {
            Some(seq) => match seq.append(entry) {
                Ok(()) => Ok(Bucket::Grouped),
                Err(SequenceError::FrameCollision { existing, incoming }) => {
                    debug!("Frame collision: {} vs {}", incoming, existing);
                    self.pending.collisions.push(*incoming);
                    Ok(Bucket::Collision)
                }
                Err(e) => {
                    // Key came from the entry itself, so only a collision can happen;
                    // keep the file visible regardless
                    warn!("Unexpected append failure: {}", e);
                    self.pending.collisions.push(e.into_entry());
                    Ok(Bucket::Collision)
                }
            },
            None => match FileSequence::new(entry, self.ignore_padding) {
                Ok(seq) => {
                    self.working.insert(key, seq);
                    Ok(Bucket::Grouped)
                }
                Err(e) => {
                    self.pending.non_sequences.push(e.into_entry());
                    Ok(Bucket::NonSequence)
                }
            },
        }
    }

    /// Batch feed: invalid names are logged and counted, never fatal
    fn feed(&mut self, path: String, stats: Option<Stat>) {
        if let Err(e) = self.classify_one(path, stats) {
            warn!("{}", e);
            let EntryError::InvalidFilename(raw) = e;
            self.pending.invalid.push(raw);
        }
    }

    /// Batch feed of a source name; non-UTF-8 names are counted as invalid
    fn feed_name(&mut self, name: scan::ScannedName, stats: Option<Stat>) {
        match name {
            Ok(path) => self.feed(path, stats),
            Err(shown) => {
                warn!("Name is not valid UTF-8: {}", shown);
                self.pending.invalid.push(shown);
            }
        }
    }

    /// Drain the working map into the final buckets and mark the run parsed
    pub fn finalize(&mut self) {
        if self.parsed {
            debug!("finalize() called twice, ignoring");
            return;
        }

        let mut results = std::mem::take(&mut self.pending);
        for (_, seq) in self.working.drain(..) {
            match seq.into_single() {
                Ok(entry) => results.single_frames.push(entry),
                Err(seq) => results.sequences.push(seq),
            }
        }

        self.results = results;
        self.parsed = true;
        info!("{}", self);
    }

    /// Scan a directory (recursing if configured) and parse every regular file
    pub fn parse_directory(&mut self, dir: impl AsRef<Path>) -> Result<(), ParseError> {
        self.reset();
        let dir = paths::expand_home(dir.as_ref());
        if !dir.is_dir() {
            let err = ParseError::InvalidRoot(dir);
            warn!("{}", err);
            return Err(err);
        }

        info!("Scanning {} (recurse={})", dir.display(), self.recurse);
        for (name, stats) in scan::scan_dir(&dir, self.recurse, self.get_stats) {
            self.feed_name(name, stats);
        }
        self.finalize();
        Ok(())
    }

    /// Parse a text file with one filename per line.
    ///
    /// With `get_stats`, names that exist on disk get stats from their own
    /// (non-followed) metadata; names that don't are parsed without stats.
    pub fn parse_listing(&mut self, listing: impl AsRef<Path>) -> Result<(), ParseError> {
        self.reset();
        let listing = paths::expand_home(listing.as_ref());
        if !listing.is_file() {
            let err = ParseError::InvalidListingFile(listing, "not a file".to_string());
            warn!("{}", err);
            return Err(err);
        }

        let lines = match scan::read_listing(&listing) {
            Ok(lines) => lines,
            Err(e) => {
                let err = ParseError::InvalidListingFile(listing.clone(), e.to_string());
                warn!("{}", err);
                return Err(err);
            }
        };

        info!("Reading listing {}", listing.display());
        for line in lines {
            let stats = match (&line, self.get_stats) {
                (Ok(name), true) => stat_listed(name),
                _ => None,
            };
            self.feed_name(line, stats);
        }
        self.finalize();
        Ok(())
    }

    /// Parse an in-memory list of filenames
    pub fn parse_paths<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reset();
        for path in paths {
            self.feed(path.into(), None);
        }
        self.finalize();
    }

    /// Expand a glob pattern and parse the matching regular files
    pub fn parse_glob(&mut self, pattern: &str) -> Result<(), ParseError> {
        self.reset();
        let expanded = paths::expand_home(Path::new(pattern));
        let pattern_str = expanded.to_string_lossy();

        let entries = match glob::glob(&pattern_str) {
            Ok(entries) => entries,
            Err(e) => {
                let err = ParseError::InvalidGlob(pattern.to_string(), e.to_string());
                warn!("{}", err);
                return Err(err);
            }
        };

        for entry in entries {
            let path = match entry {
                Ok(p) => p,
                Err(e) => {
                    warn!("Glob entry error: {}", e);
                    continue;
                }
            };
            // Links are skipped like in directory scans
            let meta = match std::fs::symlink_metadata(&path) {
                Ok(m) if m.file_type().is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    warn!("Failed to stat {}: {}", path.display(), e);
                    continue;
                }
            };
            let stats = self.get_stats.then(|| Stat::from(&meta));
            self.feed_name(scan::path_text(&path), stats);
        }
        self.finalize();
        Ok(())
    }

    pub fn is_parsed(&self) -> bool {
        self.parsed
    }

    pub fn ignore_padding(&self) -> bool {
        self.ignore_padding
    }

    pub fn results(&self) -> &ParseResults {
        &self.results
    }

    pub fn into_results(self) -> ParseResults {
        self.results
    }

    pub fn sequences(&self) -> &[FileSequence] {
        &self.results.sequences
    }

    pub fn single_frames(&self) -> &[FileEntry] {
        &self.results.single_frames
    }

    pub fn non_sequences(&self) -> &[FileEntry] {
        &self.results.non_sequences
    }

    pub fn excluded(&self) -> &[FileEntry] {
        &self.results.excluded
    }

    pub fn collisions(&self) -> &[FileEntry] {
        &self.results.collisions
    }

    /// Inputs rejected with `InvalidFilename` or as undecodable names
    pub fn invalid(&self) -> &[String] {
        &self.results.invalid
    }
}

fn stat_listed(name: &str) -> Option<Stat> {
    match std::fs::symlink_metadata(paths::expand_home(Path::new(name))) {
        Ok(meta) => Some(Stat::from(&meta)),
        Err(e) => {
            debug!("No stats for {}: {}", name, e);
            None
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(ParseOptions::default())
    }
}

impl fmt::Display for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.results;
        write!(
            f,
            "Parser(sequences={}, single_frames={}, non_sequences={}, excluded={}, collisions={}, invalid={})",
            r.sequences.len(),
            r.single_frames.len(),
            r.non_sequences.len(),
            r.excluded.len(),
            r.collisions.len(),
            r.invalid.len()
        )
    }
}
