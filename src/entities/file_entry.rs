//! Single filename decomposition
//!
//! **Why**: Sequence grouping works on the structure of a name, not on the file.
//! `/shots/cam2_plate.0012.final.exr` splits into:
//!
//! ```text
//! dir        /shots
//! name_head  cam2_plate.
//! frame      0012        (padding 4, frame number 12)
//! tail       .final
//! extension  exr
//! ```
//!
//! Only the rightmost digit run of the base name (extension removed) is the frame
//! field. Earlier runs such as the `2` in `cam2` stay in the head verbatim.
//! Names with several numeric groups close together (`v01_0012`) are resolved by
//! this heuristic alone; there is no attempt to guess which group "looks" like a frame.
//!
//! **Used by**: Parser (classification), FileSequence (members)

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

use crate::config::ConfigError;

use super::sequence::SeqKey;
use super::stat::Stat;

/// Default frame pattern: optional head ending in a non-digit, digit run, tail.
/// Greedy head means the digit run found is always the rightmost one.
pub const DEFAULT_FRAME_PATTERN: &str = r"((.*)([^0-9]))?([0-9]+)(.*)";
pub const DEFAULT_HEAD_GROUP: usize = 1;
pub const DEFAULT_FRAME_GROUP: usize = 4;
pub const DEFAULT_TAIL_GROUP: usize = 5;

static DEFAULT_EXTRACTOR: Lazy<FrameExtractor> = Lazy::new(|| {
    FrameExtractor::new(
        DEFAULT_FRAME_PATTERN,
        DEFAULT_HEAD_GROUP,
        DEFAULT_FRAME_GROUP,
        DEFAULT_TAIL_GROUP,
    )
    .expect("default frame pattern must compile")
});

/// FileEntry construction errors
#[derive(Debug, Clone, PartialEq)]
pub enum EntryError {
    /// Empty path, or a path with no base name (`/some/dir/`)
    InvalidFilename(String),
}

impl fmt::Display for EntryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryError::InvalidFilename(p) => write!(f, "Invalid filename: '{}'", p),
        }
    }
}

impl std::error::Error for EntryError {}

/// Splits a base name (no dir, no extension) into head, frame digits and tail.
///
/// The pattern is anchored at the start of the name and matched in dot-all mode.
/// Group indices are 1-based regex capture numbers.
#[derive(Debug, Clone)]
pub struct FrameExtractor {
    re: Regex,
    head_group: usize,
    frame_group: usize,
    tail_group: usize,
}

impl FrameExtractor {
    /// Compile a custom frame pattern
    pub fn new(
        pattern: &str,
        head_group: usize,
        frame_group: usize,
        tail_group: usize,
    ) -> Result<Self, ConfigError> {
        let re = Regex::new(&format!("^(?s:{})", pattern))?;
        let groups = re.captures_len() - 1;
        for group in [head_group, frame_group, tail_group] {
            if group == 0 || group > groups {
                return Err(ConfigError::BadGroup { group, groups });
            }
        }
        Ok(Self {
            re,
            head_group,
            frame_group,
            tail_group,
        })
    }

    /// Shared extractor built from the default pattern
    pub fn default_ref() -> &'static FrameExtractor {
        &DEFAULT_EXTRACTOR
    }

    /// Returns `(head, frame, tail)`. No match: `(name, "", "")`.
    pub fn extract<'a>(&self, name: &'a str) -> (&'a str, &'a str, &'a str) {
        match self.re.captures(name) {
            Some(caps) => {
                let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or("");
                (
                    group(self.head_group),
                    group(self.frame_group),
                    group(self.tail_group),
                )
            }
            None => (name, "", ""),
        }
    }
}

impl Default for FrameExtractor {
    fn default() -> Self {
        DEFAULT_EXTRACTOR.clone()
    }
}

/// Split off the extension after the last `.`
///
/// `"test.some.123.ext1"` -> `("test.some.123", "ext1")`, `"readme"` -> `("readme", "")`
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) => (&name[..i], &name[i + 1..]),
        None => (name, ""),
    }
}

/// One file, decomposed for sequence matching
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileEntry {
    path: String,       // as given
    dir: String,        // "/path/to", "" when no separator
    name: String,       // "file.0001.exr"
    prefix: String,     // dir + separator + name_head
    name_head: String,  // "file."
    frame_text: String, // "0001", empty when no frame field
    frame_number: Option<u64>,
    tail: String,       // chars between frame and extension
    extension: String,  // original case
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<Stat>,
}

impl FileEntry {
    /// Decompose `path` using the default frame pattern
    pub fn new(path: impl Into<String>, stats: Option<Stat>) -> Result<Self, EntryError> {
        Self::with_extractor(path, stats, FrameExtractor::default_ref())
    }

    /// Decompose `path` using a custom frame pattern
    pub fn with_extractor(
        path: impl Into<String>,
        stats: Option<Stat>,
        extractor: &FrameExtractor,
    ) -> Result<Self, EntryError> {
        let path = path.into();
        if path.trim().is_empty() {
            return Err(EntryError::InvalidFilename(path));
        }

        let (dir_part, name) = match path.rfind(std::path::is_separator) {
            Some(i) => path.split_at(i + 1),
            None => ("", path.as_str()),
        };
        if name.is_empty() {
            return Err(EntryError::InvalidFilename(path));
        }

        let (base, extension) = split_extension(name);
        let (mut name_head, mut frame_text, mut tail) = extractor.extract(base);

        let frame_number = if frame_text.is_empty() {
            None
        } else {
            match frame_text.parse::<u64>() {
                Ok(n) => Some(n),
                Err(_) => {
                    // Overflow or non-digit capture from a custom pattern
                    debug!("'{}': frame field '{}' not usable, treating as plain file", path, frame_text);
                    name_head = base;
                    frame_text = "";
                    tail = "";
                    None
                }
            }
        };

        // Root dir keeps its separator, like "/" in "/a.exr"
        let dir = if dir_part.chars().count() > 1 {
            let mut d = dir_part.to_string();
            d.pop();
            d
        } else {
            dir_part.to_string()
        };

        Ok(Self {
            prefix: format!("{}{}", dir_part, name_head),
            dir,
            name: name.to_string(),
            name_head: name_head.to_string(),
            frame_text: frame_text.to_string(),
            frame_number,
            tail: tail.to_string(),
            extension: extension.to_string(),
            stats,
            path,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn dir(&self) -> &str {
        &self.dir
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Everything preceding the frame field, directory included
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Prefix without the directory
    pub fn name_head(&self) -> &str {
        &self.name_head
    }

    /// Frame digits exactly as written, zero padding kept
    pub fn frame_text(&self) -> &str {
        &self.frame_text
    }

    pub fn frame_number(&self) -> Option<u64> {
        self.frame_number
    }

    /// Width of the frame field, 0 when there is none
    pub fn padding(&self) -> usize {
        self.frame_text.chars().count()
    }

    /// Chars between frame and extension, without the extension
    pub fn tail(&self) -> &str {
        &self.tail
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Lower-cased extension, used for filtering and keys
    pub fn ext_lower(&self) -> String {
        self.extension.to_lowercase()
    }

    pub fn stats(&self) -> Option<&Stat> {
        self.stats.as_ref()
    }

    /// File size from stats, if collected
    pub fn size(&self) -> Option<u64> {
        self.stats.as_ref().and_then(|s| s.size)
    }

    /// Sequence identity: `(prefix, tail, extension, padding?)`.
    /// Entries without a frame field still get a key, but never join a sequence.
    pub fn seq_key(&self, ignore_padding: bool) -> SeqKey {
        SeqKey {
            head: self.prefix.clone(),
            tail: self.tail.clone(),
            ext: self.ext_lower(),
            padding: if ignore_padding { None } else { Some(self.padding()) },
        }
    }

    /// Same as `self.seq_key(key.ignores_padding()) == *key`, without allocating the key
    pub fn matches_key(&self, key: &SeqKey) -> bool {
        self.prefix == key.head
            && self.tail == key.tail
            && self.extension.to_lowercase() == key.ext
            && key.padding.is_none_or(|p| p == self.padding())
    }
}

impl fmt::Display for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_frame_name() {
        let ex = FrameExtractor::default();
        assert_eq!(ex.extract("/path/to/file.1000.more"), ("/path/to/file.", "1000", ".more"));
        assert_eq!(ex.extract("1000.more"), ("", "1000", ".more"));
        assert_eq!(ex.extract("/path/to/file.more"), ("/path/to/file.more", "", ""));
        assert_eq!(ex.extract("1000"), ("", "1000", ""));
        assert_eq!(ex.extract("/path/to/file.1000"), ("/path/to/file.", "1000", ""));
    }

    #[test]
    fn test_extract_takes_rightmost_run() {
        let ex = FrameExtractor::default();
        assert_eq!(ex.extract("cam2_shot_0012"), ("cam2_shot_", "0012", ""));
        assert_eq!(ex.extract("v01_0012_x"), ("v01_", "0012", "_x"));
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("test.ext"), ("test", "ext"));
        assert_eq!(split_extension("test.some.123.ext1"), ("test.some.123", "ext1"));
        assert_eq!(split_extension("testext1"), ("testext1", ""));
    }

    #[test]
    fn test_normal_file() {
        let f = FileEntry::new("/path/to/file.01000.more.ext", None).unwrap();
        assert_eq!(f.path(), "/path/to/file.01000.more.ext");
        assert_eq!(f.dir(), "/path/to");
        assert_eq!(f.name(), "file.01000.more.ext");
        assert_eq!(f.extension(), "ext");
        assert_eq!(f.name_head(), "file.");
        assert_eq!(f.prefix(), "/path/to/file.");
        assert_eq!(f.frame_text(), "01000");
        assert_eq!(f.frame_number(), Some(1000));
        assert_eq!(f.tail(), ".more");
        assert_eq!(f.padding(), 5);
    }

    #[test]
    fn test_no_number_file() {
        let f = FileEntry::new("/path/to/file.ext", None).unwrap();
        assert_eq!(f.prefix(), "/path/to/file");
        assert_eq!(f.frame_text(), "");
        assert_eq!(f.frame_number(), None);
        assert_eq!(f.padding(), 0);
        assert_eq!(f.extension(), "ext");
    }

    #[test]
    fn test_number_only_file() {
        let f = FileEntry::new("/path/to/01234.ext", None).unwrap();
        assert_eq!(f.prefix(), "/path/to/");
        assert_eq!(f.frame_number(), Some(1234));
        assert_eq!(f.padding(), 5);

        let f = FileEntry::new("1234.ext", None).unwrap();
        assert_eq!(f.dir(), "");
        assert_eq!(f.prefix(), "");
        assert_eq!(f.frame_number(), Some(1234));
    }

    #[test]
    fn test_digits_in_extension_ignored() {
        let f = FileEntry::new("clip.mp4", None).unwrap();
        assert_eq!(f.frame_number(), None);
        assert_eq!(f.extension(), "mp4");
    }

    #[test]
    fn test_digits_in_dir_ignored() {
        let f = FileEntry::new("/shots/sh010/readme", None).unwrap();
        assert_eq!(f.frame_number(), None);
        assert_eq!(f.dir(), "/shots/sh010");
    }

    #[test]
    fn test_root_dir() {
        let f = FileEntry::new("/a.0001.exr", None).unwrap();
        assert_eq!(f.dir(), "/");
        assert_eq!(f.prefix(), "/a.");
    }

    #[test]
    fn test_invalid_filename() {
        assert_eq!(
            FileEntry::new("", None),
            Err(EntryError::InvalidFilename(String::new()))
        );
        assert!(FileEntry::new("   ", None).is_err());
        assert!(FileEntry::new("/some/dir/", None).is_err());
    }

    #[test]
    fn test_frame_overflow_is_plain_file() {
        let f = FileEntry::new("big_123456789012345678901234567890.exr", None).unwrap();
        assert_eq!(f.frame_number(), None);
        assert_eq!(f.frame_text(), "");
        assert_eq!(f.prefix(), "big_123456789012345678901234567890");
    }

    #[test]
    fn test_extension_case_preserved() {
        let f = FileEntry::new("plate.0001.EXR", None).unwrap();
        assert_eq!(f.extension(), "EXR");
        assert_eq!(f.ext_lower(), "exr");
    }

    #[test]
    fn test_seq_key_padding() {
        let a = FileEntry::new("file_1.exr", None).unwrap();
        let b = FileEntry::new("file_001.exr", None).unwrap();
        assert_ne!(a.seq_key(false), b.seq_key(false));
        assert_eq!(a.seq_key(true), b.seq_key(true));
        assert_eq!(a.seq_key(false).padding, Some(1));
    }

    #[test]
    fn test_matches_key() {
        let a = FileEntry::new("/r/a.0001.exr", None).unwrap();
        let b = FileEntry::new("/r/a.0002.EXR", None).unwrap();
        let c = FileEntry::new("/r/a.02.exr", None).unwrap();
        let key = a.seq_key(false);
        assert!(b.matches_key(&key));
        assert!(!c.matches_key(&key));
        assert!(c.matches_key(&a.seq_key(true)));
    }

    #[test]
    fn test_custom_extractor() {
        // Frame field must be the first digit run
        let ex = FrameExtractor::new(r"([^0-9]*)([0-9]+)(.*)", 1, 2, 3).unwrap();
        let f = FileEntry::with_extractor("/r/v2_plate_0010.exr", None, &ex).unwrap();
        assert_eq!(f.frame_number(), Some(2));
        assert_eq!(f.tail(), "_plate_0010");
    }

    #[test]
    fn test_custom_extractor_bad_group() {
        assert!(matches!(
            FrameExtractor::new(r"(.*)([0-9]+)", 1, 2, 3),
            Err(ConfigError::BadGroup { group: 3, groups: 2 })
        ));
        assert!(matches!(
            FrameExtractor::new(r"(.*)([0-9]+)", 0, 1, 2),
            Err(ConfigError::BadGroup { group: 0, .. })
        ));
        assert!(matches!(
            FrameExtractor::new(r"((", 1, 2, 3),
            Err(ConfigError::BadPattern(_))
        ));
    }

    #[test]
    fn test_size_from_stats() {
        let f = FileEntry::new("a.0001.exr", Some(Stat::with_size(10))).unwrap();
        assert_eq!(f.size(), Some(10));
        assert_eq!(FileEntry::new("a.0001.exr", None).unwrap().size(), None);
    }
}
