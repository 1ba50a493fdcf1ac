//! File sequence accumulation
//!
//! **Why**: Renders write one file per frame (`shot.0001.exr` .. `shot.0240.exr`).
//! A `FileSequence` collects entries sharing one [`SeqKey`] and keeps exactly one
//! entry per frame number. A second file claiming an existing frame is rejected
//! and handed back to the caller, never merged.
//!
//! **Used by**: Parser (working map, final `sequences` bucket), report (formatting)

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::file_entry::FileEntry;
use super::format::SeqFormat;

/// Sequence identity shared by every member.
///
/// `padding` is `None` when padding is ignored, so `file_1.exr` and
/// `file_001.exr` produce equal keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SeqKey {
    pub head: String, // dir + name head
    pub tail: String,
    pub ext: String, // lower-cased
    pub padding: Option<usize>,
}

impl SeqKey {
    pub fn ignores_padding(&self) -> bool {
        self.padding.is_none()
    }
}

/// `/path/file.%04d.exr`, or `/path/file.#.exr` when padding is ignored
impl fmt::Display for SeqKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.head)?;
        match self.padding {
            Some(p) => write!(f, "%0{}d", p)?,
            None => write!(f, "#")?,
        }
        write!(f, "{}", self.tail)?;
        if !self.ext.is_empty() {
            write!(f, ".{}", self.ext)?;
        }
        Ok(())
    }
}

/// Append/seed failures. Every variant that rejects an entry returns it.
#[derive(Debug)]
pub enum SequenceError {
    /// Entry has no frame field
    NoFrameNumber(Box<FileEntry>),
    /// Entry key differs from the sequence key
    KeyMismatch { key: SeqKey, entry: Box<FileEntry> },
    /// Frame number already taken by `existing`
    FrameCollision {
        existing: String,
        incoming: Box<FileEntry>,
    },
}

impl SequenceError {
    /// Take back the rejected entry
    pub fn into_entry(self) -> FileEntry {
        match self {
            SequenceError::NoFrameNumber(e) => *e,
            SequenceError::KeyMismatch { entry, .. } => *entry,
            SequenceError::FrameCollision { incoming, .. } => *incoming,
        }
    }
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceError::NoFrameNumber(e) => write!(f, "{} can not be sequenced", e),
            SequenceError::KeyMismatch { key, entry } => {
                write!(f, "{} is not a member of {}", entry, key)
            }
            SequenceError::FrameCollision { existing, incoming } => {
                write!(f, "{} collides with {} (frame {})", incoming, existing, incoming.frame_text())
            }
        }
    }
}

impl std::error::Error for SequenceError {}

/// Ordered set of entries with one member per frame number
#[derive(Debug, Clone, Serialize)]
pub struct FileSequence {
    key: SeqKey,
    #[serde(serialize_with = "serialize_members")]
    members: BTreeMap<u64, FileEntry>,
    padding: usize,             // widest member padding
    inconsistent_padding: bool, // members disagree on width (ignore_padding only)
}

fn serialize_members<S: serde::Serializer>(
    members: &BTreeMap<u64, FileEntry>,
    s: S,
) -> Result<S::Ok, S::Error> {
    s.collect_seq(members.values())
}

impl FileSequence {
    /// Start a sequence from its first entry
    pub fn new(first: FileEntry, ignore_padding: bool) -> Result<Self, SequenceError> {
        let Some(frame) = first.frame_number() else {
            return Err(SequenceError::NoFrameNumber(Box::new(first)));
        };
        let mut members = BTreeMap::new();
        let key = first.seq_key(ignore_padding);
        let padding = first.padding();
        members.insert(frame, first);
        Ok(Self {
            key,
            members,
            padding,
            inconsistent_padding: false,
        })
    }

    /// Add a member. Rejects entries without a frame, from another key,
    /// or whose frame is already present; `members` is untouched on error.
    pub fn append(&mut self, entry: FileEntry) -> Result<(), SequenceError> {
        let Some(frame) = entry.frame_number() else {
            return Err(SequenceError::NoFrameNumber(Box::new(entry)));
        };
        if !entry.matches_key(&self.key) {
            return Err(SequenceError::KeyMismatch {
                key: self.key.clone(),
                entry: Box::new(entry),
            });
        }
        if let Some(existing) = self.members.get(&frame) {
            return Err(SequenceError::FrameCollision {
                existing: existing.path().to_string(),
                incoming: Box::new(entry),
            });
        }

        if entry.padding() != self.padding {
            self.inconsistent_padding = true;
            self.padding = self.padding.max(entry.padding());
        }
        self.members.insert(frame, entry);
        Ok(())
    }

    pub fn key(&self) -> &SeqKey {
        &self.key
    }

    /// Number of members
    pub fn frame_count(&self) -> usize {
        self.members.len()
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    pub fn inconsistent_padding(&self) -> bool {
        self.inconsistent_padding
    }

    /// First frame number
    pub fn start(&self) -> u64 {
        self.members.keys().next().copied().unwrap_or_default()
    }

    /// Last frame number
    pub fn end(&self) -> u64 {
        self.members.keys().next_back().copied().unwrap_or_default()
    }

    /// Sorted frame numbers
    pub fn frame_numbers(&self) -> Vec<u64> {
        self.members.keys().copied().collect()
    }

    /// Entry for an exact frame number
    pub fn get_frame(&self, frame: u64) -> Option<&FileEntry> {
        self.members.get(&frame)
    }

    /// Entries in `start..=end` stepping by `step`; absent frames are skipped
    pub fn get_frames(&self, start: u64, end: u64, step: usize) -> Vec<&FileEntry> {
        (start..=end)
            .step_by(step.max(1))
            .filter_map(|f| self.members.get(&f))
            .collect()
    }

    /// Members in frame order
    pub fn iter(&self) -> impl Iterator<Item = &FileEntry> {
        self.members.values()
    }

    /// Lowest-numbered member
    pub fn first(&self) -> &FileEntry {
        // Never empty: seeded in new(), only grows
        self.members.values().next().expect("sequence has at least one member")
    }

    /// Consume a one-member sequence into its entry
    pub fn into_single(mut self) -> Result<FileEntry, Self> {
        if self.members.len() == 1 {
            if let Some((_, entry)) = self.members.pop_first() {
                return Ok(entry);
            }
        }
        Err(self)
    }

    /// Sum of member sizes, `None` if any size is unknown
    pub fn size(&self) -> Option<u64> {
        self.members.values().map(|e| e.size()).sum()
    }

    /// Directory of the sequence
    pub fn dir(&self) -> &str {
        self.first().dir()
    }

    /// Pattern path, e.g. `/path/file.%04d.exr`
    pub fn abspath(&self) -> String {
        self.pattern(self.first().prefix())
    }

    /// Pattern name without dir, e.g. `file.%04d.exr`
    pub fn name(&self) -> String {
        self.pattern(self.first().name_head())
    }

    fn pattern(&self, head: &str) -> String {
        let first = self.first();
        let digits = if self.key.ignores_padding() {
            "#".to_string()
        } else {
            format!("%0{}d", self.padding)
        };
        let mut out = format!("{}{}{}", head, digits, first.tail());
        if !first.extension().is_empty() {
            out.push('.');
            out.push_str(first.extension());
        }
        out
    }

    /// Render with a compiled format, see [`SeqFormat`]
    pub fn format(&self, fmt: &SeqFormat) -> String {
        fmt.render(self)
    }
}

impl fmt::Display for FileSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(&SeqFormat::default()))
    }
}

/// Collapse sorted frame numbers into ranges: `[100-102, 104, 107-108]`
pub fn frame_ranges(frames: &[u64]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut iter = frames.iter().copied().peekable();

    while let Some(start) = iter.next() {
        let mut end = start;
        while let Some(&next) = iter.peek() {
            if next == end + 1 {
                end = next;
                iter.next();
            } else {
                break;
            }
        }
        if start == end {
            parts.push(start.to_string());
        } else {
            parts.push(format!("{}-{}", start, end));
        }
    }

    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Stat;

    fn entry(path: &str) -> FileEntry {
        FileEntry::new(path, None).unwrap()
    }

    #[test]
    fn test_frame_ranges() {
        assert_eq!(frame_ranges(&[100, 101, 102, 104, 107, 108, 1010]), "[100-102, 104, 107-108, 1010]");
        assert_eq!(frame_ranges(&[]), "[]");
        assert_eq!(frame_ranges(&[5]), "[5]");
    }

    #[test]
    fn test_new_and_append() {
        let mut seq = FileSequence::new(entry("/r/a.0002.exr"), false).unwrap();
        seq.append(entry("/r/a.0001.exr")).unwrap();
        seq.append(entry("/r/a.0005.exr")).unwrap();

        assert_eq!(seq.frame_count(), 3);
        assert_eq!(seq.start(), 1);
        assert_eq!(seq.end(), 5);
        assert_eq!(seq.frame_numbers(), vec![1, 2, 5]);
        assert_eq!(seq.padding(), 4);
        assert!(!seq.inconsistent_padding());
        assert_eq!(seq.first().path(), "/r/a.0001.exr");
    }

    #[test]
    fn test_append_collision_keeps_members() {
        let mut seq = FileSequence::new(entry("/r/a.0001.exr"), false).unwrap();
        seq.append(entry("/r/a.0002.exr")).unwrap();

        let err = seq.append(entry("/r/a.0002.EXR")).unwrap_err();
        match &err {
            SequenceError::FrameCollision { existing, incoming } => {
                assert_eq!(existing, "/r/a.0002.exr");
                assert_eq!(incoming.path(), "/r/a.0002.EXR");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(err.into_entry().path(), "/r/a.0002.EXR");
        assert_eq!(seq.frame_count(), 2);
        assert_eq!(seq.get_frame(2).unwrap().path(), "/r/a.0002.exr");
    }

    #[test]
    fn test_append_rejects_foreign_entries() {
        let mut seq = FileSequence::new(entry("/r/a.0001.exr"), false).unwrap();

        let err = seq.append(entry("/r/b.0002.exr")).unwrap_err();
        assert!(matches!(err, SequenceError::KeyMismatch { .. }));

        let err = seq.append(entry("/r/a.exr")).unwrap_err();
        assert!(matches!(err, SequenceError::NoFrameNumber(_)));

        assert!(FileSequence::new(entry("readme"), false).is_err());
        assert_eq!(seq.frame_count(), 1);
    }

    #[test]
    fn test_ignore_padding_merge() {
        let mut seq = FileSequence::new(entry("file_1.exr"), true).unwrap();
        seq.append(entry("file_002.exr")).unwrap();
        assert_eq!(seq.frame_count(), 2);
        assert_eq!(seq.padding(), 3);
        assert!(seq.inconsistent_padding());

        // Same integer frame, different text: still a collision
        let err = seq.append(entry("file_01.exr")).unwrap_err();
        assert!(matches!(err, SequenceError::FrameCollision { .. }));
    }

    #[test]
    fn test_inconsistent_padding_any_order() {
        // Narrower member joining after a wider one is flagged too
        let mut seq = FileSequence::new(entry("file_002.exr"), true).unwrap();
        seq.append(entry("file_1.exr")).unwrap();
        assert!(seq.inconsistent_padding());
        assert_eq!(seq.padding(), 3);

        let mut seq = FileSequence::new(entry("file_002.exr"), true).unwrap();
        seq.append(entry("file_003.exr")).unwrap();
        assert!(!seq.inconsistent_padding());
    }

    #[test]
    fn test_strict_padding_rejects_other_width() {
        let mut seq = FileSequence::new(entry("file_001.exr"), false).unwrap();
        let err = seq.append(entry("file_2.exr")).unwrap_err();
        assert!(matches!(err, SequenceError::KeyMismatch { .. }));
    }

    #[test]
    fn test_get_frames() {
        let mut seq = FileSequence::new(entry("a.1.exr"), false).unwrap();
        for f in ["a.2.exr", "a.3.exr", "a.5.exr"] {
            seq.append(entry(f)).unwrap();
        }
        let got: Vec<u64> = seq.get_frames(1, 5, 2).iter().filter_map(|e| e.frame_number()).collect();
        assert_eq!(got, vec![1, 3, 5]);
        assert_eq!(seq.get_frames(4, 4, 1).len(), 0);
    }

    #[test]
    fn test_into_single() {
        let seq = FileSequence::new(entry("a.0001.exr"), false).unwrap();
        assert_eq!(seq.into_single().unwrap().path(), "a.0001.exr");

        let mut seq = FileSequence::new(entry("a.0001.exr"), false).unwrap();
        seq.append(entry("a.0002.exr")).unwrap();
        let seq = seq.into_single().unwrap_err();
        assert_eq!(seq.frame_numbers(), vec![1, 2]);
    }

    #[test]
    fn test_names() {
        let mut seq = FileSequence::new(entry("/r/a.0001.final.exr"), false).unwrap();
        seq.append(entry("/r/a.0002.final.exr")).unwrap();
        assert_eq!(seq.abspath(), "/r/a.%04d.final.exr");
        assert_eq!(seq.name(), "a.%04d.final.exr");
        assert_eq!(seq.key().to_string(), "/r/a.%04d.final.exr");

        let seq = FileSequence::new(entry("/r/a.0001.exr"), true).unwrap();
        assert_eq!(seq.abspath(), "/r/a.#.exr");
    }

    #[test]
    fn test_size() {
        let mut seq = FileSequence::new(FileEntry::new("a.1.exr", Some(Stat::with_size(3))).unwrap(), false).unwrap();
        seq.append(FileEntry::new("a.2.exr", Some(Stat::with_size(4))).unwrap()).unwrap();
        assert_eq!(seq.size(), Some(7));

        seq.append(entry("a.3.exr")).unwrap();
        assert_eq!(seq.size(), None);
    }

}
