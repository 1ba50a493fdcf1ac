//! Entities module - the data model of a parse
//!
//! - `FileEntry`: one filename split into head / frame / tail / extension
//! - `FileSequence`: entries sharing a sequence key, one per frame number
//! - `Stat`: optional filesystem metadata carried by an entry
//! - `SeqFormat`: compiled display format for sequences

pub mod file_entry;
pub mod format;
pub mod sequence;
pub mod stat;

pub use file_entry::{split_extension, EntryError, FileEntry, FrameExtractor};
pub use format::{FormatError, SeqFormat, DEFAULT_FORMAT};
pub use sequence::{frame_ranges, FileSequence, SeqKey, SequenceError};
pub use stat::{Stat, StatValue};
