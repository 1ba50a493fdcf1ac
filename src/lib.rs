//! ULTRASEQ - file sequence grouping library
//!
//! Groups filenames that differ only by a frame number (`shot.0001.exr` ..
//! `shot.0240.exr`) into sequences, from a directory scan, a listing file,
//! a glob or an in-memory list.
//!
//! ```
//! use ultraseq::{ParseOptions, Parser};
//!
//! let mut parser = Parser::new(ParseOptions::default());
//! parser.parse_paths(["a_001.exr", "a_002.exr", "a_002.exr", "readme"]);
//!
//! assert_eq!(parser.sequences().len(), 1);
//! assert_eq!(parser.sequences()[0].frame_count(), 2);
//! assert_eq!(parser.collisions()[0].path(), "a_002.exr");
//! assert_eq!(parser.non_sequences()[0].path(), "readme");
//! ```

pub mod cli;
pub mod config;
pub mod entities;
pub mod parser;
pub mod paths;
pub mod report;
pub mod scan;

// Re-export commonly used types
pub use config::{Config, ConfigError, ParseOptions};
pub use entities::{EntryError, FileEntry, FileSequence, FrameExtractor, SeqFormat, SeqKey, SequenceError, Stat};
pub use parser::{Bucket, ParseError, ParseResults, Parser};
