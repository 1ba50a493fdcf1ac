//! Input sources for the parser
//!
//! **Why**: Classification consumes one filename at a time. These helpers produce
//! filenames lazily from a directory tree or a listing file, so a large scan never
//! materializes the whole file list.
//!
//! **Used by**: Parser (`parse_directory`, `parse_listing`)
//!
//! # Links
//!
//! Symbolic links are skipped entirely, whether they point to files or directories.
//! They never show up in any parser bucket.
//!
//! # Undecodable names
//!
//! Names that aren't valid UTF-8 come back as `Err` holding a lossy rendering.
//! They can't be decomposed faithfully, so the parser counts them as invalid
//! instead of grouping the lossy text.

use log::{debug, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use walkdir::WalkDir;

use crate::entities::Stat;

/// A name from an input source; `Err` holds a lossy rendering of a non-UTF-8 name
pub type ScannedName = Result<String, String>;

/// One scanned file: path plus stats when requested
pub type ScannedFile = (ScannedName, Option<Stat>);

/// Path as UTF-8 text, or its lossy rendering as `Err`
pub fn path_text(path: &Path) -> ScannedName {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| path.display().to_string())
}

/// Walk `root` and yield regular files.
///
/// - `recurse = false`: only direct children of `root`
/// - `get_stats = true`: attach [`Stat`] from the (non-followed) metadata
///
/// Entries are sorted by file name per directory, so the order is stable per run.
/// Unreadable entries are logged and skipped.
pub fn scan_dir(root: &Path, recurse: bool, get_stats: bool) -> impl Iterator<Item = ScannedFile> {
    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();
    if !recurse {
        walker = walker.max_depth(1);
    }

    walker.into_iter().filter_map(move |entry| {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                return None;
            }
        };

        let file_type = entry.file_type();
        if file_type.is_symlink() {
            debug!("Skipping link: {}", entry.path().display());
            return None;
        }
        if !file_type.is_file() {
            return None;
        }

        let path = path_text(entry.path());
        let stats = match (&path, get_stats) {
            (Ok(_), true) => match entry.metadata() {
                Ok(meta) => Some(Stat::from(&meta)),
                Err(e) => {
                    warn!("Failed to stat {}: {}", entry.path().display(), e);
                    None
                }
            },
            _ => None,
        };

        Some((path, stats))
    })
}

/// Open a listing file and yield one filename per line.
///
/// Trailing whitespace (and the newline) is trimmed; leading whitespace is kept since
/// it can be part of a name. Blank lines are skipped. A line that isn't valid UTF-8
/// comes back as `Err("<listing>:<line>: <lossy text>")`. A read error ends the stream.
pub fn read_listing(path: &Path) -> std::io::Result<impl Iterator<Item = ScannedName>> {
    let file = File::open(path)?;
    let display = path.display().to_string();
    let read_display = display.clone();

    Ok(BufReader::new(file)
        .split(b'\n')
        .enumerate()
        .map_while(move |(i, line)| match line {
            Ok(bytes) => Some((i + 1, bytes)),
            Err(e) => {
                warn!("{}:{}: read failed, stopping: {}", read_display, i + 1, e);
                None
            }
        })
        .filter_map(move |(lineno, bytes)| match String::from_utf8(bytes) {
            Ok(line) => {
                let name = line.trim_end();
                (!name.is_empty()).then(|| Ok(name.to_string()))
            }
            Err(e) => {
                let lossy = String::from_utf8_lossy(e.as_bytes());
                let name = lossy.trim_end();
                (!name.is_empty()).then(|| Err(format!("{}:{}: {}", display, lineno, name)))
            }
        }))
}
