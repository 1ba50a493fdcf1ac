//! Output rendering for a finished parse
//!
//! **Why**: The CLI prints every result as one line: sequences through the
//! configured [`SeqFormat`], plain files as their path. CSV mode appends stat
//! columns; JSON mode dumps the whole [`ParseResults`].
//!
//! **Used by**: main

use anyhow::{bail, Context, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};

use crate::config::Config;
use crate::entities::{FileEntry, FileSequence, SeqFormat, StatValue};
use crate::parser::ParseResults;

/// Columns accepted in `stat_order`
pub const STAT_FIELDS: &[&str] = &[
    "size", "frames", "mtime", "ctime", "atime", "inode", "mode", "uid", "gid", "nlink", "dev",
];

/// One output row
#[derive(Debug, Clone, Copy)]
pub enum Row<'a> {
    Sequence(&'a FileSequence),
    File(&'a FileEntry),
}

impl Row<'_> {
    /// Path used for sorting (pattern path for sequences)
    pub fn sort_key(&self) -> String {
        match self {
            Row::Sequence(s) => s.abspath().to_lowercase(),
            Row::File(f) => f.path().to_lowercase(),
        }
    }

    fn stat(&self, field: &str) -> Option<StatValue> {
        match (self, field) {
            (Row::Sequence(s), "size") => s.size().map(StatValue::Int),
            (Row::File(f), "size") => f.size().map(StatValue::Int),
            (Row::Sequence(s), "frames") => Some(StatValue::Int(s.frame_count() as u64)),
            (Row::File(_), "frames") => Some(StatValue::Int(1)),
            // Newest member time
            (Row::Sequence(s), "mtime" | "ctime" | "atime") => s
                .iter()
                .filter_map(|e| e.stats()?.field(field))
                .max_by(|a, b| time_of(a).total_cmp(&time_of(b))),
            (Row::Sequence(s), _) => s.first().stats()?.field(field),
            (Row::File(f), _) => f.stats()?.field(field),
        }
    }
}

fn time_of(v: &StatValue) -> f64 {
    match v {
        StatValue::Time(t) => *t,
        StatValue::Int(i) => *i as f64,
    }
}

/// Everything that shapes the printed output
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format: SeqFormat,
    pub csv: bool,
    pub csv_sep: String,
    pub stat_order: Vec<String>,
    pub date_format: String,
}

impl OutputOptions {
    /// Validate and compile output settings
    pub fn from_config(config: &Config) -> Result<Self> {
        for field in &config.stat_order {
            if !STAT_FIELDS.contains(&field.as_str()) {
                bail!("Unknown stat field '{}' (expected one of: {})", field, STAT_FIELDS.join(", "));
            }
        }
        if StrftimeItems::new(&config.date_format).any(|item| matches!(item, Item::Error)) {
            bail!("Invalid date_format: {}", config.date_format);
        }

        Ok(Self {
            format: config.seq_format().context("Bad sequence format")?,
            csv: config.csv,
            csv_sep: unescape_sep(&config.csv_sep),
            stat_order: config.stat_order.clone(),
            date_format: config.date_format.clone(),
        })
    }

    fn render_value(&self, value: Option<StatValue>) -> String {
        match value {
            None => String::new(),
            Some(StatValue::Int(i)) => i.to_string(),
            Some(StatValue::Time(t)) => {
                let secs = t.floor();
                let nanos = ((t - secs) * 1e9) as u32;
                match DateTime::from_timestamp(secs as i64, nanos) {
                    Some(utc) => utc.with_timezone(&Local).format(&self.date_format).to_string(),
                    None => t.to_string(),
                }
            }
        }
    }

    /// Render one row
    pub fn render_row(&self, row: &Row<'_>) -> String {
        let name = match row {
            Row::Sequence(s) => s.format(&self.format),
            Row::File(f) => f.path().to_string(),
        };
        if !self.csv {
            return name;
        }

        let mut cols = vec![name];
        cols.extend(self.stat_order.iter().map(|field| self.render_value(row.stat(field))));
        cols.join(&self.csv_sep)
    }
}

/// `\t` typed on a command line means a tab
fn unescape_sep(sep: &str) -> String {
    sep.replace("\\t", "\t")
}

/// All rows of a parse, sorted case-insensitively by path
pub fn rows(results: &ParseResults) -> Vec<Row<'_>> {
    let mut rows: Vec<Row<'_>> = results
        .sequences
        .iter()
        .map(Row::Sequence)
        .chain(
            results
                .single_frames
                .iter()
                .chain(&results.non_sequences)
                .chain(&results.collisions)
                .chain(&results.excluded)
                .map(Row::File),
        )
        .collect();
    rows.sort_by_cached_key(|r| r.sort_key());
    rows
}

/// Plain/CSV lines for a parse
pub fn render_lines(results: &ParseResults, options: &OutputOptions) -> Vec<String> {
    rows(results).iter().map(|r| options.render_row(r)).collect()
}

/// Pretty JSON for a parse
pub fn render_json(results: &ParseResults) -> Result<String> {
    serde_json::to_string_pretty(results).context("Failed to serialize results")
}
