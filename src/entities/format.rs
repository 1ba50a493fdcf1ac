//! Sequence display formats
//!
//! A format string is compiled once into a list of pieces, so a bad directive is
//! reported before any output is written.
//!
//! Sample: frames 101-140, 148, 150 of `/path/to/file_name.0101.final.ext`
//!
//! | Directive | Meaning                        | Example                  |
//! |-----------|--------------------------------|--------------------------|
//! | `%%`      | literal `%`                    | `%`                      |
//! | `%p`      | directory                      | `/path/to`               |
//! | `%h`      | name chars before frame        | `file_name.`             |
//! | `%H`      | all chars before frame         | `/path/to/file_name.`    |
//! | `%f`      | number of frames               | `42`                     |
//! | `%r`      | implied range, padded          | `[0101-0150]`            |
//! | `%R`      | explicit ranges                | `[101-140, 148, 150]`    |
//! | `%D`      | `#` per padding digit          | `####`                   |
//! | `%P`      | printf padding                 | `%04d`                   |
//! | `%t`      | tail without extension         | `.final`                 |
//! | `%T`      | tail with extension            | `.final.ext`             |
//! | `%e`      | extension                      | `ext`                    |

use std::fmt;

use super::sequence::{frame_ranges, FileSequence};

/// Default output format: `/path/file.[0001-0100].exr`
pub const DEFAULT_FORMAT: &str = "%H%r%T";

/// Format compile errors
#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    UnknownDirective(char),
    TrailingPercent,
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::UnknownDirective(c) => write!(f, "Unknown format directive: %{}", c),
            FormatError::TrailingPercent => write!(f, "Format ends with a lone '%'"),
        }
    }
}

impl std::error::Error for FormatError {}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Directive {
    Percent,
    Dir,
    NameHead,
    Head,
    FrameCount,
    ImpliedRange,
    ExplicitRange,
    Pounds,
    Printf,
    Tail,
    TailExt,
    Ext,
}

impl Directive {
    fn from_char(c: char) -> Option<Self> {
        Some(match c {
            '%' => Self::Percent,
            'p' => Self::Dir,
            'h' => Self::NameHead,
            'H' => Self::Head,
            'f' => Self::FrameCount,
            'r' => Self::ImpliedRange,
            'R' => Self::ExplicitRange,
            'D' => Self::Pounds,
            'P' => Self::Printf,
            't' => Self::Tail,
            'T' => Self::TailExt,
            'e' => Self::Ext,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Literal(String),
    Directive(Directive),
}

/// Compiled sequence format
#[derive(Debug, Clone, PartialEq)]
pub struct SeqFormat {
    pieces: Vec<Piece>,
}

impl SeqFormat {
    /// Compile a format string
    pub fn parse(format: &str) -> Result<Self, FormatError> {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut chars = format.chars();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            let next = chars.next().ok_or(FormatError::TrailingPercent)?;
            let directive = Directive::from_char(next).ok_or(FormatError::UnknownDirective(next))?;
            if directive == Directive::Percent {
                literal.push('%');
                continue;
            }
            if !literal.is_empty() {
                pieces.push(Piece::Literal(std::mem::take(&mut literal)));
            }
            pieces.push(Piece::Directive(directive));
        }
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        Ok(Self { pieces })
    }

    /// Render a sequence
    pub fn render(&self, seq: &FileSequence) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(s) => out.push_str(s),
                Piece::Directive(d) => render_directive(*d, seq, &mut out),
            }
        }
        out
    }
}

impl Default for SeqFormat {
    fn default() -> Self {
        Self::parse(DEFAULT_FORMAT).expect("default format must compile")
    }
}

fn render_directive(d: Directive, seq: &FileSequence, out: &mut String) {
    let first = seq.first();
    match d {
        Directive::Percent => out.push('%'),
        Directive::Dir => out.push_str(first.dir()),
        Directive::NameHead => out.push_str(first.name_head()),
        Directive::Head => out.push_str(first.prefix()),
        Directive::FrameCount => out.push_str(&seq.frame_count().to_string()),
        Directive::ImpliedRange => {
            // Original text of first/last frames keeps their padding
            let start = seq.get_frame(seq.start()).map(|e| e.frame_text()).unwrap_or("");
            let end = seq.get_frame(seq.end()).map(|e| e.frame_text()).unwrap_or("");
            out.push_str(&format!("[{}-{}]", start, end));
        }
        Directive::ExplicitRange => out.push_str(&frame_ranges(&seq.frame_numbers())),
        Directive::Pounds => out.push_str(&"#".repeat(seq.padding())),
        Directive::Printf => out.push_str(&format!("%0{}d", seq.padding())),
        Directive::Tail => out.push_str(first.tail()),
        Directive::TailExt => {
            out.push_str(first.tail());
            if !first.extension().is_empty() {
                out.push('.');
                out.push_str(first.extension());
            }
        }
        Directive::Ext => out.push_str(first.extension()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::FileEntry;

    fn sample() -> FileSequence {
        let entry = |p: &str| FileEntry::new(p, None).unwrap();
        let mut seq = FileSequence::new(entry("/path/to/file_name.0101.final.ext"), false).unwrap();
        for f in (102..=140).chain([148, 150]) {
            seq.append(entry(&format!("/path/to/file_name.{:04}.final.ext", f))).unwrap();
        }
        seq
    }

    #[test]
    fn test_default_format() {
        assert_eq!(sample().to_string(), "/path/to/file_name.[0101-0150].final.ext");
    }

    #[test]
    fn test_all_directives() {
        let seq = sample();
        let cases = [
            ("%%", "%"),
            ("%p", "/path/to"),
            ("%h", "file_name."),
            ("%H", "/path/to/file_name."),
            ("%f", "42"),
            ("%r", "[0101-0150]"),
            ("%R", "[101-140, 148, 150]"),
            ("%D", "####"),
            ("%P", "%04d"),
            ("%t", ".final"),
            ("%T", ".final.ext"),
            ("%e", "ext"),
        ];
        for (fmt, expected) in cases {
            let compiled = SeqFormat::parse(fmt).unwrap();
            assert_eq!(seq.format(&compiled), expected, "format {}", fmt);
        }
    }

    #[test]
    fn test_mixed_literal() {
        let seq = sample();
        let fmt = SeqFormat::parse("%r %h%P%T 100%% (%f)").unwrap();
        assert_eq!(seq.format(&fmt), "[0101-0150] file_name.%04d.final.ext 100% (42)");
    }

    #[test]
    fn test_bad_formats() {
        assert_eq!(SeqFormat::parse("%x"), Err(FormatError::UnknownDirective('x')));
        assert_eq!(SeqFormat::parse("abc%"), Err(FormatError::TrailingPercent));
    }
}
