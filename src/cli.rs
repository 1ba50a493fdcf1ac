use clap::Parser;
use std::path::PathBuf;

use crate::paths;

// Build version with platform info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Group numbered files (shot.0001.exr .. shot.0240.exr) into sequences
#[derive(Parser, Debug)]
#[command(name = "useq", author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Directory to scan, listing file (one name per line), or glob pattern
    #[arg(value_name = "SOURCE", required_unless_present = "make_config")]
    pub source: Option<String>,

    /// Write a default config file to the config directory and exit
    #[arg(long = "make-config")]
    pub make_config: bool,

    /// Ignore the user config file
    #[arg(short = 'I', long = "ignore-config")]
    pub ignore_config: bool,

    /// Sequence output format, e.g. "%h%P%T" (see docs for directives)
    #[arg(short = 'f', long = "format", value_name = "FMT")]
    pub format: Option<String>,

    /// Extensions to include, without dot (everything else is excluded)
    #[arg(short = 'i', long = "include", value_name = "EXT", num_args = 1..)]
    pub include: Vec<String>,

    /// Extensions to exclude, without dot
    #[arg(short = 'e', long = "exclude", value_name = "EXT", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Recurse into child directories
    #[arg(short = 'R', long = "recurse")]
    pub recurse: bool,

    /// Collect file stats while scanning directories
    #[arg(short = 's', long = "get-stats")]
    pub get_stats: bool,

    /// Treat file_1 and file_001 as the same sequence
    #[arg(short = 'P', long = "ignore-padding", conflicts_with = "strict_padding")]
    pub ignore_padding: bool,

    /// Different digit counts are different sequences (default unless config says otherwise)
    #[arg(short = 'p', long = "strict-padding")]
    pub strict_padding: bool,

    /// Print stat columns after each entry
    #[arg(long = "csv")]
    pub csv: bool,

    /// CSV column separator ("\t" for tab)
    #[arg(long = "csv-sep", value_name = "SEP")]
    pub csv_sep: Option<String>,

    /// Stat columns for CSV output (size, frames, mtime, ctime, atime, inode, mode, uid, gid, nlink, dev)
    #[arg(long = "stat-order", value_name = "FIELD", num_args = 1..)]
    pub stat_order: Vec<String>,

    /// Print results as JSON
    #[arg(long = "json", conflicts_with = "csv")]
    pub json: bool,

    /// Enable logging to file (default: useq.log in the data directory)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

impl Args {
    /// Apply command-line overrides on top of a loaded config
    pub fn apply(&self, config: &mut crate::config::Config) {
        if let Some(format) = &self.format {
            config.format = format.clone();
        }
        if !self.include.is_empty() {
            config.include_exts = self.include.clone();
        }
        if !self.exclude.is_empty() {
            config.exclude_exts = self.exclude.clone();
        }
        if self.recurse {
            config.recurse = true;
        }
        if self.get_stats {
            config.get_stats = true;
        }
        if self.ignore_padding {
            config.ignore_padding = true;
        }
        if self.strict_padding {
            config.ignore_padding = false;
        }
        if self.csv {
            config.csv = true;
        }
        if let Some(sep) = &self.csv_sep {
            config.csv_sep = sep.clone();
        }
        if !self.stat_order.is_empty() {
            config.stat_order = self.stat_order.clone();
        }
    }
}

/// What `SOURCE` names
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Directory(PathBuf),
    Listing(PathBuf),
    Glob(String),
}

impl Source {
    /// Existing directories and files win over glob syntax, so `shots[1].txt` is
    /// read as a listing when it exists. Anything else with `*`, `?` or `[` is a
    /// glob; the rest is a listing path (reported if missing).
    pub fn detect(source: &str) -> Self {
        let expanded = paths::expand_home(std::path::Path::new(source));
        if expanded.is_dir() {
            Source::Directory(expanded)
        } else if expanded.is_file() {
            Source::Listing(expanded)
        } else if source.contains(['*', '?', '[']) {
            Source::Glob(source.to_string())
        } else {
            Source::Listing(expanded)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "useq", "/renders", "-i", "exr", "dpx", "-R", "-P", "--csv", "--csv-sep", ";", "--stat-order", "size",
        ]);
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.include_exts, vec!["exr", "dpx"]);
        assert!(config.recurse);
        assert!(config.ignore_padding);
        assert!(config.csv);
        assert_eq!(config.csv_sep, ";");
        assert_eq!(config.stat_order, vec!["size"]);
        assert_eq!(args.source.as_deref(), Some("/renders"));
    }

    #[test]
    fn test_strict_padding_overrides_config() {
        let args = Args::parse_from(["useq", "list.txt", "-p"]);
        let mut config = Config {
            ignore_padding: true,
            ..Default::default()
        };
        args.apply(&mut config);
        assert!(!config.ignore_padding);
    }

    #[test]
    fn test_padding_flags_conflict() {
        assert!(Args::try_parse_from(["useq", "x", "-p", "-P"]).is_err());
    }

    #[test]
    fn test_source_detect() {
        let dir = tempfile::tempdir().unwrap();
        let listing = dir.path().join("shots[1].txt");
        std::fs::write(&listing, "a.0001.exr\n").unwrap();

        assert_eq!(
            Source::detect(&dir.path().to_string_lossy()),
            Source::Directory(dir.path().to_path_buf())
        );
        assert_eq!(Source::detect(&listing.to_string_lossy()), Source::Listing(listing.clone()));

        let glob = format!("{}/*.exr", dir.path().display());
        assert_eq!(Source::detect(&glob), Source::Glob(glob.clone()));

        let missing = dir.path().join("missing.txt");
        assert_eq!(Source::detect(&missing.to_string_lossy()), Source::Listing(missing));
    }

    #[test]
    fn test_source_required() {
        assert!(Args::try_parse_from(["useq"]).is_err());
        assert!(Args::try_parse_from(["useq", "--make-config"]).is_ok());
    }
}
