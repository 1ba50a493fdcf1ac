//! `useq` - list file sequences in a directory, listing file or glob
//!
//! ```text
//! $ useq /renders/shot010
//! /renders/shot010/comp.[0001-0240].exr
//! /renders/shot010/notes.txt
//! ```

use anyhow::{Context, Result};
use clap::Parser as _;
use log::{debug, info};

use ultraseq::cli::{Args, Source};
use ultraseq::config::Config;
use ultraseq::parser::Parser;
use ultraseq::paths::{self, PathConfig};
use ultraseq::report::{self, OutputOptions};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(args: &Args, path_config: &PathConfig) -> Result<()> {
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .as_ref()
            .cloned()
            .unwrap_or_else(|| paths::data_file(paths::LOG_FILE, path_config));
        paths::ensure_parent(&log_path)?;

        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging respects RUST_LOG if set
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}

fn run() -> Result<()> {
    let args = Args::parse();
    let path_config = PathConfig::from_env_and_cli(args.config_dir.clone());

    init_logging(&args, &path_config)?;
    debug!("Command-line args: {:?}", args);

    if args.make_config {
        let path = Config::write_user_config(&path_config)?;
        println!("Made user config file at {}", path.display());
        return Ok(());
    }

    let mut config = if args.ignore_config {
        Config::default()
    } else {
        Config::load(&path_config)?
    };
    args.apply(&mut config);
    debug!("Effective config: {:?}", config);

    let output = OutputOptions::from_config(&config)?;
    let mut parser = Parser::from_config(&config)?;

    let Some(source) = args.source.as_deref() else {
        return Ok(());
    };
    match Source::detect(source) {
        Source::Directory(dir) => parser.parse_directory(&dir)?,
        Source::Listing(listing) => parser.parse_listing(&listing)?,
        Source::Glob(pattern) => parser.parse_glob(&pattern)?,
    }

    if args.json {
        println!("{}", report::render_json(parser.results())?);
    } else {
        for line in report::render_lines(parser.results(), &output) {
            println!("{}", line);
        }
    }

    if !parser.invalid().is_empty() {
        eprintln!("Skipped {} invalid filename(s)", parser.invalid().len());
    }
    Ok(())
}
