use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use log::{error, info};
use relnotes::{fmt::ReportFormat, ReleaseNotes};
use tracing_subscriber::EnvFilter;

/// Release notes from the merged pull requests of a revision range.
#[derive(Debug, Parser)]
#[command(name = "relnotes", version, about)]
struct Args {
    /// Revision range, e.g. v10.2.5..v10.2.6
    range: String,

    /// Path to the git repository
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Configuration file (defaults to <repo>/.relnotes.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Require issue references and `<branch>: <component>: ...` titles
    #[arg(long)]
    strict: bool,

    /// Classify titles by component prefix or pull request labels
    #[arg(long)]
    use_tags: bool,

    /// Write plain text instead of reStructuredText
    #[arg(long, conflicts_with = "format")]
    plaintext: bool,

    /// Report format
    #[arg(long)]
    format: Option<ReportFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Token for the hosting platform's API
    #[arg(long, env = "GITHUB_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// More output; repeat for debug logging from every crate
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// progress markers are `info` records of the library, so they show by default
fn default_directives(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn,relnotes=info",
        1 => "info,relnotes=debug",
        _ => "debug",
    }
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn options(args: Args) -> relnotes::error::Result<ReleaseNotes> {
    let default_cfg = args.repo.join(".relnotes.toml");
    let mut notes = match args.config {
        Some(cfg) => ReleaseNotes::default().try_config_file(&cfg)?,
        None if default_cfg.is_file() => ReleaseNotes::default().try_config_file(&default_cfg)?,
        None => ReleaseNotes::default(),
    };

    let strict = args.strict || notes.strict;
    let use_tags = args.use_tags || notes.use_tags;
    notes = notes
        .work_tree(&args.repo)
        .range(args.range)
        .strict(strict)
        .use_tags(use_tags);
    if args.plaintext {
        notes = notes.output_format(ReportFormat::Plain);
    } else if let Some(format) = args.format {
        notes = notes.output_format(format);
    }
    if let Some(output) = args.output {
        notes = notes.outfile(output);
    }
    if let Some(token) = args.token {
        notes = notes.token(token);
    }
    Ok(notes)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let result = options(args).and_then(|notes| notes.write_report());
    match result {
        Ok(data) => {
            if !data.diagnostics.is_empty() {
                info!("{} problems reported", data.diagnostics.len());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_shows_by_default() {
        let filter = EnvFilter::new(default_directives(0));
        assert_eq!(filter.max_level_hint(), Some(tracing_subscriber::filter::LevelFilter::INFO));
        assert!(default_directives(0).contains("relnotes=info"));
    }

    #[test]
    fn flags_parse() {
        let args = Args::try_parse_from(["relnotes", "v1..v2", "--strict", "-vv"]).unwrap();
        assert_eq!(args.range, "v1..v2");
        assert!(args.strict);
        assert_eq!(default_directives(args.verbose), "debug");
        assert!(Args::try_parse_from(["relnotes", "r", "--plaintext", "--format", "json"]).is_err());
    }
}
