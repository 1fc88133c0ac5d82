//! gisaid-track-aa-subs - AA substitutions by date and country
//!
//! ```bash
//! gisaid-track-aa-subs -i metadata.tsv -o aa_subs.csv            # human sequences
//! gisaid-track-aa-subs -i metadata.tsv -o mink.csv -s "Neovison vison"
//! gisaid-track-aa-subs -i metadata.tsv -o aa_subs.csv --strict-dates --report run.json
//! ```
//!
//! Missing or invalid arguments print usage to stderr and exit with code 2.
//! Runtime failures exit with code 1.

use clap::Parser;
use aasubs::logs::{log_error, LOGGER};
use aasubs::{track_file, write_report, DateCheck, TrackOptions, DEFAULT_HOST};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gisaid-track-aa-subs")]
#[command(about = "Create a CSV of AA substitutions by date and country from a GISAID metadata file", long_about = None)]
struct Cli {
    /// GISAID metadata file, tab-separated (required)
    #[arg(short = 'i', long = "input_file")]
    input_file: PathBuf,

    /// Output CSV file (required)
    #[arg(short = 'o', long = "output_file")]
    output_file: PathBuf,

    /// Virus host species, exact match
    #[arg(short = 's', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Also reject dates that are not real calendar dates (e.g. 2021-13-40)
    #[arg(long)]
    strict_dates: bool,

    /// Drop rows whose substitution list is empty
    #[arg(long)]
    drop_empty: bool,

    /// Write a JSON run summary to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn options(&self) -> TrackOptions {
        TrackOptions {
            host: self.host.clone(),
            date_check: if self.strict_dates {
                DateCheck::Calendar
            } else {
                DateCheck::Pattern
            },
            drop_empty: self.drop_empty,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    LOGGER.set_quiet(cli.quiet);

    let result = cmd_track(
        &cli.input_file,
        &cli.output_file,
        &cli.options(),
        cli.report.as_deref(),
    );

    if let Err(e) = result {
        log_error(format!("Error: {}", e));
        std::process::exit(1);
    }
}

fn cmd_track(
    input: &Path,
    output: &Path,
    options: &TrackOptions,
    report_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = track_file(input, output, options)?;

    if let Some(path) = report_path {
        write_report(path, &report)?;
    }

    if !LOGGER.is_quiet() {
        eprintln!("\n✨ Done!");
    }
    Ok(())
}
