use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{LevelFilter, error};

use ofx2qif::errors::ConvertResult;
use ofx2qif::{ConvertOptions, ConverterBuilder, DatePolicy};

#[derive(Parser, Debug)]
#[command(name = "ofx2qif", version, about = "Convert an OFX bank statement into a QIF file")]
struct Cli {
    /// OFX or QFX statement to read
    input: PathBuf,

    /// QIF file to write
    output: PathBuf,

    /// JSON file with conversion options; flags below override it
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Fail on a DTUSER value that is not a yyyyMMdd date instead of leaving it blank
    #[arg(long)]
    strict_dates: bool,

    /// Aggregate that delimits one transaction [default: STMTTRN]
    #[arg(long, value_name = "NAME")]
    transaction_aggregate: Option<String>,

    /// Also write the OFX headers and document tree as JSON
    #[arg(long, value_name = "PATH")]
    dump_tree: Option<PathBuf>,

    /// -v for info, -vv for debug (RUST_LOG wins when set)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}: {err}", cli.input.display());
            ExitCode::FAILURE
        }
    }
}

fn options(cli: &Cli) -> ConvertResult<ConvertOptions> {
    let mut options = match &cli.config {
        Some(path) => ConvertOptions::from_json_file(path)?,
        None => ConvertOptions::default(),
    };
    if let Some(name) = &cli.transaction_aggregate {
        options.transaction_aggregate = name.clone();
    }
    if cli.strict_dates {
        options.date_policy = DatePolicy::Strict;
    }
    Ok(options)
}

fn run(cli: &Cli) -> ConvertResult<()> {
    let conversion = ConverterBuilder::new()
        .filename(&cli.input.to_string_lossy())
        .options(options(cli)?)
        .convert_file(&cli.output)?;

    if let Some(path) = &cli.dump_tree {
        let json = conversion.tree_json().map_err(std::io::Error::from)?;
        fs::write(path, json)?;
    }
    Ok(())
}
