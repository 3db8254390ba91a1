use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::GlobalArgs;

mod commands;
mod output;
mod tty;

use commands::{index, ranges, refs, renumber, validate};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "lpkit")]
#[command(version = VERSION)]
#[command(about = "Validate, renumber and index a numbered proposal corpus")]
struct Cli {
    /// Corpus root holding lpkit.json and the documents directory
    #[arg(long, global = true, default_value = ".", value_name = "DIR")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every document against its range policy and the metadata rules
    Validate(validate::ValidateArgs),
    /// Move documents to new ids and rewrite every reference (dry run by default)
    Renumber(renumber::RenumberArgs),
    /// Build the sorted document index
    Index(index::IndexArgs),
    /// List inbound and outbound references for one document
    Refs(refs::RefsArgs),
    /// Show the active range registry
    Ranges(ranges::RangesArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let global = GlobalArgs { root: cli.root };

    let (json_result, exit_code) = commands::run_json(cli.command, &global);

    if let Err(err) = output::print_json_result(json_result) {
        eprintln!("{}", err.message);
        return std::process::ExitCode::from(exit_code_to_u8(1));
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
