use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use lpkit::index::{self, LpIndex};
use lpkit::{validate, Error};

use super::{CmdResult, Workspace};

#[derive(Args)]
pub struct IndexArgs {
    /// Write the index to this path (repeatable, relative to the corpus
    /// root). The index is printed when no path is given.
    #[arg(long, short, value_name = "PATH")]
    pub output: Vec<PathBuf>,

    /// Build the index even when validation reports errors
    #[arg(long)]
    pub allow_invalid: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "command")]
pub enum IndexOutput {
    #[serde(rename = "index.show")]
    Show(LpIndex),

    #[serde(rename = "index.write")]
    Write {
        lp_count: usize,
        generated_at: String,
        written: Vec<String>,
    },
}

pub fn run(args: IndexArgs, global: &super::GlobalArgs) -> CmdResult<IndexOutput> {
    let workspace = Workspace::open(&global.root)?;

    if !args.allow_invalid {
        let registry = workspace.config.registry()?;
        let report = validate::run(&workspace.corpus, &registry);
        if !report.passed() {
            return Err(Error::validation_failed(report.errors, report.warnings)
                .with_hint("Run 'lpkit validate' for details, or pass --allow-invalid"));
        }
    }

    let lp_index = index::build(&workspace.corpus, &workspace.config);

    if args.output.is_empty() {
        return Ok((IndexOutput::Show(lp_index), 0));
    }

    let paths: Vec<PathBuf> = args
        .output
        .iter()
        .map(|p| global.root.join(p))
        .collect();
    let written = index::write(&lp_index, &paths)?;

    Ok((
        IndexOutput::Write {
            lp_count: lp_index.lp_count,
            generated_at: lp_index.generated_at,
            written,
        },
        0,
    ))
}
