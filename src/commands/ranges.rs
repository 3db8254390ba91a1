use clap::Args;
use serde::Serialize;

use lpkit::{LpkitConfig, RangePolicy};

use super::CmdResult;

#[derive(Args)]
pub struct RangesArgs {
    /// Show only the range covering this id
    #[arg(long, value_name = "ID")]
    pub id: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct RangesOutput {
    pub command: &'static str,
    /// `config` when lpkit.json supplies its own table.
    pub source: &'static str,
    pub ranges: Vec<RangePolicy>,
}

pub fn run(args: RangesArgs, global: &super::GlobalArgs) -> CmdResult<RangesOutput> {
    let config = LpkitConfig::load(&global.root)?;
    let registry = config.registry()?;

    let ranges = match args.id {
        Some(id) => registry.policy_for(id).cloned().into_iter().collect(),
        None => registry.ranges().to_vec(),
    };

    Ok((
        RangesOutput {
            command: "ranges",
            source: if config.ranges.is_some() {
                "config"
            } else {
                "default"
            },
            ranges,
        },
        0,
    ))
}
