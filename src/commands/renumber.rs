use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use lpkit::renumber::{self, ChangeOutcome, DocumentChange, RenumberPlan, SkippedEntry};
use lpkit::utils::validation;
use lpkit::BulkResult;

use super::{CmdResult, Workspace};

#[derive(Args)]
pub struct RenumberArgs {
    /// Move a document to a new id (repeatable)
    #[arg(long = "map", value_name = "OLD=NEW")]
    pub map: Vec<String>,

    /// JSON file with a remap object: {"100": 9999}
    #[arg(long, value_name = "PATH")]
    pub map_file: Option<PathBuf>,

    /// Apply the plan (default is a dry run)
    #[arg(long)]
    pub write: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "command")]
pub enum RenumberOutput {
    #[serde(rename = "renumber.plan")]
    Plan {
        dry_run: bool,
        remap: BTreeMap<u32, u32>,
        skipped: Vec<SkippedEntry>,
        total_substitutions: usize,
        total_renames: usize,
        changes: Vec<DocumentChange>,
    },

    #[serde(rename = "renumber.apply")]
    Apply {
        remap: BTreeMap<u32, u32>,
        skipped: Vec<SkippedEntry>,
        total_substitutions: usize,
        total_renames: usize,
        #[serde(flatten)]
        result: BulkResult<ChangeOutcome>,
    },
}

pub fn run(args: RenumberArgs, global: &super::GlobalArgs) -> CmdResult<RenumberOutput> {
    let mut pairs = args
        .map
        .iter()
        .map(|arg| renumber::parse_mapping(arg))
        .collect::<lpkit::Result<Vec<(u32, u32)>>>()?;

    if let Some(path) = &args.map_file {
        pairs.extend(renumber::load_map_file(&global.root.join(path))?);
    }

    validation::require_non_empty_vec(
        &pairs,
        "map",
        "Pass at least one --map OLD=NEW or a --map-file",
    )?;
    let remap = renumber::build_remap(pairs)?;

    let mut workspace = Workspace::open(&global.root)?;
    let plan = renumber::plan(&remap, &workspace.corpus)?;

    if !args.write {
        return Ok((plan_output(plan), 0));
    }

    let result = renumber::persist_local(&plan, &mut workspace.storage)?;
    let result = renumber::ensure_complete(result)?;

    Ok((
        RenumberOutput::Apply {
            total_substitutions: plan.total_substitutions(),
            total_renames: plan.total_renames(),
            remap: plan.remap,
            skipped: plan.skipped,
            result,
        },
        0,
    ))
}

fn plan_output(plan: RenumberPlan) -> RenumberOutput {
    RenumberOutput::Plan {
        dry_run: true,
        total_substitutions: plan.total_substitutions(),
        total_renames: plan.total_renames(),
        remap: plan.remap,
        skipped: plan.skipped,
        changes: plan.changes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::GlobalArgs;
    use std::fs;
    use tempfile::tempdir;

    fn args(map: &[&str], write: bool) -> RenumberArgs {
        RenumberArgs {
            map: map.iter().map(|m| m.to_string()).collect(),
            map_file: None,
            write,
        }
    }

    fn corpus_root() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        let docs = dir.path().join("LPs");
        fs::create_dir(&docs).unwrap();
        fs::write(
            docs.join("lp-0100-a.md"),
            "---\nlp: 100\ntitle: A\nstatus: Final\n---\n",
        )
        .unwrap();
        fs::write(
            docs.join("lp-0200-b.md"),
            "---\nlp: 200\ntitle: B\nstatus: Draft\nrequires: [100]\n---\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn dry_run_does_not_touch_the_corpus() {
        let dir = corpus_root();
        let global = GlobalArgs {
            root: dir.path().to_path_buf(),
        };

        let (output, code) = run(args(&["100=150"], false), &global).unwrap();

        assert_eq!(code, 0);
        assert!(matches!(output, RenumberOutput::Plan { total_renames: 1, .. }));
        assert!(dir.path().join("LPs/lp-0100-a.md").exists());
    }

    #[test]
    fn write_applies_the_plan() {
        let dir = corpus_root();
        let global = GlobalArgs {
            root: dir.path().to_path_buf(),
        };

        let (output, _) = run(args(&["100=150"], true), &global).unwrap();

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["command"], "renumber.apply");
        assert_eq!(json["summary"]["succeeded"], 2);
        assert!(dir.path().join("LPs/lp-0150-a.md").exists());
        let b = fs::read_to_string(dir.path().join("LPs/lp-0200-b.md")).unwrap();
        assert!(b.contains("requires: [150]"));
    }

    #[test]
    fn map_file_is_read_relative_to_root() {
        let dir = corpus_root();
        fs::write(dir.path().join("remap.json"), r#"{"100": 150}"#).unwrap();
        let global = GlobalArgs {
            root: dir.path().to_path_buf(),
        };

        let mut with_file = args(&[], false);
        with_file.map_file = Some(PathBuf::from("remap.json"));
        let (output, _) = run(with_file, &global).unwrap();

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["remap"]["100"], 150);
    }

    #[test]
    fn missing_mapping_is_an_argument_error() {
        let dir = corpus_root();
        let global = GlobalArgs {
            root: dir.path().to_path_buf(),
        };

        let err = run(args(&[], true), &global).unwrap_err();
        assert_eq!(err.code.as_str(), "validation.missing_argument");

        let err = run(args(&["100-150"], true), &global).unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
    }
}
