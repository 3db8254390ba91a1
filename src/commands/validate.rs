use clap::Args;
use serde::Serialize;

use lpkit::validate::{self, Diagnostic, ValidationReport};

use super::{CmdResult, Workspace};

#[derive(Args)]
pub struct ValidateArgs {
    /// Only report diagnostics for this document id
    #[arg(long, value_name = "ID")]
    pub id: Option<u32>,

    /// Leave warnings out of the output
    #[arg(long)]
    pub errors_only: bool,
}

#[derive(Debug, Serialize)]
pub struct ValidateOutput {
    pub command: &'static str,
    pub passed: bool,
    pub documents_scanned: usize,
    pub errors: usize,
    pub warnings: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Exit code 1 when any error-severity diagnostic exists; warnings alone pass.
pub fn run(args: ValidateArgs, global: &super::GlobalArgs) -> CmdResult<ValidateOutput> {
    let workspace = Workspace::open(&global.root)?;
    let registry = workspace.config.registry()?;
    let report = validate::run(&workspace.corpus, &registry);

    let exit_code = if report.passed() { 0 } else { 1 };
    Ok((filter_report(report, &args), exit_code))
}

fn filter_report(report: ValidationReport, args: &ValidateArgs) -> ValidateOutput {
    let passed = report.passed();
    let diagnostics = report
        .diagnostics
        .into_iter()
        .filter(|d| args.id.is_none_or(|id| d.document_id == Some(id)))
        .filter(|d| !args.errors_only || d.is_error())
        .collect();

    ValidateOutput {
        command: "validate",
        passed,
        documents_scanned: report.documents_scanned,
        errors: report.errors,
        warnings: report.warnings,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::GlobalArgs;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn errors_set_exit_code_and_filters_apply() {
        let dir = tempdir().unwrap();
        let docs = dir.path().join("LPs");
        fs::create_dir(&docs).unwrap();
        fs::write(docs.join("lp-0100-a.md"), "---\nlp: 100\ntitle: A\nstatus: Superseded\n---\n").unwrap();
        fs::write(docs.join("lp-0200-b.md"), "---\nlp: 200\nstatus: Final\n---\n").unwrap();
        let global = GlobalArgs {
            root: dir.path().to_path_buf(),
        };

        let all = ValidateArgs {
            id: None,
            errors_only: false,
        };
        let (output, code) = run(all, &global).unwrap();
        assert_eq!(code, 1);
        assert!(!output.passed);
        assert_eq!(output.errors, 1);
        assert_eq!(output.warnings, 1);

        let only_100 = ValidateArgs {
            id: Some(100),
            errors_only: true,
        };
        let (output, _) = run(only_100, &global).unwrap();
        assert!(output.diagnostics.is_empty());
        assert_eq!(output.errors, 1);
    }
}
