use clap::Args;
use serde::Serialize;

use lpkit::document::Document;
use lpkit::scanner::{self, Reference, ReferenceKind};
use lpkit::Error;

use super::{CmdResult, Workspace};

#[derive(Args)]
pub struct RefsArgs {
    /// Document id
    pub id: u32,

    /// Only list references from header metadata fields
    #[arg(long)]
    pub metadata_only: bool,
}

#[derive(Debug, Serialize)]
pub struct RefEntry {
    pub storage_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<u32>,
    pub target_id: u32,
    #[serde(flatten)]
    pub kind: ReferenceKind,
    pub line: usize,
}

impl RefEntry {
    fn new(doc: &Document, reference: Reference) -> Self {
        Self {
            storage_name: doc.storage_name.clone(),
            source_id: reference.source_id,
            target_id: reference.target_id,
            line: scanner::line_of(&doc.raw, reference.span.start),
            kind: reference.kind,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RefsOutput {
    pub command: &'static str,
    pub id: u32,
    pub storage_name: String,
    pub outbound: Vec<RefEntry>,
    pub inbound: Vec<RefEntry>,
}

pub fn run(args: RefsArgs, global: &super::GlobalArgs) -> CmdResult<RefsOutput> {
    let workspace = Workspace::open(&global.root)?;
    let corpus = &workspace.corpus;

    let doc = match corpus.with_id(args.id).as_slice() {
        [] => return Err(Error::document_not_found(args.id.to_string())),
        [doc] => *doc,
        [first, second, ..] => {
            return Err(Error::validation_invalid_argument(
                "id",
                format!(
                    "LP-{} is carried by more than one document ({}, {})",
                    args.id, first.storage_name, second.storage_name
                ),
                Some(args.id.to_string()),
                None,
            ))
        }
    };

    let keep = |r: &Reference| !args.metadata_only || r.is_metadata();

    let outbound = scanner::scan(doc)
        .filter(|r| keep(r))
        .map(|r| RefEntry::new(doc, r))
        .collect();

    let inbound = scanner::references_to(corpus, args.id)
        .filter(|(_, r)| keep(r))
        .map(|(source, r)| RefEntry::new(source, r))
        .collect();

    Ok((
        RefsOutput {
            command: "refs",
            id: args.id,
            storage_name: doc.storage_name.clone(),
            outbound,
            inbound,
        },
        0,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::GlobalArgs;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn lists_both_directions() {
        let dir = tempdir().unwrap();
        let docs = dir.path().join("LPs");
        fs::create_dir(&docs).unwrap();
        fs::write(docs.join("lp-0100-a.md"), "---\nlp: 100\ntitle: A\n---\nSee LP-300.\n").unwrap();
        fs::write(docs.join("lp-0200-b.md"), "---\nlp: 200\nrequires: [100]\n---\n").unwrap();
        fs::write(docs.join("lp-0300-c.md"), "---\nlp: 300\n---\n").unwrap();
        let global = GlobalArgs {
            root: dir.path().to_path_buf(),
        };

        let (output, _) = run(RefsArgs { id: 100, metadata_only: false }, &global).unwrap();

        assert_eq!(output.outbound.len(), 1);
        assert_eq!(output.outbound[0].target_id, 300);
        assert_eq!(output.outbound[0].line, 5);
        assert_eq!(output.inbound.len(), 1);
        assert_eq!(output.inbound[0].storage_name, "lp-0200-b.md");

        let err = run(RefsArgs { id: 999, metadata_only: false }, &global).unwrap_err();
        assert_eq!(err.code.as_str(), "document.not_found");
    }
}
