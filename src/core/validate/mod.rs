//! Corpus validation.
//!
//! Checks every document against the range policy for its id and a fixed set
//! of metadata rules, then runs corpus-wide checks:
//!
//! 1. Per-document rules (parse, range, status, type, category, filename,
//!    required fields, supersession, reference integrity)
//! 2. Duplicate ids, computed once over the whole corpus
//! 3. Stable ordering by document id, then rule
//!
//! Every issue is collected; nothing short-circuits the run.

mod diagnostics;
mod rules;

pub use diagnostics::{Diagnostic, Rule, Severity};

use serde::Serialize;

use crate::corpus::Corpus;
use crate::ranges::RangeRegistry;

/// Summary plus the full diagnostic list.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub documents_scanned: usize,
    pub errors: usize,
    pub warnings: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    /// Warnings alone still pass.
    pub fn passed(&self) -> bool {
        self.errors == 0
    }

    pub fn for_document(&self, id: u32) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.document_id == Some(id))
    }
}

/// Validate a corpus snapshot. Deterministic for a fixed corpus and registry.
pub fn validate(corpus: &Corpus, registry: &RangeRegistry) -> Vec<Diagnostic> {
    let ctx = rules::Context {
        registry,
        known_ids: corpus.ids(),
        file_prefix: corpus.file_prefix(),
    };

    let mut diagnostics = Vec::new();

    // Phase 1: per-document rules
    for doc in corpus.documents() {
        rules::check_document(doc, &ctx, &mut diagnostics);
    }

    // Phase 2: duplicate ids
    for (id, names) in corpus.duplicate_ids() {
        for name in &names {
            let others: Vec<&str> = names.iter().copied().filter(|n| n != name).collect();
            diagnostics.push(Diagnostic::error(
                Some(id),
                name,
                Rule::Duplicate,
                format!("Duplicate LP number. Also in: {}", others.join(", ")),
            ));
        }
    }

    // Phase 3: stable order
    diagnostics::sort(&mut diagnostics);
    diagnostics
}

/// Validate and summarize.
pub fn run(corpus: &Corpus, registry: &RangeRegistry) -> ValidationReport {
    log_status!("validate", "Checking {} documents", corpus.len());

    let diagnostics = validate(corpus, registry);
    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    let warnings = diagnostics.len() - errors;

    log_status!("validate", "{} error(s), {} warning(s)", errors, warnings);

    ValidationReport {
        documents_scanned: corpus.len(),
        errors,
        warnings,
        diagnostics,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, Status};
    use crate::ranges::RangePolicy;
    use std::collections::BTreeSet;

    fn doc(name: &str, header: &str) -> Document {
        Document::parse(name, format!("---\n{}---\n\nBody.\n", header))
    }

    fn corpus(docs: Vec<Document>) -> Corpus {
        Corpus::new("lp", docs)
    }

    fn rules_for(diags: &[Diagnostic], id: u32) -> Vec<(&'static str, Severity)> {
        diags
            .iter()
            .filter(|d| d.document_id == Some(id))
            .map(|d| (d.rule.as_str(), d.severity))
            .collect()
    }

    #[test]
    fn clean_document_has_no_diagnostics() {
        let c = corpus(vec![doc(
            "lp-0100-consensus.md",
            "lp: 100\ntitle: Consensus\nstatus: Draft\ntype: Standards Track\ncategory: Core\n",
        )]);
        let report = run(&c, &RangeRegistry::default());
        assert!(report.diagnostics.is_empty());
        assert!(report.passed());
    }

    #[test]
    fn forbidden_status_is_single_status_error() {
        let registry = RangeRegistry::new(vec![RangePolicy {
            low: 100,
            high: 199,
            name: "Experimental".to_string(),
            allowed_statuses: [Status::Draft, Status::Final].into_iter().collect(),
            required_status: None,
            forbidden_statuses: [Status::Final].into_iter().collect(),
        }])
        .unwrap();
        let c = corpus(vec![doc("lp-0150-x.md", "lp: 150\ntitle: X\nstatus: Final\n")]);

        let diags = validate(&c, &registry);
        assert_eq!(rules_for(&diags, 150), vec![("status", Severity::Error)]);
    }

    #[test]
    fn status_outside_allowed_set_is_error() {
        let c = corpus(vec![doc("lp-0100-x.md", "lp: 100\ntitle: X\nstatus: Research\n")]);
        let diags = validate(&c, &RangeRegistry::default());
        assert_eq!(rules_for(&diags, 100), vec![("status", Severity::Error)]);
    }

    #[test]
    fn required_status_mismatch_is_warning() {
        let c = corpus(vec![doc("lp-0005-x.md", "lp: 5\ntitle: X\nstatus: Draft\n")]);
        let diags = validate(&c, &RangeRegistry::default());
        assert_eq!(
            rules_for(&diags, 5),
            vec![("status", Severity::Error), ("status", Severity::Warning)]
        );
    }

    #[test]
    fn out_of_range_id_is_error() {
        let c = corpus(vec![doc("lp-20000-x.md", "lp: 20000\ntitle: X\nstatus: Draft\n")]);
        let diags = validate(&c, &RangeRegistry::default());
        assert_eq!(rules_for(&diags, 20000), vec![("range", Severity::Error)]);
    }

    #[test]
    fn superseded_without_target_warns_once() {
        let c = corpus(vec![doc("lp-0100-x.md", "lp: 100\ntitle: X\nstatus: Superseded\n")]);
        let diags = validate(&c, &RangeRegistry::default());
        let superseded: Vec<_> = diags.iter().filter(|d| d.rule == Rule::Superseded).collect();
        assert_eq!(superseded.len(), 1);
        assert_eq!(superseded[0].severity, Severity::Warning);
        assert_eq!(superseded[0].document_id, Some(100));
    }

    #[test]
    fn dangling_requires_is_one_reference_error() {
        let c = corpus(vec![
            doc("lp-0100-a.md", "lp: 100\ntitle: A\nstatus: Draft\nrequires: [101, 999]\n"),
            doc("lp-0101-b.md", "lp: 101\ntitle: B\nstatus: Draft\n"),
        ]);
        let diags = validate(&c, &RangeRegistry::default());
        let refs: Vec<_> = diags.iter().filter(|d| d.rule == Rule::Reference).collect();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].document_id, Some(100));
        assert!(refs[0].is_error());
        assert!(refs[0].message.contains("999"));
    }

    #[test]
    fn duplicates_name_each_other() {
        let c = corpus(vec![
            doc("lp-0100-a.md", "lp: 100\ntitle: A\nstatus: Draft\n"),
            doc("lp-0100-b.md", "lp: 100\ntitle: B\nstatus: Draft\n"),
        ]);
        let diags = validate(&c, &RangeRegistry::default());
        let dups: Vec<_> = diags.iter().filter(|d| d.rule == Rule::Duplicate).collect();
        assert_eq!(dups.len(), 2);
        assert!(dups[0].message.contains("lp-0100-b.md"));
        assert!(dups[1].message.contains("lp-0100-a.md"));
    }

    #[test]
    fn filename_mismatch_is_warning() {
        let c = corpus(vec![doc("lp-100-x.md", "lp: 100\ntitle: X\nstatus: Draft\n")]);
        let report = run(&c, &RangeRegistry::default());
        assert_eq!(rules_for(&report.diagnostics, 100), vec![("filename", Severity::Warning)]);
        assert!(report.passed());
    }

    #[test]
    fn invalid_type_and_category_are_errors() {
        let c = corpus(vec![doc(
            "lp-0100-x.md",
            "lp: 100\ntitle: X\nstatus: Draft\ntype: Standards Track\ncategory: Gossip\n",
        )]);
        let diags = validate(&c, &RangeRegistry::default());
        assert_eq!(rules_for(&diags, 100), vec![("category", Severity::Error)]);

        let c = corpus(vec![doc("lp-0100-x.md", "lp: 100\ntitle: X\nstatus: Draft\ntype: Living\ncategory: Gossip\n")]);
        let diags = validate(&c, &RangeRegistry::default());
        assert_eq!(rules_for(&diags, 100), vec![("type", Severity::Error)]);
    }

    #[test]
    fn parse_failures_block_other_rules_only_for_that_document() {
        let c = corpus(vec![
            Document::parse("lp-0001-broken.md", "no header\nLP-555\n"),
            doc("lp-0002-missing-id.md", "title: Y\n"),
            doc("lp-0100-ok.md", "lp: 100\ntitle: X\nstatus: Draft\n"),
        ]);
        let diags = validate(&c, &RangeRegistry::default());
        let unreadable: Vec<&str> = diags
            .iter()
            .filter(|d| d.document_id.is_none())
            .map(|d| d.rule.as_str())
            .collect();
        assert_eq!(unreadable, vec!["parse", "required"]);
        assert!(rules_for(&diags, 100).is_empty());
    }

    #[test]
    fn ordering_is_by_document_then_rule() {
        let c = corpus(vec![
            doc("lp-0200-b.md", "lp: 200\nstatus: Superseded\n"),
            doc("lp-100-a.md", "lp: 100\ntitle: A\nstatus: Living\n"),
        ]);
        let diags = validate(&c, &RangeRegistry::default());
        let order: Vec<(Option<u32>, &str)> = diags
            .iter()
            .map(|d| (d.document_id, d.rule.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (Some(100), "status"),
                (Some(100), "filename"),
                (Some(200), "required"),
                (Some(200), "superseded"),
            ]
        );
        assert_eq!(diags, validate(&c, &RangeRegistry::default()));
    }

    #[test]
    fn every_default_range_accepts_its_allowed_statuses() {
        let registry = RangeRegistry::default();
        for range in registry.ranges() {
            let allowed: BTreeSet<Status> = range.allowed_statuses.clone();
            for status in allowed {
                let name = format!("{}-x.md", crate::document::canonical_prefix("lp", range.low));
                let c = corpus(vec![doc(
                    &name,
                    &format!("lp: {}\ntitle: X\nstatus: {}\n", range.low, status),
                )]);
                let errors = validate(&c, &registry).into_iter().filter(|d| d.is_error()).count();
                assert_eq!(errors, 0, "{} rejected {}", range.name, status);
            }
        }
    }
}
