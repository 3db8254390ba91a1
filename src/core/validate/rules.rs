//! Per-document rule checks.

use std::collections::BTreeSet;

use super::diagnostics::{Diagnostic, Rule};
use crate::document::{
    canonical_prefix, has_canonical_prefix, Category, DocType, Document, DocumentRecord,
    FieldValue, ParseFailure, Status, KEY_STATUS, KEY_SUPERSEDED_BY, KEY_TITLE,
};
use crate::ranges::{RangePolicy, RangeRegistry};
use crate::scanner::{self, ReferenceKind};

pub(super) struct Context<'a> {
    pub registry: &'a RangeRegistry,
    pub known_ids: BTreeSet<u32>,
    pub file_prefix: &'a str,
}

/// Run every per-document rule. A document that fails to parse gets one
/// diagnostic and no further checks.
pub(super) fn check_document(doc: &Document, ctx: &Context<'_>, out: &mut Vec<Diagnostic>) {
    let record = match &doc.parsed {
        Ok(record) => record,
        Err(failure) => {
            out.push(parse_failure(doc, failure));
            return;
        }
    };

    let policy = check_range(record, ctx, out);
    check_status(record, policy, out);
    check_type(record, out);
    check_category(record, out);
    check_filename(record, ctx, out);
    check_required(record, out);
    check_superseded(record, out);
    check_references(doc, record, ctx, out);
}

fn parse_failure(doc: &Document, failure: &ParseFailure) -> Diagnostic {
    let rule = match failure {
        ParseFailure::MissingId => Rule::Required,
        _ => Rule::Parse,
    };
    Diagnostic::error(None, &doc.storage_name, rule, failure.message())
}

fn check_range<'a>(
    record: &DocumentRecord,
    ctx: &Context<'a>,
    out: &mut Vec<Diagnostic>,
) -> Option<&'a RangePolicy> {
    let policy = ctx.registry.policy_for(record.id);
    if policy.is_none() {
        out.push(Diagnostic::error(
            Some(record.id),
            &record.storage_name,
            Rule::Range,
            format!("LP-{} is not in any defined range", record.id),
        ));
    }
    policy
}

fn list_statuses<'a>(statuses: impl IntoIterator<Item = &'a Status>) -> String {
    statuses
        .into_iter()
        .map(Status::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn check_status(record: &DocumentRecord, policy: Option<&RangePolicy>, out: &mut Vec<Diagnostic>) {
    let id = Some(record.id);
    let name = record.storage_name.as_str();

    let status = match &record.status {
        FieldValue::Absent => return,
        FieldValue::Invalid(value) => {
            out.push(Diagnostic::error(
                id,
                name,
                Rule::Status,
                format!(
                    "Invalid status '{}'. Must be one of: {}",
                    value,
                    list_statuses(&Status::ALL)
                ),
            ));
            return;
        }
        FieldValue::Valid(status) => *status,
    };

    let Some(policy) = policy else {
        return;
    };

    if policy.forbidden_statuses.contains(&status) {
        out.push(Diagnostic::error(
            id,
            name,
            Rule::Status,
            format!("Status '{}' is forbidden for {} range", status, policy.name),
        ));
    } else if !policy.allowed_statuses.contains(&status) {
        out.push(Diagnostic::error(
            id,
            name,
            Rule::Status,
            format!(
                "Status '{}' is not allowed for {} range (allowed: {})",
                status,
                policy.name,
                list_statuses(&policy.allowed_statuses)
            ),
        ));
    }

    if let Some(required) = policy.required_status {
        if status != required {
            out.push(Diagnostic::warning(
                id,
                name,
                Rule::Status,
                format!("Status must be '{}' for {} range", required, policy.name),
            ));
        }
    }
}

fn check_type(record: &DocumentRecord, out: &mut Vec<Diagnostic>) {
    if let FieldValue::Invalid(value) = &record.doc_type {
        let valid: Vec<&str> = DocType::ALL.iter().map(DocType::as_str).collect();
        out.push(Diagnostic::error(
            Some(record.id),
            &record.storage_name,
            Rule::Type,
            format!("Invalid type '{}'. Must be one of: {}", value, valid.join(", ")),
        ));
    }
}

fn check_category(record: &DocumentRecord, out: &mut Vec<Diagnostic>) {
    if record.doc_type.valid() != Some(DocType::StandardsTrack) {
        return;
    }
    if let FieldValue::Invalid(value) = &record.category {
        let valid: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
        out.push(Diagnostic::error(
            Some(record.id),
            &record.storage_name,
            Rule::Category,
            format!("Invalid category '{}'. Must be one of: {}", value, valid.join(", ")),
        ));
    }
}

fn check_filename(record: &DocumentRecord, ctx: &Context<'_>, out: &mut Vec<Diagnostic>) {
    if !has_canonical_prefix(&record.storage_name, ctx.file_prefix, record.id) {
        out.push(Diagnostic::warning(
            Some(record.id),
            &record.storage_name,
            Rule::Filename,
            format!(
                "Filename should start with '{}-'",
                canonical_prefix(ctx.file_prefix, record.id)
            ),
        ));
    }
}

fn check_required(record: &DocumentRecord, out: &mut Vec<Diagnostic>) {
    let missing = [
        (KEY_TITLE, record.title.is_none()),
        (KEY_STATUS, record.status.is_absent()),
    ];
    for (key, absent) in missing {
        if absent {
            out.push(Diagnostic::error(
                Some(record.id),
                &record.storage_name,
                Rule::Required,
                format!("Missing required field: '{}'", key),
            ));
        }
    }
}

fn check_superseded(record: &DocumentRecord, out: &mut Vec<Diagnostic>) {
    if record.status.valid() == Some(Status::Superseded) && record.superseded_by.is_none() {
        out.push(Diagnostic::warning(
            Some(record.id),
            &record.storage_name,
            Rule::Superseded,
            format!("Superseded documents must include '{}'", KEY_SUPERSEDED_BY),
        ));
    }
}

fn check_references(
    doc: &Document,
    record: &DocumentRecord,
    ctx: &Context<'_>,
    out: &mut Vec<Diagnostic>,
) {
    for malformed in &record.malformed_references {
        out.push(Diagnostic::error(
            Some(record.id),
            &record.storage_name,
            Rule::Reference,
            format!("Malformed reference '{}'", malformed),
        ));
    }

    for reference in scanner::scan(doc) {
        if ctx.known_ids.contains(&reference.target_id) {
            continue;
        }
        let location = match &reference.kind {
            ReferenceKind::MetadataField { field } => format!("'{}'", field),
            ReferenceKind::InlineMention => "an inline mention".to_string(),
        };
        out.push(Diagnostic::error(
            Some(record.id),
            &record.storage_name,
            Rule::Reference,
            format!(
                "LP-{} referenced in {} does not exist",
                reference.target_id, location
            ),
        ));
    }
}
