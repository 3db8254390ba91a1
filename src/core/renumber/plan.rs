use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use crate::corpus::Corpus;
use crate::document::{canonical_storage_name, padded_id, Document, KEY_ID};
use crate::error::{Error, Result};
use crate::scanner::{self, ReferenceKind};

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No document carries the old id.
    NotFound,
    /// Old and new id are the same.
    Identity,
}

/// A remap entry that planning left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub old_id: u32,
    pub new_id: u32,
    pub reason: SkipReason,
}

/// One span-addressed text replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Substitution {
    /// Byte span in the document's current raw text.
    pub span: Range<usize>,
    pub from: String,
    pub to: String,
    /// Header key the span sits in, or `inline` for a mention.
    pub location: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdChange {
    pub from: u32,
    pub to: u32,
}

/// Everything that happens to one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentChange {
    pub storage_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_storage_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_change: Option<IdChange>,
    pub substitutions: Vec<Substitution>,
    /// SHA-256 of the raw text the plan was computed from.
    pub fingerprint: String,
    #[serde(skip)]
    pub new_content: String,
}

impl DocumentChange {
    /// Storage name after the change is applied.
    pub fn final_name(&self) -> &str {
        self.new_storage_name.as_deref().unwrap_or(&self.storage_name)
    }
}

/// A conflict-checked renumbering, computed without touching storage.
#[derive(Debug, Clone, Serialize)]
pub struct RenumberPlan {
    /// Entries that will be carried out.
    pub remap: BTreeMap<u32, u32>,
    pub skipped: Vec<SkippedEntry>,
    pub changes: Vec<DocumentChange>,
}

impl RenumberPlan {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn total_substitutions(&self) -> usize {
        self.changes.iter().map(|c| c.substitutions.len()).sum()
    }

    pub fn total_renames(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| c.new_storage_name.is_some())
            .count()
    }
}

pub fn fingerprint(raw: &str) -> String {
    Sha256::digest(raw.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

// ============================================================================
// Planning
// ============================================================================

/// Compute a renumbering plan. Any collision aborts with
/// `renumber.conflict` before anything is written.
pub fn plan(remap: &BTreeMap<u32, u32>, corpus: &Corpus) -> Result<RenumberPlan> {
    let mut effective = BTreeMap::new();
    let mut skipped = Vec::new();

    for (&old_id, &new_id) in remap {
        if old_id == new_id {
            skipped.push(SkippedEntry {
                old_id,
                new_id,
                reason: SkipReason::Identity,
            });
            continue;
        }

        match corpus.with_id(old_id).as_slice() {
            [] => skipped.push(SkippedEntry {
                old_id,
                new_id,
                reason: SkipReason::NotFound,
            }),
            [_] => {
                effective.insert(old_id, new_id);
            }
            [first, second, ..] => {
                return Err(Error::renumber_conflict(
                    "ambiguous_source",
                    format!("{} -> {}", old_id, new_id),
                    format!("{} and {}", first.storage_name, second.storage_name),
                ));
            }
        }
    }

    check_targets(&effective, corpus)?;

    let changes: Vec<DocumentChange> = corpus
        .documents()
        .iter()
        .filter_map(|doc| plan_document(doc, &effective, corpus.file_prefix()))
        .collect();

    check_storage_names(&changes, corpus)?;

    let plan = RenumberPlan {
        remap: effective,
        skipped,
        changes,
    };

    log_status!(
        "renumber",
        "Planned {} document change(s): {} substitution(s), {} rename(s)",
        plan.changes.len(),
        plan.total_substitutions(),
        plan.total_renames()
    );

    Ok(plan)
}

/// No two entries may share a target, and a target may only be occupied by
/// a document that is itself moving away.
fn check_targets(effective: &BTreeMap<u32, u32>, corpus: &Corpus) -> Result<()> {
    let mut claimed: BTreeMap<u32, u32> = BTreeMap::new();

    for (&old_id, &new_id) in effective {
        if let Some(&other) = claimed.get(&new_id) {
            return Err(Error::renumber_conflict(
                "duplicate_target",
                format!("{} -> {}", old_id, new_id),
                format!("{} -> {}", other, new_id),
            ));
        }
        claimed.insert(new_id, old_id);

        if effective.contains_key(&new_id) {
            continue;
        }
        if let Some(holder) = corpus.with_id(new_id).first() {
            return Err(Error::renumber_conflict(
                "target_exists",
                format!("{} -> {}", old_id, new_id),
                holder.storage_name.clone(),
            ));
        }
    }

    Ok(())
}

/// A planned storage name may only replace a name that is itself moving.
fn check_storage_names(changes: &[DocumentChange], corpus: &Corpus) -> Result<()> {
    let moving: BTreeSet<&str> = changes
        .iter()
        .filter(|c| c.new_storage_name.is_some())
        .map(|c| c.storage_name.as_str())
        .collect();

    for change in changes {
        let Some(target) = &change.new_storage_name else {
            continue;
        };
        if corpus.by_storage_name(target).is_some() && !moving.contains(target.as_str()) {
            return Err(Error::renumber_conflict(
                "storage_name_taken",
                format!("{} -> {}", change.storage_name, target),
                target.clone(),
            ));
        }
    }

    Ok(())
}

fn plan_document(
    doc: &Document,
    effective: &BTreeMap<u32, u32>,
    file_prefix: &str,
) -> Option<DocumentChange> {
    let mut substitutions = Vec::new();
    let mut new_storage_name = None;
    let mut id_change = None;

    // Identity: id field and storage name; an explicit order is left as written
    if let (Some(record), Some(fm)) = (doc.record(), doc.frontmatter.as_ref()) {
        if let Some(&new_id) = effective.get(&record.id) {
            if let Some(field) = fm.get(KEY_ID) {
                substitutions.push(Substitution {
                    span: field.value_span.clone(),
                    from: field.value.clone(),
                    to: new_id.to_string(),
                    location: KEY_ID.to_string(),
                });
            }

            let renamed = canonical_storage_name(&doc.storage_name, file_prefix, new_id);
            if renamed != doc.storage_name {
                new_storage_name = Some(renamed);
            }
            id_change = Some(IdChange {
                from: record.id,
                to: new_id,
            });
        }
    }

    // References pointing at remapped ids
    for reference in scanner::scan(doc) {
        let Some(&new_id) = effective.get(&reference.target_id) else {
            continue;
        };
        let to = if reference.padded {
            padded_id(new_id)
        } else {
            new_id.to_string()
        };
        let location = match reference.kind {
            ReferenceKind::MetadataField { field } => field,
            ReferenceKind::InlineMention => "inline".to_string(),
        };
        substitutions.push(Substitution {
            from: doc.raw[reference.span.clone()].to_string(),
            span: reference.span,
            to,
            location,
        });
    }

    if substitutions.is_empty() && new_storage_name.is_none() {
        return None;
    }

    substitutions.sort_by_key(|s| s.span.start);

    // Replace from the end so earlier offsets stay valid
    let mut new_content = doc.raw.clone();
    for sub in substitutions.iter().rev() {
        new_content.replace_range(sub.span.clone(), &sub.to);
    }

    Some(DocumentChange {
        storage_name: doc.storage_name.clone(),
        new_storage_name,
        id_change,
        substitutions,
        fingerprint: fingerprint(&doc.raw),
        new_content,
    })
}

// ============================================================================
// Tests
// ============================================================================
