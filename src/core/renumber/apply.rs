use serde::Serialize;
use std::collections::BTreeSet;

use super::plan::{fingerprint, DocumentChange, RenumberPlan};
use crate::corpus::Corpus;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::output::{BulkResult, ItemOutcome};
use crate::storage::{LocalStorage, MemoryStorage, Storage};

/// Suffix for the intermediate name of a rename whose target is still
/// occupied by another rename's source.
const TEMP_SUFFIX: &str = ".renumber-tmp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    Written,
    AlreadyApplied,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangeOutcome {
    pub status: ChangeStatus,
    /// Storage name after the apply.
    pub storage_name: String,
    pub substitutions: usize,
}

/// Where one document stands relative to its planned change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Untouched pre-image.
    Pending,
    /// Content written, rename still outstanding.
    Written,
    Applied,
}

fn current_state<S: Storage + ?Sized>(
    change: &DocumentChange,
    storage: &S,
    names: &BTreeSet<String>,
) -> Result<State> {
    let final_name = change.final_name();
    if names.contains(final_name) && storage.read(final_name)? == change.new_content {
        return Ok(State::Applied);
    }

    if names.contains(&change.storage_name) {
        let content = storage.read(&change.storage_name)?;
        if fingerprint(&content) == change.fingerprint {
            return Ok(State::Pending);
        }
        if content == change.new_content {
            return Ok(State::Written);
        }
    }

    Err(Error::renumber_stale_plan(change.storage_name.clone()))
}

fn describe(err: &Error) -> String {
    err.details
        .get("error")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| err.message.clone())
}

/// Persist a plan to storage.
///
/// Every document is checked against its fingerprint before anything is
/// written; a single stale document aborts the whole apply. After that each
/// document is handled independently and its outcome reported, so a failed
/// write never hides the documents that did succeed. Documents already in
/// their planned state are reported as `already_applied` and left alone.
pub fn persist<S: Storage + ?Sized>(
    plan: &RenumberPlan,
    storage: &mut S,
) -> Result<BulkResult<ChangeOutcome>> {
    if plan.is_empty() {
        return Err(Error::renumber_nothing_to_do());
    }

    // Phase 1: verify every document before touching any
    let names: BTreeSet<String> = storage.list()?.into_iter().collect();
    let states = plan
        .changes
        .iter()
        .map(|change| current_state(change, &*storage, &names))
        .collect::<Result<Vec<State>>>()?;

    let mut errors: Vec<Option<String>> = vec![None; plan.changes.len()];

    // Phase 2: content
    for (i, change) in plan.changes.iter().enumerate() {
        if states[i] != State::Pending {
            continue;
        }
        if let Err(e) = storage.write(&change.storage_name, &change.new_content) {
            errors[i] = Some(describe(&e));
        }
    }

    // Phase 3: renames, staged through a temporary name when the target is
    // another rename's source
    let moving: BTreeSet<&str> = plan
        .changes
        .iter()
        .enumerate()
        .filter(|(i, c)| states[*i] != State::Applied && c.new_storage_name.is_some())
        .map(|(_, c)| c.storage_name.as_str())
        .collect();

    let mut staged: Vec<(usize, String)> = Vec::new();
    for (i, change) in plan.changes.iter().enumerate() {
        if states[i] == State::Applied || errors[i].is_some() {
            continue;
        }
        let Some(target) = change.new_storage_name.as_deref() else {
            continue;
        };

        if moving.contains(target) {
            let temp = format!("{}{}", target, TEMP_SUFFIX);
            match storage.rename(&change.storage_name, &temp) {
                Ok(()) => staged.push((i, temp)),
                Err(e) => errors[i] = Some(describe(&e)),
            }
        } else if let Err(e) = storage.rename(&change.storage_name, target) {
            errors[i] = Some(describe(&e));
        }
    }

    for (i, temp) in staged {
        let target = plan.changes[i].final_name();
        if let Err(e) = storage.rename(&temp, target) {
            errors[i] = Some(format!("{} (left at {})", describe(&e), temp));
        }
    }

    let results: Vec<ItemOutcome<ChangeOutcome>> = plan
        .changes
        .iter()
        .zip(states)
        .zip(errors)
        .map(|((change, state), error)| match error {
            Some(error) => ItemOutcome::failure(change.storage_name.clone(), error),
            None => ItemOutcome::success(
                change.storage_name.clone(),
                ChangeOutcome {
                    status: if state == State::Applied {
                        ChangeStatus::AlreadyApplied
                    } else {
                        ChangeStatus::Written
                    },
                    storage_name: change.final_name().to_string(),
                    substitutions: change.substitutions.len(),
                },
            ),
        })
        .collect();

    let result = BulkResult::new("renumber", results);

    log_status!(
        "renumber",
        "Applied {} of {} document change(s)",
        result.summary.succeeded,
        result.summary.total
    );

    Ok(result)
}

/// Persist to a local directory while holding its apply lock.
pub fn persist_local(
    plan: &RenumberPlan,
    storage: &mut LocalStorage,
) -> Result<BulkResult<ChangeOutcome>> {
    let _lock = storage.lock()?;
    persist(plan, storage)
}

/// Turn per-document failures into `renumber.partial_failure`.
pub fn ensure_complete(result: BulkResult<ChangeOutcome>) -> Result<BulkResult<ChangeOutcome>> {
    if !result.has_failures() {
        return Ok(result);
    }
    let details = serde_json::to_value(&result)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize outcomes".to_string())))?;
    Err(Error::renumber_partial_failure(details))
}

/// Apply a plan to a snapshot, returning the renumbered snapshot. The input
/// corpus is not modified.
pub fn apply_to(plan: &RenumberPlan, corpus: &Corpus) -> Result<Corpus> {
    let mut storage = corpus
        .documents()
        .iter()
        .fold(MemoryStorage::new(), |s, d| s.with(&d.storage_name, &d.raw));

    ensure_complete(persist(plan, &mut storage)?)?;

    let documents = storage
        .units()
        .iter()
        .map(|(name, raw)| Document::parse(name.as_str(), raw.as_str()))
        .collect();

    Ok(Corpus::new(corpus.file_prefix(), documents))
}
