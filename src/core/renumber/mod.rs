//! Renumbering engine: move documents to new ids and rewrite every
//! reference to them.
//!
//! Works in two steps:
//! 1. `plan` checks the remap against the corpus (missing sources are
//!    skipped, collisions abort) and records every span substitution and
//!    rename, without touching storage
//! 2. `persist` (or `apply_to` for an in-memory snapshot) carries the plan
//!    out, verifying fingerprints first and reporting per-document outcomes

mod apply;
mod plan;

pub use apply::{
    apply_to, ensure_complete, persist, persist_local, ChangeOutcome, ChangeStatus,
};
pub use plan::{
    fingerprint, plan, DocumentChange, IdChange, RenumberPlan, SkipReason, SkippedEntry,
    Substitution,
};

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::utils::io;

/// Parse one `OLD=NEW` mapping argument.
pub fn parse_mapping(arg: &str) -> Result<(u32, u32)> {
    let invalid = || {
        Error::validation_invalid_argument(
            "map",
            format!("Expected OLD=NEW with non-negative integers, got '{}'", arg),
            None,
            None,
        )
    };

    let (old, new) = arg.split_once('=').ok_or_else(invalid)?;
    let old = old.trim().parse::<u32>().map_err(|_| invalid())?;
    let new = new.trim().parse::<u32>().map_err(|_| invalid())?;
    Ok((old, new))
}

/// Collect mapping pairs, rejecting an old id given two different targets.
pub fn build_remap(pairs: impl IntoIterator<Item = (u32, u32)>) -> Result<BTreeMap<u32, u32>> {
    let mut remap = BTreeMap::new();
    for (old, new) in pairs {
        if let Some(previous) = remap.insert(old, new) {
            if previous != new {
                return Err(Error::validation_invalid_argument(
                    "map",
                    format!("LP-{} is mapped to both {} and {}", old, previous, new),
                    Some(old.to_string()),
                    None,
                ));
            }
        }
    }
    Ok(remap)
}

/// Read a JSON remap file: `{"100": 9999, "101": 10000}`.
pub fn load_map_file(path: &Path) -> Result<Vec<(u32, u32)>> {
    let content = io::read_file(path, &format!("read {}", path.display()))?;
    let raw: BTreeMap<String, u32> = serde_json::from_str(&content).map_err(|e| {
        Error::validation_invalid_argument(
            "map_file",
            format!("Expected a JSON object of old id to new id: {}", e),
            Some(path.display().to_string()),
            None,
        )
    })?;

    raw.into_iter()
        .map(|(old, new)| {
            let old = old.trim().parse::<u32>().map_err(|_| {
                Error::validation_invalid_argument(
                    "map_file",
                    format!("Key '{}' is not an id", old),
                    Some(path.display().to_string()),
                    None,
                )
            })?;
            Ok((old, new))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_mapping_accepts_pairs() {
        assert_eq!(parse_mapping("100=9999").unwrap(), (100, 9999));
        assert_eq!(parse_mapping(" 7 = 8 ").unwrap(), (7, 8));
    }

    #[test]
    fn parse_mapping_rejects_garbage() {
        for bad in ["100", "a=1", "1=-2", "=5"] {
            let err = parse_mapping(bad).unwrap_err();
            assert_eq!(err.code.as_str(), "validation.invalid_argument");
        }
    }

    #[test]
    fn build_remap_rejects_contradictions() {
        assert!(build_remap([(1, 2), (1, 2)]).is_ok());
        assert!(build_remap([(1, 2), (1, 3)]).is_err());
    }

    #[test]
    fn map_file_is_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.json");
        std::fs::write(&path, r#"{"100": 9999, "200": 201}"#).unwrap();
        assert_eq!(load_map_file(&path).unwrap(), vec![(100, 9999), (200, 201)]);

        std::fs::write(&path, r#"{"abc": 1}"#).unwrap();
        assert!(load_map_file(&path).is_err());
    }
}
