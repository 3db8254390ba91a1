//! Project configuration (`lpkit.json` at the corpus root).

use glob_match::glob_match;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::ranges::{RangePolicy, RangeRegistry};
use crate::utils::io;

pub const CONFIG_FILE: &str = "lpkit.json";

/// Rank given to a missing or unknown tier; sorts after every known tier.
pub const UNKNOWN_TIER_RANK: i64 = 99;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LpkitConfig {
    /// Directory holding the documents, relative to the corpus root.
    #[serde(default = "default_documents_dir")]
    pub documents_dir: String,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    #[serde(default = "default_include")]
    pub include: String,

    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Replaces the stock range table when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranges: Option<Vec<RangePolicy>>,

    #[serde(default = "default_tier_ranks")]
    pub tier_ranks: BTreeMap<String, i64>,
}

impl Default for LpkitConfig {
    fn default() -> Self {
        Self {
            documents_dir: default_documents_dir(),
            file_prefix: default_file_prefix(),
            include: default_include(),
            exclude: default_exclude(),
            ranges: None,
            tier_ranks: default_tier_ranks(),
        }
    }
}

fn default_documents_dir() -> String {
    "LPs".to_string()
}

fn default_file_prefix() -> String {
    "lp".to_string()
}

fn default_include() -> String {
    "lp-*.md".to_string()
}

fn default_exclude() -> Vec<String> {
    vec!["lp-draft.md".to_string(), "TEMPLATE.md".to_string()]
}

fn default_tier_ranks() -> BTreeMap<String, i64> {
    [("core", 0), ("chain", 1), ("product", 2), ("research", 3)]
        .into_iter()
        .map(|(tier, rank)| (tier.to_string(), rank))
        .collect()
}

impl LpkitConfig {
    /// Load `lpkit.json` from `root`, falling back to defaults when absent.
    /// A present but malformed file is an error, never silently ignored.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }

        let content = io::read_file(&path, &format!("read {}", path.display()))?;
        let config: LpkitConfig = serde_json::from_str(&content)
            .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.file_prefix.trim().is_empty() {
            return Err(Error::config_invalid_value(
                "file_prefix",
                Some(self.file_prefix.clone()),
                "Prefix cannot be empty",
            ));
        }
        self.registry().map(|_| ())
    }

    /// Active range registry: the configured table or the stock one.
    pub fn registry(&self) -> Result<RangeRegistry> {
        match &self.ranges {
            Some(ranges) => RangeRegistry::new(ranges.clone()),
            None => Ok(RangeRegistry::default()),
        }
    }

    pub fn documents_path(&self, root: &Path) -> PathBuf {
        root.join(&self.documents_dir)
    }

    /// Whether a storage name belongs to the corpus.
    pub fn is_document_name(&self, name: &str) -> bool {
        glob_match(&self.include, name) && !self.exclude.iter().any(|ex| glob_match(ex, name))
    }

    pub fn tier_rank(&self, tier: Option<&str>) -> i64 {
        tier.and_then(|t| self.tier_ranks.get(&t.to_lowercase()).copied())
            .unwrap_or(UNKNOWN_TIER_RANK)
    }
}
