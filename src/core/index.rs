//! Index builder: sorted listing of parsed documents for browsing.
//!
//! Pure downstream consumer of document records. Sort order is
//! `(tier_rank, order, lp)`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::LpkitConfig;
use crate::corpus::Corpus;
use crate::document::{DocumentRecord, FieldValue};
use crate::error::{Error, Result};
use crate::utils::io;

pub const SORT_ORDER: [&str; 3] = ["tier_rank", "order", "lp"];

#[derive(Debug, Clone, Serialize)]
pub struct IndexEntry {
    pub lp: u32,
    pub slug: String,
    pub file: String,
    pub title: String,
    pub description: String,
    pub author: String,
    pub status: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub category: String,
    pub tier: String,
    pub order: i64,
    pub tier_rank: i64,
    pub tags: Vec<String>,
    pub created: String,
    pub updated: String,
    pub requires: Vec<u32>,
    pub replaces: Vec<u32>,
    pub discussions_to: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LpIndex {
    pub generated_at: String,
    pub lp_count: usize,
    pub sort_order: [&'static str; 3],
    pub tier_ranks: BTreeMap<String, i64>,
    pub lps: Vec<IndexEntry>,
    pub by_lp: BTreeMap<u32, String>,
}

fn field_text<T>(value: &FieldValue<T>, as_str: impl Fn(&T) -> &'static str) -> String {
    match value {
        FieldValue::Absent => String::new(),
        FieldValue::Invalid(raw) => raw.clone(),
        FieldValue::Valid(v) => as_str(v).to_string(),
    }
}

fn entry(record: &DocumentRecord, config: &LpkitConfig) -> IndexEntry {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();

    IndexEntry {
        lp: record.id,
        slug: record.slug().to_string(),
        file: format!("{}/{}", config.documents_dir, record.storage_name),
        title: record.title.clone().unwrap_or_else(|| "Untitled".to_string()),
        description: text(&record.description),
        author: text(&record.author),
        status: field_text(&record.status, |s| s.as_str()),
        doc_type: field_text(&record.doc_type, |t| t.as_str()),
        category: field_text(&record.category, |c| c.as_str()),
        tier: text(&record.tier),
        order: record.order(),
        tier_rank: config.tier_rank(record.tier.as_deref()),
        tags: record.tags.iter().cloned().collect(),
        created: text(&record.created),
        updated: text(&record.updated),
        requires: record.requires.clone(),
        replaces: record.replaces.clone(),
        discussions_to: text(&record.discussions_to),
    }
}

/// Build the index with an explicit timestamp.
pub fn build_at(corpus: &Corpus, config: &LpkitConfig, generated_at: DateTime<Utc>) -> LpIndex {
    let mut lps: Vec<IndexEntry> = corpus
        .documents()
        .iter()
        .filter_map(|doc| doc.record())
        .map(|record| entry(record, config))
        .collect();

    lps.sort_by_key(|e| (e.tier_rank, e.order, e.lp));

    let by_lp = lps.iter().map(|e| (e.lp, e.slug.clone())).collect();

    LpIndex {
        generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        lp_count: lps.len(),
        sort_order: SORT_ORDER,
        tier_ranks: config.tier_ranks.clone(),
        lps,
        by_lp,
    }
}

pub fn build(corpus: &Corpus, config: &LpkitConfig) -> LpIndex {
    let index = build_at(corpus, config, Utc::now());
    log_status!("index", "Indexed {} documents", index.lp_count);
    index
}

/// Write the index as pretty JSON to each path, creating parent directories.
pub fn write(index: &LpIndex, paths: &[PathBuf]) -> Result<Vec<String>> {
    let json = serde_json::to_string_pretty(index)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize index".to_string())))?;

    let mut written = Vec::new();
    for path in paths {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::internal_io(e.to_string(), Some(format!("create {}", parent.display())))
            })?;
        }
        io::write_file_atomic(path, &json, &format!("write {}", path.display()))?;
        written.push(path.display().to_string());
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn corpus() -> Corpus {
        Corpus::new(
            "lp",
            vec![
                Document::parse("lp-0100-a.md", "---\nlp: 100\ntitle: A\ntier: chain\n---\n"),
                Document::parse("lp-0200-b.md", "---\nlp: 200\ntitle: B\ntier: core\norder: 5000\n---\n"),
                Document::parse("lp-0005-c.md", "---\nlp: 5\ntitle: C\n---\n"),
                Document::parse("lp-0300-d.md", "---\nlp: 300\ntier: Core\nstatus: Draft\ntags: [x, a]\n---\n"),
                Document::parse("broken.md", "no header"),
            ],
        )
    }

    #[test]
    fn sorts_by_tier_order_then_id() {
        let index = build_at(&corpus(), &LpkitConfig::default(), Utc::now());
        let ids: Vec<u32> = index.lps.iter().map(|e| e.lp).collect();
        // core: 300 (order 3000), 200 (order 5000); chain: 100; no tier: 5
        assert_eq!(ids, vec![300, 200, 100, 5]);
        assert_eq!(index.lp_count, 4);
    }

    #[test]
    fn entries_carry_defaults() {
        let index = build_at(&corpus(), &LpkitConfig::default(), Utc::now());
        let d = index.lps.iter().find(|e| e.lp == 300).unwrap();
        assert_eq!(d.title, "Untitled");
        assert_eq!(d.status, "Draft");
        assert_eq!(d.tags, vec!["a", "x"]);
        assert_eq!(d.file, "LPs/lp-0300-d.md");
        assert_eq!(index.by_lp[&5], "lp-0005-c");
    }

    #[test]
    fn json_shape_matches_listing_format() {
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let index = build_at(&corpus(), &LpkitConfig::default(), at);
        let json = serde_json::to_value(&index).unwrap();
        assert_eq!(json["generated_at"], "2025-01-02T03:04:05Z");
        assert_eq!(json["sort_order"][0], "tier_rank");
        assert_eq!(json["by_lp"]["100"], "lp-0100-a");
        assert_eq!(json["lps"][0]["type"], "");
        assert_eq!(json["tier_ranks"]["research"], 3);
    }

    #[test]
    fn write_creates_each_output() {
        let dir = tempdir().unwrap();
        let index = build_at(&corpus(), &LpkitConfig::default(), Utc::now());
        let paths = vec![
            dir.path().join("docs/lp-index.json"),
            dir.path().join("site/public/lp-index.json"),
        ];
        let written = write(&index, &paths).unwrap();
        assert_eq!(written.len(), 2);
        let content = std::fs::read_to_string(&paths[1]).unwrap();
        assert!(content.contains("\"lp_count\": 4"));
    }
}
