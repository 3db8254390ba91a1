//! Document records: typed view over one proposal's frontmatter.
//!
//! A `Document` is the raw text plus its storage name, the extracted
//! frontmatter and either a parsed `DocumentRecord` or the reason parsing
//! failed. Records are never mutated here; renumbering produces new raw text
//! which is parsed again.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Range;

use crate::frontmatter::{self, Frontmatter, FrontmatterError};

pub const KEY_ID: &str = "lp";
pub const KEY_TITLE: &str = "title";
pub const KEY_DESCRIPTION: &str = "description";
pub const KEY_AUTHOR: &str = "author";
pub const KEY_STATUS: &str = "status";
pub const KEY_TYPE: &str = "type";
pub const KEY_CATEGORY: &str = "category";
pub const KEY_TAGS: &str = "tags";
pub const KEY_CREATED: &str = "created";
pub const KEY_UPDATED: &str = "updated";
pub const KEY_ORDER: &str = "order";
pub const KEY_TIER: &str = "tier";
pub const KEY_REQUIRES: &str = "requires";
pub const KEY_SUPERSEDED_BY: &str = "superseded-by";
pub const KEY_REPLACES: &str = "replaces";
pub const KEY_DISCUSSIONS_TO: &str = "discussions-to";

/// Frontmatter keys whose values are document ids referencing other documents.
pub const REFERENCE_KEYS: &[&str] = &[KEY_REQUIRES, KEY_SUPERSEDED_BY, KEY_REPLACES];

/// Frontmatter keys holding plain numbers that must never be read as mentions.
pub const NUMERIC_KEYS: &[&str] = &[KEY_ID, KEY_ORDER];

// ============================================================================
// Enumerations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    Draft,
    Final,
    Superseded,
    Research,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Draft,
        Status::Final,
        Status::Superseded,
        Status::Research,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "Draft",
            Status::Final => "Final",
            Status::Superseded => "Superseded",
            Status::Research => "Research",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DocType {
    StandardsTrack,
    Meta,
    Informational,
}

impl DocType {
    pub const ALL: [DocType; 3] = [DocType::StandardsTrack, DocType::Meta, DocType::Informational];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::StandardsTrack => "Standards Track",
            DocType::Meta => "Meta",
            DocType::Informational => "Informational",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Core,
    Networking,
    Interface,
    Lrc,
    Bridge,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Core,
        Category::Networking,
        Category::Interface,
        Category::Lrc,
        Category::Bridge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Core => "Core",
            Category::Networking => "Networking",
            Category::Interface => "Interface",
            Category::Lrc => "LRC",
            Category::Bridge => "Bridge",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

/// A frontmatter value parsed into an enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue<T> {
    Absent,
    Invalid(String),
    Valid(T),
}

impl<T: Copy> FieldValue<T> {
    fn from_raw(raw: Option<&str>, parse: impl Fn(&str) -> Option<T>) -> Self {
        match raw {
            None => FieldValue::Absent,
            Some(v) => match parse(v) {
                Some(parsed) => FieldValue::Valid(parsed),
                None => FieldValue::Invalid(v.to_string()),
            },
        }
    }

    pub fn valid(&self) -> Option<T> {
        match self {
            FieldValue::Valid(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }
}

/// Display precedence within a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// No usable `order` value; derived as `id * 10`.
    Derived,
    Explicit(i64),
}

// ============================================================================
// Canonical naming
// ============================================================================

/// Zero-padded textual form of an id: 4 digits below 10000, 5 at or above.
pub fn padded_id(id: u32) -> String {
    if id < 10000 {
        format!("{:04}", id)
    } else {
        format!("{:05}", id)
    }
}

/// Canonical storage-name prefix for an id, e.g. `lp-0100`.
pub fn canonical_prefix(file_prefix: &str, id: u32) -> String {
    format!("{}-{}", file_prefix, padded_id(id))
}

/// Whether `storage_name` starts with the canonical prefix for `id`, followed
/// by a slug separator or the extension.
pub fn has_canonical_prefix(storage_name: &str, file_prefix: &str, id: u32) -> bool {
    let prefix = canonical_prefix(file_prefix, id);
    storage_name
        .strip_prefix(&prefix)
        .is_some_and(|rest| rest.starts_with('-') || rest.starts_with('.'))
}

/// Split `lp-0100-slug.md` into the numeric part and the remainder
/// (`("0100", "-slug.md")`). Returns `None` when the name has no id prefix.
pub fn split_storage_name<'a>(storage_name: &'a str, file_prefix: &str) -> Option<(&'a str, &'a str)> {
    let rest = storage_name.strip_prefix(file_prefix)?.strip_prefix('-')?;
    let digits = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    Some((&rest[..digits], &rest[digits..]))
}

/// Id encoded in a storage name, if any.
pub fn id_from_storage_name(storage_name: &str, file_prefix: &str) -> Option<u32> {
    split_storage_name(storage_name, file_prefix).and_then(|(digits, _)| digits.parse().ok())
}

/// Storage name for `id`, keeping the slug and extension of `storage_name`.
pub fn canonical_storage_name(storage_name: &str, file_prefix: &str, id: u32) -> String {
    let prefix = canonical_prefix(file_prefix, id);
    match split_storage_name(storage_name, file_prefix) {
        Some((_, rest)) => format!("{}{}", prefix, rest),
        None => format!("{}-{}", prefix, storage_name),
    }
}

/// Storage name without its extension, used as the listing slug.
pub fn slug(storage_name: &str) -> &str {
    storage_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(storage_name)
}

// ============================================================================
// Sequence parsing
// ============================================================================

/// One entry of an id sequence with its byte range inside the parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdEntry<'a> {
    pub text: &'a str,
    pub span: Range<usize>,
}

/// Split an id sequence (`[1, 2]`, `1, 2`, `LP-7`) into entries. Brackets,
/// quotes and an `LP-` prefix are stripped from each entry; empty and `null`
/// entries are dropped. Record parsing and the reference scanner both read
/// reference fields through this.
pub fn id_entries(value: &str) -> Vec<IdEntry<'_>> {
    let mut entries = Vec::new();
    let mut start = 0;

    for piece in value.split(',') {
        let span = trim_entry(value, start..start + piece.len());
        start += piece.len() + 1;

        let text = &value[span.clone()];
        if !text.is_empty() && text != "null" {
            entries.push(IdEntry { text, span });
        }
    }

    entries
}

fn trim_entry(value: &str, mut span: Range<usize>) -> Range<usize> {
    let bytes = value.as_bytes();
    loop {
        let before = span.clone();
        while span.start < span.end && bytes[span.start].is_ascii_whitespace() {
            span.start += 1;
        }
        while span.end > span.start && bytes[span.end - 1].is_ascii_whitespace() {
            span.end -= 1;
        }
        if span.start < span.end && matches!(bytes[span.start], b'[' | b'"' | b'\'') {
            span.start += 1;
        }
        if span.end > span.start && matches!(bytes[span.end - 1], b']' | b'"' | b'\'') {
            span.end -= 1;
        }
        if span == before {
            break;
        }
    }

    let prefixed = value
        .get(span.start..span.start + 3)
        .is_some_and(|p| p.eq_ignore_ascii_case("lp-"));
    if prefixed && span.len() > 3 {
        span.start += 3;
    }
    span
}

/// Parse an id sequence into ids, collecting any entries that are not
/// integers separately.
pub fn parse_id_list(value: &str) -> (Vec<u32>, Vec<String>) {
    let mut ids = Vec::new();
    let mut malformed = Vec::new();

    for entry in id_entries(value) {
        match entry.text.parse::<u32>() {
            Ok(id) => ids.push(id),
            Err(_) => malformed.push(entry.text.to_string()),
        }
    }

    (ids, malformed)
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    let inner = value.trim();
    let inner = inner
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(inner);

    inner
        .split(',')
        .map(|item| item.trim().trim_matches(['"', '\'']).trim())
        .filter(|item| !item.is_empty() && *item != "null")
}

// ============================================================================
// Records
// ============================================================================

/// Typed metadata of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub id: u32,
    pub title: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub status: FieldValue<Status>,
    pub doc_type: FieldValue<DocType>,
    pub category: FieldValue<Category>,
    pub tags: BTreeSet<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub order: Order,
    pub tier: Option<String>,
    pub requires: Vec<u32>,
    pub replaces: Vec<u32>,
    pub superseded_by: Option<u32>,
    /// Reference entries that are not integers (`requires: [100, foo]`).
    pub malformed_references: Vec<String>,
    pub discussions_to: Option<String>,
    pub storage_name: String,
}

impl DocumentRecord {
    /// Effective display order: explicit value, or `id * 10`.
    pub fn order(&self) -> i64 {
        match self.order {
            Order::Explicit(order) => order,
            Order::Derived => i64::from(self.id) * 10,
        }
    }

    pub fn slug(&self) -> &str {
        slug(&self.storage_name)
    }

    fn from_frontmatter(fm: &Frontmatter, storage_name: &str) -> Result<Self, ParseFailure> {
        let raw_id = fm.value(KEY_ID).ok_or(ParseFailure::MissingId)?;
        let id = raw_id
            .parse::<u32>()
            .map_err(|_| ParseFailure::InvalidId(raw_id.to_string()))?;

        let text = |key: &str| fm.value(key).map(str::to_string);

        let mut malformed_references = Vec::new();
        let mut id_list = |key: &str| {
            let (ids, malformed) = fm.value(key).map(parse_id_list).unwrap_or_default();
            malformed_references.extend(malformed);
            ids
        };
        let requires = id_list(KEY_REQUIRES);
        let replaces = id_list(KEY_REPLACES);
        let superseded_by = fm.value(KEY_SUPERSEDED_BY).and_then(|v| {
            let (ids, malformed) = parse_id_list(v);
            malformed_references.extend(malformed);
            ids.first().copied()
        });

        let order = fm
            .value(KEY_ORDER)
            .and_then(|v| v.parse::<i64>().ok())
            .map(Order::Explicit)
            .unwrap_or(Order::Derived);

        Ok(DocumentRecord {
            id,
            title: text(KEY_TITLE),
            description: text(KEY_DESCRIPTION),
            author: text(KEY_AUTHOR),
            status: FieldValue::from_raw(fm.value(KEY_STATUS), Status::parse),
            doc_type: FieldValue::from_raw(fm.value(KEY_TYPE), DocType::parse),
            category: FieldValue::from_raw(fm.value(KEY_CATEGORY), Category::parse),
            tags: fm
                .value(KEY_TAGS)
                .map(|v| split_list(v).map(str::to_string).collect())
                .unwrap_or_default(),
            created: text(KEY_CREATED),
            updated: text(KEY_UPDATED),
            order,
            tier: text(KEY_TIER),
            requires,
            replaces,
            superseded_by,
            malformed_references,
            discussions_to: text(KEY_DISCUSSIONS_TO),
            storage_name: storage_name.to_string(),
        })
    }
}

/// Why a document could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    Frontmatter(FrontmatterError),
    MissingId,
    InvalidId(String),
}

impl ParseFailure {
    pub fn message(&self) -> String {
        match self {
            ParseFailure::Frontmatter(err) => err.message(),
            ParseFailure::MissingId => format!("Missing required field: '{}'", KEY_ID),
            ParseFailure::InvalidId(raw) => {
                format!("Field '{}' is not a non-negative integer: '{}'", KEY_ID, raw)
            }
        }
    }
}

/// One stored document: raw text plus everything derived from it.
#[derive(Debug, Clone)]
pub struct Document {
    pub storage_name: String,
    pub raw: String,
    pub frontmatter: Option<Frontmatter>,
    pub parsed: Result<DocumentRecord, ParseFailure>,
}

impl Document {
    pub fn parse(storage_name: impl Into<String>, raw: impl Into<String>) -> Self {
        let storage_name = storage_name.into();
        let raw = raw.into();

        match frontmatter::extract(&raw) {
            Ok(fm) => {
                let parsed = DocumentRecord::from_frontmatter(&fm, &storage_name);
                Document {
                    storage_name,
                    raw,
                    frontmatter: Some(fm),
                    parsed,
                }
            }
            Err(err) => Document {
                storage_name,
                raw,
                frontmatter: None,
                parsed: Err(ParseFailure::Frontmatter(err)),
            },
        }
    }

    pub fn record(&self) -> Option<&DocumentRecord> {
        self.parsed.as_ref().ok()
    }

    pub fn id(&self) -> Option<u32> {
        self.record().map(|r| r.id)
    }

    /// Body text, i.e. everything after the frontmatter block.
    pub fn body(&self) -> &str {
        match &self.frontmatter {
            Some(fm) => &self.raw[fm.body_start..],
            None => &self.raw,
        }
    }
}
