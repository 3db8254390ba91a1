//! Reference scanner.
//!
//! Finds every place one document points at another: id entries of the
//! reference metadata fields (`requires`, `replaces`, `superseded-by`), on
//! the key line or on block sequence lines below it, and inline `LP-<n>`
//! mentions anywhere else in the header and in the body.
//! Each reference records the byte span of its digits in the raw text, so a
//! rewrite can replace exactly that span and nothing else.
//!
//! Scanning never consults the rest of the corpus; a reference to an id that
//! does not exist is still returned.

use regex::Regex;
use serde::Serialize;
use std::ops::Range;
use std::sync::LazyLock;

use crate::corpus::Corpus;
use crate::document::{id_entries, Document, NUMERIC_KEYS, REFERENCE_KEYS};
use crate::frontmatter::Field;

// Inline mention: `LP-42`, `lp-0100`, `./lp-0100-slug.md`. Up to six digits;
// a longer digit run is not an id.
static MENTION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blp-(\d{1,6})\b").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReferenceKind {
    MetadataField { field: String },
    InlineMention,
}

/// One occurrence of a document id inside another document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    /// Id of the containing document; `None` when its own id is unreadable.
    pub source_id: Option<u32>,
    pub target_id: u32,
    #[serde(flatten)]
    pub kind: ReferenceKind,
    /// Byte span of the id digits inside the raw document.
    pub span: Range<usize>,
    /// Whether a rewrite should use the zero-padded form: the token has a
    /// leading zero (`LP-0100`) or names a storage file (`lp-0100-slug.md`).
    pub padded: bool,
}

impl Reference {
    pub fn is_metadata(&self) -> bool {
        matches!(self.kind, ReferenceKind::MetadataField { .. })
    }
}

/// Scan one document. The returned iterator is lazy; calling `scan` again on
/// the same document yields the same sequence.
pub fn scan(doc: &Document) -> impl Iterator<Item = Reference> + '_ {
    let source_id = doc.id();
    let frontmatter = doc.frontmatter.as_ref();
    let fields: &[Field] = frontmatter.map(|fm| fm.fields()).unwrap_or(&[]);

    let metadata = fields
        .iter()
        .filter(|f| REFERENCE_KEYS.contains(&f.key.as_str()))
        .flat_map(move |field| metadata_references(doc, field, source_id));

    // Id and reference values are read above; everything else is free text
    let header = frontmatter.map(|fm| fm.header_span.clone()).unwrap_or(0..0);
    let header_mentions = mentions(&doc.raw, header, source_id).filter(move |r| {
        !fields
            .iter()
            .filter(|f| is_structured(f))
            .flat_map(|f| f.spans())
            .any(|span| span.start <= r.span.start && r.span.end <= span.end)
    });

    let body_start = frontmatter.map(|fm| fm.body_start).unwrap_or(0);
    let body_mentions = mentions(&doc.raw, body_start..doc.raw.len(), source_id);

    metadata.chain(header_mentions).chain(body_mentions)
}

fn is_structured(field: &Field) -> bool {
    let key = field.key.as_str();
    REFERENCE_KEYS.contains(&key) || NUMERIC_KEYS.contains(&key)
}

fn metadata_references<'a>(
    doc: &'a Document,
    field: &'a Field,
    source_id: Option<u32>,
) -> impl Iterator<Item = Reference> + 'a {
    field.spans().flat_map(move |span| {
        let offset = span.start;
        id_entries(&doc.raw[span])
            .into_iter()
            .filter_map(move |entry| {
                let target_id = entry.text.parse::<u32>().ok()?;
                Some(Reference {
                    source_id,
                    target_id,
                    kind: ReferenceKind::MetadataField {
                        field: field.key.clone(),
                    },
                    span: offset + entry.span.start..offset + entry.span.end,
                    padded: false,
                })
            })
    })
}

fn mentions(
    raw: &str,
    region: Range<usize>,
    source_id: Option<u32>,
) -> impl Iterator<Item = Reference> + '_ {
    let offset = region.start;
    let text = &raw[region];
    MENTION_PATTERN.captures_iter(text).filter_map(move |caps| {
        let digits = caps.get(1)?;
        Some(Reference {
            source_id,
            target_id: digits.as_str().parse().ok()?,
            kind: ReferenceKind::InlineMention,
            span: offset + digits.start()..offset + digits.end(),
            padded: is_padded(digits.as_str(), &text[digits.end()..]),
        })
    })
}

/// Only a leading zero marks a token as padded; `LP-1234` could be either
/// form and is written plain. A token followed by `-slug` or `.md` is a
/// storage name and always takes the canonical width.
fn is_padded(digits: &str, rest: &str) -> bool {
    (digits.len() > 1 && digits.starts_with('0')) || rest.starts_with('-') || rest.starts_with(".md")
}

/// Every reference other documents make to `target`, in storage name order.
pub fn references_to(
    corpus: &Corpus,
    target: u32,
) -> impl Iterator<Item = (&Document, Reference)> + '_ {
    corpus
        .documents()
        .iter()
        .filter(move |doc| doc.id() != Some(target))
        .flat_map(move |doc| {
            scan(doc)
                .filter(move |r| r.target_id == target)
                .map(move |r| (doc, r))
        })
}

/// 1-based line of a byte offset in `raw`.
pub fn line_of(raw: &str, offset: usize) -> usize {
    raw[..offset.min(raw.len())].matches('\n').count() + 1
}
