//! Diagnostic records produced by validation.

use serde::Serialize;

/// Validation rules, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rule {
    Parse,
    Range,
    Status,
    Type,
    Category,
    Filename,
    Required,
    Superseded,
    Reference,
    Duplicate,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::Parse => "parse",
            Rule::Range => "range",
            Rule::Status => "status",
            Rule::Type => "type",
            Rule::Category => "category",
            Rule::Filename => "filename",
            Rule::Required => "required",
            Rule::Superseded => "superseded",
            Rule::Reference => "reference",
            Rule::Duplicate => "duplicate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Hard failure.
    Error,
    /// Reported, but the corpus still passes.
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// `None` when the document's own id could not be read.
    pub document_id: Option<u32>,
    pub storage_name: String,
    pub rule: Rule,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn error(
        document_id: Option<u32>,
        storage_name: &str,
        rule: Rule,
        message: impl Into<String>,
    ) -> Self {
        Self {
            document_id,
            storage_name: storage_name.to_string(),
            rule,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(
        document_id: Option<u32>,
        storage_name: &str,
        rule: Rule,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(document_id, storage_name, rule, message)
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Stable report order: by document id (unreadable ids first), then rule.
/// The sort is stable, so ties keep generation order.
pub fn sort(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by_key(|d| (d.document_id, d.rule));
}
