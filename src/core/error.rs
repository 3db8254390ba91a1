use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationMissingArgument,
    ValidationInvalidArgument,
    ValidationFailed,

    CorpusNotFound,
    DocumentNotFound,

    RenumberConflict,
    RenumberNothingToDo,
    RenumberStalePlan,
    RenumberPartialFailure,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationMissingArgument => "validation.missing_argument",
            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",
            ErrorCode::ValidationFailed => "validation.failed",

            ErrorCode::CorpusNotFound => "corpus.not_found",
            ErrorCode::DocumentNotFound => "document.not_found",

            ErrorCode::RenumberConflict => "renumber.conflict",
            ErrorCode::RenumberNothingToDo => "renumber.nothing_to_do",
            ErrorCode::RenumberStalePlan => "renumber.stale_plan",
            ErrorCode::RenumberPartialFailure => "renumber.partial_failure",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingArgumentDetails {
    pub args: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundDetails {
    pub id: String,
}

/// The two parties of a renumbering collision.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictDetails {
    pub kind: String,
    pub requested: String,
    pub existing: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalJsonErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    pub fn validation_missing_argument(args: Vec<String>) -> Self {
        Self::new(
            ErrorCode::ValidationMissingArgument,
            "Missing required argument",
            to_details(MissingArgumentDetails { args }),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        let details = to_details(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.into(),
            id,
            tried,
        });

        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            details,
        )
    }

    /// Hard validation failure: at least one error-severity diagnostic.
    pub fn validation_failed(errors: usize, warnings: usize) -> Self {
        Self::new(
            ErrorCode::ValidationFailed,
            format!(
                "Validation failed with {} error(s) and {} warning(s)",
                errors, warnings
            ),
            serde_json::json!({ "errors": errors, "warnings": warnings }),
        )
    }

    pub fn corpus_not_found(path: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::CorpusNotFound,
            "Documents directory not found",
            to_details(NotFoundDetails { id: path.into() }),
        )
        .with_hint("Pass --root or set 'documents_dir' in lpkit.json")
    }

    pub fn document_not_found(id: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::DocumentNotFound,
            "Document not found",
            to_details(NotFoundDetails { id: id.into() }),
        )
    }

    pub fn renumber_conflict(
        kind: impl Into<String>,
        requested: impl Into<String>,
        existing: impl Into<String>,
    ) -> Self {
        let details = ConflictDetails {
            kind: kind.into(),
            requested: requested.into(),
            existing: existing.into(),
        };
        let message = format!(
            "Renumbering conflict ({}): {} collides with {}",
            details.kind, details.requested, details.existing
        );

        Self::new(ErrorCode::RenumberConflict, message, to_details(details))
            .with_hint("Choose a target id that is free, or remap the existing document in the same run")
    }

    pub fn renumber_nothing_to_do() -> Self {
        Self::new(
            ErrorCode::RenumberNothingToDo,
            "Nothing left to renumber",
            Value::Object(serde_json::Map::new()),
        )
    }

    pub fn renumber_stale_plan(storage_name: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::RenumberStalePlan,
            "Document changed since the plan was computed",
            to_details(NotFoundDetails {
                id: storage_name.into(),
            }),
        )
        .with_hint("Re-run the renumbering to compute a fresh plan")
    }

    pub fn renumber_partial_failure(details: Value) -> Self {
        let mut err = Self::new(
            ErrorCode::RenumberPartialFailure,
            "Renumbering was only partially applied",
            details,
        )
        .with_hint("Inspect the per-document outcomes; failed documents can be retried");
        err.retryable = Some(true);
        err
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            to_details(ConfigInvalidJsonDetails {
                path: path.into(),
                error: err.to_string(),
            }),
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            to_details(ConfigInvalidValueDetails {
                key: key.into(),
                value,
                problem: problem.into(),
            }),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalIoError,
            "IO error",
            to_details(InternalIoErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            to_details(InternalJsonErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_names_both_parties() {
        let err = Error::renumber_conflict("target_exists", "100 -> 200", "lp-0200-bridge.md");
        assert_eq!(err.code.as_str(), "renumber.conflict");
        assert!(err.message.contains("100 -> 200"));
        assert!(err.message.contains("lp-0200-bridge.md"));
        assert_eq!(err.details["existing"], "lp-0200-bridge.md");
        assert_eq!(err.hints.len(), 1);
    }

    #[test]
    fn partial_failure_is_retryable() {
        let err = Error::renumber_partial_failure(serde_json::json!({ "failed": 1 }));
        assert_eq!(err.retryable, Some(true));
        assert_eq!(err.details["failed"], 1);
    }

    #[test]
    fn invalid_argument_serializes_field() {
        let err = Error::validation_invalid_argument("map", "Expected OLD=NEW", None, None);
        assert_eq!(err.code, ErrorCode::ValidationInvalidArgument);
        assert_eq!(err.details["field"], "map");
        assert!(err.details.get("id").is_none());
    }
}
