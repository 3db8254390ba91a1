//! Public output types shared by command responses.

use serde::Serialize;

// ============================================================================
// Bulk Operations (for commands that process multiple items)
// ============================================================================

/// Standardized bulk execution result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkResult<T: Serialize> {
    pub action: String,
    pub results: Vec<ItemOutcome<T>>,
    pub summary: BulkSummary,
}

/// Outcome for a single item in a bulk operation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemOutcome<T: Serialize> {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of bulk operation results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl<T: Serialize> ItemOutcome<T> {
    pub fn success(id: impl Into<String>, result: T) -> Self {
        Self {
            id: id.into(),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            result: None,
            error: Some(error.into()),
        }
    }
}

impl<T: Serialize> BulkResult<T> {
    pub fn new(action: impl Into<String>, results: Vec<ItemOutcome<T>>) -> Self {
        let failed = results.iter().filter(|r| r.error.is_some()).count();
        let summary = BulkSummary {
            total: results.len(),
            succeeded: results.len() - failed,
            failed,
        };
        Self {
            action: action.into(),
            results,
            summary,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_failures() {
        let result = BulkResult::new(
            "renumber",
            vec![
                ItemOutcome::success("a.md", serde_json::json!({ "written": true })),
                ItemOutcome::failure("b.md", "disk full"),
            ],
        );
        assert_eq!(result.summary.total, 2);
        assert_eq!(result.summary.succeeded, 1);
        assert!(result.has_failures());
    }

    #[test]
    fn failure_omits_result() {
        let outcome: ItemOutcome<serde_json::Value> = ItemOutcome::failure("b.md", "boom");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["error"], "boom");
        assert_eq!(json["id"], "b.md");
    }
}
