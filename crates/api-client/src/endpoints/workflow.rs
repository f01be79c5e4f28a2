//! Workflow transitions and bulk-operation payloads
//!
//! Shapes shared by every transactional collection. Response types are
//! lenient: missing fields fall back to their defaults so minor contract
//! drift does not turn a successful call into a decode failure.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Common workflow transitions
///
/// Entity-specific actions (`post-to-ledger`, `mark-as-counted`, ...) can be
/// passed to [`ResourceClient::transition`](crate::ResourceClient::transition)
/// as plain strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowAction {
    /// Submit a draft for approval
    Submit,
    /// Approve a submitted document
    Approve,
    /// Send a submitted document back
    Reject,
    /// Cancel the document
    Cancel,
    /// Mark the work as finished
    Complete,
    /// Begin execution
    Start,
    /// Release to the shop floor
    Release,
    /// Hand over to the carrier
    Ship,
    /// Confirm delivery
    Deliver,
    /// Raise the invoice
    Invoice,
    /// Pick the lines from stock
    Pick,
    /// Book incoming goods
    Receive,
    /// Close the document
    Close,
    /// Post to the ledger
    Post,
    /// Issue material
    Issue,
    /// Dispatch to the destination
    Dispatch,
    /// Run processing
    Process,
}

impl WorkflowAction {
    /// Route segment for the transition
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Cancel => "cancel",
            Self::Complete => "complete",
            Self::Start => "start",
            Self::Release => "release",
            Self::Ship => "ship",
            Self::Deliver => "deliver",
            Self::Invoice => "invoice",
            Self::Pick => "pick",
            Self::Receive => "receive",
            Self::Close => "close",
            Self::Post => "post",
            Self::Issue => "issue",
            Self::Dispatch => "dispatch",
            Self::Process => "process",
        }
    }
}

impl AsRef<str> for WorkflowAction {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional payload for a transition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    /// Free-text comment stored in the workflow history
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl TransitionRequest {
    /// Transition with a comment
    pub fn with_comment(comment: impl Into<String>) -> Self {
        Self {
            comment: Some(comment.into()),
        }
    }
}

/// Move several records to one workflow status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeWorkflowStatusRequest {
    /// Records to update
    pub ids: Vec<i64>,
    /// Status code to move them to
    pub target_status_code: String,
    /// Comment stored with each transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Per-record error of a bulk operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BulkOperationError {
    pub id: Option<i64>,
    pub message: String,
}

/// Result of a bulk delete or bulk status change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BulkOperationResult {
    /// Records processed successfully
    pub success_count: u32,
    /// Records that failed
    pub failure_count: u32,
    /// Failure details
    pub errors: Vec<BulkOperationError>,
}

impl BulkOperationResult {
    /// Every record was processed
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failure_count == 0 && self.errors.is_empty()
    }
}

/// One finding of a validation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationIssue {
    pub field: Option<String>,
    pub message: String,
}

/// Server-side validation of an edit payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// One step of a record's workflow history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkflowHistoryEntry {
    pub from_status: Option<String>,
    pub to_status: Option<String>,
    pub action: Option<String>,
    pub changed_by: Option<String>,
    /// Timestamp as sent by the API
    pub changed_at: Option<String>,
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_route_segment() {
        assert_eq!(WorkflowAction::Approve.as_ref(), "approve");
        assert_eq!(WorkflowAction::Dispatch.to_string(), "dispatch");
    }

    #[test]
    fn test_bulk_result_is_lenient() {
        let result: BulkOperationResult =
            serde_json::from_str(r#"{"successCount":3,"extra":true}"#).unwrap();
        assert_eq!(result.success_count, 3);
        assert!(result.is_complete());

        let partial: BulkOperationResult = serde_json::from_str(
            r#"{"successCount":1,"failureCount":1,"errors":[{"id":9,"message":"in use"}]}"#,
        )
        .unwrap();
        assert!(!partial.is_complete());
        assert_eq!(partial.errors[0].id, Some(9));
    }

    #[test]
    fn test_status_change_wire_shape() {
        let request = ChangeWorkflowStatusRequest {
            ids: vec![1, 2],
            target_status_code: "APPROVED".into(),
            comment: None,
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"ids":[1,2],"targetStatusCode":"APPROVED"}"#
        );
    }

    #[test]
    fn test_history_entry() {
        let entry: WorkflowHistoryEntry = serde_json::from_str(
            r#"{"fromStatus":"DRAFT","toStatus":"SUBMITTED","changedBy":"SEEDING_SERVICE","changedAt":"2024-03-01T10:00:00"}"#,
        )
        .unwrap();
        assert_eq!(entry.to_status.as_deref(), Some("SUBMITTED"));
        assert!(entry.comment.is_none());
    }
}
