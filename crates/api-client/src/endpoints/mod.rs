//! Collections of the MES Office API
//!
//! | Module | Contents |
//! |--------|----------|
//! | `catalog` | Every REST collection with its base path and lookup route |
//! | `workflow` | Workflow actions and the bulk/validation/history payloads |
//!
//! All collections share one route layout, so they are served by the
//! generic [`ResourceClient`](crate::ResourceClient) rather than one type per
//! entity.

pub mod catalog;
pub mod workflow;

pub use catalog::{CodeSegment, Entity, EntityGroup, UnknownEntity};
pub use workflow::{
    BulkOperationError, BulkOperationResult, ChangeWorkflowStatusRequest, TransitionRequest,
    ValidationIssue, ValidationReport, WorkflowAction, WorkflowHistoryEntry,
};
