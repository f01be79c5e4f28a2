//! Generic CRUD, search and workflow client for one REST collection

use crate::client::MesClient;
use crate::endpoints::workflow::{
    BulkOperationResult, ChangeWorkflowStatusRequest, ValidationReport, WorkflowHistoryEntry,
};
use crate::endpoints::CodeSegment;
use crate::query::QueryParams;
use crate::test_data::filter_test_data;
use mes_core::Outcome;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// Client for the collection at one base path
///
/// - `S`: list item (summary) type
/// - `R`: single-record response type
/// - `E`: create/update payload type
///
/// All three default to [`serde_json::Value`].
///
/// | Method | Route |
/// |--------|-------|
/// | [`get_all`](Self::get_all) | `GET {base}` |
/// | [`get_by_id`](Self::get_by_id) | `GET {base}/{id}` |
/// | [`get_by_code`](Self::get_by_code) | `GET {base}/code/{code}` or `GET {base}/by-code/{code}` |
/// | [`create`](Self::create) | `POST {base}` |
/// | [`update`](Self::update) | `PUT {base}/{id}` |
/// | [`delete`](Self::delete) | `DELETE {base}/{id}` |
/// | [`search`](Self::search) | `POST {base}/search` |
/// | [`validate`](Self::validate) | `POST {base}/validate` |
/// | [`bulk_delete`](Self::bulk_delete) | `DELETE {base}/bulk` |
/// | [`change_workflow_status`](Self::change_workflow_status) | `POST {base}/workflow-status` |
/// | [`transition`](Self::transition) | `POST {base}/{id}/{action}` |
/// | [`workflow_history`](Self::workflow_history) | `GET {base}/{id}/workflow-history` |
pub struct ResourceClient<S = Value, R = S, E = R> {
    client: MesClient,
    base_path: String,
    code_segment: CodeSegment,
    _types: PhantomData<fn() -> (S, R, E)>,
}

impl<S, R, E> Clone for ResourceClient<S, R, E> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            base_path: self.base_path.clone(),
            code_segment: self.code_segment,
            _types: PhantomData,
        }
    }
}

impl<S, R, E> fmt::Debug for ResourceClient<S, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceClient")
            .field("base_path", &self.base_path)
            .field("code_segment", &self.code_segment)
            .finish_non_exhaustive()
    }
}

impl<S, R, E> ResourceClient<S, R, E> {
    /// Create a client for `base_path` (e.g. `api/sites`)
    pub fn new(client: MesClient, base_path: impl Into<String>) -> Self {
        Self {
            client,
            base_path: base_path.into().trim_matches('/').to_string(),
            code_segment: CodeSegment::Code,
            _types: PhantomData,
        }
    }

    /// Use `segment` for [`get_by_code`](Self::get_by_code)
    #[must_use]
    pub fn with_code_segment(mut self, segment: CodeSegment) -> Self {
        self.code_segment = segment;
        self
    }

    /// Collection route
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Underlying API client
    #[must_use]
    pub fn client(&self) -> &MesClient {
        &self.client
    }

    fn route(&self, tail: impl fmt::Display) -> String {
        format!("{}/{tail}", self.base_path)
    }
}

impl<S, R, E> ResourceClient<S, R, E>
where
    S: DeserializeOwned,
    R: DeserializeOwned,
    E: Serialize,
{
    /// List every record
    pub async fn get_all(&self) -> Outcome<Vec<S>> {
        self.client.get_list(&self.base_path).await
    }

    /// List records matching `query`
    pub async fn list_filtered(&self, query: &QueryParams) -> Outcome<Vec<S>> {
        self.client.get_list(&query.apply_to(&self.base_path)).await
    }

    /// Fetch one record
    pub async fn get_by_id(&self, id: i64) -> Outcome<R> {
        self.client.get(&self.route(id)).await
    }

    /// Fetch one record by business code
    pub async fn get_by_code(&self, code: &str) -> Outcome<R> {
        let path = format!("{}/{}/{}", self.base_path, self.code_segment.as_str(), encode_segment(code));
        self.client.get(&path).await
    }

    /// Create a record
    pub async fn create(&self, payload: &E) -> Outcome<R> {
        self.client.post(&self.base_path, payload).await
    }

    /// Replace a record
    pub async fn update(&self, id: i64, payload: &E) -> Outcome<R> {
        self.client.put(&self.route(id), payload).await
    }

    /// Delete a record
    pub async fn delete(&self, id: i64) -> Outcome<()> {
        self.client.delete(&self.route(id)).await
    }

    /// Search with an entity-specific filter body
    pub async fn search<F: Serialize + ?Sized>(&self, filter: &F) -> Outcome<Vec<R>> {
        self.client.post_list(&self.route("search"), filter).await
    }

    /// Validate a payload without saving it
    pub async fn validate(&self, payload: &E) -> Outcome<ValidationReport> {
        self.client.post(&self.route("validate"), payload).await
    }

    /// Delete several records in one call
    pub async fn bulk_delete(&self, ids: &[i64]) -> Outcome<BulkOperationResult> {
        self.client.delete_with(&self.route("bulk"), ids).await
    }

    /// Move several records to one workflow status
    pub async fn change_workflow_status(
        &self,
        request: &ChangeWorkflowStatusRequest,
    ) -> Outcome<BulkOperationResult> {
        self.client.post(&self.route("workflow-status"), request).await
    }

    /// Apply a workflow action (`submit`, `approve`, ...) to one record
    pub async fn transition<B: Serialize + ?Sized>(
        &self,
        id: i64,
        action: impl AsRef<str>,
        body: &B,
    ) -> Outcome<R> {
        let path = format!("{}/{id}/{}", self.base_path, action.as_ref().trim_matches('/'));
        self.client.post(&path, body).await
    }

    /// Workflow history of one record
    pub async fn workflow_history(&self, id: i64) -> Outcome<Vec<WorkflowHistoryEntry>> {
        let path = format!("{}/{id}/workflow-history", self.base_path);
        self.client.get_list(&path).await
    }

    /// Records whose code starts with the configured test-data prefix
    ///
    /// `code_of` picks the code field out of a list item.
    pub async fn get_test_data(&self, code_of: impl Fn(&S) -> Option<&str>) -> Outcome<Vec<S>> {
        let prefix = self.client.config().test_data_prefix.clone();
        self.get_all()
            .await
            .map(|items| filter_test_data(items, &prefix, code_of))
    }

    // -------------------------------------------------------------------------
    // Sub-routes without a dedicated method
    // -------------------------------------------------------------------------

    /// GET `{base}/{sub_path}`
    pub async fn get_at<T: DeserializeOwned>(&self, sub_path: &str) -> Outcome<T> {
        self.client.get(&self.route(sub_path.trim_start_matches('/'))).await
    }

    /// GET `{base}/{sub_path}` returning a list
    pub async fn list_at<T: DeserializeOwned>(&self, sub_path: &str) -> Outcome<Vec<T>> {
        self.client
            .get_list(&self.route(sub_path.trim_start_matches('/')))
            .await
    }

    /// POST `body` to `{base}/{sub_path}`
    pub async fn post_at<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        sub_path: &str,
        body: &B,
    ) -> Outcome<T> {
        self.client
            .post(&self.route(sub_path.trim_start_matches('/')), body)
            .await
    }

    /// PATCH `body` to `{base}/{sub_path}`, ignoring the response body
    pub async fn patch_at<B: Serialize + ?Sized>(&self, sub_path: &str, body: &B) -> Outcome<()> {
        self.client
            .patch_unit(&self.route(sub_path.trim_start_matches('/')), body)
            .await
    }
}

/// Percent-encode a value used as one path segment
fn encode_segment(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
