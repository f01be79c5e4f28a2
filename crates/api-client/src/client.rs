//! Main API client implementation

use crate::auth::{AuthHandler, TokenProvider, COMPANY_ID_HEADER};
use crate::config::ClientConfig;
use crate::endpoints::Entity;
use crate::error::{ApiError, ApiResult};
use crate::resource::ResourceClient;
use mes_core::{Failure, Outcome};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

const CLIENT_USER_AGENT: &str = concat!("mes-api-client/", env!("CARGO_PKG_VERSION"));

type Decoder<T> = fn(&[u8]) -> serde_json::Result<T>;

/// Client for the MES Office REST API
///
/// Every call returns an [`Outcome`]: HTTP error statuses, transport errors,
/// undecodable bodies and cancellation all end up in [`Outcome::Failure`]
/// with an [`ErrorCode`](mes_core::ErrorCode) derived from the status.
///
/// Cloning is cheap and clones share the connection pool and token cache.
#[derive(Clone)]
pub struct MesClient {
    inner: Client,
    config: Arc<ClientConfig>,
    auth: Option<AuthHandler>,
    cancellation: Option<CancellationToken>,
    company_id: Option<i64>,
}

impl MesClient {
    /// Create a new client with default configuration from environment
    pub fn new() -> ApiResult<Self> {
        let config = ClientConfig::from_env()?;
        Self::with_config(config)
    }

    /// Create a new client with specific configuration
    pub fn with_config(config: ClientConfig) -> ApiResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        default_headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let inner = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(ApiError::Request)?;

        let auth = if config.enable_authentication {
            // Token requests go out on their own client, never through the handler.
            let token_client = Client::builder()
                .timeout(config.timeout)
                .user_agent(CLIENT_USER_AGENT)
                .build()
                .map_err(ApiError::Request)?;
            let tokens = Arc::new(TokenProvider::new(token_client, &config)?);
            Some(AuthHandler::new(tokens, config.auth.default_company_id))
        } else {
            None
        };

        Ok(Self {
            inner,
            config: Arc::new(config),
            auth,
            cancellation: None,
            company_id: None,
        })
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Shared token provider, if authentication is enabled
    #[must_use]
    pub fn tokens(&self) -> Option<&Arc<TokenProvider>> {
        self.auth.as_ref().map(AuthHandler::tokens)
    }

    /// Token provider or [`ApiError::AuthenticationDisabled`]
    pub fn require_tokens(&self) -> ApiResult<&Arc<TokenProvider>> {
        self.tokens().ok_or(ApiError::AuthenticationDisabled)
    }

    /// Handle whose calls end with `OPERATION_CANCELED` once `token` fires
    #[must_use]
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            cancellation: Some(token),
            ..self.clone()
        }
    }

    /// Handle sending `X-Company-Id: <company_id>` with every request
    #[must_use]
    pub fn with_company_id(&self, company_id: i64) -> Self {
        Self {
            company_id: Some(company_id),
            ..self.clone()
        }
    }

    /// Company sent with every request of this handle
    #[must_use]
    pub fn company_id(&self) -> Option<i64> {
        self.company_id
    }

    // -------------------------------------------------------------------------
    // Resource accessors
    // -------------------------------------------------------------------------

    /// Untyped client for a catalog entity
    #[must_use]
    pub fn entity(&self, entity: Entity) -> ResourceClient<Value> {
        ResourceClient::new(self.clone(), entity.base_path()).with_code_segment(entity.code_segment())
    }

    /// Typed client for the collection at `base_path`
    ///
    /// `S` is the list item, `R` the single-record response and `E` the
    /// create/update payload.
    #[must_use]
    pub fn resource<S, R, E>(&self, base_path: impl Into<String>) -> ResourceClient<S, R, E> {
        ResourceClient::new(self.clone(), base_path)
    }

    // -------------------------------------------------------------------------
    // HTTP verbs
    // -------------------------------------------------------------------------

    /// GET `path` and decode the body
    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Outcome<T> {
        self.execute(Method::GET, path, None::<&()>, decode_json::<T>, |_| None)
            .await
    }

    /// GET `path` and decode a JSON array
    #[instrument(skip(self))]
    pub async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Outcome<Vec<T>> {
        self.execute(Method::GET, path, None::<&()>, decode_list::<T>, |items| {
            Some(items.len())
        })
        .await
    }

    /// POST `body` to `path` and decode the response
    #[instrument(skip(self, body))]
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Outcome<T> {
        self.execute(Method::POST, path, Some(body), decode_json::<T>, |_| None)
            .await
    }

    /// POST `body` to `path` and decode a JSON array
    #[instrument(skip(self, body))]
    pub async fn post_list<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Outcome<Vec<T>> {
        self.execute(Method::POST, path, Some(body), decode_list::<T>, |items| {
            Some(items.len())
        })
        .await
    }

    /// POST `body` to `path`, ignoring any response body
    #[instrument(skip(self, body))]
    pub async fn post_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Outcome<()> {
        self.execute(Method::POST, path, Some(body), decode_unit, |_| None)
            .await
    }

    /// PUT `body` to `path` and decode the response
    #[instrument(skip(self, body))]
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Outcome<T> {
        self.execute(Method::PUT, path, Some(body), decode_json::<T>, |_| None)
            .await
    }

    /// PATCH `body` to `path` and decode the response
    #[instrument(skip(self, body))]
    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Outcome<T> {
        self.execute(Method::PATCH, path, Some(body), decode_json::<T>, |_| None)
            .await
    }

    /// PATCH `body` to `path`, ignoring any response body
    #[instrument(skip(self, body))]
    pub async fn patch_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Outcome<()> {
        self.execute(Method::PATCH, path, Some(body), decode_unit, |_| None)
            .await
    }

    /// DELETE `path`
    #[instrument(skip(self))]
    pub async fn delete(&self, path: &str) -> Outcome<()> {
        self.execute(Method::DELETE, path, None::<&()>, decode_unit, |_| None)
            .await
    }

    /// DELETE `path` with a JSON body and decode the response
    #[instrument(skip(self, body))]
    pub async fn delete_with<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Outcome<T> {
        self.execute(Method::DELETE, path, Some(body), decode_json::<T>, |_| None)
            .await
    }

    // -------------------------------------------------------------------------
    // Pipeline
    // -------------------------------------------------------------------------

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn execute<T, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        decode: Decoder<T>,
        count: fn(&T) -> Option<usize>,
    ) -> Outcome<T> {
        let request_id = Uuid::new_v4().to_string();
        let start = Instant::now();

        info!(
            request_id = %request_id,
            method = %method,
            endpoint = %path,
            "Sending API request"
        );

        let exchange = self.exchange(method.clone(), path, &request_id, body, decode);
        let result = match &self.cancellation {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => Err(Interrupted::Canceled),
                result = exchange => result,
            },
            None => exchange.await,
        };

        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(value) => {
                match count(&value) {
                    Some(count) => info!(
                        request_id = %request_id,
                        method = %method,
                        endpoint = %path,
                        elapsed_ms,
                        count,
                        "API request succeeded"
                    ),
                    None => info!(
                        request_id = %request_id,
                        method = %method,
                        endpoint = %path,
                        elapsed_ms,
                        "API request succeeded"
                    ),
                }
                Outcome::Success(value)
            }
            Err(Interrupted::Status { status, body }) => {
                warn!(
                    request_id = %request_id,
                    method = %method,
                    endpoint = %path,
                    status,
                    elapsed_ms,
                    "API request failed"
                );
                Failure::from_status(status, &body)
                    .with_context("endpoint", path)
                    .with_context("method", method.as_str())
                    .with_context("elapsed_ms", elapsed_ms)
                    .into()
            }
            Err(Interrupted::Transport(message)) => {
                error!(
                    request_id = %request_id,
                    method = %method,
                    endpoint = %path,
                    elapsed_ms,
                    error = %message,
                    "API request error"
                );
                Failure::unavailable(message)
                    .with_context("endpoint", path)
                    .with_context("method", method.as_str())
                    .with_context("elapsed_ms", elapsed_ms)
                    .into()
            }
            Err(Interrupted::Canceled) => {
                warn!(
                    request_id = %request_id,
                    method = %method,
                    endpoint = %path,
                    elapsed_ms,
                    "API request canceled"
                );
                Failure::canceled()
                    .with_context("endpoint", path)
                    .with_context("method", method.as_str())
                    .into()
            }
        }
    }

    async fn exchange<T, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        request_id: &str,
        body: Option<&B>,
        decode: Decoder<T>,
    ) -> Result<T, Interrupted> {
        let mut builder = self
            .inner
            .request(method, self.url(path))
            .header(X_REQUEST_ID, request_id);

        if let Some(company_id) = self.company_id {
            builder = builder.header(COMPANY_ID_HEADER, company_id);
        }

        if let Some(b) = body {
            builder = builder.json(b);
        }

        let request = builder.build().map_err(Interrupted::transport)?;

        let response = match &self.auth {
            Some(auth) => auth.send(&self.inner, request).await,
            None => self.inner.execute(request).await,
        }
        .map_err(Interrupted::transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Interrupted::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(Interrupted::transport)?;
        decode(&bytes).map_err(Interrupted::transport)
    }
}

impl std::fmt::Debug for MesClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MesClient")
            .field("base_url", &self.config.base_url)
            .field("authenticated", &self.auth.is_some())
            .field("company_id", &self.company_id)
            .finish_non_exhaustive()
    }
}

/// Why an exchange produced no value
enum Interrupted {
    Status { status: u16, body: String },
    Transport(String),
    Canceled,
}

impl Interrupted {
    fn transport(error: impl std::fmt::Display) -> Self {
        Self::Transport(error.to_string())
    }
}

/// Decode a JSON body; an empty body decodes as `null`
fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> serde_json::Result<T> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_slice(b"null")
    } else {
        serde_json::from_slice(bytes)
    }
}

/// Decode a JSON array; an empty or `null` body decodes as no items
fn decode_list<T: DeserializeOwned>(bytes: &[u8]) -> serde_json::Result<Vec<T>> {
    decode_json::<Option<Vec<T>>>(bytes).map(Option::unwrap_or_default)
}

fn decode_unit(_: &[u8]) -> serde_json::Result<()> {
    Ok(())
}
