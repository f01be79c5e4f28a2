//! Bearer token acquisition and caching

use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::config::{AuthConfig, ClientConfig};
use crate::error::{ApiError, ApiResult};

/// Path of the token-issuing endpoint
pub const TOKEN_ENDPOINT: &str = "/api/auth/token";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    user_id: &'a str,
    user_name: &'a str,
    roles: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    company_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    #[serde(default)]
    token: String,
    #[serde(deserialize_with = "deserialize_expiry")]
    expires_at: DateTime<Utc>,
    #[serde(default)]
    company_id: Option<i64>,
}

/// Accepts RFC 3339 timestamps and offset-less ones, which the API emits for
/// UTC `DateTime` values.
fn deserialize_expiry<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

/// The single cached token
#[derive(Clone)]
pub struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
    company_id: Option<i64>,
}

impl CachedToken {
    /// Raw bearer credential
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Absolute expiry reported by the token endpoint
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Tenant the token was issued for
    #[must_use]
    pub fn company_id(&self) -> Option<i64> {
        self.company_id
    }

    /// Usable for `company_id` at `now`, keeping `buffer` in reserve before expiry
    #[must_use]
    pub fn is_fresh_for(&self, company_id: Option<i64>, buffer: chrono::Duration, now: DateTime<Utc>) -> bool {
        self.company_id == company_id
            && self
                .expires_at
                .checked_sub_signed(buffer)
                .is_some_and(|refresh_at| now < refresh_at)
    }
}

impl fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedToken")
            .field("expires_at", &self.expires_at)
            .field("company_id", &self.company_id)
            .finish_non_exhaustive()
    }
}

/// Acquires bearer tokens for the configured service identity.
///
/// Holds a single-slot cache: a request for a different company evicts the
/// cached token. Concurrent callers that miss the cache are serialized on one
/// async mutex so a refresh window issues exactly one call to
/// [`TOKEN_ENDPOINT`]; the slot is only written after a successful response,
/// so a cancelled refresh leaves it untouched.
///
/// One provider is meant to be shared (`Arc`) by every client of a process.
pub struct TokenProvider {
    http: Client,
    token_url: String,
    identity: AuthConfig,
    refresh_buffer: chrono::Duration,
    slot: RwLock<Option<CachedToken>>,
    refresh: Mutex<()>,
}

impl fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenProvider")
            .field("token_url", &self.token_url)
            .field("user_id", &self.identity.seeding_user_id)
            .finish_non_exhaustive()
    }
}

impl TokenProvider {
    /// Create a provider posting to `{base_url}/api/auth/token`
    ///
    /// `http` must not route through the authenticating handler.
    pub fn new(http: Client, config: &ClientConfig) -> ApiResult<Self> {
        let refresh_buffer = chrono::Duration::from_std(config.auth.token_refresh_buffer)
            .map_err(|_| ApiError::config("token_refresh_buffer is out of range"))?;

        Ok(Self {
            http,
            token_url: format!("{}{TOKEN_ENDPOINT}", config.base_url.trim_end_matches('/')),
            identity: config.auth.clone(),
            refresh_buffer,
            slot: RwLock::new(None),
            refresh: Mutex::new(()),
        })
    }

    /// Get a valid token for `company_id`, refreshing it if needed
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Request`] if the token endpoint is unreachable and
    /// [`ApiError::Authentication`] if it rejects the request or returns no
    /// usable token. Nothing is cached on error.
    pub async fn get_token(&self, company_id: Option<i64>) -> ApiResult<String> {
        if let Some(token) = self.fresh_token(company_id) {
            return Ok(token);
        }

        let _refresh = self.refresh.lock().await;

        // Another caller may have refreshed while we waited.
        if let Some(token) = self.fresh_token(company_id) {
            return Ok(token);
        }

        debug!(company_id = ?company_id, "Requesting new API token");

        let fresh = self.request_token(company_id).await?;
        let token = fresh.token.clone();
        *self.write_slot() = Some(fresh);
        Ok(token)
    }

    /// Drop the cached token so the next call re-authenticates
    pub fn clear_cache(&self) {
        *self.write_slot() = None;
        debug!("Cleared cached API token");
    }

    /// Current cache entry, fresh or not
    #[must_use]
    pub fn cached(&self) -> Option<CachedToken> {
        self.read_slot().clone()
    }

    /// Endpoint the provider posts to
    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    fn fresh_token(&self, company_id: Option<i64>) -> Option<String> {
        self.read_slot()
            .as_ref()
            .filter(|cached| cached.is_fresh_for(company_id, self.refresh_buffer, Utc::now()))
            .map(|cached| cached.token.clone())
    }

    fn read_slot(&self) -> RwLockReadGuard<'_, Option<CachedToken>> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_slot(&self) -> RwLockWriteGuard<'_, Option<CachedToken>> {
        self.slot.write().unwrap_or_else(PoisonError::into_inner)
    }

    async fn request_token(&self, company_id: Option<i64>) -> ApiResult<CachedToken> {
        let body = TokenRequest {
            user_id: &self.identity.seeding_user_id,
            user_name: &self.identity.seeding_user_name,
            roles: &self.identity.seeding_roles,
            company_id,
        };

        let response = self
            .http
            .post(&self.token_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(endpoint = TOKEN_ENDPOINT, error = %e, "Failed to obtain API token");
                ApiError::Request(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                endpoint = TOKEN_ENDPOINT,
                status = status.as_u16(),
                "Token endpoint rejected the request"
            );
            return Err(ApiError::authentication(Some(status.as_u16()), message));
        }

        let parsed: TokenResponse = response.json().await.map_err(|e| {
            error!(endpoint = TOKEN_ENDPOINT, error = %e, "Unreadable token response");
            ApiError::authentication(None, format!("invalid token response: {e}"))
        })?;

        if parsed.token.is_empty() {
            return Err(ApiError::authentication(
                None,
                "Received empty token from authentication endpoint",
            ));
        }

        if parsed.company_id.is_some() && parsed.company_id != company_id {
            debug!(
                requested = ?company_id,
                issued = ?parsed.company_id,
                "Token issued for a different company than requested"
            );
        }

        info!(
            user_id = %self.identity.seeding_user_id,
            company_id = ?company_id,
            expires_at = %parsed.expires_at,
            "Obtained API token"
        );

        Ok(CachedToken {
            token: parsed.token,
            expires_at: parsed.expires_at,
            company_id,
        })
    }

    #[cfg(test)]
    pub(crate) fn prime(&self, token: &str, expires_at: DateTime<Utc>, company_id: Option<i64>) {
        *self.write_slot() = Some(CachedToken {
            token: token.to_string(),
            expires_at,
            company_id,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn provider(server: &MockServer) -> TokenProvider {
        let config = ClientConfig::default()
            .with_base_url(server.base_url())
            .with_seeding_identity("SEEDING_SERVICE", ["SYSDEV"]);
        TokenProvider::new(Client::new(), &config).unwrap()
    }

    fn token_json(token: &str, expires_in: chrono::Duration) -> String {
        let expires_at = (Utc::now() + expires_in).to_rfc3339();
        format!(
            r#"{{"token":"{token}","expiresAt":"{expires_at}","tokenType":"Bearer","userId":"SEEDING_SERVICE"}}"#
        )
    }

    // -- freshness ------------------------------------------------------------

    #[test]
    fn fresh_until_refresh_buffer() {
        let now = Utc::now();
        let cached = CachedToken {
            token: "abc".into(),
            expires_at: now + chrono::Duration::minutes(10),
            company_id: Some(1),
        };
        let buffer = chrono::Duration::minutes(5);

        assert!(cached.is_fresh_for(Some(1), buffer, now));
        assert!(cached.is_fresh_for(Some(1), buffer, now + chrono::Duration::minutes(4)));
        assert!(!cached.is_fresh_for(Some(1), buffer, now + chrono::Duration::minutes(5)));
        assert!(!cached.is_fresh_for(Some(2), buffer, now));
        assert!(!cached.is_fresh_for(None, buffer, now));
    }

    #[test]
    fn parses_offsetless_expiry() {
        let json = r#"{"token":"abc","expiresAt":"2030-01-01T12:00:00.1234567","tokenType":"Bearer"}"#;
        let parsed: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.expires_at.to_rfc3339(), "2030-01-01T12:00:00.123456700+00:00");
    }

    #[test]
    fn debug_does_not_reveal_token() {
        let cached = CachedToken {
            token: "super-secret-tok".into(),
            expires_at: Utc::now(),
            company_id: None,
        };
        assert!(!format!("{cached:?}").contains("super-secret-tok"));
    }

    // -- get_token ------------------------------------------------------------

    #[tokio::test]
    async fn cached_token_is_reused() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path(TOKEN_ENDPOINT)
                .body_includes(r#""userId":"SEEDING_SERVICE""#)
                .body_includes(r#""userName":"API Client Service""#)
                .body_includes(r#""roles":["SYSDEV"]"#);
            then.status(200)
                .header("content-type", "application/json")
                .body(token_json("abc", chrono::Duration::hours(1)));
        });

        let tokens = provider(&server);
        assert_eq!(tokens.get_token(None).await.unwrap(), "abc");
        assert_eq!(tokens.get_token(None).await.unwrap(), "abc");

        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn token_inside_refresh_buffer_is_refreshed() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path(TOKEN_ENDPOINT);
            then.status(200)
                .header("content-type", "application/json")
                .body(token_json("short", chrono::Duration::minutes(4)));
        });

        let tokens = provider(&server);
        tokens.get_token(None).await.unwrap();
        assert_eq!(mock.calls(), 1);

        tokens.get_token(None).await.unwrap();
        assert_eq!(mock.calls(), 2, "each call inside the buffer triggers one refresh");
    }

    #[tokio::test]
    async fn clear_cache_forces_refresh() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path(TOKEN_ENDPOINT);
            then.status(200)
                .header("content-type", "application/json")
                .body(token_json("abc", chrono::Duration::hours(1)));
        });

        let tokens = provider(&server);
        tokens.get_token(None).await.unwrap();
        tokens.clear_cache();
        tokens.clear_cache();
        assert!(tokens.cached().is_none());

        tokens.get_token(None).await.unwrap();
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn different_company_replaces_slot() {
        let server = MockServer::start();
        let company_7 = server.mock(|when, then| {
            when.method(POST).path(TOKEN_ENDPOINT).body_includes(r#""companyId":7"#);
            then.status(200)
                .header("content-type", "application/json")
                .body(token_json("tok-7", chrono::Duration::hours(1)));
        });
        let company_9 = server.mock(|when, then| {
            when.method(POST).path(TOKEN_ENDPOINT).body_includes(r#""companyId":9"#);
            then.status(200)
                .header("content-type", "application/json")
                .body(token_json("tok-9", chrono::Duration::hours(1)));
        });

        let tokens = provider(&server);
        assert_eq!(tokens.get_token(Some(7)).await.unwrap(), "tok-7");
        assert_eq!(tokens.get_token(Some(9)).await.unwrap(), "tok-9");
        assert_eq!(tokens.cached().and_then(|c| c.company_id()), Some(9));

        // single slot: going back to 7 re-authenticates
        assert_eq!(tokens.get_token(Some(7)).await.unwrap(), "tok-7");
        assert_eq!(company_7.calls(), 2);
        assert_eq!(company_9.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_refresh() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path(TOKEN_ENDPOINT);
            then.status(200)
                .header("content-type", "application/json")
                .delay(Duration::from_millis(200))
                .body(token_json("tok-conc", chrono::Duration::hours(1)));
        });

        let tokens = Arc::new(provider(&server));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let tokens = Arc::clone(&tokens);
                tokio::spawn(async move { tokens.get_token(Some(1)).await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "tok-conc");
        }
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn rejected_request_is_not_cached() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path(TOKEN_ENDPOINT);
            then.status(500).body("token service down");
        });

        let tokens = provider(&server);
        let err = tokens.get_token(None).await.unwrap_err();

        assert!(matches!(err, ApiError::Authentication { status: Some(500), .. }));
        assert!(tokens.cached().is_none());
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn empty_token_is_an_error() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(POST).path(TOKEN_ENDPOINT);
            then.status(200)
                .header("content-type", "application/json")
                .body(token_json("", chrono::Duration::hours(1)));
        });

        let err = provider(&server).get_token(None).await.unwrap_err();
        assert!(err.to_string().contains("empty token"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_request_error() {
        let config = ClientConfig::default().with_base_url("http://127.0.0.1:9");
        let tokens = TokenProvider::new(Client::new(), &config).unwrap();

        let err = tokens.get_token(None).await.unwrap_err();
        assert!(matches!(err, ApiError::Request(_)));
        assert!(err.is_unreachable());
    }

    #[tokio::test]
    async fn cancelled_refresh_leaves_cache_untouched() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(POST).path(TOKEN_ENDPOINT);
            then.status(200)
                .header("content-type", "application/json")
                .delay(Duration::from_millis(500))
                .body(token_json("late", chrono::Duration::hours(1)));
        });

        let tokens = provider(&server);
        let stale = Utc::now() + chrono::Duration::minutes(1);
        tokens.prime("stale", stale, None);

        let timed_out = tokio::time::timeout(Duration::from_millis(50), tokens.get_token(None)).await;
        assert!(timed_out.is_err());

        let cached = tokens.cached().unwrap();
        assert_eq!(cached.token(), "stale");
        assert_eq!(cached.expires_at(), stale);
    }
}
