//! Request interceptor attaching bearer tokens

use std::sync::Arc;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, Request, Response, StatusCode};
use tracing::{debug, info, warn};

use super::token::{TokenProvider, TOKEN_ENDPOINT};

/// Header selecting the tenant for a single request
pub const COMPANY_ID_HEADER: &str = "X-Company-Id";

/// Sends requests with a bearer token and recovers once from a 401.
///
/// Token acquisition failures are not fatal: the request is sent without a
/// token and the API's answer is returned to the caller.
#[derive(Debug, Clone)]
pub struct AuthHandler {
    tokens: Arc<TokenProvider>,
    default_company_id: Option<i64>,
}

impl AuthHandler {
    /// Create a handler using `tokens`, falling back to `default_company_id`
    /// for requests without an `X-Company-Id` header
    pub fn new(tokens: Arc<TokenProvider>, default_company_id: Option<i64>) -> Self {
        Self {
            tokens,
            default_company_id,
        }
    }

    /// Shared token provider
    #[must_use]
    pub fn tokens(&self) -> &Arc<TokenProvider> {
        &self.tokens
    }

    /// Send `request` through `client`
    ///
    /// # Errors
    ///
    /// Only transport errors are returned; HTTP error statuses come back as
    /// responses.
    pub async fn send(&self, client: &Client, mut request: Request) -> reqwest::Result<Response> {
        if is_token_request(&request) {
            return client.execute(request).await;
        }

        let company_id = self.company_for(&request);

        match self.tokens.get_token(company_id).await {
            Ok(token) => {
                attach_bearer(&mut request, &token);
            }
            Err(e) => {
                warn!(
                    url = %request.url(),
                    company_id = ?company_id,
                    error = %e,
                    "Failed to obtain API token, sending request without authentication"
                );
            }
        }

        // Streaming bodies cannot be cloned; such requests get no retry.
        let retry = request.try_clone();
        let response = client.execute(request).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let Some(mut retry) = retry else {
            debug!(url = %response.url(), "401 on a non-replayable request, not retrying");
            return Ok(response);
        };

        warn!(url = %response.url(), "Received 401 Unauthorized, refreshing token and retrying");
        self.tokens.clear_cache();

        let token = match self.tokens.get_token(company_id).await {
            Ok(token) => token,
            Err(e) => {
                warn!(
                    url = %response.url(),
                    error = %e,
                    "Token refresh after 401 failed, returning original response"
                );
                return Ok(response);
            }
        };

        if !attach_bearer(&mut retry, &token) {
            return Ok(response);
        }

        info!(url = %retry.url(), "Retrying request with refreshed token");
        client.execute(retry).await
    }

    fn company_for(&self, request: &Request) -> Option<i64> {
        request
            .headers()
            .get(COMPANY_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok())
            .or(self.default_company_id)
    }
}

fn is_token_request(request: &Request) -> bool {
    request
        .url()
        .path()
        .to_ascii_lowercase()
        .contains(TOKEN_ENDPOINT)
}

fn attach_bearer(request: &mut Request, token: &str) -> bool {
    match HeaderValue::from_str(&format!("Bearer {token}")) {
        Ok(mut value) => {
            value.set_sensitive(true);
            request.headers_mut().insert(AUTHORIZATION, value);
            true
        }
        Err(e) => {
            warn!(error = %e, "Token is not a valid header value");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use chrono::Utc;
    use httpmock::prelude::*;

    fn token_body(token: &str) -> String {
        let expires_at = (Utc::now() + chrono::Duration::hours(1)).to_rfc3339();
        format!(r#"{{"token":"{token}","expiresAt":"{expires_at}","tokenType":"Bearer"}}"#)
    }

    fn handler(server: &MockServer, default_company_id: Option<i64>) -> AuthHandler {
        let config = ClientConfig::default().with_base_url(server.base_url());
        let tokens = TokenProvider::new(Client::new(), &config).unwrap();
        AuthHandler::new(Arc::new(tokens), default_company_id)
    }

    fn get(client: &Client, url: String) -> Request {
        client.get(url).build().unwrap()
    }

    #[tokio::test]
    async fn attaches_bearer_token() {
        let server = MockServer::start();
        let token = server.mock(|when, then| {
            when.method(POST).path(TOKEN_ENDPOINT);
            then.status(200)
                .header("content-type", "application/json")
                .body(token_body("abc"));
        });
        let api = server.mock(|when, then| {
            when.method(GET)
                .path("/api/sites")
                .header("authorization", "Bearer abc");
            then.status(200).body("[]");
        });

        let client = Client::new();
        let auth = handler(&server, None);
        let response = auth.send(&client, get(&client, server.url("/api/sites"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(token.calls(), 1);
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn token_endpoint_passes_through_untouched() {
        let server = MockServer::start();
        let token = server.mock(|when, then| {
            when.method(POST)
                .path("/API/Auth/Token")
                .header_missing("authorization");
            then.status(200)
                .header("content-type", "application/json")
                .body(token_body("abc"));
        });

        let client = Client::new();
        let auth = handler(&server, None);
        let request = client
            .post(server.url("/API/Auth/Token"))
            .body("{}")
            .build()
            .unwrap();
        let response = auth.send(&client, request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(token.calls(), 1, "no nested token request");
        assert!(auth.tokens().cached().is_none());
    }

    #[tokio::test]
    async fn company_header_selects_tenant() {
        let server = MockServer::start();
        let token = server.mock(|when, then| {
            when.method(POST)
                .path(TOKEN_ENDPOINT)
                .body_includes(r#""companyId":7"#);
            then.status(200)
                .header("content-type", "application/json")
                .body(token_body("tok-7"));
        });
        let _api = server.mock(|when, then| {
            when.method(GET).path("/api/warehouses");
            then.status(200).body("[]");
        });

        let client = Client::new();
        let auth = handler(&server, Some(3));
        let request = client
            .get(server.url("/api/warehouses"))
            .header(COMPANY_ID_HEADER, "7")
            .build()
            .unwrap();
        auth.send(&client, request).await.unwrap();

        assert_eq!(token.calls(), 1);
        assert_eq!(auth.tokens().cached().and_then(|c| c.company_id()), Some(7));
    }

    #[tokio::test]
    async fn invalid_company_header_falls_back_to_default() {
        let server = MockServer::start();
        let token = server.mock(|when, then| {
            when.method(POST)
                .path(TOKEN_ENDPOINT)
                .body_includes(r#""companyId":3"#);
            then.status(200)
                .header("content-type", "application/json")
                .body(token_body("tok-3"));
        });
        let _api = server.mock(|when, then| {
            when.method(GET).path("/api/warehouses");
            then.status(200).body("[]");
        });

        let client = Client::new();
        let auth = handler(&server, Some(3));
        let request = client
            .get(server.url("/api/warehouses"))
            .header(COMPANY_ID_HEADER, "acme")
            .build()
            .unwrap();
        auth.send(&client, request).await.unwrap();

        assert_eq!(token.calls(), 1);
    }

    #[tokio::test]
    async fn unauthorized_refreshes_and_retries_once() {
        let server = MockServer::start();
        let token = server.mock(|when, then| {
            when.method(POST).path(TOKEN_ENDPOINT);
            then.status(200)
                .header("content-type", "application/json")
                .body(token_body("fresh"));
        });
        let stale = server.mock(|when, then| {
            when.method(GET)
                .path("/api/sites")
                .header("authorization", "Bearer stale");
            then.status(401);
        });
        let fresh = server.mock(|when, then| {
            when.method(GET)
                .path("/api/sites")
                .header("authorization", "Bearer fresh");
            then.status(200).body("[]");
        });

        let client = Client::new();
        let auth = handler(&server, None);
        auth.tokens()
            .prime("stale", Utc::now() + chrono::Duration::hours(1), None);

        let response = auth.send(&client, get(&client, server.url("/api/sites"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(stale.calls(), 1);
        assert_eq!(fresh.calls(), 1);
        assert_eq!(token.calls(), 1);
    }

    #[tokio::test]
    async fn second_unauthorized_is_returned() {
        let server = MockServer::start();
        let token = server.mock(|when, then| {
            when.method(POST).path(TOKEN_ENDPOINT);
            then.status(200)
                .header("content-type", "application/json")
                .body(token_body("abc"));
        });
        let api = server.mock(|when, then| {
            when.method(GET).path("/api/sites");
            then.status(401);
        });

        let client = Client::new();
        let auth = handler(&server, None);
        let response = auth.send(&client, get(&client, server.url("/api/sites"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(api.calls(), 2, "original request plus exactly one retry");
        assert_eq!(token.calls(), 2);
    }

    #[tokio::test]
    async fn refresh_failure_returns_original_unauthorized() {
        let server = MockServer::start();
        let token = server.mock(|when, then| {
            when.method(POST).path(TOKEN_ENDPOINT);
            then.status(500);
        });
        let api = server.mock(|when, then| {
            when.method(GET).path("/api/sites");
            then.status(401);
        });

        let client = Client::new();
        let auth = handler(&server, None);
        auth.tokens()
            .prime("stale", Utc::now() + chrono::Duration::hours(1), None);

        let response = auth.send(&client, get(&client, server.url("/api/sites"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(api.calls(), 1);
        assert_eq!(token.calls(), 1);
    }

    #[tokio::test]
    async fn token_failure_sends_unauthenticated() {
        let server = MockServer::start();
        let _token = server.mock(|when, then| {
            when.method(POST).path(TOKEN_ENDPOINT);
            then.status(500).body("down");
        });
        let api = server.mock(|when, then| {
            when.method(GET)
                .path("/api/health")
                .header_missing("authorization");
            then.status(200).body("{}");
        });

        let client = Client::new();
        let auth = handler(&server, None);
        let response = auth.send(&client, get(&client, server.url("/api/health"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(api.calls(), 1);
    }
}
