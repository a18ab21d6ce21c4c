// Allow dead code: bearer-token plumbing for authenticated endpoints
#![allow(dead_code)]

//! HTTP client for the identity service.
//!
//! Three endpoints are implemented, matching the service contract exactly:
//! obtain a token pair, register an account, and exchange a refresh token
//! for a new access token. Tokens are treated as opaque strings; no local
//! decoding or expiry inspection happens here.

use std::time::Duration;

use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ApiError;

/// HTTP request timeout in seconds.
/// Auth calls are small; failing fast keeps the login form responsive.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

/// Access/refresh token pair returned by the token and register endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
}

/// Identity service client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create a new client with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build the `Authorization: Bearer <token>` header set for
    /// authenticated requests.
    pub(crate) fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| ApiError::InvalidResponse(format!("Invalid token header: {}", e)))?,
            );
        }
        Ok(headers)
    }

    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// POST `/token/` - exchange credentials for an access/refresh pair.
    /// Bad credentials surface as a 4xx error.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, ApiError> {
        let response = self
            .client
            .post(self.url("/token/"))
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        debug!(username, "Token pair obtained");

        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse token response: {}", e)))
    }

    /// POST `/register/` - create an account. The 201 response carries a
    /// token pair, so no separate token request is needed after signup.
    /// Validation failures (e.g. duplicate username) surface as 4xx errors.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<TokenPair, ApiError> {
        let response = self
            .client
            .post(self.url("/register/"))
            .json(&RegisterRequest {
                username,
                email,
                password,
            })
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        debug!(username, "Account registered");

        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse register response: {}", e)))
    }

    /// POST `/token/refresh/` - exchange the refresh token for a new access
    /// token. An expired or invalid refresh token surfaces as `Unauthorized`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .post(self.url("/token/refresh/"))
            .json(&RefreshRequest {
                refresh: refresh_token,
            })
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        debug!("Access token refreshed");

        let parsed: RefreshResponse = response.json().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse refresh response: {}", e))
        })?;
        Ok(parsed.access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn auth_headers_carry_bearer_token() {
        let client = ApiClient::new("http://localhost:8000")
            .unwrap()
            .with_token("access123".to_string());

        let headers = client.auth_headers().unwrap();
        assert_eq!(
            headers.get(header::AUTHORIZATION).unwrap(),
            "Bearer access123"
        );
    }

    #[test]
    fn auth_headers_empty_without_token() {
        let client = ApiClient::new("http://localhost:8000").unwrap();
        assert!(client.auth_headers().unwrap().is_empty());
    }

    #[test]
    fn trailing_slash_in_base_url_is_normalized() {
        let client = ApiClient::new("http://localhost:8000/").unwrap();
        assert_eq!(client.url("/token/"), "http://localhost:8000/token/");
    }

    #[tokio::test]
    async fn login_posts_credentials_and_parses_pair() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token/"))
            .and(body_json(serde_json::json!({
                "username": "alice",
                "password": "hunter2"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access": "access123",
                "refresh": "refresh456"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let pair = client.login("alice", "hunter2").await.unwrap();

        assert_eq!(pair.access, "access123");
        assert_eq!(pair.refresh, "refresh456");
    }

    #[tokio::test]
    async fn login_with_bad_credentials_is_unauthorized() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token/"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "detail": "No active account found with the given credentials"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let err = client.login("alice", "wrong").await.unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn register_returns_token_pair_on_created() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/register/"))
            .and(body_json(serde_json::json!({
                "username": "bob",
                "email": "bob@example.com",
                "password": "hunter2"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "access": "access789",
                "refresh": "refresh000"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let pair = client
            .register("bob", "bob@example.com", "hunter2")
            .await
            .unwrap();

        assert_eq!(pair.access, "access789");
        assert_eq!(pair.refresh, "refresh000");
    }

    #[tokio::test]
    async fn register_duplicate_username_is_validation_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/register/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "username": ["A user with that username already exists."]
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let err = client
            .register("alice", "alice@example.com", "hunter2")
            .await
            .unwrap_err();

        match err {
            ApiError::ValidationFailed(body) => assert!(body.contains("already exists")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn refresh_exchanges_token_for_new_access() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token/refresh/"))
            .and(body_json(serde_json::json!({ "refresh": "refresh456" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access": "access-renewed"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let access = client.refresh("refresh456").await.unwrap();

        assert_eq!(access, "access-renewed");
    }

    #[tokio::test]
    async fn expired_refresh_token_is_unauthorized() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token/refresh/"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "detail": "Token is invalid or expired",
                "code": "token_not_valid"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let err = client.refresh("stale").await.unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized));
    }
}
