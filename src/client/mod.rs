//! Outbound HTTP client. Requests always receive a [`ClientContext`] so the
//! `X-Client-Package` tag travels with the request instead of living in a
//! shared default. Errors are sanitised the same way for every call: bodies are
//! trimmed and truncated before they reach a caller.

mod context;

pub use self::context::{CLIENT_PACKAGE_HEADER, ClientContext};

use crate::APP_USER_AGENT;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

/// Default request timeout applied to every call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Maximum number of error body characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Response error: {0}")]
    Parse(String),
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|err| ClientError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Starts a request against `path`, tagged with the context's headers.
    #[must_use]
    pub fn request(&self, method: Method, path: &str, context: &ClientContext) -> RequestBuilder {
        let url = build_url_with_base(&self.base_url, path);
        let mut builder = self.http.request(method, url);
        for (name, value) in context.headers() {
            builder = builder.header(name, value);
        }
        builder
    }

    /// # Errors
    /// Returns an error on network failure, non-success status or an
    /// undecodable body.
    #[instrument(skip(self, context))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        context: &ClientContext,
    ) -> Result<T, ClientError> {
        let response = self
            .request(Method::GET, path, context)
            .send()
            .await
            .map_err(map_request_error)?;

        handle_json_response(response).await
    }

    /// # Errors
    /// Returns an error on network failure, non-success status or an
    /// undecodable body.
    #[instrument(skip(self, body, context))]
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        context: &ClientContext,
    ) -> Result<T, ClientError> {
        let response = self
            .request(Method::POST, path, context)
            .json(body)
            .send()
            .await
            .map_err(map_request_error)?;

        handle_json_response(response).await
    }
}

/// Builds a URL from an explicit base URL and the provided path.
fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

fn map_request_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout("Request timed out. Please try again.".to_string())
    } else {
        ClientError::Network(format!("Unable to reach the server: {err}"))
    }
}

async fn handle_json_response<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| ClientError::Parse(format!("Failed to decode response: {err}")))
    } else {
        let body = response.text().await.unwrap_or_default();
        debug!("Request failed with status {status}");
        Err(ClientError::Http {
            status: status.as_u16(),
            message: sanitize_body(&body),
        })
    }
}

fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use axum::{
        Json, Router,
        http::{HeaderMap, StatusCode},
        routing::get,
    };
    use serde::Deserialize;
    use serde_json::{Value, json};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Echo {
        client_package: Option<String>,
        body: Option<Value>,
    }

    fn client_package(headers: &HeaderMap) -> Option<String> {
        headers
            .get(CLIENT_PACKAGE_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string)
    }

    /// Serves a small echo API on an ephemeral local port and returns its base URL.
    async fn spawn_server() -> Result<String> {
        let app = Router::new()
            .route(
                "/echo",
                get(|headers: HeaderMap| async move {
                    Json(json!({"client_package": client_package(&headers), "body": null}))
                })
                .post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                    Json(json!({"client_package": client_package(&headers), "body": body}))
                }),
            )
            .route(
                "/fail",
                get(|| async { (StatusCode::BAD_REQUEST, format!("  {}  ", "e".repeat(500))) }),
            )
            .route("/garbage", get(|| async { "not json" }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(format!("http://{addr}"))
    }

    #[test]
    fn build_url_joins_base_and_path() {
        assert_eq!(
            build_url_with_base("https://api.ente.io/", "/users/details"),
            "https://api.ente.io/users/details"
        );
        assert_eq!(build_url_with_base("  ", "/users"), "/users");
    }

    #[test]
    fn sanitize_body_trims_and_truncates() {
        assert_eq!(sanitize_body("   "), "Request failed.");
        assert_eq!(sanitize_body("  nope \n"), "nope");
        assert_eq!(sanitize_body(&"x".repeat(500)).len(), MAX_ERROR_CHARS);
    }

    #[tokio::test]
    async fn request_carries_client_package_when_set() -> Result<()> {
        let client = ApiClient::new("https://api.ente.io")?;
        let context = ClientContext::default().with_client_package("com.example.app");

        let request = client
            .request(Method::GET, "/passkeys", &context)
            .build()?;

        assert_eq!(request.url().as_str(), "https://api.ente.io/passkeys");
        assert_eq!(
            request
                .headers()
                .get(CLIENT_PACKAGE_HEADER)
                .and_then(|value| value.to_str().ok()),
            Some("com.example.app")
        );
        Ok(())
    }

    #[tokio::test]
    async fn contexts_do_not_leak_between_requests() -> Result<()> {
        let client = ApiClient::new("https://api.ente.io")?;
        let tagged = ClientContext::default().with_client_package("com.example.app");

        let first = client.request(Method::GET, "/a", &tagged).build()?;
        let second = client
            .request(Method::GET, "/b", &ClientContext::default())
            .build()?;

        assert!(first.headers().contains_key(CLIENT_PACKAGE_HEADER));
        assert!(!second.headers().contains_key(CLIENT_PACKAGE_HEADER));
        Ok(())
    }

    #[tokio::test]
    async fn get_json_decodes_and_threads_context() -> Result<()> {
        let client = ApiClient::new(&spawn_server().await?)?;
        let context = ClientContext::default().with_client_package("io.ente.auth");

        let tagged: Echo = client.get_json("/echo", &context).await?;
        assert_eq!(tagged.client_package.as_deref(), Some("io.ente.auth"));

        let untagged: Echo = client.get_json("/echo", &ClientContext::default()).await?;
        assert_eq!(untagged.client_package, None);
        Ok(())
    }

    #[tokio::test]
    async fn post_json_sends_body_and_context() -> Result<()> {
        let client = ApiClient::new(&spawn_server().await?)?;
        let context = ClientContext::default().with_client_package("io.ente.photos");

        let echo: Echo = client
            .post_json("/echo", &json!({"name": "passkey"}), &context)
            .await?;
        assert_eq!(
            echo,
            Echo {
                client_package: Some("io.ente.photos".to_string()),
                body: Some(json!({"name": "passkey"})),
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn error_status_carries_sanitised_body() -> Result<()> {
        let client = ApiClient::new(&spawn_server().await?)?;

        let result: Result<Value, ClientError> =
            client.get_json("/fail", &ClientContext::default()).await;
        match result {
            Err(ClientError::Http { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "e".repeat(MAX_ERROR_CHARS));
            }
            other => panic!("expected an http error, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn undecodable_body_is_a_parse_error() -> Result<()> {
        let client = ApiClient::new(&spawn_server().await?)?;

        let result: Result<Value, ClientError> =
            client.get_json("/garbage", &ClientContext::default()).await;
        assert!(matches!(result, Err(ClientError::Parse(_))));
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() -> Result<()> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        drop(listener);

        let client = ApiClient::new(&format!("http://{addr}"))?;
        let result: Result<Value, ClientError> =
            client.get_json("/echo", &ClientContext::default()).await;
        assert!(matches!(result, Err(ClientError::Network(_))));
        Ok(())
    }
}
