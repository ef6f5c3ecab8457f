//! HTTP client for Catalyst Center REST endpoints.
//!
//! [`CatalystClient`] wraps `reqwest::Client` and provides one method per
//! controller endpoint the tools need. All responses are returned as
//! `serde_json::Value`; shaping into records happens in the query layer.
//!
//! ## Authentication
//!
//! A token is requested from `/dna/system/api/v1/auth/token` with HTTP basic
//! auth on first use, cached, and sent as `X-Auth-Token`. A `401` drops the
//! cached token and the request is retried once.
//!
//! ## Error handling
//!
//! Non-2xx responses are parsed for an error message in the JSON body. If
//! parsing fails, the raw response body is returned as the error message.
//! `204 No Content` and empty bodies come back as `Value::Null`.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::ControllerConfig;

const AUTH_PATH: &str = "/dna/system/api/v1/auth/token";
const DEVICES_PATH: &str = "/dna/intent/api/v1/network-device";
const COMPLIANCE_PATH: &str = "/dna/intent/api/v1/compliance";
const CLIENT_HEALTH_PATH: &str = "/dna/intent/api/v1/client-health";
const FABRIC_SITES_PATH: &str = "/dna/intent/api/v1/sda/fabricSites";

/// HTTP client for a single Catalyst Center cluster.
pub struct CatalystClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    token: Mutex<Option<String>>,
}

impl CatalystClient {
    /// Build the client. The HTTP connection pool lives as long as the client.
    pub fn new(config: &ControllerConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ClientError::Request)?;
        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            token: Mutex::new(None),
        })
    }

    /// The controller's base URL (without trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /network-device` — full device inventory.
    pub async fn device_list(&self) -> Result<Value, ClientError> {
        self.get(DEVICES_PATH, &[]).await
    }

    /// `GET /compliance` — per-device compliance status.
    pub async fn device_compliance(&self) -> Result<Value, ClientError> {
        self.get(COMPLIANCE_PATH, &[]).await
    }

    /// `GET /client-health` — overall client health at `timestamp_ms`.
    pub async fn client_health(&self, timestamp_ms: i64) -> Result<Value, ClientError> {
        self.get(CLIENT_HEALTH_PATH, &[("timestamp", timestamp_ms.to_string())])
            .await
    }

    /// `GET /sda/fabricSites` — SDA fabric sites.
    pub async fn fabric_sites(&self) -> Result<Value, ClientError> {
        self.get(FABRIC_SITES_PATH, &[]).await
    }

    /// `GET /network-device/:id/config` — running configuration, or the
    /// archived snapshot at `timestamp_ms` when given.
    pub async fn device_config(
        &self,
        device_id: &str,
        timestamp_ms: Option<i64>,
    ) -> Result<Value, ClientError> {
        let path = format!("{}/{}/config", DEVICES_PATH, device_id);
        let query: Vec<(&str, String)> = timestamp_ms
            .map(|ts| vec![("timestamp", ts.to_string())])
            .unwrap_or_default();
        self.get(&path, &query).await
    }

    /// Authenticated GET with a single retry on an expired token.
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ClientError> {
        let token = self.token().await?;
        let resp = self.send_get(path, query, &token).await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Self::handle_response(resp).await;
        }

        debug!(path, "token rejected, re-authenticating");
        self.token.lock().await.take();
        let token = self.token().await?;
        let resp = self.send_get(path, query, &token).await?;
        Self::handle_response(resp).await
    }

    async fn send_get(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: &str,
    ) -> Result<reqwest::Response, ClientError> {
        self.http
            .get(format!("{}{}", self.base_url, path))
            .header("X-Auth-Token", token)
            .query(query)
            .send()
            .await
            .map_err(ClientError::Request)
    }

    /// Cached token, requesting a new one if none is held.
    async fn token(&self) -> Result<String, ClientError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        let resp = self
            .http
            .post(format!("{}{}", self.base_url, AUTH_PATH))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(ClientError::Request)?;
        let body = Self::handle_response(resp)
            .await
            .map_err(|e| ClientError::Auth(e.to_string()))?;
        let token = body
            .get("Token")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::Auth("no Token in auth response".into()))?
            .to_string();

        debug!(base_url = %self.base_url, "obtained controller token");
        *cached = Some(token.clone());
        Ok(token)
    }

    /// Parse an HTTP response — returns the JSON body on success, or a
    /// [`ClientError`] with the error message on failure.
    async fn handle_response(resp: reqwest::Response) -> Result<Value, ClientError> {
        let status = resp.status();
        let body = resp.text().await.map_err(ClientError::Request)?;

        if status.is_success() {
            if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_str(&body)
                .map_err(|e| ClientError::Protocol(format!("Invalid JSON from controller: {}", e)))
        } else {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| error_message(&v))
                .unwrap_or(body);
            Err(ClientError::Controller {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Catalyst Center reports errors under a few different keys depending on
/// the API family.
fn error_message(body: &Value) -> Option<String> {
    body.get("message")
        .or_else(|| body.get("error"))
        .or_else(|| body.pointer("/response/message"))
        .or_else(|| body.pointer("/response/detail"))
        .and_then(Value::as_str)
        .map(String::from)
}

/// Errors returned by [`CatalystClient`] methods.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP transport error (connection refused, timeout, DNS failure, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[source] reqwest::Error),
    /// The controller returned a non-2xx HTTP status.
    #[error("controller error (HTTP {status}): {message}")]
    Controller { status: u16, message: String },
    /// The response body was not valid JSON.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// Token request failed.
    #[error("authentication failed: {0}")]
    Auth(String),
}

impl ClientError {
    /// Returns `true` if the error is an HTTP 404 Not Found response.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Controller { status: 404, .. })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{basic_auth, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn test_config(url: &str) -> ControllerConfig {
        ControllerConfig {
            url: url.to_string(),
            username: "admin".into(),
            password: "C1sco12345".into(),
            verify_tls: false,
            timeout_secs: 5,
            log_level: "info".into(),
        }
    }

    /// Mock controller with the token endpoint mounted.
    pub(crate) async fn mock_controller() -> (MockServer, CatalystClient) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(AUTH_PATH))
            .and(basic_auth("admin", "C1sco12345"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Token": "tok-1"})))
            .mount(&server)
            .await;
        let client = CatalystClient::new(&test_config(&server.uri())).unwrap();
        (server, client)
    }

    #[tokio::test]
    async fn sends_token_header() {
        let (server, client) = mock_controller().await;
        Mock::given(method("GET"))
            .and(path(DEVICES_PATH))
            .and(header("X-Auth-Token", "tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": []})))
            .expect(1)
            .mount(&server)
            .await;

        let body = client.device_list().await.unwrap();
        assert_eq!(body, json!({"response": []}));
    }

    #[tokio::test]
    async fn token_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(AUTH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Token": "t"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(FABRIC_SITES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = CatalystClient::new(&test_config(&server.uri())).unwrap();
        client.fabric_sites().await.unwrap();
        client.fabric_sites().await.unwrap();
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(AUTH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Token": "t"})))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(DEVICES_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(DEVICES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = CatalystClient::new(&test_config(&server.uri())).unwrap();
        let body = client.device_list().await.unwrap();
        assert_eq!(body, json!({"response": []}));
    }

    #[tokio::test]
    async fn no_content_is_null() {
        let (server, client) = mock_controller().await;
        Mock::given(method("GET"))
            .and(path(COMPLIANCE_PATH))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        assert_eq!(client.device_compliance().await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn config_snapshot_passes_timestamp() {
        let (server, client) = mock_controller().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/u1/config", DEVICES_PATH)))
            .and(query_param("timestamp", "60000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "old"})))
            .mount(&server)
            .await;

        let body = client.device_config("u1", Some(60_000)).await.unwrap();
        assert_eq!(body["response"], "old");
    }

    #[tokio::test]
    async fn error_body_message_is_surfaced() {
        let (server, client) = mock_controller().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/nope/config", DEVICES_PATH)))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"response": {"message": "device not found"}})),
            )
            .mount(&server)
            .await;

        let err = client.device_config("nope", None).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "controller error (HTTP 404): device not found"
        );
    }

    #[tokio::test]
    async fn invalid_json_is_protocol_error() {
        let (server, client) = mock_controller().await;
        Mock::given(method("GET"))
            .and(path(DEVICES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client.device_list().await.unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
    }

    #[tokio::test]
    async fn rejected_credentials_are_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(AUTH_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let client = CatalystClient::new(&test_config(&server.uri())).unwrap();
        let err = client.device_list().await.unwrap_err();
        assert!(matches!(err, ClientError::Auth(_)));
    }
}
