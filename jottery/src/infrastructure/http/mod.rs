// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! `reqwest`-backed implementation of
//! [`crate::application::sync_engine::SyncTransport`].
//!
//! This is the only module in the `jottery` crate that knows the sync
//! protocol runs over HTTP; the application layer only sees the trait.

use async_trait::async_trait;
use jottery_domain::error::JotteryError;
use jottery_domain::wire::{PullRequest, PullResponse, PushRequest, PushResponse, RegisterRequest, RegisterResponse, StatusResponse};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::application::sync_engine::SyncTransport;

/// Wraps a [`reqwest::Client`] configured with sane timeouts for a sync
/// endpoint that may be a slow mobile connection away.
pub struct HttpSyncTransport {
    client: Client,
}

impl HttpSyncTransport {
    pub fn new() -> Result<Self, JotteryError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| JotteryError::InternalError(format!("failed to build http client: {e}")))?;
        Ok(Self { client })
    }

    async fn post_json<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        url: &str,
        api_key: Option<&str>,
        body: &Req,
    ) -> Result<Resp, JotteryError> {
        let mut request = self.client.post(url).json(body);
        if let Some(key) = api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await.map_err(map_transport_error)?;
        Self::decode(response).await
    }

    async fn get_json<Resp: DeserializeOwned>(&self, url: &str, api_key: &str) -> Result<Resp, JotteryError> {
        let response = self.client.get(url).bearer_auth(api_key).send().await.map_err(map_transport_error)?;
        Self::decode(response).await
    }

    async fn decode<Resp: DeserializeOwned>(response: reqwest::Response) -> Result<Resp, JotteryError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(JotteryError::Unauthorized("server rejected the api key".to_string()));
        }
        if status == StatusCode::FORBIDDEN {
            return Err(JotteryError::Forbidden("server refused the request".to_string()));
        }
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(JotteryError::ProtocolError(format!("{status}: {body}")));
        }
        if status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(JotteryError::ServerError(format!("{status}: {body}")));
        }
        response.json().await.map_err(|e| JotteryError::ProtocolError(format!("malformed response body: {e}")))
    }
}

impl Default for HttpSyncTransport {
    fn default() -> Self {
        Self::new().expect("default reqwest client configuration is always valid")
    }
}

fn map_transport_error(err: reqwest::Error) -> JotteryError {
    if err.is_timeout() || err.is_connect() {
        JotteryError::NetworkError(err.to_string())
    } else {
        JotteryError::NetworkError(err.to_string())
    }
}

#[async_trait]
impl SyncTransport for HttpSyncTransport {
    async fn register(&self, endpoint: &str, request: RegisterRequest) -> Result<RegisterResponse, JotteryError> {
        let url = format!("{endpoint}/api/v1/auth/register");
        self.post_json(&url, None, &request).await
    }

    async fn status(&self, endpoint: &str, api_key: &str) -> Result<StatusResponse, JotteryError> {
        let url = format!("{endpoint}/api/v1/sync/status");
        self.get_json(&url, api_key).await
    }

    async fn push(&self, endpoint: &str, api_key: &str, request: PushRequest) -> Result<PushResponse, JotteryError> {
        let url = format!("{endpoint}/api/v1/sync/push");
        self.post_json(&url, Some(api_key), &request).await
    }

    async fn pull(&self, endpoint: &str, api_key: &str, request: PullRequest) -> Result<PullResponse, JotteryError> {
        let url = format!("{endpoint}/api/v1/sync/pull");
        self.post_json(&url, Some(api_key), &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jottery_domain::value_objects::ClientId;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn register_posts_to_the_auth_endpoint_and_decodes_the_response() {
        let server = MockServer::start().await;
        let response = RegisterResponse { api_key: "a".repeat(64), client_id: ClientId::new(), created_at: chrono::Utc::now() };
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/register"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response))
            .mount(&server)
            .await;

        let transport = HttpSyncTransport::new().unwrap();
        let result = transport
            .register(&server.uri(), RegisterRequest { device_name: "laptop".to_string(), device_type: jottery_domain::wire::DeviceType::Cli })
            .await
            .unwrap();

        assert_eq!(result.api_key, response.api_key);
    }

    #[tokio::test]
    async fn unauthorized_status_maps_to_an_unauthorized_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/sync/status"))
            .and(header("authorization", "Bearer badkey"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let transport = HttpSyncTransport::new().unwrap();
        let result = transport.status(&server.uri(), "badkey").await;
        assert!(matches!(result, Err(JotteryError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn server_error_status_maps_to_a_retryable_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/sync/status"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let transport = HttpSyncTransport::new().unwrap();
        let result = transport.status(&server.uri(), "anykey").await;
        match result {
            Err(JotteryError::ServerError(_)) => {}
            other => panic!("expected ServerError, got {other:?}"),
        }
    }
}
