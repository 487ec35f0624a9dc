//! Bearer-authenticated HTTP transport
//!
//! A non-2xx status is returned as data. Only failures to complete the
//! exchange (connect, timeout, TLS) surface as `SyncError::Transport`.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::multipart::Form;
use reqwest::{Client, Method, Proxy, RequestBuilder};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;
use streamsync_core::models::ResponseEnvelope;
use streamsync_core::{StreamConfig, SyncError, SyncResult};

/// Request payload
pub enum RequestBody {
    Empty,
    Bytes(Vec<u8>),
    Multipart(Form),
}

/// Status, headers and body of a completed exchange
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Header value as text; `None` when absent or not valid visible ASCII
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn envelope(&self) -> ResponseEnvelope {
        ResponseEnvelope::parse(self.status, &self.body)
    }
}

#[derive(Clone)]
pub struct TransportClient {
    client: Client,
    api_token: String,
    account_id: String,
    api_endpoint: String,
}

impl Debug for TransportClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("TransportClient")
            .field("account_id", &self.account_id)
            .field("api_endpoint", &self.api_endpoint)
            .finish()
    }
}

impl TransportClient {
    pub fn new(config: &StreamConfig) -> SyncResult<Self> {
        let mut builder =
            Client::builder().timeout(Duration::from_secs(config.request_timeout_secs));

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                SyncError::Configuration(format!("Invalid proxy URL {}: {}", proxy_url, e))
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            api_token: config.api_token.trim().to_string(),
            account_id: config.account_id.trim().to_string(),
            api_endpoint: config.api_endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Both the token and the account identifier are configured
    pub fn is_ready(&self) -> bool {
        !self.api_token.is_empty() && !self.account_id.is_empty()
    }

    pub fn ensure_ready(&self) -> SyncResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(SyncError::Configuration(
                "No API token or account ID configured for the streaming provider".to_string(),
            ))
        }
    }

    /// `{endpoint}/accounts/{account}/stream[/{id}]`
    pub fn stream_url(&self, id: &str) -> String {
        let base = format!("{}/accounts/{}/stream", self.api_endpoint, self.account_id);
        if id.is_empty() {
            base
        } else {
            format!("{}/{}", base, id)
        }
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", format!("Bearer {}", self.api_token))
    }

    pub async fn request(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: RequestBody,
    ) -> SyncResult<RawResponse> {
        let mut request = self
            .apply_auth(self.client.request(method.clone(), url))
            .headers(headers);

        request = match body {
            RequestBody::Empty => request,
            RequestBody::Bytes(bytes) => request.body(bytes),
            RequestBody::Multipart(form) => request.multipart(form),
        };

        let response = request.send().await.map_err(|e| {
            tracing::error!(method = %method, url = %url, error = %e, "Provider request failed");
            SyncError::from(e)
        })?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        tracing::debug!(
            method = %method,
            url = %url,
            status = status,
            body_bytes = body.len(),
            "Provider request completed"
        );

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }

    pub async fn get(&self, url: &str) -> SyncResult<RawResponse> {
        self.request(Method::GET, url, HeaderMap::new(), RequestBody::Empty)
            .await
    }

    pub async fn delete(&self, url: &str) -> SyncResult<RawResponse> {
        self.request(Method::DELETE, url, HeaderMap::new(), RequestBody::Empty)
            .await
    }

    pub async fn head(&self, url: &str, headers: HeaderMap) -> SyncResult<RawResponse> {
        self.request(Method::HEAD, url, headers, RequestBody::Empty)
            .await
    }

    pub async fn post(
        &self,
        url: &str,
        headers: HeaderMap,
        body: RequestBody,
    ) -> SyncResult<RawResponse> {
        self.request(Method::POST, url, headers, body).await
    }

    pub async fn patch(
        &self,
        url: &str,
        headers: HeaderMap,
        body: RequestBody,
    ) -> SyncResult<RawResponse> {
        self.request(Method::PATCH, url, headers, body).await
    }
}
