//! The network boundary.
//!
//! # Design
//! `Transport` is the fetch-like primitive the dispatcher consumes: it takes
//! an `HttpRequest` plus the caller's `RequestOptions` and returns an
//! `HttpResponse` or a `RequestError`. A non-2xx status is a normal response
//! at this layer; only the dispatcher decides it is a failure.
//!
//! `ReqwestTransport` is the production implementation. Tests substitute their
//! own implementations to script responses.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::{ClientConfig, ConfigError};
use crate::error::RequestError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Per-call transport options. Method and body are owned by the dispatcher
/// and cannot be set here.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Extra request headers, sent after the dispatcher's own.
    pub headers: Vec<(String, String)>,
    /// Overall deadline for this call.
    pub timeout: Option<Duration>,
    /// Cancels the call when triggered.
    pub signal: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn signal(mut self, token: CancellationToken) -> Self {
        self.signal = Some(token);
        self
    }
}

/// Executes plain-data HTTP requests.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: HttpRequest,
        options: &RequestOptions,
    ) -> impl Future<Output = Result<HttpResponse, RequestError>> + Send;
}

/// `Transport` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::new(builder.build().map_err(ConfigError::Client)?))
    }

    async fn send(&self, request: HttpRequest, options: &RequestOptions) -> Result<HttpResponse, RequestError> {
        let mut builder = self.client.request(reqwest_method(request.method), &request.url);
        for (name, value) in request.headers.iter().chain(&options.headers) {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(RequestError::transport)?;
        let status = response.status();
        let status_text = reason_phrase(&response);
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(RequestError::transport)?;

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text,
            headers,
            body,
        })
    }
}

impl Transport for ReqwestTransport {
    fn execute(
        &self,
        request: HttpRequest,
        options: &RequestOptions,
    ) -> impl Future<Output = Result<HttpResponse, RequestError>> + Send {
        async move {
            match &options.signal {
                Some(token) if token.is_cancelled() => Err(RequestError::Aborted),
                Some(token) => token
                    .run_until_cancelled(self.send(request, options))
                    .await
                    .unwrap_or(Err(RequestError::Aborted)),
                None => self.send(request, options).await,
            }
        }
    }
}

/// The reason phrase the server sent, or the canonical one for the status
/// when the server sent none (HTTP/2) or the standard one.
fn reason_phrase(response: &reqwest::Response) -> String {
    match response.extensions().get::<hyper::ext::ReasonPhrase>() {
        Some(reason) => String::from_utf8_lossy(reason.as_bytes()).into_owned(),
        None => response
            .status()
            .canonical_reason()
            .unwrap_or_default()
            .to_string(),
    }
}

fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}
