//! Scripted `Transport` for exercising a `Client` without a network.

use std::sync::Mutex;

use bytes::Bytes;
use serde_json::Value;

use crate::error::RequestError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{RequestOptions, Transport};

#[derive(Debug, Clone)]
enum Outcome {
    Respond(HttpResponse),
    Fail(String),
}

/// Answers every request with the same scripted outcome and records what it
/// was sent.
#[derive(Debug)]
pub struct ScriptedTransport {
    outcome: Outcome,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new(response: HttpResponse) -> Self {
        Self {
            outcome: Outcome::Respond(response),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Respond with `status`, its canonical reason and a JSON body.
    pub fn json(status: u16, body: Value) -> Self {
        Self::new(HttpResponse {
            status,
            status_text: canonical_reason(status),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Bytes::from(body.to_string()),
        })
    }

    /// Respond with an arbitrary content type and raw body.
    pub fn raw(status: u16, content_type: Option<&str>, body: impl Into<Bytes>) -> Self {
        Self::new(HttpResponse {
            status,
            status_text: canonical_reason(status),
            headers: content_type
                .map(|ct| vec![("content-type".to_string(), ct.to_string())])
                .unwrap_or_default(),
            body: body.into(),
        })
    }

    /// Respond with `status` and a custom status text.
    pub fn status(status: u16, status_text: &str) -> Self {
        Self::new(HttpResponse {
            status,
            status_text: status_text.to_string(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Bytes::from_static(br#"{"error":"scripted"}"#),
        })
    }

    /// Fail every request at the transport level.
    pub fn unreachable(message: &str) -> Self {
        Self {
            outcome: Outcome::Fail(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of requests that reached the transport.
    pub fn calls(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().ok().and_then(|r| r.last().cloned())
    }
}

impl Transport for ScriptedTransport {
    async fn execute(
        &self,
        request: HttpRequest,
        options: &RequestOptions,
    ) -> Result<HttpResponse, RequestError> {
        if options.signal.as_ref().is_some_and(|t| t.is_cancelled()) {
            return Err(RequestError::Aborted);
        }
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        match &self.outcome {
            Outcome::Respond(response) => Ok(response.clone()),
            Outcome::Fail(message) => Err(RequestError::Transport {
                message: message.clone(),
                source: None,
            }),
        }
    }
}

fn canonical_reason(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or_default()
        .to_string()
}
