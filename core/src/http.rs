//! HTTP data types exchanged with a `Transport`, and response classification.
//!
//! # Design
//! Requests and responses are plain data. The dispatcher builds an
//! `HttpRequest`, hands it to a `Transport`, and turns the returned
//! `HttpResponse` into a `Payload` by looking only at the declared content
//! type. Classification is a pure function of the `content-type` string so it
//! can be tested without any I/O.

use std::fmt;

use bytes::Bytes;
use serde_json::Value;

use crate::error::RequestError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether requests with this method carry a JSON body.
    pub fn has_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl HttpResponse {
    /// First header with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// How a response body is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Text,
    Binary,
}

impl ContentKind {
    /// Classify a `content-type` header value.
    ///
    /// Only the media type is considered; parameters such as `charset` are
    /// ignored and matching is case-insensitive.
    pub fn classify(content_type: Option<&str>) -> Self {
        let Some(raw) = content_type else {
            return ContentKind::Binary;
        };
        let essence = raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        if essence == "application/json" {
            ContentKind::Json
        } else if essence.starts_with("text/") {
            ContentKind::Text
        } else {
            ContentKind::Binary
        }
    }
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
    Binary(Bytes),
}

impl Payload {
    /// Decode a body according to its content type.
    pub fn decode(content_type: Option<&str>, body: Bytes) -> Result<Self, RequestError> {
        match ContentKind::classify(content_type) {
            ContentKind::Json => serde_json::from_slice(&body)
                .map(Payload::Json)
                .map_err(RequestError::decode),
            ContentKind::Text => Ok(Payload::Text(String::from_utf8_lossy(&body).into_owned())),
            ContentKind::Binary => Ok(Payload::Binary(body)),
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            Payload::Json(_) => ContentKind::Json,
            Payload::Text(_) => ContentKind::Text,
            Payload::Binary(_) => ContentKind::Binary,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }
}
