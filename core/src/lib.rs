//! Typed request layer for the `/rest` API.
//!
//! # Overview
//! Call sites address endpoints through descriptor types, so the params, body
//! and response of every call are checked at compile time. The `Client`
//! encodes params into the query string, sends the request through a
//! `Transport`, decodes the response by content type, and either trusts the
//! payload or runs a validator over it. Every failure comes back as one
//! `RequestError`.
//!
//! # Design
//! - `Client` is stateless apart from its base URL and transport.
//! - The network is behind the `Transport` trait; `ReqwestTransport` is the
//!   real one and `testing::ScriptedTransport` scripts responses.
//! - Query encoding, content-type classification and error normalization are
//!   pure functions, testable without I/O.
//! - Body types are defined independently from the mock-server crate;
//!   integration tests catch schema drift.

pub mod api;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod query;
pub mod testing;
pub mod transport;
pub mod types;
pub mod validate;

pub use client::Client;
pub use config::{ClientConfig, ConfigError};
pub use endpoint::{
    check_unique, DeleteEndpoint, Endpoint, EndpointInfo, GetEndpoint, PatchEndpoint,
    PostEndpoint, PutEndpoint,
};
pub use error::{ensure_error, ErrorKind, RequestError, Thrown};
pub use http::{ContentKind, HttpMethod, HttpRequest, HttpResponse, Payload};
pub use query::{QueryParams, QueryValue, ToQuery};
pub use transport::{ReqwestTransport, RequestOptions, Transport};
pub use validate::{decode_as, Schema, Validator};
