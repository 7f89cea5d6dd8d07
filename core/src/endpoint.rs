//! Endpoint contracts.
//!
//! # Design
//! Each (verb, path) pair is described by its own zero-sized descriptor type.
//! `Endpoint` carries the path and the parameter and response types; one verb
//! trait per HTTP method marks which operation the descriptor may be used
//! with, and the body verbs add the request body type. Any crate can declare
//! more descriptors for its own endpoints by implementing these traits.
//!
//! The contract check is static: `Client::get::<GetUser>` only compiles when
//! `GetUser: GetEndpoint`, and the params, body and response types flow from
//! the descriptor. `EndpointInfo` tables give a runtime view of a catalog so
//! tests can assert no (verb, path) pair is declared twice.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::http::HttpMethod;
use crate::query::ToQuery;

/// The contract shared by every endpoint descriptor.
pub trait Endpoint {
    /// Endpoint key, appended to the client's base URL.
    const PATH: &'static str;

    type Params: ToQuery;

    type Response: DeserializeOwned;
}

pub trait GetEndpoint: Endpoint {}

pub trait DeleteEndpoint: Endpoint {}

pub trait PostEndpoint: Endpoint {
    type Body: Serialize;
}

pub trait PutEndpoint: Endpoint {
    type Body: Serialize;
}

pub trait PatchEndpoint: Endpoint {
    type Body: Serialize;
}

/// Runtime description of one descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointInfo {
    pub method: HttpMethod,
    pub path: &'static str,
    pub name: &'static str,
}

impl EndpointInfo {
    pub fn of<E: Endpoint>(method: HttpMethod) -> Self {
        EndpointInfo {
            method,
            path: E::PATH,
            name: short_type_name::<E>(),
        }
    }

    pub fn get<E: GetEndpoint>() -> Self {
        Self::of::<E>(HttpMethod::Get)
    }

    pub fn post<E: PostEndpoint>() -> Self {
        Self::of::<E>(HttpMethod::Post)
    }

    pub fn put<E: PutEndpoint>() -> Self {
        Self::of::<E>(HttpMethod::Put)
    }

    pub fn patch<E: PatchEndpoint>() -> Self {
        Self::of::<E>(HttpMethod::Patch)
    }

    pub fn delete<E: DeleteEndpoint>() -> Self {
        Self::of::<E>(HttpMethod::Delete)
    }
}

fn short_type_name<E>() -> &'static str {
    let full = std::any::type_name::<E>();
    full.rsplit("::").next().unwrap_or(full)
}

/// A (verb, path) pair declared by more than one descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{method} {path} is declared by both {first} and {second}")]
pub struct DuplicateEndpoint {
    pub method: HttpMethod,
    pub path: &'static str,
    pub first: &'static str,
    pub second: &'static str,
}

/// Check that every (verb, path) pair in a catalog is declared exactly once.
pub fn check_unique(table: &[EndpointInfo]) -> Result<(), DuplicateEndpoint> {
    for (i, a) in table.iter().enumerate() {
        if let Some(b) = table[i + 1..]
            .iter()
            .find(|b| b.method == a.method && b.path == a.path)
        {
            return Err(DuplicateEndpoint {
                method: a.method,
                path: a.path,
                first: a.name,
                second: b.name,
            });
        }
    }
    Ok(())
}
