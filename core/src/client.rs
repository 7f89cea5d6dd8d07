//! Typed request dispatcher.
//!
//! # Design
//! `Client` holds a base URL and a `Transport` and carries no mutable state
//! between calls, so clones can be shared freely and calls may run
//! concurrently. There is one operation per HTTP verb, each bound to the verb
//! trait of its endpoint descriptor, plus a `*_with` twin that runs a
//! validator over the decoded payload instead of trusting it.
//!
//! Every operation goes through `dispatch`: encode params, send, reject
//! non-2xx statuses with the status text, decode by content type, then
//! validate or trust. Each stage fails with a `RequestError`; validator
//! rejections go through `ensure_error`.

use serde::Serialize;
use tracing::debug;

use crate::config::{ClientConfig, ConfigError};
use crate::endpoint::{DeleteEndpoint, GetEndpoint, PatchEndpoint, PostEndpoint, PutEndpoint};
use crate::error::{ensure_error, RequestError};
use crate::http::{HttpMethod, HttpRequest, Payload};
use crate::query::{self, ToQuery};
use crate::transport::{ReqwestTransport, RequestOptions, Transport};
use crate::validate::{decode_as, Validator};

/// Client for a catalog of typed endpoints.
#[derive(Debug, Clone)]
pub struct Client<T = ReqwestTransport> {
    base_url: String,
    transport: T,
}

impl Client<ReqwestTransport> {
    /// Client for `base_url` with default settings.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Self::from_config(&ClientConfig::default().with_base_url(base_url))
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        let base_url = config.normalized_base_url()?;
        Ok(Self::with_transport(&base_url, ReqwestTransport::from_config(config)?))
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(base_url: &str, transport: T) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the plain-data request for a call without sending it.
    pub fn build_request<P, B>(
        &self,
        method: HttpMethod,
        path: &str,
        params: &P,
        body: Option<&B>,
    ) -> Result<HttpRequest, RequestError>
    where
        P: ToQuery + ?Sized,
        B: Serialize + ?Sized,
    {
        let query = query::encode(Some(&params.to_query()));
        let url = format!("{}{path}{query}", self.base_url);
        let (headers, body) = match body {
            Some(body) if method.has_body() => {
                let json = serde_json::to_string(body).map_err(|e| RequestError::Serialize {
                    message: e.to_string(),
                })?;
                (
                    vec![("content-type".to_string(), "application/json".to_string())],
                    Some(json),
                )
            }
            _ => (Vec::new(), None),
        };
        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    pub async fn get<E: GetEndpoint>(
        &self,
        params: &E::Params,
        options: &RequestOptions,
    ) -> Result<E::Response, RequestError> {
        self.dispatch(HttpMethod::Get, E::PATH, params, None::<&()>, options, decode_as)
            .await
    }

    pub async fn get_with<E, V>(
        &self,
        params: &E::Params,
        validator: &V,
        options: &RequestOptions,
    ) -> Result<E::Response, RequestError>
    where
        E: GetEndpoint,
        V: Validator<E::Response> + ?Sized,
    {
        self.dispatch(HttpMethod::Get, E::PATH, params, None::<&()>, options, |payload| {
            validator.validate(payload).map_err(ensure_error)
        })
        .await
    }

    pub async fn post<E: PostEndpoint>(
        &self,
        params: &E::Params,
        body: &E::Body,
        options: &RequestOptions,
    ) -> Result<E::Response, RequestError> {
        self.dispatch(HttpMethod::Post, E::PATH, params, Some(body), options, decode_as)
            .await
    }

    pub async fn post_with<E, V>(
        &self,
        params: &E::Params,
        body: &E::Body,
        validator: &V,
        options: &RequestOptions,
    ) -> Result<E::Response, RequestError>
    where
        E: PostEndpoint,
        V: Validator<E::Response> + ?Sized,
    {
        self.dispatch(HttpMethod::Post, E::PATH, params, Some(body), options, |payload| {
            validator.validate(payload).map_err(ensure_error)
        })
        .await
    }

    pub async fn put<E: PutEndpoint>(
        &self,
        params: &E::Params,
        body: &E::Body,
        options: &RequestOptions,
    ) -> Result<E::Response, RequestError> {
        self.dispatch(HttpMethod::Put, E::PATH, params, Some(body), options, decode_as)
            .await
    }

    pub async fn put_with<E, V>(
        &self,
        params: &E::Params,
        body: &E::Body,
        validator: &V,
        options: &RequestOptions,
    ) -> Result<E::Response, RequestError>
    where
        E: PutEndpoint,
        V: Validator<E::Response> + ?Sized,
    {
        self.dispatch(HttpMethod::Put, E::PATH, params, Some(body), options, |payload| {
            validator.validate(payload).map_err(ensure_error)
        })
        .await
    }

    pub async fn patch<E: PatchEndpoint>(
        &self,
        params: &E::Params,
        body: &E::Body,
        options: &RequestOptions,
    ) -> Result<E::Response, RequestError> {
        self.dispatch(HttpMethod::Patch, E::PATH, params, Some(body), options, decode_as)
            .await
    }

    pub async fn patch_with<E, V>(
        &self,
        params: &E::Params,
        body: &E::Body,
        validator: &V,
        options: &RequestOptions,
    ) -> Result<E::Response, RequestError>
    where
        E: PatchEndpoint,
        V: Validator<E::Response> + ?Sized,
    {
        self.dispatch(HttpMethod::Patch, E::PATH, params, Some(body), options, |payload| {
            validator.validate(payload).map_err(ensure_error)
        })
        .await
    }

    pub async fn delete<E: DeleteEndpoint>(
        &self,
        params: &E::Params,
        options: &RequestOptions,
    ) -> Result<E::Response, RequestError> {
        self.dispatch(HttpMethod::Delete, E::PATH, params, None::<&()>, options, decode_as)
            .await
    }

    pub async fn delete_with<E, V>(
        &self,
        params: &E::Params,
        validator: &V,
        options: &RequestOptions,
    ) -> Result<E::Response, RequestError>
    where
        E: DeleteEndpoint,
        V: Validator<E::Response> + ?Sized,
    {
        self.dispatch(HttpMethod::Delete, E::PATH, params, None::<&()>, options, |payload| {
            validator.validate(payload).map_err(ensure_error)
        })
        .await
    }

    async fn dispatch<P, B, R, F>(
        &self,
        method: HttpMethod,
        path: &str,
        params: &P,
        body: Option<&B>,
        options: &RequestOptions,
        finish: F,
    ) -> Result<R, RequestError>
    where
        P: ToQuery + ?Sized,
        B: Serialize + ?Sized,
        F: FnOnce(Payload) -> Result<R, RequestError>,
    {
        let request = self.build_request(method, path, params, body);
        let url = match &request {
            Ok(request) => request.url.clone(),
            Err(_) => format!("{}{path}", self.base_url),
        };
        debug!(target: "request", %method, %url, ">>");

        let result = self.exchange(request, options, finish).await;

        match &result {
            Ok(_) => debug!(target: "request", %method, %url, "<<"),
            Err(err) => debug!(target: "request", %method, %url, kind = ?err.kind(), error = %err, "<< failed"),
        }
        result
    }

    async fn exchange<R, F>(
        &self,
        request: Result<HttpRequest, RequestError>,
        options: &RequestOptions,
        finish: F,
    ) -> Result<R, RequestError>
    where
        F: FnOnce(Payload) -> Result<R, RequestError>,
    {
        let response = self.transport.execute(request?, options).await?;
        if !response.is_success() {
            return Err(RequestError::Status {
                status: response.status,
                status_text: response.status_text,
            });
        }
        let content_type = response.content_type().map(str::to_owned);
        let payload = Payload::decode(content_type.as_deref(), response.body)?;
        finish(payload)
    }
}
