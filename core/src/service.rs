//! The generic REST service: build a request, dispatch it through the
//! injected transport, check the status, decode the body.
//!
//! # Design
//! `ApiService` holds only immutable configuration (base URL, resource path,
//! collaborators, request options), so a single instance can serve any
//! number of concurrent calls; thread safety of the transport and serializer
//! is their own business. The blocking operations exist whenever the
//! transport implements `Transport`, the suspending ones whenever it
//! implements `AsyncTransport`. A transport implementing both gives one
//! service with both call shapes.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::entity::AttachResponse;
use crate::error::ApiError;
use crate::hooks::{DefaultHooks, ServiceHooks};
use crate::http::{ApiRequest, ApiResponse, HttpMethod, DEFAULT_CONTENT_TYPE};
use crate::serializer::{JsonSerializer, Serializer};
use crate::transport::{AsyncTransport, Transport};

/// Pass-through settings copied onto every request the service builds.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub content_type: String,
    pub timeout: Option<Duration>,
    pub allow_auto_redirect: bool,
    pub proxy: Option<Url>,
    pub headers: BTreeMap<String, String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            timeout: None,
            allow_auto_redirect: false,
            proxy: None,
            headers: BTreeMap::new(),
        }
    }
}

/// REST service over one resource path.
///
/// Every operation takes a `resource` appended to the service path (an
/// empty or blank resource addresses the path itself) and optional `data`:
/// the JSON body for POST, the query parameters for GET.
#[derive(Debug, Clone)]
pub struct ApiService<C, S = JsonSerializer, H = DefaultHooks> {
    base_url: Url,
    path: String,
    client: C,
    serializer: S,
    hooks: H,
    options: RequestOptions,
}

impl<C, S> ApiService<C, S, DefaultHooks> {
    pub fn new(base_url: Url, path: impl Into<String>, client: C, serializer: S) -> Self {
        Self {
            base_url,
            path: path.into(),
            client,
            serializer,
            hooks: DefaultHooks,
            options: RequestOptions::default(),
        }
    }
}

impl<C, S, H> ApiService<C, S, H> {
    pub fn with_hooks<H2: ServiceHooks>(self, hooks: H2) -> ApiService<C, S, H2> {
        ApiService {
            base_url: self.base_url,
            path: self.path,
            client: self.client,
            serializer: self.serializer,
            hooks,
            options: self.options,
        }
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn serializer(&self) -> &S {
        &self.serializer
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Relative endpoint for `resource`: `path/resource`, or `path` alone
    /// when `resource` is empty or whitespace.
    pub fn endpoint(&self, resource: &str) -> String {
        if resource.trim().is_empty() {
            self.path.clone()
        } else {
            format!("{}/{}", self.path, resource)
        }
    }
}

impl<C, S: Serializer, H: ServiceHooks> ApiService<C, S, H> {
    /// Build the request for `resource` without sending it.
    ///
    /// POST data becomes the body exactly as the serializer writes it. GET
    /// data is serialized and read back as a string-keyed map whose entries
    /// become the query parameters, so the serializer's output rules apply
    /// to them too.
    pub fn build_request<D: Serialize + ?Sized>(
        &self,
        resource: &str,
        method: HttpMethod,
        data: Option<&D>,
    ) -> Result<ApiRequest, ApiError> {
        self.hooks.before_send(method, data);

        let mut request = ApiRequest::new(self.base_url.clone(), self.endpoint(resource));
        request.method = method;
        request.content_type = self.options.content_type.clone();
        request.timeout = self.options.timeout;
        request.allow_auto_redirect = self.options.allow_auto_redirect;
        request.proxy = self.options.proxy.clone();
        request.headers = self.options.headers.clone();

        if let Some(data) = data {
            let json = self
                .serializer
                .serialize(data)
                .map_err(|e| ApiError::Serialization(e.to_string()))?;
            match method {
                HttpMethod::Post => request.body = Some(json),
                HttpMethod::Get => {
                    let values: Option<BTreeMap<String, Value>> =
                        self.serializer.deserialize(&json).map_err(|e| {
                            ApiError::Serialization(format!("query data must be a JSON object: {e}"))
                        })?;
                    request.parameters.extend(values.into_iter().flatten());
                }
            }
        }

        debug!(
            method = %request.method,
            endpoint = %request.endpoint,
            parameters = request.parameters.len(),
            has_body = request.body.is_some(),
            "built request"
        );
        Ok(request)
    }

    fn check_status(&self, response: ApiResponse) -> Result<ApiResponse, ApiError> {
        debug!(
            status = response.status,
            content_length = response.content_length,
            "received response"
        );
        if response.is_success() {
            return Ok(response);
        }
        warn!(
            response = %response.summary(),
            error = response.error_message.as_deref().unwrap_or(""),
            "request failed"
        );
        Err(self.hooks.handle_error(response))
    }

    fn decode<T: DeserializeOwned>(&self, response: &ApiResponse) -> Result<T, ApiError> {
        self.serializer
            .deserialize(&response.content)
            .map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    fn decode_attached<T>(&self, response: &ApiResponse) -> Result<T, ApiError>
    where
        T: DeserializeOwned + AttachResponse<H::Attachment>,
    {
        let mut entity: T = self.decode(response)?;
        if let Some(attachment) = self.hooks.entity_response(response) {
            entity.attach_response(attachment);
        }
        Ok(entity)
    }
}

impl<C: Transport, S: Serializer, H: ServiceHooks> ApiService<C, S, H> {
    pub fn get_request<T, D>(&self, resource: &str, data: Option<&D>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        D: Serialize + ?Sized,
    {
        let response = self.run_request(resource, HttpMethod::Get, data)?;
        self.decode(&response)
    }

    pub fn post_request<T, D>(&self, resource: &str, data: Option<&D>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        D: Serialize + ?Sized,
    {
        let response = self.run_request(resource, HttpMethod::Post, data)?;
        self.decode(&response)
    }

    /// `get_request`, then attach the hooks' auxiliary value to the entity.
    pub fn get_request_with_response<T, D>(&self, resource: &str, data: Option<&D>) -> Result<T, ApiError>
    where
        T: DeserializeOwned + AttachResponse<H::Attachment>,
        D: Serialize + ?Sized,
    {
        let response = self.run_request(resource, HttpMethod::Get, data)?;
        self.decode_attached(&response)
    }

    /// `post_request`, then attach the hooks' auxiliary value to the entity.
    pub fn post_request_with_response<T, D>(&self, resource: &str, data: Option<&D>) -> Result<T, ApiError>
    where
        T: DeserializeOwned + AttachResponse<H::Attachment>,
        D: Serialize + ?Sized,
    {
        let response = self.run_request(resource, HttpMethod::Post, data)?;
        self.decode_attached(&response)
    }

    #[instrument(level = "debug", skip(self, data), fields(path = %self.path))]
    fn run_request<D: Serialize + ?Sized>(
        &self,
        resource: &str,
        method: HttpMethod,
        data: Option<&D>,
    ) -> Result<ApiResponse, ApiError> {
        let request = self.build_request(resource, method, data)?;
        let response = self.client.send(&request);
        self.check_status(response)
    }
}

impl<C: AsyncTransport, S: Serializer, H: ServiceHooks> ApiService<C, S, H> {
    pub async fn get_request_async<T, D>(
        &self,
        resource: &str,
        data: Option<&D>,
        cancel: &CancellationToken,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        D: Serialize + ?Sized,
    {
        let response = self.run_request_async(resource, HttpMethod::Get, data, cancel).await?;
        self.decode(&response)
    }

    pub async fn post_request_async<T, D>(
        &self,
        resource: &str,
        data: Option<&D>,
        cancel: &CancellationToken,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        D: Serialize + ?Sized,
    {
        let response = self.run_request_async(resource, HttpMethod::Post, data, cancel).await?;
        self.decode(&response)
    }

    pub async fn get_request_with_response_async<T, D>(
        &self,
        resource: &str,
        data: Option<&D>,
        cancel: &CancellationToken,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned + AttachResponse<H::Attachment>,
        D: Serialize + ?Sized,
    {
        let response = self.run_request_async(resource, HttpMethod::Get, data, cancel).await?;
        self.decode_attached(&response)
    }

    pub async fn post_request_with_response_async<T, D>(
        &self,
        resource: &str,
        data: Option<&D>,
        cancel: &CancellationToken,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned + AttachResponse<H::Attachment>,
        D: Serialize + ?Sized,
    {
        let response = self.run_request_async(resource, HttpMethod::Post, data, cancel).await?;
        self.decode_attached(&response)
    }

    #[instrument(level = "debug", skip(self, data, cancel), fields(path = %self.path))]
    async fn run_request_async<D: Serialize + ?Sized>(
        &self,
        resource: &str,
        method: HttpMethod,
        data: Option<&D>,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse, ApiError> {
        let request = self.build_request(resource, method, data)?;
        if cancel.is_cancelled() {
            debug!("cancelled before send");
            return Err(ApiError::Cancelled);
        }
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("cancelled while waiting for transport");
                return Err(ApiError::Cancelled);
            }
            response = self.client.send_async(&request, cancel) => response,
        };
        self.check_status(response)
    }
}
