//! HTTP request and response values exchanged with a transport.
//!
//! # Design
//! These types describe one HTTP exchange as plain data. The service builds
//! an `ApiRequest`, an injected transport executes it and hands back an
//! `ApiResponse`. Nothing here touches the network: status codes, redirects,
//! proxies and timeouts are configuration the transport consumes.
//!
//! Transport failures travel inside the response (`error_message`, `error`)
//! rather than through a separate channel, so a transport never has to
//! decide what counts as an application error.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::error::{ApiError, TransportError};

/// Content type stamped on requests unless configured otherwise.
pub const DEFAULT_CONTENT_TYPE: &str = "text/json";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// Built by `ApiService`; the transport is responsible for executing it.
/// `base_address` and `endpoint` are required at construction, every other
/// field starts empty or at its default.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub base_address: Url,
    /// Relative to `base_address`.
    pub endpoint: String,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    /// Query parameters. Values keep the JSON shape produced by the serializer.
    pub parameters: BTreeMap<String, Value>,
    pub body: Option<String>,
    pub content_type: String,
    pub timeout: Option<Duration>,
    pub allow_auto_redirect: bool,
    pub proxy: Option<Url>,
}

impl ApiRequest {
    pub fn new(base_address: Url, endpoint: impl Into<String>) -> Self {
        Self {
            base_address,
            endpoint: endpoint.into(),
            method: HttpMethod::Get,
            headers: BTreeMap::new(),
            parameters: BTreeMap::new(),
            body: None,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            timeout: None,
            allow_auto_redirect: false,
            proxy: None,
        }
    }

    /// Absolute URL for the request: `endpoint` resolved against
    /// `base_address` (RFC 3986 reference resolution), with `parameters`
    /// appended as the query string.
    ///
    /// String parameters are written as-is, `null` as an empty value, and
    /// anything else as its compact JSON text.
    pub fn url(&self) -> Result<Url, ApiError> {
        let mut url = self.base_address.join(&self.endpoint)?;
        if !self.parameters.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.parameters {
                pairs.append_pair(key, &query_value(value));
            }
        }
        Ok(url)
    }
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// An HTTP response described as plain data.
///
/// Constructed by the transport after executing an `ApiRequest`. On success
/// `content` carries the body; when the exchange failed the transport fills
/// `error_message` and, if it has one, `error`.
#[derive(Debug, Default)]
pub struct ApiResponse {
    pub status: u16,
    pub status_text: String,
    pub content: String,
    pub content_type: Option<String>,
    pub content_length: u64,
    pub headers: BTreeMap<String, String>,
    pub response_uri: Option<Url>,
    pub error_message: Option<String>,
    pub error: Option<TransportError>,
}

impl ApiResponse {
    /// A 200 response carrying `content`.
    pub fn ok(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            status: 200,
            status_text: "OK".to_string(),
            content_length: content.len() as u64,
            content,
            ..Self::default()
        }
    }

    /// A response with `status` and a textual error message but no error value.
    pub fn failed(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            error_message: Some(message.into()),
            ..Self::default()
        }
    }

    /// A response for an exchange that never completed. Status 0 marks that
    /// no HTTP status was received.
    pub fn from_error(error: impl Into<TransportError>) -> Self {
        let error = error.into();
        Self {
            status: 0,
            error_message: Some(error.to_string()),
            error: Some(error),
            ..Self::default()
        }
    }

    /// Only `200 OK` counts as success.
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// One-line description for logs.
    pub fn summary(&self) -> String {
        format!(
            "status: {}, content-type: {}, content-length: {}",
            self.status,
            self.content_type.as_deref().unwrap_or("-"),
            self.content_length
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> Url {
        Url::parse("http://localhost:3000/").unwrap()
    }

    #[test]
    fn new_request_has_defaults() {
        let req = ApiRequest::new(base(), "items");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.content_type, "text/json");
        assert!(req.headers.is_empty());
        assert!(req.parameters.is_empty());
        assert!(req.body.is_none());
        assert!(!req.allow_auto_redirect);
    }

    #[test]
    fn url_resolves_endpoint_and_appends_query() {
        let mut req = ApiRequest::new(base(), "api/items");
        req.parameters.insert("name".to_string(), json!("box of nails"));
        req.parameters.insert("limit".to_string(), json!(10));
        req.parameters.insert("cursor".to_string(), Value::Null);
        let url = req.url().unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/api/items?cursor=&limit=10&name=box+of+nails"
        );
    }

    #[test]
    fn url_without_parameters_has_no_query() {
        let req = ApiRequest::new(base(), "items");
        assert_eq!(req.url().unwrap().as_str(), "http://localhost:3000/items");
    }

    #[test]
    fn url_replaces_last_base_segment_without_trailing_slash() {
        let base = Url::parse("http://localhost:3000/v1").unwrap();
        let req = ApiRequest::new(base, "items");
        assert_eq!(req.url().unwrap().as_str(), "http://localhost:3000/items");
    }

    #[test]
    fn method_renders_uppercase() {
        assert_eq!(HttpMethod::Get.to_string(), "GET");
        assert_eq!(HttpMethod::Post.as_str(), "POST");
    }

    #[test]
    fn ok_response_is_success() {
        let resp = ApiResponse::ok("{}");
        assert!(resp.is_success());
        assert_eq!(resp.content_length, 2);
        assert!(resp.error.is_none());
    }

    #[test]
    fn non_200_is_not_success() {
        assert!(!ApiResponse::failed(201, "created").is_success());
        assert!(!ApiResponse::failed(404, "missing").is_success());
    }

    #[test]
    fn from_error_keeps_message_and_error() {
        let resp = ApiResponse::from_error("connection refused");
        assert_eq!(resp.status, 0);
        assert_eq!(resp.error_message.as_deref(), Some("connection refused"));
        assert!(resp.error.is_some());
    }

    #[test]
    fn summary_mentions_status_and_length() {
        let mut resp = ApiResponse::ok("hello");
        resp.content_type = Some("text/plain".to_string());
        assert_eq!(resp.summary(), "status: 200, content-type: text/plain, content-length: 5");
    }
}
