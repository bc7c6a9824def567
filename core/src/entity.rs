//! Attaching response details to deserialized entities.
//!
//! Result types that want to see something of the HTTP exchange implement
//! `AttachResponse` for the payload their service's hooks produce. The
//! `*_with_response` service operations require the bound; the plain ones
//! never attach anything.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::http::ApiResponse;

/// Accepts an auxiliary value computed from the response an entity was
/// decoded from.
pub trait AttachResponse<R> {
    fn attach_response(&mut self, response: R);
}

impl<T: AttachResponse<R>, R: Clone> AttachResponse<R> for Vec<T> {
    fn attach_response(&mut self, response: R) {
        for item in self.iter_mut() {
            item.attach_response(response.clone());
        }
    }
}

impl<T: AttachResponse<R>, R> AttachResponse<R> for Option<T> {
    fn attach_response(&mut self, response: R) {
        if let Some(inner) = self {
            inner.attach_response(response);
        }
    }
}

/// Transport-level details of a response, without the body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub content_length: u64,
    pub headers: BTreeMap<String, String>,
    pub response_uri: Option<Url>,
}

impl From<&ApiResponse> for ResponseMeta {
    fn from(response: &ApiResponse) -> Self {
        Self {
            status: response.status,
            status_text: response.status_text.clone(),
            content_type: response.content_type.clone(),
            content_length: response.content_length,
            headers: response.headers.clone(),
            response_uri: response.response_uri.clone(),
        }
    }
}
