//! Per-service customization points around the request/response flow.

use serde::Serialize;

use crate::entity::ResponseMeta;
use crate::error::ApiError;
use crate::http::{ApiResponse, HttpMethod};

/// Hooks an `ApiService` calls while running a request.
///
/// Every method has a default, so an implementation only overrides what it
/// needs.
pub trait ServiceHooks {
    /// Value handed to `AttachResponse` by the `*_with_response` operations.
    type Attachment;

    /// Called before the request is built, with the caller's payload.
    fn before_send<D: Serialize + ?Sized>(&self, _method: HttpMethod, _data: Option<&D>) {}

    /// Auxiliary value to attach to a successfully decoded entity. `None`
    /// leaves the entity untouched.
    fn entity_response(&self, _response: &ApiResponse) -> Option<Self::Attachment> {
        None
    }

    /// Converts a non-200 response into the error returned to the caller.
    fn handle_error(&self, response: ApiResponse) -> ApiError {
        error_from_response(response)
    }
}

/// The transport's own error when it supplied one, otherwise a `Status`
/// error carrying its message.
pub fn error_from_response(response: ApiResponse) -> ApiError {
    match response.error {
        Some(error) => ApiError::Transport(error),
        None => ApiError::Status {
            status: response.status,
            message: response.error_message.unwrap_or_default(),
        },
    }
}

/// No customization; nothing is ever attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl ServiceHooks for DefaultHooks {
    type Attachment = ();
}

/// Attaches a `ResponseMeta` for every successful response.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetaHooks;

impl ServiceHooks for MetaHooks {
    type Attachment = ResponseMeta;

    fn entity_response(&self, response: &ApiResponse) -> Option<ResponseMeta> {
        Some(ResponseMeta::from(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("tls handshake failed")]
    struct Handshake;

    #[test]
    fn prefers_transport_error() {
        let mut response = ApiResponse::failed(0, "ignored");
        response.error = Some(Box::new(Handshake));
        let err = error_from_response(response);
        let ApiError::Transport(inner) = err else {
            panic!("expected transport error, got {err:?}");
        };
        assert!(inner.downcast_ref::<Handshake>().is_some());
    }

    #[test]
    fn falls_back_to_error_message() {
        let err = error_from_response(ApiResponse::failed(503, "service unavailable"));
        assert!(matches!(
            err,
            ApiError::Status { status: 503, ref message } if message == "service unavailable"
        ));
    }

    #[test]
    fn missing_message_yields_empty_status_error() {
        let response = ApiResponse {
            status: 500,
            ..ApiResponse::default()
        };
        assert_eq!(error_from_response(response).to_string(), "");
    }

    #[test]
    fn default_hooks_attach_nothing() {
        assert!(DefaultHooks.entity_response(&ApiResponse::ok("{}")).is_none());
    }

    #[test]
    fn meta_hooks_describe_response() {
        let meta = MetaHooks.entity_response(&ApiResponse::ok("{}")).unwrap();
        assert_eq!(meta.status, 200);
        assert_eq!(meta.status_text, "OK");
    }
}
