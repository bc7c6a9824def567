//! Transport contracts: the injected collaborator that performs the HTTP call.
//!
//! # Design
//! The crate never does network I/O itself. A caller plugs in any HTTP
//! library by implementing `Transport` (blocking), `AsyncTransport`
//! (suspending and cancellable), or both. Failures are reported through the
//! returned `ApiResponse` so that status interpretation stays with the
//! service.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::http::{ApiRequest, ApiResponse};

/// Blocking transport.
pub trait Transport {
    fn send(&self, request: &ApiRequest) -> ApiResponse;
}

/// Suspending transport.
///
/// Implementations should stop work once `cancel` fires; the service stops
/// waiting at that point regardless.
#[async_trait]
pub trait AsyncTransport: Send + Sync {
    async fn send_async(&self, request: &ApiRequest, cancel: &CancellationToken) -> ApiResponse;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &ApiRequest) -> ApiResponse {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: &ApiRequest) -> ApiResponse {
        (**self).send(request)
    }
}

#[async_trait]
impl<T: AsyncTransport + ?Sized> AsyncTransport for &T {
    async fn send_async(&self, request: &ApiRequest, cancel: &CancellationToken) -> ApiResponse {
        (**self).send_async(request, cancel).await
    }
}

#[async_trait]
impl<T: AsyncTransport + ?Sized> AsyncTransport for Arc<T> {
    async fn send_async(&self, request: &ApiRequest, cancel: &CancellationToken) -> ApiResponse {
        (**self).send_async(request, cancel).await
    }
}
