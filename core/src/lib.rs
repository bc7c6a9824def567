//! Thin layer for building REST API clients.
//!
//! # Overview
//! An `ApiService` composes a base URL, a resource path, an injected
//! transport and a serializer into GET/POST operations. It builds an
//! `ApiRequest`, lets the transport execute it, checks the `ApiResponse`
//! status and decodes the body into the requested type. HTTP I/O and JSON
//! encoding both stay outside: callers provide a `Transport` and/or
//! `AsyncTransport`, and a `Serializer` (`JsonSerializer` covers the usual
//! serde_json case).
//!
//! # Design
//! - One generic service. Blocking operations are available when the
//!   transport implements `Transport`, cancellable async operations when it
//!   implements `AsyncTransport`.
//! - Result types opt into receiving response details by implementing
//!   `AttachResponse`; `ServiceHooks` decides what gets attached and how
//!   failed responses become errors.
//! - The service holds only immutable configuration, so calls are
//!   independent and may run concurrently.

pub mod config;
pub mod entity;
pub mod error;
pub mod hooks;
pub mod http;
pub mod serializer;
pub mod service;
pub mod transport;

pub use config::ServiceConfig;
pub use entity::{AttachResponse, ResponseMeta};
pub use error::{ApiError, TransportError};
pub use hooks::{DefaultHooks, MetaHooks, ServiceHooks};
pub use http::{ApiRequest, ApiResponse, HttpMethod};
pub use serializer::{JsonSerializer, Serializer};
pub use service::{ApiService, RequestOptions};
pub use transport::{AsyncTransport, Transport};

pub use tokio_util::sync::CancellationToken;
