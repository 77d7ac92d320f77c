//! Single-shot HTTP request executor.
//!
//! # Overview
//! Validates a request descriptor, builds the outgoing request, applies
//! headers, bounds the call with a per-request deadline and/or cancellation
//! token, and dispatches it through an injected [`HttpClient`]. The result
//! is either the live response with its body still open ([`execute`]) or the
//! fully read body ([`execute_bytes`]).
//!
//! # Design
//! - Validation failures (`InvalidMethod`, `Construction`, `InvalidHeader`)
//!   never reach the client.
//! - The deadline travels with the request in a [`Context`]; clients are
//!   shared read-only and never reconfigured per call.
//! - No retries. Non-2xx statuses are responses, not errors.
//! - The default client is a blocking `ureq` agent; tests swap in fakes
//!   through the `HttpClient` trait.

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod headers;
pub mod http;
pub mod ureq_client;

use std::sync::LazyLock;

pub use crate::client::HttpClient;
pub use crate::config::ExecutorConfig;
pub use crate::context::Context;
pub use crate::error::{BoxError, BuildError, ConfigError, ErrorKind, ExecError, HeaderError, TransportError};
pub use crate::executor::Executor;
pub use crate::headers::HeaderValuePolicy;
pub use crate::http::{BodyStream, HttpMethod, HttpRequest, HttpResponse, RequestBody, ResponseBody};
pub use crate::ureq_client::UreqClient;
pub use tokio_util::sync::CancellationToken;

static DEFAULT_EXECUTOR: LazyLock<Executor<UreqClient>> =
    LazyLock::new(|| Executor::new(UreqClient::new()));

/// Send `request` through the process-wide default client and return the
/// live response.
pub fn execute(request: HttpRequest) -> Result<HttpResponse, ExecError> {
    DEFAULT_EXECUTOR.execute(request)
}

/// Send `request` through the process-wide default client and return the
/// drained body.
pub fn execute_bytes(request: HttpRequest) -> Result<Vec<u8>, ExecError> {
    DEFAULT_EXECUTOR.execute_bytes(request)
}
