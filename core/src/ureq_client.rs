//! `HttpClient` backed by a blocking `ureq::Agent`.
//!
//! # Design
//! The remaining deadline is set as the per-request global timeout, so the
//! agent itself is never reconfigured and may be shared freely. A context
//! without a deadline falls back to [`UreqClient::fallback_timeout`], so every
//! socket ureq opens is bounded. ureq cannot be interrupted from outside, so
//! when the context carries a cancellation token the call runs on a worker
//! thread and the caller waits on a child token that fires either when the
//! worker finishes or when the parent is cancelled. An abandoned worker stops
//! at that same bounded timeout, closes its connection and drops whatever it
//! produced.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use http::Request;
use tokio_util::sync::CancellationToken;
use ureq::{Agent, AsSendBody, SendBody};

use crate::client::HttpClient;
use crate::context::{block_until, Context};
use crate::error::TransportError;
use crate::http::{HttpResponse, RequestBody, ResponseBody};

type SendResult = Result<HttpResponse, TransportError>;

const DEFAULT_FALLBACK_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking client over a shared `ureq::Agent`.
///
/// Non-2xx statuses are returned as responses, not errors.
#[derive(Debug, Clone)]
pub struct UreqClient {
    agent: Agent,
    fallback_timeout: Duration,
}

impl UreqClient {
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self::from_agent(agent)
    }

    /// Wrap an existing agent. Its proxy, TLS and pooling settings are used
    /// as-is.
    pub fn from_agent(agent: Agent) -> Self {
        Self {
            agent,
            fallback_timeout: DEFAULT_FALLBACK_TIMEOUT,
        }
    }

    /// Bound used when the context has no deadline of its own.
    pub fn with_fallback_timeout(mut self, timeout: Duration) -> Self {
        self.fallback_timeout = timeout;
        self
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn fallback_timeout(&self) -> Duration {
        self.fallback_timeout
    }

    fn timeout_for(&self, ctx: &Context) -> Duration {
        ctx.remaining().unwrap_or(self.fallback_timeout)
    }

    fn send_cancellable(
        &self,
        request: Request<RequestBody>,
        ctx: &Context,
        parent: &CancellationToken,
    ) -> SendResult {
        let finished = parent.child_token();
        let slot: Arc<Mutex<Option<SendResult>>> = Arc::default();

        let agent = self.agent.clone();
        let timeout = self.timeout_for(ctx);
        let worker_slot = Arc::clone(&slot);
        let worker_finished = finished.clone();
        thread::Builder::new()
            .name("oneshot-dispatch".to_string())
            .spawn(move || {
                let result = dispatch(&agent, request, timeout);
                *worker_slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
                worker_finished.cancel();
            })
            .map_err(TransportError::transport)?;

        block_until(Some(&finished), ctx.deadline()).map_err(TransportError::transport)?;

        let result = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        match result {
            Some(result) => result,
            None => {
                tracing::debug!("abandoning in-flight request");
                Err(ctx.err().unwrap_or(TransportError::Cancelled))
            }
        }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for UreqClient {
    fn send(&self, request: Request<RequestBody>, ctx: &Context) -> SendResult {
        if let Some(err) = ctx.err() {
            return Err(err);
        }
        match ctx.cancel_token() {
            Some(token) => self.send_cancellable(request, ctx, token),
            None => dispatch(&self.agent, request, self.timeout_for(ctx)),
        }
    }
}

fn dispatch(agent: &Agent, request: Request<RequestBody>, timeout: Duration) -> SendResult {
    let (parts, body) = request.into_parts();
    match body {
        RequestBody::Empty => run(agent, Request::from_parts(parts, ()), timeout),
        RequestBody::Bytes(bytes) => run(agent, Request::from_parts(parts, bytes), timeout),
        RequestBody::Reader(reader) => run(
            agent,
            Request::from_parts(parts, SendBody::from_owned_reader(reader)),
            timeout,
        ),
    }
}

fn run<S: AsSendBody>(agent: &Agent, request: Request<S>, timeout: Duration) -> SendResult {
    let request = agent
        .configure_request(request)
        .timeout_global(Some(timeout))
        .build();

    let response = agent.run(request).map_err(|err| match err {
        ureq::Error::Timeout(_) => TransportError::DeadlineExceeded,
        other => TransportError::transport(other),
    })?;

    let (parts, body) = response.into_parts();
    Ok(HttpResponse {
        status: parts.status,
        headers: parts.headers,
        body: ResponseBody::from_reader(body.into_reader()),
    })
}
