//! Validate, build, bound and dispatch one request.
//!
//! # Design
//! `Executor` holds a client and a config and nothing else; it is `Sync`
//! whenever its client is. Checks run cheapest first (method, then request
//! construction, then headers) and all of them happen before the client is
//! called. `execute` hands the open body to the caller; `execute_bytes`
//! drains and releases it.

use std::io::Read;

use http::Request;
use uuid::Uuid;

use crate::client::HttpClient;
use crate::config::ExecutorConfig;
use crate::context::Context;
use crate::error::{BuildError, ExecError};
use crate::headers::apply_headers;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};

#[derive(Debug, Clone)]
pub struct Executor<C> {
    client: C,
    config: ExecutorConfig,
}

impl<C: HttpClient> Executor<C> {
    pub fn new(client: C) -> Self {
        Self::with_config(client, ExecutorConfig::default())
    }

    pub fn with_config(client: C, config: ExecutorConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Send the request and return the live response. The caller owns the
    /// body and must read and release it.
    pub fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ExecError> {
        let span = tracing::debug_span!(
            "execute",
            request_id = %Uuid::new_v4(),
            method = %request.method,
            url = %request.url,
        );
        let _enter = span.enter();
        self.dispatch(request)
    }

    /// Send the request, read the whole body and release it.
    ///
    /// A failure to release the body after a complete read is logged and
    /// does not affect the result.
    pub fn execute_bytes(&self, request: HttpRequest) -> Result<Vec<u8>, ExecError> {
        let span = tracing::debug_span!(
            "execute_bytes",
            request_id = %Uuid::new_v4(),
            method = %request.method,
            url = %request.url,
        );
        let _enter = span.enter();

        let response = self.dispatch(request)?;
        let mut body = response.body;

        let mut bytes = Vec::new();
        if let Err(err) = body.read_to_end(&mut bytes) {
            tracing::error!(error = %err, "could not read response body");
            if let Err(close_err) = body.close() {
                tracing::warn!(error = %close_err, "could not close response body");
            }
            return Err(ExecError::BodyRead(err));
        }

        if let Err(err) = body.close() {
            tracing::warn!(error = %err, "could not close response body");
        }
        Ok(bytes)
    }

    fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, ExecError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
            timeout,
            context,
        } = request;

        let method = self.config.check_method(&method)?;
        let mut outgoing = build_request(method, &url, body)?;
        apply_headers(outgoing.headers_mut(), &headers, self.config.header_values)?;

        let ctx = self.bind_context(context, timeout);
        tracing::debug!(remaining = ?ctx.remaining(), "sending request");

        let response = self.client.send(outgoing, &ctx).map_err(|err| {
            tracing::error!(error = %err, "could not send request");
            ExecError::Request(err)
        })?;
        tracing::debug!(status = %response.status, "received response");
        Ok(response)
    }

    /// Every dispatched call carries a deadline. A cancellation token alone
    /// does not bound the network I/O behind it, so the default timeout
    /// applies whenever neither the context nor the request sets one.
    fn bind_context(&self, context: Context, timeout: Option<std::time::Duration>) -> Context {
        let context = match timeout {
            Some(timeout) => context.with_timeout(timeout),
            None => context,
        };
        if context.deadline().is_some() {
            context
        } else {
            context.with_timeout(self.config.default_timeout())
        }
    }
}

fn build_request(
    method: HttpMethod,
    url: &str,
    body: RequestBody,
) -> Result<Request<RequestBody>, BuildError> {
    if method == HttpMethod::Trace && !body.is_empty() {
        return Err(BuildError::BodyNotAllowed {
            method: method.as_str(),
        });
    }
    let request = Request::builder()
        .method(method.to_http())
        .uri(url)
        .body(body)?;
    let uri = request.uri();
    if uri.scheme().is_none() || uri.host().is_none() {
        return Err(BuildError::NotAbsolute {
            url: url.to_string(),
        });
    }
    Ok(request)
}
