//! The seam between the executor and whatever actually speaks HTTP.
//!
//! # Design
//! `HttpClient` receives a fully built `http::Request` together with the
//! call's [`Context`]. The context is the only place a deadline lives, so an
//! implementation shared by many threads must read its bound from there and
//! never from its own mutable state. Implementations are expected to return
//! promptly once the context ends, with the error from [`Context::err`].

use std::sync::Arc;

use http::Request;

use crate::context::Context;
use crate::error::TransportError;
use crate::http::{HttpResponse, RequestBody};

/// Executes one request. No retries, no redirects policy beyond the
/// implementation's own defaults.
pub trait HttpClient: Send + Sync {
    fn send(&self, request: Request<RequestBody>, ctx: &Context) -> Result<HttpResponse, TransportError>;
}

impl<C: HttpClient + ?Sized> HttpClient for &C {
    fn send(&self, request: Request<RequestBody>, ctx: &Context) -> Result<HttpResponse, TransportError> {
        (**self).send(request, ctx)
    }
}

impl<C: HttpClient + ?Sized> HttpClient for Arc<C> {
    fn send(&self, request: Request<RequestBody>, ctx: &Context) -> Result<HttpResponse, TransportError> {
        (**self).send(request, ctx)
    }
}

impl<C: HttpClient + ?Sized> HttpClient for Box<C> {
    fn send(&self, request: Request<RequestBody>, ctx: &Context) -> Result<HttpResponse, TransportError> {
        (**self).send(request, ctx)
    }
}
