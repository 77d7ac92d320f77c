//! Request descriptor and response types.
//!
//! # Design
//! `HttpRequest` is the caller's description of one outbound call: a method
//! string, a URL string, a header map and an optional body, plus the timeout
//! and cancellation context that bound it. Nothing here is validated; the
//! executor checks the descriptor before anything touches the network.
//!
//! `HttpResponse` exposes status and headers as `http` crate types and keeps
//! the body as an open [`ResponseBody`]. The body owns the underlying
//! connection and releases it on [`ResponseBody::close`] or on drop, so a
//! caller that bails out half-way through a read never leaks it.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Read};
use std::str::FromStr;
use std::time::Duration;

use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};

use crate::context::Context;

/// HTTP method accepted by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
    Trace,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
        HttpMethod::Patch,
        HttpMethod::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
        }
    }

    pub(crate) fn to_http(self) -> http::Method {
        match self {
            HttpMethod::Get => http::Method::GET,
            HttpMethod::Post => http::Method::POST,
            HttpMethod::Put => http::Method::PUT,
            HttpMethod::Delete => http::Method::DELETE,
            HttpMethod::Head => http::Method::HEAD,
            HttpMethod::Options => http::Method::OPTIONS,
            HttpMethod::Patch => http::Method::PATCH,
            HttpMethod::Trace => http::Method::TRACE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Method names are matched exactly; `get` is not `GET`.
impl FromStr for HttpMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or(UnknownMethod)
    }
}

/// Returned by `HttpMethod::from_str` for names outside the known set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMethod;

/// Outgoing request body.
///
/// `Reader` is consumed exactly once, while the request is sent.
#[derive(Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Bytes(Vec<u8>),
    Reader(Box<dyn Read + Send + Sync>),
}

impl RequestBody {
    pub fn from_reader(reader: impl Read + Send + Sync + 'static) -> Self {
        RequestBody::Reader(Box::new(reader))
    }

    /// Whether the body is known to carry no bytes. A reader is never
    /// considered empty, since finding out would consume it.
    pub fn is_empty(&self) -> bool {
        match self {
            RequestBody::Empty => true,
            RequestBody::Bytes(bytes) => bytes.is_empty(),
            RequestBody::Reader(_) => false,
        }
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Empty => f.write_str("Empty"),
            RequestBody::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            RequestBody::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        RequestBody::Bytes(bytes)
    }
}

impl From<String> for RequestBody {
    fn from(s: String) -> Self {
        RequestBody::Bytes(s.into_bytes())
    }
}

impl From<&str> for RequestBody {
    fn from(s: &str) -> Self {
        RequestBody::Bytes(s.as_bytes().to_vec())
    }
}

/// One outbound request, described as plain data.
///
/// Built by the caller and handed to `Executor::execute` or
/// `Executor::execute_bytes`, which take ownership of it.
#[derive(Debug, Default)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: RequestBody,
    pub timeout: Option<Duration>,
    pub context: Context,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn post(url: impl Into<String>, body: impl Into<RequestBody>) -> Self {
        Self::new("POST", url).with_body(body)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn with_body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }
}

/// A readable response stream that can report a failed release.
///
/// Transports whose release cannot fail keep the default `close`.
pub trait BodyStream: Read + Send {
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct PlainReader<R>(R);

impl<R: Read> Read for PlainReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<R: Read + Send> BodyStream for PlainReader<R> {}

/// Unread response body. Released exactly once, by `close` or on drop.
pub struct ResponseBody {
    stream: Option<Box<dyn BodyStream>>,
}

impl ResponseBody {
    pub fn new(stream: impl BodyStream + 'static) -> Self {
        Self {
            stream: Some(Box::new(stream)),
        }
    }

    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Self::new(PlainReader(reader))
    }

    pub fn empty() -> Self {
        Self::from_reader(io::empty())
    }

    pub fn read_to_vec(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.read_to_end(&mut buf)?;
        Ok(buf)
    }

    pub fn read_to_string(&mut self) -> io::Result<String> {
        let mut buf = String::new();
        Read::read_to_string(self, &mut buf)?;
        Ok(buf)
    }

    /// Release the underlying stream, surfacing any failure to do so.
    pub fn close(mut self) -> io::Result<()> {
        self.release()
    }

    fn release(&mut self) -> io::Result<()> {
        match self.stream.take() {
            Some(mut stream) => stream.close(),
            None => Ok(()),
        }
    }
}

impl Read for ResponseBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.stream.as_mut() {
            Some(stream) => stream.read(buf),
            None => Ok(0),
        }
    }
}

impl Drop for ResponseBody {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            tracing::warn!(error = %err, "could not close response body");
        }
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBody")
            .field("open", &self.stream.is_some())
            .finish()
    }
}

/// Live response handed back by `Executor::execute`.
///
/// The caller owns `body` and is responsible for reading and releasing it.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ResponseBody,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: ResponseBody) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingClose {
        data: io::Cursor<Vec<u8>>,
        closes: Arc<AtomicUsize>,
    }

    impl Read for CountingClose {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.data.read(buf)
        }
    }

    impl BodyStream for CountingClose {
        fn close(&mut self) -> io::Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn counting(body: &str) -> (ResponseBody, Arc<AtomicUsize>) {
        let closes = Arc::new(AtomicUsize::new(0));
        let body = ResponseBody::new(CountingClose {
            data: io::Cursor::new(body.as_bytes().to_vec()),
            closes: closes.clone(),
        });
        (body, closes)
    }

    #[test]
    fn method_parses_exact_names_only() {
        assert_eq!("GET".parse::<HttpMethod>(), Ok(HttpMethod::Get));
        assert_eq!("TRACE".parse::<HttpMethod>(), Ok(HttpMethod::Trace));
        assert_eq!("get".parse::<HttpMethod>(), Err(UnknownMethod));
        assert_eq!("CONNECT".parse::<HttpMethod>(), Err(UnknownMethod));
        assert_eq!("".parse::<HttpMethod>(), Err(UnknownMethod));
    }

    #[test]
    fn method_serializes_uppercase() {
        let json = serde_json::to_string(&HttpMethod::Options).unwrap();
        assert_eq!(json, r#""OPTIONS""#);
        let back: HttpMethod = serde_json::from_str(r#""PATCH""#).unwrap();
        assert_eq!(back, HttpMethod::Patch);
    }

    #[test]
    fn request_builder_collects_fields() {
        let req = HttpRequest::post("http://localhost/x", "payload")
            .with_header("X-One", "1")
            .with_timeout(Duration::from_secs(2));
        assert_eq!(req.method, "POST");
        assert_eq!(req.url, "http://localhost/x");
        assert_eq!(req.headers.get("X-One").map(String::as_str), Some("1"));
        assert_eq!(req.timeout, Some(Duration::from_secs(2)));
        assert!(matches!(req.body, RequestBody::Bytes(ref b) if b == b"payload"));
    }

    #[test]
    fn zero_length_bytes_count_as_empty() {
        assert!(RequestBody::Empty.is_empty());
        assert!(RequestBody::Bytes(Vec::new()).is_empty());
        assert!(RequestBody::from("").is_empty());
        assert!(!RequestBody::from("x").is_empty());
        assert!(!RequestBody::from_reader(io::empty()).is_empty());
    }

    #[test]
    fn body_close_runs_once() {
        let (body, closes) = counting("hello");
        body.close().unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn body_drop_closes_unread_stream() {
        let (body, closes) = counting("hello");
        drop(body);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn body_reads_to_string() {
        let (mut body, closes) = counting("hello");
        assert_eq!(body.read_to_string().unwrap(), "hello");
        assert_eq!(closes.load(Ordering::SeqCst), 0);
        drop(body);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_body_reads_nothing() {
        let mut body = ResponseBody::empty();
        assert!(body.read_to_vec().unwrap().is_empty());
    }
}
