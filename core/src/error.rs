//! Error types for the request executor.
//!
//! # Design
//! Every failure is tagged with an [`ErrorKind`] so callers can branch on
//! "what went wrong" without matching on nested causes. The first three
//! kinds are caller errors raised before anything is sent. `Request` and
//! `BodyRead` come from the network. Causes are always kept as `source()`.

use std::io;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Coarse classification of an [`ExecError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidMethod,
    Construction,
    InvalidHeader,
    Request,
    BodyRead,
}

/// Errors returned by `Executor::execute` and `Executor::execute_bytes`.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The method is unknown or not in the configured allow-list.
    #[error("invalid HTTP method: {method}")]
    InvalidMethod { method: String },

    /// The request could not be built from the descriptor.
    #[error("failed to create request: {0}")]
    Construction(#[from] BuildError),

    /// A header entry was blank or not representable on the wire.
    #[error("invalid request header: {0}")]
    InvalidHeader(#[from] HeaderError),

    /// The transport failed, or the call was cancelled or timed out.
    #[error("failed to make request: {0}")]
    Request(#[from] TransportError),

    /// The response arrived but its body could not be read.
    #[error("failed to read response body: {0}")]
    BodyRead(#[source] io::Error),
}

impl ExecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecError::InvalidMethod { .. } => ErrorKind::InvalidMethod,
            ExecError::Construction(_) => ErrorKind::Construction,
            ExecError::InvalidHeader(_) => ErrorKind::InvalidHeader,
            ExecError::Request(_) => ErrorKind::Request,
            ExecError::BodyRead(_) => ErrorKind::BodyRead,
        }
    }

    /// The transport error behind a `Request` failure.
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            ExecError::Request(err) => Some(err),
            _ => None,
        }
    }
}

/// Why an outgoing request could not be constructed.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Http(#[from] http::Error),

    #[error("URL is not absolute: `{url}`")]
    NotAbsolute { url: String },

    #[error("{method} requests must not carry a body")]
    BodyNotAllowed { method: &'static str },
}

/// Why a header entry was rejected.
#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("empty header entry: `{key}`=`{value}`")]
    Blank { key: String, value: String },

    #[error("invalid header name `{name}`")]
    Name {
        name: String,
        #[source]
        source: http::header::InvalidHeaderName,
    },

    #[error("invalid value for header `{name}`")]
    Value {
        name: String,
        #[source]
        source: http::header::InvalidHeaderValue,
    },
}

/// Failure reported by an `HttpClient` while sending.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("transport failure: {0}")]
    Transport(#[source] BoxError),
}

impl TransportError {
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        TransportError::Transport(Box::new(err))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::DeadlineExceeded)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransportError::Cancelled)
    }
}

/// Errors raised while loading an `ExecutorConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("allowed_methods must include {0}")]
    MissingRequiredMethod(&'static str),

    #[error("default_timeout_ms must be greater than zero")]
    ZeroTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn kinds_match_variants() {
        let err = ExecError::InvalidMethod {
            method: "FOO".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::InvalidMethod);
        assert_eq!(err.to_string(), "invalid HTTP method: FOO");

        let err = ExecError::from(TransportError::DeadlineExceeded);
        assert_eq!(err.kind(), ErrorKind::Request);
        assert!(err.transport().is_some_and(TransportError::is_timeout));

        let err = ExecError::BodyRead(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"));
        assert_eq!(err.kind(), ErrorKind::BodyRead);
        assert!(err.transport().is_none());
    }

    #[test]
    fn causes_are_exposed_as_source() {
        let err = ExecError::BodyRead(io::Error::new(io::ErrorKind::Other, "reset"));
        let source = err.source().expect("body read keeps its cause");
        assert_eq!(source.to_string(), "reset");

        let err = ExecError::from(TransportError::transport(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "refused",
        )));
        let transport = err.source().expect("request keeps its cause");
        assert_eq!(transport.source().map(|s| s.to_string()).as_deref(), Some("refused"));
    }

    #[test]
    fn blank_header_message_names_entry() {
        let err = ExecError::from(HeaderError::Blank {
            key: "X-Key".to_string(),
            value: " ".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::InvalidHeader);
        assert_eq!(
            err.to_string(),
            "invalid request header: empty header entry: `X-Key`=` `"
        );
    }
}
