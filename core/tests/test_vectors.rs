//! Verify method and header validation against JSON test vectors stored in
//! `test-vectors/`.
//!
//! Each vector names its inputs and the expected outcome: `ok` or the error
//! kind. For accepted header sets the vector also lists exactly what must
//! land on the outgoing request.

use std::collections::HashMap;
use std::sync::Mutex;

use http::{HeaderMap, Request, StatusCode};
use oneshot_core::{
    Context, ErrorKind, Executor, ExecutorConfig, HeaderValuePolicy, HttpClient, HttpRequest,
    HttpResponse, RequestBody, ResponseBody, TransportError,
};

const URL: &str = "http://vectors.invalid/";

/// Keeps the headers of the last request it was asked to send.
#[derive(Default)]
struct RecordingClient {
    sent: Mutex<Option<HeaderMap>>,
}

impl HttpClient for RecordingClient {
    fn send(&self, request: Request<RequestBody>, _: &Context) -> Result<HttpResponse, TransportError> {
        *self.sent.lock().unwrap() = Some(request.headers().clone());
        Ok(HttpResponse::new(StatusCode::OK, ResponseBody::empty()))
    }
}

/// Map the `expect` string from test vectors onto an error kind.
fn expected_kind(s: &str) -> Option<ErrorKind> {
    match s {
        "ok" => None,
        "invalid_method" => Some(ErrorKind::InvalidMethod),
        "invalid_header" => Some(ErrorKind::InvalidHeader),
        other => panic!("unknown expectation: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Methods
// ---------------------------------------------------------------------------

#[test]
fn method_test_vectors() {
    let raw = include_str!("../../test-vectors/methods.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let method = case["method"].as_str().unwrap();
        let expected = expected_kind(case["expect"].as_str().unwrap());

        let executor = Executor::new(RecordingClient::default());
        let result = executor.execute(HttpRequest::new(method, URL));
        let dispatched = executor.client().sent.lock().unwrap().is_some();

        match expected {
            None => {
                assert!(result.is_ok(), "{name}: {result:?}");
                assert!(dispatched, "{name}: client not called");
            }
            Some(kind) => {
                assert_eq!(result.unwrap_err().kind(), kind, "{name}");
                assert!(!dispatched, "{name}: client called");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

#[test]
fn header_test_vectors() {
    let raw = include_str!("../../test-vectors/headers.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let policy: HeaderValuePolicy = serde_json::from_value(case["policy"].clone()).unwrap();
        let headers: HashMap<String, String> =
            serde_json::from_value(case["headers"].clone()).unwrap();
        let expected = expected_kind(case["expect"].as_str().unwrap());

        let config = ExecutorConfig::default().with_header_values(policy);
        let executor = Executor::with_config(RecordingClient::default(), config);
        let result = executor.execute(HttpRequest::get(URL).with_headers(headers));
        let sent = executor.client().sent.lock().unwrap().take();

        match expected {
            None => {
                assert!(result.is_ok(), "{name}: {result:?}");
                let sent = sent.unwrap_or_else(|| panic!("{name}: client not called"));
                let expected_sent = case["sent"].as_array().unwrap();
                assert_eq!(sent.len(), expected_sent.len(), "{name}: header count");
                for pair in expected_sent {
                    let pair = pair.as_array().unwrap();
                    let key = pair[0].as_str().unwrap();
                    let value = pair[1].as_str().unwrap();
                    assert_eq!(
                        sent.get(key).map(|v| v.to_str().unwrap()),
                        Some(value),
                        "{name}: {key}"
                    );
                }
            }
            Some(kind) => {
                assert_eq!(result.unwrap_err().kind(), kind, "{name}");
                assert!(sent.is_none(), "{name}: client called");
            }
        }
    }
}
