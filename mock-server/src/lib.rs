//! Local HTTP server the core's integration tests talk to.
//!
//! Routes:
//! - `GET /hello` answers `hello`.
//! - `ANY /echo` answers with the method, headers and body it received.
//! - `GET /delay/{ms}` sleeps, then answers `done`.
//! - `GET /status/{code}` answers an empty body with that status.

use std::{collections::BTreeMap, time::Duration};

use axum::{
    body::Bytes,
    extract::Path,
    http::{HeaderMap, Method, StatusCode},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// What `/echo` saw. Repeated headers are joined with `, `.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/hello", get(hello))
        .route("/echo", any(echo))
        .route("/delay/{ms}", get(delay))
        .route("/status/{code}", get(status))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn hello() -> &'static str {
    "hello"
}

async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in &headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        seen.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    Json(Echo {
        method: method.to_string(),
        headers: seen,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn delay(Path(ms): Path<u64>) -> &'static str {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    "done"
}

async fn status(Path(code): Path<u16>) -> Result<StatusCode, StatusCode> {
    StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)
}
