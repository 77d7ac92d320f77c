//! Executor configuration.
//!
//! # Design
//! Configuration is plain serde data so a calling application can embed it
//! in its own JSON config. Every field has a default; an empty object is a
//! valid config. `from_json` is the only path that validates.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ExecError};
use crate::headers::HeaderValuePolicy;
use crate::http::HttpMethod;

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

const REQUIRED_METHODS: [HttpMethod; 4] = [
    HttpMethod::Get,
    HttpMethod::Post,
    HttpMethod::Put,
    HttpMethod::Delete,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Methods the executor will send.
    pub allowed_methods: BTreeSet<HttpMethod>,
    /// How header values are written.
    pub header_values: HeaderValuePolicy,
    /// Bound applied when a request carries neither a timeout nor a
    /// cancellation token.
    pub default_timeout_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            allowed_methods: HttpMethod::ALL.into_iter().collect(),
            header_values: HeaderValuePolicy::default(),
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ExecutorConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: ExecutorConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(missing) = REQUIRED_METHODS
            .iter()
            .find(|m| !self.allowed_methods.contains(*m))
        {
            return Err(ConfigError::MissingRequiredMethod(missing.as_str()));
        }
        if self.default_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    pub fn with_header_values(mut self, policy: HeaderValuePolicy) -> Self {
        self.header_values = policy;
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    /// Resolve a method string against the allow-list.
    pub fn check_method(&self, method: &str) -> Result<HttpMethod, ExecError> {
        method
            .parse::<HttpMethod>()
            .ok()
            .filter(|m| self.allowed_methods.contains(m))
            .ok_or_else(|| ExecError::InvalidMethod {
                method: method.to_string(),
            })
    }
}
