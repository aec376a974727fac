use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::ApiDescriptor;

pub const DEFAULT_PROXY_BASE: &str = "https://api.allorigins.win/raw";
pub const DEFAULT_MOCK_DELAY: Duration = Duration::from_millis(600);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Options chosen for a single invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunOptions {
    pub mock_mode_enabled: bool,
    pub credential: Option<String>,
    pub editable_mock_body: String,
    pub proxy_enabled: bool,
}

impl RunOptions {
    /// The credential to inject, if any. An empty string counts as absent.
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref().filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultSource {
    Live,
    Mock,
    Proxy,
    CustomMock,
}

impl fmt::Display for ResultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultSource::Live => write!(f, "Live"),
            ResultSource::Mock => write!(f, "Mock"),
            ResultSource::Proxy => write!(f, "Proxy"),
            ResultSource::CustomMock => write!(f, "Custom Mock"),
        }
    }
}

/// Normalized outcome of one invocation.
///
/// `status_code` is `0` when no HTTP response was received at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    pub payload: Value,
    pub status_code: u16,
    pub duration_ms: u64,
    pub source: ResultSource,
}

impl ExecutionResult {
    pub fn error_message(&self) -> Option<&str> {
        self.payload.get("error").and_then(Value::as_str)
    }

    pub fn is_transport_failure(&self) -> bool {
        self.status_code == 0
    }
}

/// The four mutually exclusive ways an invocation can be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPath {
    CustomMock,
    MockShortCircuit,
    Live,
    Proxied,
}

impl ExecutionPath {
    pub fn select(descriptor: &ApiDescriptor, options: &RunOptions) -> Self {
        if options.mock_mode_enabled {
            ExecutionPath::CustomMock
        } else if descriptor.auth_required && options.credential().is_none() {
            ExecutionPath::MockShortCircuit
        } else if options.proxy_enabled {
            ExecutionPath::Proxied
        } else {
            ExecutionPath::Live
        }
    }

    pub fn touches_network(self) -> bool {
        matches!(self, ExecutionPath::Live | ExecutionPath::Proxied)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// CORS relay; the target URL is passed as its `url` query argument.
    pub proxy_base: String,
    /// Artificial pause before mock results so callers can show a pending state.
    pub mock_delay: Duration,
    /// `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            proxy_base: DEFAULT_PROXY_BASE.to_string(),
            mock_delay: DEFAULT_MOCK_DELAY,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl EngineConfig {
    pub fn without_delay(mut self) -> Self {
        self.mock_delay = Duration::ZERO;
        self
    }
}
