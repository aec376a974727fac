mod models;
mod normalize;
mod request;
mod runner;
mod transport;

pub use models::{
    EngineConfig, ExecutionPath, ExecutionResult, ResultSource, RunOptions, DEFAULT_MOCK_DELAY,
    DEFAULT_PROXY_BASE, DEFAULT_TIMEOUT,
};
pub use normalize::{classify, is_json_content_type};
pub use request::{build_request_url, inject_credential, wrap_in_proxy, CREDENTIAL_ALIASES};
pub use runner::{Engine, INVALID_MOCK_MESSAGE};
pub use transport::{
    HttpTransport, RawResponse, ReqwestTransport, TransportError, NETWORK_FAILURE_MESSAGE,
};
