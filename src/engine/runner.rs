use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use serde_json::{json, Value};

use crate::catalog::ApiDescriptor;

use super::{
    models::{EngineConfig, ExecutionPath, ExecutionResult, ResultSource, RunOptions},
    normalize::classify,
    request::build_request_url,
    transport::{HttpTransport, ReqwestTransport},
};

pub const INVALID_MOCK_MESSAGE: &str = "Invalid JSON format. Please correct the JSON syntax.";

/// Executes descriptors. Calls are independent; concurrent calls complete in
/// whatever order their network requests do.
#[derive(Clone)]
pub struct Engine {
    config: EngineConfig,
    transport: Arc<dyn HttpTransport>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::default()))
    }

    pub fn with_transport(config: EngineConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs one invocation. Never fails: every error ends up in the returned result.
    pub async fn execute(&self, descriptor: &ApiDescriptor, options: &RunOptions) -> ExecutionResult {
        let start = Instant::now();

        let path = ExecutionPath::select(descriptor, options);
        let (success, status_code, source, payload) = match path {
            ExecutionPath::CustomMock => {
                self.pending().await;
                match serde_json::from_str::<Value>(&options.editable_mock_body) {
                    Ok(parsed) => (true, 200, ResultSource::CustomMock, parsed),
                    Err(_) => (
                        false,
                        400,
                        ResultSource::CustomMock,
                        json!({ "error": INVALID_MOCK_MESSAGE }),
                    ),
                }
            }
            ExecutionPath::MockShortCircuit => {
                self.pending().await;
                (true, 200, ResultSource::Mock, descriptor.mock_response.clone())
            }
            ExecutionPath::Live | ExecutionPath::Proxied => {
                let source = if path == ExecutionPath::Proxied {
                    ResultSource::Proxy
                } else {
                    ResultSource::Live
                };
                let url = build_request_url(descriptor, options, &self.config.proxy_base);
                match self.transport.get(&url, self.config.timeout).await {
                    Ok(response) => (
                        (200..300).contains(&response.status),
                        response.status,
                        source,
                        classify(
                            response.content_type.as_deref(),
                            &response.body,
                            &response.status_text,
                        ),
                    ),
                    Err(err) => (false, 0, source, json!({ "error": err.user_message() })),
                }
            }
        };

        ExecutionResult {
            success,
            payload,
            status_code,
            duration_ms: elapsed_ms(start.elapsed()),
            source,
        }
    }

    async fn pending(&self) {
        if !self.config.mock_delay.is_zero() {
            tokio::time::sleep(self.config.mock_delay).await;
        }
    }
}

fn elapsed_ms(elapsed: Duration) -> u64 {
    (elapsed.as_secs_f64() * 1000.0).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AuthType;
    use crate::engine::transport::{RawResponse, TransportError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        urls: Mutex<Vec<String>>,
        failure: Option<TransportError>,
    }

    #[async_trait]
    impl HttpTransport for RecordingTransport {
        async fn get(
            &self,
            url: &str,
            _timeout: Option<Duration>,
        ) -> Result<RawResponse, TransportError> {
            self.urls.lock().unwrap().push(url.to_string());
            if let Some(err) = &self.failure {
                return Err(err.clone());
            }
            Ok(RawResponse {
                status: 200,
                status_text: "OK".into(),
                content_type: Some("application/json".into()),
                body: "{\"fact\":\"x\"}".into(),
            })
        }
    }

    fn engine(transport: Arc<RecordingTransport>) -> Engine {
        Engine::with_transport(EngineConfig::default().without_delay(), transport)
    }

    #[tokio::test]
    async fn custom_mock_never_touches_network() {
        let transport = Arc::new(RecordingTransport::default());
        let descriptor = ApiDescriptor::new("fact", "https://api.example.com/fact");
        let options = RunOptions {
            mock_mode_enabled: true,
            editable_mock_body: "{\"edited\": [1, 2]}".into(),
            ..RunOptions::default()
        };

        let result = engine(transport.clone()).execute(&descriptor, &options).await;
        assert!(result.success);
        assert_eq!(result.status_code, 200);
        assert_eq!(result.source, ResultSource::CustomMock);
        assert_eq!(result.payload, json!({ "edited": [1, 2] }));
        assert!(transport.urls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn gated_api_without_credential_returns_descriptor_mock() {
        let transport = Arc::new(RecordingTransport::default());
        let descriptor = ApiDescriptor::new("gated", "https://api.example.com/data")
            .with_auth(AuthType::ApiKey, json!({ "temp": 280 }));

        let result = engine(transport.clone())
            .execute(&descriptor, &RunOptions::default())
            .await;
        assert_eq!(result.source, ResultSource::Mock);
        assert_eq!(result.payload, json!({ "temp": 280 }));
        assert!(transport.urls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn network_failure_reports_status_zero_with_source() {
        let transport = Arc::new(RecordingTransport {
            failure: Some(TransportError::Network("connection refused".into())),
            ..RecordingTransport::default()
        });
        let descriptor = ApiDescriptor::new("fact", "https://api.example.com/fact");
        let options = RunOptions {
            proxy_enabled: true,
            ..RunOptions::default()
        };

        let result = engine(transport.clone()).execute(&descriptor, &options).await;
        assert!(!result.success);
        assert_eq!(result.status_code, 0);
        assert_eq!(result.source, ResultSource::Proxy);
        assert!(result.error_message().unwrap().contains("CORS"));
        assert!(transport.urls.lock().unwrap()[0].starts_with("https://api.allorigins.win/raw?url="));
    }

    #[tokio::test(start_paused = true)]
    async fn mock_paths_wait_for_configured_delay() {
        let transport = Arc::new(RecordingTransport::default());
        let config = EngineConfig {
            mock_delay: Duration::from_millis(600),
            ..EngineConfig::default()
        };
        let engine = Engine::with_transport(config, transport);
        let descriptor = ApiDescriptor::new("fact", "https://api.example.com/fact");
        let options = RunOptions {
            mock_mode_enabled: true,
            editable_mock_body: "null".into(),
            ..RunOptions::default()
        };

        let before = tokio::time::Instant::now();
        let result = engine.execute(&descriptor, &options).await;
        assert!(before.elapsed() >= Duration::from_millis(600));
        assert!(result.success);
        assert_eq!(result.payload, Value::Null);
    }

    #[test]
    fn elapsed_ms_rounds() {
        assert_eq!(elapsed_ms(Duration::from_micros(1_499)), 1);
        assert_eq!(elapsed_ms(Duration::from_micros(1_500)), 2);
    }
}
