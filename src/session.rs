use std::{collections::HashMap, sync::Arc};

use thiserror::Error;
use tracing::{debug, info};

use crate::{
    catalog::{ApiDescriptor, Catalog},
    engine::{Engine, ExecutionPath, ExecutionResult, RunOptions},
    history::{HistoryEntry, HistoryLog},
};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Unknown API: {0}")]
    UnknownApi(String),
    #[error("No API selected")]
    NoApiSelected,
    #[error("No history entry with id {0}")]
    UnknownHistoryEntry(u64),
}

/// Owns the state around the engine: the selected API, the options being edited,
/// the last result and the history. Calls are serialized through `&mut self`.
pub struct Session {
    engine: Engine,
    catalog: Arc<Catalog>,
    credentials: HashMap<String, String>,
    history_capacity: Option<usize>,
    selected: Option<String>,
    options: RunOptions,
    last_result: Option<ExecutionResult>,
    history: HistoryLog,
    cors_hint: bool,
}

impl Session {
    pub fn new(engine: Engine, catalog: Arc<Catalog>) -> Self {
        Self {
            engine,
            catalog,
            credentials: HashMap::new(),
            history_capacity: None,
            selected: None,
            options: RunOptions::default(),
            last_result: None,
            history: HistoryLog::new(),
            cors_hint: false,
        }
    }

    /// Credentials pre-filled when an API is selected, keyed by API id.
    pub fn with_credentials(mut self, credentials: HashMap<String, String>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_history_capacity(mut self, capacity: Option<usize>) -> Self {
        self.history_capacity = capacity;
        self.history = new_history(capacity);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn proxy_base(&self) -> &str {
        &self.engine.config().proxy_base
    }

    /// Switches to another API and resets everything tied to the previous one.
    pub fn select(&mut self, id: &str) -> Result<&ApiDescriptor, SessionError> {
        let descriptor = self
            .catalog
            .get(id)
            .ok_or_else(|| SessionError::UnknownApi(id.to_string()))?;

        self.options = RunOptions {
            credential: self.credentials.get(id).cloned(),
            editable_mock_body: serde_json::to_string_pretty(&descriptor.mock_response)
                .unwrap_or_default(),
            ..RunOptions::default()
        };
        self.history = new_history(self.history_capacity);
        self.last_result = None;
        self.cors_hint = false;
        self.selected = Some(id.to_string());

        info!(api = id, "selected API");
        Ok(descriptor)
    }

    pub fn descriptor(&self) -> Option<&ApiDescriptor> {
        self.selected.as_deref().and_then(|id| self.catalog.get(id))
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    pub fn set_credential(&mut self, credential: Option<String>) {
        self.options.credential = credential.filter(|value| !value.is_empty());
    }

    pub fn set_mock_mode(&mut self, enabled: bool) {
        self.options.mock_mode_enabled = enabled;
    }

    pub fn set_mock_body(&mut self, body: impl Into<String>) {
        self.options.editable_mock_body = body.into();
    }

    pub fn set_proxy(&mut self, enabled: bool) {
        self.options.proxy_enabled = enabled;
    }

    pub async fn run(&mut self) -> Result<ExecutionResult, SessionError> {
        let proxy = self.options.proxy_enabled;
        self.run_with_proxy(proxy).await
    }

    /// Runs with `proxy` overriding the current toggle for this invocation only.
    pub async fn run_with_proxy(&mut self, proxy: bool) -> Result<ExecutionResult, SessionError> {
        let catalog = Arc::clone(&self.catalog);
        let descriptor = self
            .selected
            .as_deref()
            .and_then(|id| catalog.get(id))
            .ok_or(SessionError::NoApiSelected)?;

        let options = RunOptions {
            proxy_enabled: proxy,
            ..self.options.clone()
        };
        debug!(
            api = %descriptor.id,
            path = ?ExecutionPath::select(descriptor, &options),
            "running"
        );

        self.last_result = None;
        let result = self.engine.execute(descriptor, &options).await;
        info!(
            api = %descriptor.id,
            status = result.status_code,
            source = %result.source,
            duration_ms = result.duration_ms,
            success = result.success,
            "run finished"
        );

        self.history.record(HistoryEntry::new(&options, &result));
        self.last_result = Some(result.clone());
        Ok(result)
    }

    /// Turns the relay on and re-runs.
    pub async fn fix_cors(&mut self) -> Result<ExecutionResult, SessionError> {
        self.options.proxy_enabled = true;
        self.cors_hint = true;
        self.run_with_proxy(true).await
    }

    /// Adopts the options of a past run. Nothing is re-run.
    pub fn restore(&mut self, entry_id: u64) -> Result<&RunOptions, SessionError> {
        let entry = self
            .history
            .get(entry_id)
            .ok_or(SessionError::UnknownHistoryEntry(entry_id))?;
        self.options = self.history.restore(entry);
        self.last_result = None;
        self.cors_hint = false;
        debug!(entry = entry_id, "restored options from history");
        Ok(&self.options)
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        debug!("history cleared");
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn last_result(&self) -> Option<&ExecutionResult> {
        self.last_result.as_ref()
    }

    /// Whether the relay was switched on by [`Session::fix_cors`].
    pub fn cors_hint_visible(&self) -> bool {
        self.cors_hint
    }
}

fn new_history(capacity: Option<usize>) -> HistoryLog {
    match capacity {
        Some(capacity) => HistoryLog::with_capacity(capacity),
        None => HistoryLog::new(),
    }
}

/// Failures the relay might get around: no response at all, or an explicit
/// network/CORS message.
pub fn is_cors_error(result: &ExecutionResult) -> bool {
    if result.success {
        return false;
    }
    result.error_message().is_some_and(|message| {
        message.contains("Network Error")
            || message.contains("CORS")
            || message.contains("fetch failed")
    })
}

pub fn error_suggestion(status_code: u16) -> &'static str {
    match status_code {
        0 => "Check your internet connection or CORS settings. Many public APIs block direct browser requests.",
        401 => "The API Key provided is likely invalid or missing.",
        403 => "Access Forbidden. You may be rate limited or restricted.",
        404 => "The endpoint URL is incorrect or the resource no longer exists.",
        _ => "Check the response body below for specific error messages.",
    }
}
