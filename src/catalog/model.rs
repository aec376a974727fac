use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AuthType {
    #[default]
    None,
    #[serde(rename = "API Key", alias = "ApiKey", alias = "apiKey")]
    ApiKey,
    #[serde(rename = "OAuth", alias = "oauth")]
    OAuth,
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthType::None => write!(f, "None"),
            AuthType::ApiKey => write!(f, "API Key"),
            AuthType::OAuth => write!(f, "OAuth"),
        }
    }
}

/// One third-party API as described by the catalog. Never mutated after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDescriptor {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub auth_required: bool,
    #[serde(default)]
    pub auth_type: AuthType,
    #[serde(default)]
    pub description: String,
    /// URL template; may already carry query parameters.
    #[serde(alias = "endpointTemplate")]
    pub endpoint: String,
    #[serde(default)]
    pub docs_url: Option<String>,
    #[serde(default)]
    pub code_snippet: Option<String>,
    #[serde(default)]
    /// Kept in the order the catalog lists them.
    pub json_explanation: IndexMap<String, String>,
    #[serde(default)]
    pub security_checklist: Vec<String>,
    #[serde(default)]
    pub exercise: Option<String>,
    #[serde(default)]
    pub mock_response: Value,
}

impl ApiDescriptor {
    pub fn new(id: impl Into<String>, endpoint: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            category: String::new(),
            auth_required: false,
            auth_type: AuthType::None,
            description: String::new(),
            endpoint: endpoint.into(),
            docs_url: None,
            code_snippet: None,
            json_explanation: IndexMap::new(),
            security_checklist: Vec::new(),
            exercise: None,
            mock_response: Value::Null,
        }
    }

    pub fn with_auth(mut self, auth_type: AuthType, mock_response: Value) -> Self {
        self.auth_required = auth_type != AuthType::None;
        self.auth_type = auth_type;
        self.mock_response = mock_response;
        self
    }

    pub fn with_mock(mut self, mock_response: Value) -> Self {
        self.mock_response = mock_response;
        self
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}
