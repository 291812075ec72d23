use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Sdk,
    #[serde(rename = "openapi")]
    OpenApi,
}

impl ServiceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sdk => "sdk",
            Self::OpenApi => "openapi",
        }
    }
}

impl std::str::FromStr for ServiceKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sdk" => Ok(Self::Sdk),
            "openapi" => Ok(Self::OpenApi),
            other => Err(format!("unsupported service kind `{other}` (expected sdk|openapi)")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
    #[serde(default)]
    pub required: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub kind: ServiceKind,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub tools: Vec<Tool>,
}

/// Registration settings for a tool service, one shape per kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceConfig {
    Sdk { url: String },
    OpenApi { url: String, source: String },
}

impl ServiceConfig {
    pub fn kind(&self) -> ServiceKind {
        match self {
            Self::Sdk { .. } => ServiceKind::Sdk,
            Self::OpenApi { .. } => ServiceKind::OpenApi,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Sdk { url } | Self::OpenApi { url, .. } => url,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkServiceParams {
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenApiServiceParams {
    pub url: String,
    pub source: String,
}

/// Body of `PUT /services/{name}`: `kind` plus the matching parameter block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceUpdateRequest {
    pub kind: ServiceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk: Option<SdkServiceParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openapi: Option<OpenApiServiceParams>,
}

impl From<ServiceConfig> for ServiceUpdateRequest {
    fn from(config: ServiceConfig) -> Self {
        match config {
            ServiceConfig::Sdk { url } => {
                Self { kind: ServiceKind::Sdk, sdk: Some(SdkServiceParams { url }), openapi: None }
            }
            ServiceConfig::OpenApi { url, source } => Self {
                kind: ServiceKind::OpenApi,
                sdk: None,
                openapi: Some(OpenApiServiceParams { url, source }),
            },
        }
    }
}
