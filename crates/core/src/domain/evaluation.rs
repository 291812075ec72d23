use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::agent::AgentId;
use crate::domain::guideline::GuidelineContent;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvaluationId(pub String);

impl std::fmt::Display for EvaluationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl EvaluationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Backend evaluation job as last read. Replaced wholesale on every read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: EvaluationId,
    pub status: EvaluationStatus,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub invoices: Vec<Invoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_utc: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Evaluation {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// The guideline findings shown to the operator come from the first invoice.
    pub fn primary_invoice(&self) -> Option<&Invoice> {
        self.invoices.first()
    }
}

/// Result entry attached to an evaluation. Kept verbatim so that committing
/// sends back exactly what the backend produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Invoice(pub Value);

impl Invoice {
    pub fn approved(&self) -> bool {
        self.0.get("approved").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn coherence_checks(&self) -> Vec<CoherenceCheck> {
        self.guideline_entries("coherence_checks")
    }

    pub fn connection_propositions(&self) -> Vec<ConnectionProposition> {
        self.guideline_entries("connection_propositions")
    }

    fn guideline_entries<T>(&self, key: &str) -> Vec<T>
    where
        T: DeserializeOwned,
    {
        let Some(entries) = self
            .0
            .get("data")
            .and_then(|data| data.get("guideline"))
            .and_then(|guideline| guideline.get(key))
            .and_then(Value::as_array)
        else {
            return Vec::new();
        };

        entries.iter().filter_map(|entry| serde_json::from_value(entry.clone()).ok()).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoherenceCheck {
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<GuidelineContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second: Option<GuidelineContent>,
    pub issue: String,
    #[serde(default)]
    pub severity: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProposition {
    #[serde(default)]
    pub check_kind: String,
    pub source: GuidelineContent,
    pub target: GuidelineContent,
}

/// Which backend checks run for a proposed guideline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvaluationOptions {
    pub coherence_check: bool,
    pub connection_proposition: bool,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self { coherence_check: true, connection_proposition: true }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub agent_id: AgentId,
    pub payloads: Vec<EvaluationPayload>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvaluationPayload {
    Guideline { guideline: GuidelinePayload },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidelinePayload {
    pub content: GuidelineContent,
    pub operation: String,
    pub coherence_check: bool,
    pub connection_proposition: bool,
}

impl EvaluationRequest {
    pub fn add_guideline(
        agent_id: AgentId,
        content: GuidelineContent,
        options: EvaluationOptions,
    ) -> Self {
        Self {
            agent_id,
            payloads: vec![EvaluationPayload::Guideline {
                guideline: GuidelinePayload {
                    content,
                    operation: "add".to_string(),
                    coherence_check: options.coherence_check,
                    connection_proposition: options.connection_proposition,
                },
            }],
        }
    }
}
