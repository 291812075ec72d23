use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    /// The backend may send `null` or omit the field; both read as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_utc: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_engine_iterations: Option<u32>,
}

/// Editable agent fields, sent as the body of create and full-replace calls.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDraft {
    pub name: String,
    pub description: String,
}

impl From<&Agent> for AgentDraft {
    fn from(agent: &Agent) -> Self {
        Self { name: agent.name.clone(), description: agent.description.clone() }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::{Agent, AgentDraft, AgentId};

    #[test]
    fn null_description_reads_as_empty_string() {
        let agent: Agent =
            serde_json::from_str(r#"{"id":"ag_1","name":"Support","description":null}"#)
                .expect("agent should decode");

        assert_eq!(agent.id, AgentId("ag_1".to_owned()));
        assert_eq!(agent.description, "");
    }

    #[test]
    fn missing_description_reads_as_empty_string() {
        let agent: Agent =
            serde_json::from_str(r#"{"id":"ag_2","name":"Sales"}"#).expect("agent should decode");

        assert_eq!(agent.description, "");
        assert!(agent.creation_utc.is_none());
    }

    #[test]
    fn draft_copies_editable_fields() {
        let agent = Agent {
            id: AgentId("ag_3".to_owned()),
            name: "Billing".to_owned(),
            description: "Handles invoices".to_owned(),
            creation_utc: None,
            max_engine_iterations: Some(3),
        };

        let draft = AgentDraft::from(&agent);
        assert_eq!(draft.name, "Billing");
        assert_eq!(draft.description, "Handles invoices");
    }
}
