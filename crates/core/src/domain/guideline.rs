use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuidelineId(pub String);

impl std::fmt::Display for GuidelineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidelineContent {
    pub condition: String,
    pub action: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guideline {
    pub id: GuidelineId,
    pub condition: String,
    pub action: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidelineConnection {
    pub id: String,
    pub source: Guideline,
    pub target: Guideline,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub indirect: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolId {
    pub service_name: String,
    pub tool_name: String,
}

impl ToolId {
    pub fn new(service_name: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into(), tool_name: tool_name.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolAssociation {
    pub id: String,
    pub guideline_id: GuidelineId,
    pub tool_id: ToolId,
}

/// A guideline together with its connections and tool associations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidelineDetail {
    pub guideline: Guideline,
    #[serde(default)]
    pub connections: Vec<GuidelineConnection>,
    #[serde(default)]
    pub tool_associations: Vec<ToolAssociation>,
}

pub const CONNECTION_KIND_ENTAILS: &str = "entails";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionAddition {
    pub source: GuidelineId,
    pub target: GuidelineId,
    pub kind: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionsPatch {
    pub add: Vec<ConnectionAddition>,
    /// Target guideline ids whose connection from this guideline is removed.
    pub remove: Vec<GuidelineId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolAssociationsPatch {
    pub add: Vec<ToolId>,
    pub remove: Vec<ToolId>,
}

/// Partial update body for a guideline. Empty lists are still sent so the
/// backend sees an explicit no-op for the side that is not being changed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidelinePatch {
    pub connections: ConnectionsPatch,
    pub tool_associations: ToolAssociationsPatch,
}

impl GuidelinePatch {
    pub fn add_tool(tool: ToolId) -> Self {
        Self {
            tool_associations: ToolAssociationsPatch { add: vec![tool], remove: Vec::new() },
            ..Self::default()
        }
    }

    pub fn remove_tool(tool: ToolId) -> Self {
        Self {
            tool_associations: ToolAssociationsPatch { add: Vec::new(), remove: vec![tool] },
            ..Self::default()
        }
    }

    pub fn add_connection(addition: ConnectionAddition) -> Self {
        Self {
            connections: ConnectionsPatch { add: vec![addition], remove: Vec::new() },
            ..Self::default()
        }
    }

    pub fn remove_connection(target: GuidelineId) -> Self {
        Self {
            connections: ConnectionsPatch { add: Vec::new(), remove: vec![target] },
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.connections.add.is_empty()
            && self.connections.remove.is_empty()
            && self.tool_associations.add.is_empty()
            && self.tool_associations.remove.is_empty()
    }
}
