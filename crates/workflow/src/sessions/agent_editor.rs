use parlant_console_core::domain::agent::{Agent, AgentDraft, AgentId};
use parlant_console_core::ports::ConsoleApi;

use super::{reject, track, SessionError};

/// Agent list plus one editable draft. With a selection, `save` replaces
/// that agent; without one it creates a new agent and selects it.
pub struct AgentEditor<A> {
    api: A,
    agents: Vec<Agent>,
    selected: Option<AgentId>,
    draft: AgentDraft,
    last_error: Option<String>,
}

impl<A: ConsoleApi> AgentEditor<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            agents: Vec::new(),
            selected: None,
            draft: AgentDraft::default(),
            last_error: None,
        }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn selected(&self) -> Option<&AgentId> {
        self.selected.as_ref()
    }

    pub fn draft(&self) -> &AgentDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut AgentDraft {
        &mut self.draft
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub async fn refresh(&mut self) -> Result<&[Agent], SessionError> {
        let listed = self.api.list_agents().await;
        self.agents = track(&mut self.last_error, "list agents", listed)?;
        Ok(&self.agents)
    }

    pub async fn select(&mut self, agent_id: &AgentId) -> Result<&AgentDraft, SessionError> {
        let fetched = self.api.get_agent(agent_id).await;
        let agent = track(&mut self.last_error, "load agent", fetched)?;
        self.selected = Some(agent.id.clone());
        self.draft = AgentDraft::from(&agent);
        Ok(&self.draft)
    }

    pub fn new_agent(&mut self) {
        self.selected = None;
        self.draft = AgentDraft::default();
        self.last_error = None;
    }

    /// Returns the id of the saved agent.
    pub async fn save(&mut self) -> Result<AgentId, SessionError> {
        if self.draft.name.trim().is_empty() {
            return reject(
                &mut self.last_error,
                SessionError::Validation("Agent name is required.".to_string()),
            );
        }

        let saved = match self.selected.clone() {
            Some(agent_id) => {
                let updated = self.api.update_agent(&agent_id, &self.draft).await;
                track(&mut self.last_error, "save agent", updated)?;
                agent_id
            }
            None => {
                let created = self.api.create_agent(&self.draft).await;
                let agent = track(&mut self.last_error, "create agent", created)?;
                self.selected = Some(agent.id.clone());
                agent.id
            }
        };

        self.refresh().await?;
        Ok(saved)
    }

    pub async fn delete(&mut self) -> Result<(), SessionError> {
        let Some(agent_id) = self.selected.clone() else {
            return reject(&mut self.last_error, SessionError::NoSelection("agent"));
        };

        let deleted = self.api.delete_agent(&agent_id).await;
        track(&mut self.last_error, "delete agent", deleted)?;
        self.new_agent();
        self.refresh().await?;
        Ok(())
    }
}
