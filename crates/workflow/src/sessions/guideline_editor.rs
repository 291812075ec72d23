use parlant_console_core::domain::agent::AgentId;
use parlant_console_core::domain::guideline::{
    ConnectionAddition, Guideline, GuidelineDetail, GuidelineId, GuidelinePatch, ToolId,
    CONNECTION_KIND_ENTAILS,
};
use parlant_console_core::ports::ConsoleApi;

use super::{reject, track, SessionError};

/// Guidelines of one agent and the detail of the selected guideline.
///
/// Tool and connection edits are no-ops (returning `false`) while nothing is
/// selected. Every successful edit replaces the detail with the server copy.
pub struct GuidelineEditor<A> {
    api: A,
    agent_id: Option<AgentId>,
    guidelines: Vec<Guideline>,
    selected: Option<GuidelineDetail>,
    last_error: Option<String>,
}

impl<A: ConsoleApi> GuidelineEditor<A> {
    pub fn new(api: A) -> Self {
        Self { api, agent_id: None, guidelines: Vec::new(), selected: None, last_error: None }
    }

    pub fn agent_id(&self) -> Option<&AgentId> {
        self.agent_id.as_ref()
    }

    pub fn guidelines(&self) -> &[Guideline] {
        &self.guidelines
    }

    pub fn selected(&self) -> Option<&GuidelineDetail> {
        self.selected.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Switches agent, dropping any guideline selection.
    pub async fn select_agent(&mut self, agent_id: &AgentId) -> Result<&[Guideline], SessionError> {
        self.agent_id = Some(agent_id.clone());
        self.selected = None;
        self.guidelines.clear();
        self.refresh().await
    }

    pub async fn refresh(&mut self) -> Result<&[Guideline], SessionError> {
        let Some(agent_id) = self.agent_id.clone() else {
            return reject(&mut self.last_error, SessionError::NoSelection("agent"));
        };
        let listed = self.api.list_guidelines(&agent_id).await;
        self.guidelines = track(&mut self.last_error, "list guidelines", listed)?;
        Ok(&self.guidelines)
    }

    pub async fn select_guideline(
        &mut self,
        guideline_id: &GuidelineId,
    ) -> Result<&GuidelineDetail, SessionError> {
        let Some(agent_id) = self.agent_id.clone() else {
            return reject(&mut self.last_error, SessionError::NoSelection("agent"));
        };
        let read = self.api.read_guideline(&agent_id, guideline_id).await;
        let detail = track(&mut self.last_error, "load guideline", read)?;
        Ok(self.selected.insert(detail))
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub async fn associate_tool(
        &mut self,
        service_name: &str,
        tool_name: &str,
    ) -> Result<bool, SessionError> {
        if service_name.trim().is_empty() || tool_name.trim().is_empty() {
            return Ok(false);
        }
        let patch = GuidelinePatch::add_tool(ToolId::new(service_name, tool_name));
        self.patch_selected("associate tool", patch).await
    }

    pub async fn dissociate_tool(
        &mut self,
        service_name: &str,
        tool_name: &str,
    ) -> Result<bool, SessionError> {
        if service_name.trim().is_empty() || tool_name.trim().is_empty() {
            return Ok(false);
        }
        let patch = GuidelinePatch::remove_tool(ToolId::new(service_name, tool_name));
        self.patch_selected("remove tool association", patch).await
    }

    /// Connects the selected guideline to `target`; `kind` defaults to
    /// `entails`.
    pub async fn connect(
        &mut self,
        target: &GuidelineId,
        kind: Option<&str>,
    ) -> Result<bool, SessionError> {
        let Some(source) = self.selected.as_ref().map(|detail| detail.guideline.id.clone()) else {
            return Ok(false);
        };
        if target.0.trim().is_empty() {
            return Ok(false);
        }
        if &source == target {
            return reject(
                &mut self.last_error,
                SessionError::Validation("A guideline cannot be connected to itself.".to_string()),
            );
        }
        let addition = ConnectionAddition {
            source,
            target: target.clone(),
            kind: kind.unwrap_or(CONNECTION_KIND_ENTAILS).to_string(),
        };
        self.patch_selected("connect guidelines", GuidelinePatch::add_connection(addition)).await
    }

    pub async fn disconnect(&mut self, target: &GuidelineId) -> Result<bool, SessionError> {
        if target.0.trim().is_empty() {
            return Ok(false);
        }
        let patch = GuidelinePatch::remove_connection(target.clone());
        self.patch_selected("disconnect guidelines", patch).await
    }

    pub async fn delete_guideline(&mut self) -> Result<(), SessionError> {
        let (Some(agent_id), Some(detail)) = (self.agent_id.clone(), self.selected.as_ref()) else {
            return reject(&mut self.last_error, SessionError::NoSelection("guideline"));
        };
        let guideline_id = detail.guideline.id.clone();

        let deleted = self.api.delete_guideline(&agent_id, &guideline_id).await;
        track(&mut self.last_error, "delete guideline", deleted)?;
        self.selected = None;
        self.refresh().await?;
        Ok(())
    }

    async fn patch_selected(
        &mut self,
        context: &'static str,
        patch: GuidelinePatch,
    ) -> Result<bool, SessionError> {
        let (Some(agent_id), Some(detail)) = (self.agent_id.clone(), self.selected.as_ref()) else {
            return Ok(false);
        };
        let guideline_id = detail.guideline.id.clone();

        let updated = self.api.update_guideline(&agent_id, &guideline_id, &patch).await;
        self.selected = Some(track(&mut self.last_error, context, updated)?);
        Ok(true)
    }
}
