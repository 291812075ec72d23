#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use parlant_console_core::domain::agent::{Agent, AgentDraft, AgentId};
use parlant_console_core::domain::evaluation::{
    Evaluation, EvaluationId, EvaluationOptions, EvaluationStatus, Invoice,
};
use parlant_console_core::domain::guideline::{
    Guideline, GuidelineConnection, GuidelineDetail, GuidelineId, GuidelinePatch,
    ToolAssociation,
};
use parlant_console_core::domain::service::{Service, ServiceConfig};
use parlant_console_core::errors::{ApiError, ApiResult};
use parlant_console_core::ports::ConsoleApi;
use serde_json::{json, Value};
use tokio::time::Instant;

/// In-memory backend with scripted evaluation reads and per-operation
/// failure injection. Clones share state.
#[derive(Clone, Default)]
pub struct FakeApi {
    inner: Arc<Mutex<FakeState>>,
}

#[derive(Default)]
pub struct FakeState {
    pub agents: Vec<Agent>,
    pub guidelines: BTreeMap<String, Vec<GuidelineDetail>>,
    pub services: Vec<Service>,
    pub created: VecDeque<Evaluation>,
    pub reads: VecDeque<ApiResult<Evaluation>>,
    pub last_read: Option<Evaluation>,
    pub failures: BTreeMap<&'static str, ApiError>,
    pub calls: Vec<&'static str>,
    pub read_times: Vec<Instant>,
    pub read_hints: Vec<Option<u32>>,
    pub committed: Vec<(AgentId, Vec<Invoice>)>,
    pub patches: Vec<GuidelinePatch>,
    pub evaluation_requests: Vec<(AgentId, String, String, EvaluationOptions)>,
    next_id: u32,
}

impl FakeState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}_{}", self.next_id)
    }
}

pub fn evaluation(id: &str, status: EvaluationStatus, progress: f64) -> Evaluation {
    Evaluation {
        id: EvaluationId(id.to_string()),
        status,
        progress,
        invoices: Vec::new(),
        creation_utc: None,
        error: None,
    }
}

pub fn completed_with_invoice(id: &str) -> Evaluation {
    Evaluation {
        invoices: vec![refund_invoice()],
        ..evaluation(id, EvaluationStatus::Completed, 100.0)
    }
}

pub fn refund_invoice() -> Invoice {
    Invoice(json!({
        "payload": {
            "content": {"condition": "user asks for refund", "action": "offer store credit"},
            "operation": "add"
        },
        "checksum": "chk-1",
        "approved": true,
        "data": {
            "guideline": {
                "coherence_checks": [],
                "connection_propositions": [{
                    "check_kind": "connection_with_another_evaluated_guideline",
                    "source": {"condition": "user asks for refund", "action": "offer store credit"},
                    "target": {"condition": "user accepts credit", "action": "issue voucher"}
                }]
            }
        },
        "error": null
    }))
}

pub fn agent(id: &str, name: &str) -> Agent {
    Agent {
        id: AgentId(id.to_string()),
        name: name.to_string(),
        description: String::new(),
        creation_utc: None,
        max_engine_iterations: None,
    }
}

pub fn guideline(id: &str, condition: &str, action: &str) -> GuidelineDetail {
    GuidelineDetail {
        guideline: Guideline {
            id: GuidelineId(id.to_string()),
            condition: condition.to_string(),
            action: action.to_string(),
        },
        connections: Vec::new(),
        tool_associations: Vec::new(),
    }
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        match self.inner.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn script_create(&self, evaluation: Evaluation) {
        self.state().created.push_back(evaluation);
    }

    pub fn script_reads(&self, reads: impl IntoIterator<Item = ApiResult<Evaluation>>) {
        self.state().reads.extend(reads);
    }

    pub fn fail_next(&self, operation: &'static str, error: ApiError) {
        self.state().failures.insert(operation, error);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state().calls.clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.state().calls.iter().filter(|call| **call == operation).count()
    }

    fn enter(&self, operation: &'static str) -> ApiResult<MutexGuard<'_, FakeState>> {
        let mut state = self.state();
        state.calls.push(operation);
        match state.failures.remove(operation) {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }
}

fn not_found() -> ApiError {
    ApiError::request(404, Some("Not Found".to_string()))
}

#[async_trait]
impl ConsoleApi for FakeApi {
    async fn list_agents(&self) -> ApiResult<Vec<Agent>> {
        Ok(self.enter("list_agents")?.agents.clone())
    }

    async fn get_agent(&self, agent_id: &AgentId) -> ApiResult<Agent> {
        let state = self.enter("get_agent")?;
        state.agents.iter().find(|agent| &agent.id == agent_id).cloned().ok_or_else(not_found)
    }

    async fn create_agent(&self, draft: &AgentDraft) -> ApiResult<Agent> {
        let mut state = self.enter("create_agent")?;
        let id = state.next_id("ag");
        let created = Agent {
            description: draft.description.clone(),
            ..agent(&id, &draft.name)
        };
        state.agents.push(created.clone());
        Ok(created)
    }

    async fn update_agent(&self, agent_id: &AgentId, draft: &AgentDraft) -> ApiResult<()> {
        let mut state = self.enter("update_agent")?;
        let existing =
            state.agents.iter_mut().find(|agent| &agent.id == agent_id).ok_or_else(not_found)?;
        existing.name = draft.name.clone();
        existing.description = draft.description.clone();
        Ok(())
    }

    async fn delete_agent(&self, agent_id: &AgentId) -> ApiResult<()> {
        let mut state = self.enter("delete_agent")?;
        let before = state.agents.len();
        state.agents.retain(|agent| &agent.id != agent_id);
        if state.agents.len() == before {
            return Err(not_found());
        }
        Ok(())
    }

    async fn list_guidelines(&self, agent_id: &AgentId) -> ApiResult<Vec<Guideline>> {
        let state = self.enter("list_guidelines")?;
        Ok(state
            .guidelines
            .get(&agent_id.0)
            .map(|details| details.iter().map(|detail| detail.guideline.clone()).collect())
            .unwrap_or_default())
    }

    async fn read_guideline(
        &self,
        agent_id: &AgentId,
        guideline_id: &GuidelineId,
    ) -> ApiResult<GuidelineDetail> {
        let state = self.enter("read_guideline")?;
        state
            .guidelines
            .get(&agent_id.0)
            .and_then(|details| {
                details.iter().find(|detail| &detail.guideline.id == guideline_id)
            })
            .cloned()
            .ok_or_else(not_found)
    }

    async fn add_guideline(&self, agent_id: &AgentId, invoices: &[Invoice]) -> ApiResult<Value> {
        let mut state = self.enter("add_guideline")?;
        state.committed.push((agent_id.clone(), invoices.to_vec()));
        Ok(json!({"items": invoices.len()}))
    }

    async fn update_guideline(
        &self,
        agent_id: &AgentId,
        guideline_id: &GuidelineId,
        patch: &GuidelinePatch,
    ) -> ApiResult<GuidelineDetail> {
        let mut state = self.enter("update_guideline")?;
        state.patches.push(patch.clone());
        let association_id = state.next_id("ta");
        let connection_id = state.next_id("gc");
        let details = state.guidelines.get_mut(&agent_id.0).ok_or_else(not_found)?;
        let targets: Vec<Guideline> = details.iter().map(|detail| detail.guideline.clone()).collect();
        let detail = details
            .iter_mut()
            .find(|detail| &detail.guideline.id == guideline_id)
            .ok_or_else(not_found)?;

        for tool in &patch.tool_associations.add {
            detail.tool_associations.push(ToolAssociation {
                id: association_id.clone(),
                guideline_id: guideline_id.clone(),
                tool_id: tool.clone(),
            });
        }
        detail
            .tool_associations
            .retain(|association| !patch.tool_associations.remove.contains(&association.tool_id));

        for addition in &patch.connections.add {
            let target = targets
                .iter()
                .find(|candidate| candidate.id == addition.target)
                .cloned()
                .ok_or_else(not_found)?;
            detail.connections.push(GuidelineConnection {
                id: connection_id.clone(),
                source: detail.guideline.clone(),
                target,
                kind: Some(addition.kind.clone()),
                indirect: false,
            });
        }
        detail
            .connections
            .retain(|connection| !patch.connections.remove.contains(&connection.target.id));

        Ok(detail.clone())
    }

    async fn delete_guideline(
        &self,
        agent_id: &AgentId,
        guideline_id: &GuidelineId,
    ) -> ApiResult<()> {
        let mut state = self.enter("delete_guideline")?;
        let details = state.guidelines.get_mut(&agent_id.0).ok_or_else(not_found)?;
        details.retain(|detail| &detail.guideline.id != guideline_id);
        Ok(())
    }

    async fn create_evaluation(
        &self,
        agent_id: &AgentId,
        condition: &str,
        action: &str,
        options: EvaluationOptions,
    ) -> ApiResult<Evaluation> {
        let mut state = self.enter("create_evaluation")?;
        state.evaluation_requests.push((
            agent_id.clone(),
            condition.to_string(),
            action.to_string(),
            options,
        ));
        match state.created.pop_front() {
            Some(created) => Ok(created),
            None => Ok(evaluation("ev_default", EvaluationStatus::Pending, 0.0)),
        }
    }

    async fn read_evaluation(
        &self,
        _evaluation_id: &EvaluationId,
        wait_for_completion: Option<u32>,
    ) -> ApiResult<Evaluation> {
        let mut state = self.enter("read_evaluation")?;
        state.read_times.push(Instant::now());
        state.read_hints.push(wait_for_completion);
        match state.reads.pop_front() {
            Some(Ok(read)) => {
                state.last_read = Some(read.clone());
                Ok(read)
            }
            Some(Err(error)) => Err(error),
            None => state.last_read.clone().ok_or_else(not_found),
        }
    }

    async fn list_services(&self) -> ApiResult<Vec<Service>> {
        Ok(self.enter("list_services")?.services.clone())
    }

    async fn read_service(&self, name: &str) -> ApiResult<Service> {
        let state = self.enter("read_service")?;
        state.services.iter().find(|service| service.name == name).cloned().ok_or_else(not_found)
    }

    async fn update_service(&self, name: &str, config: &ServiceConfig) -> ApiResult<Value> {
        let mut state = self.enter("update_service")?;
        let source = match config {
            ServiceConfig::OpenApi { source, .. } => Some(source.clone()),
            ServiceConfig::Sdk { .. } => None,
        };
        let updated = Service {
            name: name.to_string(),
            kind: config.kind(),
            url: config.url().to_string(),
            source,
            tools: Vec::new(),
        };
        state.services.retain(|service| service.name != name);
        state.services.push(updated);
        Ok(json!({"name": name}))
    }

    async fn delete_service(&self, name: &str) -> ApiResult<()> {
        let mut state = self.enter("delete_service")?;
        let before = state.services.len();
        state.services.retain(|service| service.name != name);
        if state.services.len() == before {
            return Err(not_found());
        }
        Ok(())
    }
}
