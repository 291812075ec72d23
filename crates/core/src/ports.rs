use async_trait::async_trait;
use serde_json::Value;

use crate::domain::agent::{Agent, AgentDraft, AgentId};
use crate::domain::evaluation::{Evaluation, EvaluationId, EvaluationOptions, Invoice};
use crate::domain::guideline::{Guideline, GuidelineDetail, GuidelineId, GuidelinePatch};
use crate::domain::service::{Service, ServiceConfig};
use crate::errors::ApiResult;

/// Typed operations exposed by the remote agent backend.
///
/// Implementations hold no session state: every call is an independent
/// request, so the same instance can serve any number of workflows.
#[async_trait]
pub trait ConsoleApi: Send + Sync {
    async fn list_agents(&self) -> ApiResult<Vec<Agent>>;
    async fn get_agent(&self, agent_id: &AgentId) -> ApiResult<Agent>;
    async fn create_agent(&self, draft: &AgentDraft) -> ApiResult<Agent>;
    async fn update_agent(&self, agent_id: &AgentId, draft: &AgentDraft) -> ApiResult<()>;
    async fn delete_agent(&self, agent_id: &AgentId) -> ApiResult<()>;

    async fn list_guidelines(&self, agent_id: &AgentId) -> ApiResult<Vec<Guideline>>;
    async fn read_guideline(
        &self,
        agent_id: &AgentId,
        guideline_id: &GuidelineId,
    ) -> ApiResult<GuidelineDetail>;
    /// Commits invoices from a completed evaluation as persisted guidelines.
    async fn add_guideline(&self, agent_id: &AgentId, invoices: &[Invoice]) -> ApiResult<Value>;
    async fn update_guideline(
        &self,
        agent_id: &AgentId,
        guideline_id: &GuidelineId,
        patch: &GuidelinePatch,
    ) -> ApiResult<GuidelineDetail>;
    async fn delete_guideline(
        &self,
        agent_id: &AgentId,
        guideline_id: &GuidelineId,
    ) -> ApiResult<()>;

    async fn create_evaluation(
        &self,
        agent_id: &AgentId,
        condition: &str,
        action: &str,
        options: EvaluationOptions,
    ) -> ApiResult<Evaluation>;
    /// `wait_for_completion` is forwarded to the server as a hint; the call
    /// itself never blocks client-side beyond the request.
    async fn read_evaluation(
        &self,
        evaluation_id: &EvaluationId,
        wait_for_completion: Option<u32>,
    ) -> ApiResult<Evaluation>;

    async fn list_services(&self) -> ApiResult<Vec<Service>>;
    async fn read_service(&self, name: &str) -> ApiResult<Service>;
    async fn update_service(&self, name: &str, config: &ServiceConfig) -> ApiResult<Value>;
    async fn delete_service(&self, name: &str) -> ApiResult<()>;
}
