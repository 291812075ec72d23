use async_trait::async_trait;
use parlant_console_core::config::ApiConfig;
use parlant_console_core::domain::agent::{Agent, AgentDraft, AgentId};
use parlant_console_core::domain::evaluation::{
    Evaluation, EvaluationId, EvaluationOptions, EvaluationRequest, Invoice,
};
use parlant_console_core::domain::guideline::{
    Guideline, GuidelineContent, GuidelineDetail, GuidelineId, GuidelinePatch,
};
use parlant_console_core::domain::service::{Service, ServiceConfig, ServiceUpdateRequest};
use parlant_console_core::errors::{ApiError, ApiResult};
use parlant_console_core::ports::ConsoleApi;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::http::HttpBackend;

pub const USER_AGENT_VALUE: &str = concat!("parlant-console/", env!("CARGO_PKG_VERSION"));

/// Stateless client for the agent backend. Cloning is cheap and clones share
/// one connection pool.
#[derive(Debug, Clone)]
pub struct ConsoleClient {
    http: HttpBackend,
}

#[derive(Serialize)]
struct AddGuidelinesBody<'a> {
    invoices: &'a [Invoice],
}

impl ConsoleClient {
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(default_headers)
            .build()
            .map_err(|error| ApiError::Network(format!("failed to create HTTP client: {error}")))?;

        let trimmed = config.base_url.trim().trim_end_matches('/');
        let base_url = Url::parse(trimmed).map_err(|error| {
            ApiError::Validation(format!("invalid api base url `{trimmed}`: {error}"))
        })?;

        Ok(Self { http: HttpBackend { client, base_url, token: config.token } })
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url.as_str()
    }

    pub fn is_authenticated(&self) -> bool {
        self.http.token.is_some()
    }

    async fn get<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        segments: &[&str],
    ) -> ApiResult<T> {
        let url = self.http.endpoint(segments)?;
        self.http.send_json(operation, self.http.request(Method::GET, url)).await
    }

    async fn delete(&self, operation: &'static str, segments: &[&str]) -> ApiResult<()> {
        let url = self.http.endpoint(segments)?;
        self.http.send_empty(operation, self.http.request(Method::DELETE, url)).await
    }

    async fn send_body<B, T>(
        &self,
        operation: &'static str,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.http.endpoint(segments)?;
        self.http.send_json(operation, self.http.request(method, url).json(body)).await
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        segments: &[&str],
        envelope_key: &str,
    ) -> ApiResult<Vec<T>> {
        let value: Value = self.get(operation, segments).await?;
        decode_list(operation, value, envelope_key)
    }
}

/// Accepts either a bare JSON array or an object wrapping the array under
/// `envelope_key`, since backend versions differ.
fn decode_list<T: DeserializeOwned>(
    operation: &'static str,
    value: Value,
    envelope_key: &str,
) -> ApiResult<Vec<T>> {
    let items = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => map.remove(envelope_key).ok_or_else(|| {
            ApiError::InvalidResponse(format!("{operation}: missing `{envelope_key}` list"))
        })?,
        other => {
            return Err(ApiError::InvalidResponse(format!(
                "{operation}: expected a list, got {other}"
            )))
        }
    };
    serde_json::from_value(items)
        .map_err(|error| ApiError::InvalidResponse(format!("{operation}: {error}")))
}

#[async_trait]
impl ConsoleApi for ConsoleClient {
    async fn list_agents(&self) -> ApiResult<Vec<Agent>> {
        self.get_list("list_agents", &["agents"], "agents").await
    }

    async fn get_agent(&self, agent_id: &AgentId) -> ApiResult<Agent> {
        self.get("get_agent", &["agents", agent_id.0.as_str()]).await
    }

    async fn create_agent(&self, draft: &AgentDraft) -> ApiResult<Agent> {
        self.send_body("create_agent", Method::POST, &["agents"], draft).await
    }

    async fn update_agent(&self, agent_id: &AgentId, draft: &AgentDraft) -> ApiResult<()> {
        let url = self.http.endpoint(&["agents", agent_id.0.as_str()])?;
        self.http.send_empty("update_agent", self.http.request(Method::PUT, url).json(draft)).await
    }

    async fn delete_agent(&self, agent_id: &AgentId) -> ApiResult<()> {
        self.delete("delete_agent", &["agents", agent_id.0.as_str()]).await
    }

    async fn list_guidelines(&self, agent_id: &AgentId) -> ApiResult<Vec<Guideline>> {
        let segments = ["agents", agent_id.0.as_str(), "guidelines"];
        self.get_list("list_guidelines", &segments, "guidelines").await
    }

    async fn read_guideline(
        &self,
        agent_id: &AgentId,
        guideline_id: &GuidelineId,
    ) -> ApiResult<GuidelineDetail> {
        let segments = ["agents", agent_id.0.as_str(), "guidelines", guideline_id.0.as_str()];
        self.get("read_guideline", &segments).await
    }

    async fn add_guideline(&self, agent_id: &AgentId, invoices: &[Invoice]) -> ApiResult<Value> {
        self.send_body(
            "add_guideline",
            Method::POST,
            &["agents", agent_id.0.as_str(), "guidelines"],
            &AddGuidelinesBody { invoices },
        )
        .await
    }

    async fn update_guideline(
        &self,
        agent_id: &AgentId,
        guideline_id: &GuidelineId,
        patch: &GuidelinePatch,
    ) -> ApiResult<GuidelineDetail> {
        self.send_body(
            "update_guideline",
            Method::PATCH,
            &["agents", agent_id.0.as_str(), "guidelines", guideline_id.0.as_str()],
            patch,
        )
        .await
    }

    async fn delete_guideline(
        &self,
        agent_id: &AgentId,
        guideline_id: &GuidelineId,
    ) -> ApiResult<()> {
        let segments = ["agents", agent_id.0.as_str(), "guidelines", guideline_id.0.as_str()];
        self.delete("delete_guideline", &segments).await
    }

    async fn create_evaluation(
        &self,
        agent_id: &AgentId,
        condition: &str,
        action: &str,
        options: EvaluationOptions,
    ) -> ApiResult<Evaluation> {
        let request = EvaluationRequest::add_guideline(
            agent_id.clone(),
            GuidelineContent { condition: condition.to_string(), action: action.to_string() },
            options,
        );
        self.send_body("create_evaluation", Method::POST, &["index", "evaluations"], &request).await
    }

    async fn read_evaluation(
        &self,
        evaluation_id: &EvaluationId,
        wait_for_completion: Option<u32>,
    ) -> ApiResult<Evaluation> {
        let url = self.http.endpoint(&["index", "evaluations", evaluation_id.0.as_str()])?;
        let mut request = self.http.request(Method::GET, url);
        if let Some(seconds) = wait_for_completion {
            request = request.query(&[("wait_for_completion", seconds)]);
        }
        self.http.send_json("read_evaluation", request).await
    }

    async fn list_services(&self) -> ApiResult<Vec<Service>> {
        self.get_list("list_services", &["services"], "services").await
    }

    async fn read_service(&self, name: &str) -> ApiResult<Service> {
        self.get("read_service", &["services", name]).await
    }

    async fn update_service(&self, name: &str, config: &ServiceConfig) -> ApiResult<Value> {
        let body = ServiceUpdateRequest::from(config.clone());
        self.send_body("update_service", Method::PUT, &["services", name], &body).await
    }

    async fn delete_service(&self, name: &str) -> ApiResult<()> {
        self.delete("delete_service", &["services", name]).await
    }
}
