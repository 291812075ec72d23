pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod ports;

pub use audit::{AuditContext, AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::agent::{Agent, AgentDraft, AgentId};
pub use domain::evaluation::{
    Evaluation, EvaluationId, EvaluationOptions, EvaluationStatus, Invoice,
};
pub use domain::guideline::{
    Guideline, GuidelineContent, GuidelineDetail, GuidelineId, GuidelinePatch, ToolId,
};
pub use domain::service::{Service, ServiceConfig, ServiceKind};
pub use errors::{ApiError, ApiResult};
pub use flows::{WorkflowEngine, WorkflowEvent, WorkflowState};
pub use ports::ConsoleApi;
