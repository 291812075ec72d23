//! Evaluation workflow and editor sessions for the Parlant console.
//!
//! Everything here is written against the `ConsoleApi` port, so the same
//! controllers drive the HTTP client in the binary and in-memory fakes in
//! tests.
//!
//! - `evaluation` owns one in-flight guideline evaluation: submit, poll until
//!   terminal, commit.
//! - `guardrails` decides whether a submission or commit may proceed before
//!   any request is made.
//! - `sessions` hold the selection and draft state of the agent, guideline
//!   and service editors.

pub mod evaluation;
pub mod guardrails;
pub mod sessions;

pub use evaluation::{
    EvaluationWorkflow, GuidelineDraft, PollHandle, WorkflowError, WorkflowSettings,
    WorkflowSnapshot,
};
pub use guardrails::{GuardDecision, GuardIntent, SubmissionGuard};
pub use sessions::{AgentEditor, GuidelineEditor, ServiceDraft, ServicesEditor, SessionError};
