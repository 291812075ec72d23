use std::time::Duration;

use parlant_console_core::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use parlant_console_core::config::WorkflowConfig;
use parlant_console_core::domain::agent::AgentId;
use parlant_console_core::domain::evaluation::{
    Evaluation, EvaluationId, EvaluationOptions, EvaluationStatus,
};
use parlant_console_core::errors::ApiError;
use parlant_console_core::flows::{
    TransitionOutcome, WorkflowAction, WorkflowEngine, WorkflowEvent, WorkflowState,
    WorkflowTransitionError,
};
use parlant_console_core::ports::ConsoleApi;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::guardrails::{
    GuardDecision, GuardIntent, SubmissionGuard, REASON_IN_FLIGHT, SELECT_AGENT_MESSAGE,
};

pub const EVALUATE_FAILED_MESSAGE: &str = "Failed to evaluate guideline.";
pub const READ_FAILED_MESSAGE: &str = "Failed to read evaluation.";
pub const COMMIT_FAILED_MESSAGE: &str = "Failed to commit guideline.";
pub const CANCELLED_MESSAGE: &str = "Polling was stopped before the evaluation finished.";
pub const DEADLINE_MESSAGE: &str = "The evaluation did not finish in time.";
pub const EVALUATION_FAILED_MESSAGE: &str = "The evaluation failed.";

const ACTOR: &str = "evaluation_workflow";

/// Operator input for one guideline evaluation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GuidelineDraft {
    pub agent_id: Option<AgentId>,
    pub condition: String,
    pub action: String,
    pub options: EvaluationOptions,
}

impl GuidelineDraft {
    pub fn new(
        agent_id: Option<AgentId>,
        condition: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            agent_id,
            condition: condition.into(),
            action: action.into(),
            options: EvaluationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EvaluationOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkflowSettings {
    pub poll_interval: Duration,
    /// `None` polls until the backend reports a terminal status.
    pub poll_deadline: Option<Duration>,
    pub wait_for_completion: u32,
}

impl From<&WorkflowConfig> for WorkflowSettings {
    fn from(config: &WorkflowConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            poll_deadline: config.poll_deadline(),
            wait_for_completion: config.wait_for_completion,
        }
    }
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self::from(&WorkflowConfig::default())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WorkflowSnapshot {
    pub state: WorkflowState,
    pub agent_id: Option<AgentId>,
    pub evaluation: Option<Evaluation>,
    pub progress: f64,
    pub last_error: Option<String>,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{0}")]
    Validation(String),
    #[error("an evaluation is already in flight")]
    Busy,
    #[error("commit is only allowed after a completed evaluation (state: {})", .state.as_str())]
    CommitNotAllowed { state: WorkflowState },
    #[error("polling was cancelled")]
    Cancelled,
    #[error("polling deadline exceeded")]
    DeadlineExceeded,
    #[error("{context}: {source}")]
    Api { context: &'static str, source: ApiError },
    #[error(transparent)]
    Transition(#[from] WorkflowTransitionError),
}

impl WorkflowError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Busy => "busy",
            Self::CommitNotAllowed { .. } => "commit_not_allowed",
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::Api { source, .. } => source.error_class(),
            Self::Transition(_) => "invalid_transition",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Busy | Self::CommitNotAllowed { .. } => 3,
            Self::Api { source, .. } => source.exit_code(),
            Self::Cancelled | Self::DeadlineExceeded | Self::Transition(_) => 7,
        }
    }
}

/// Cancels the poll loop of one evaluation. Cloned handles share the token.
#[derive(Clone, Debug)]
pub struct PollHandle {
    evaluation_id: EvaluationId,
    token: CancellationToken,
}

impl PollHandle {
    fn new(evaluation_id: EvaluationId) -> Self {
        Self { evaluation_id, token: CancellationToken::new() }
    }

    pub fn evaluation_id(&self) -> &EvaluationId {
        &self.evaluation_id
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Drives one guideline evaluation from submission to commit.
///
/// All state lives in this struct and changes only through the transition
/// table in `WorkflowEngine`; callers observe it through [`snapshot`].
///
/// [`snapshot`]: EvaluationWorkflow::snapshot
pub struct EvaluationWorkflow<A, S> {
    api: A,
    audit: S,
    engine: WorkflowEngine,
    guard: SubmissionGuard,
    settings: WorkflowSettings,
    state: WorkflowState,
    agent_id: Option<AgentId>,
    evaluation: Option<Evaluation>,
    progress: f64,
    last_error: Option<String>,
    poll: Option<PollHandle>,
    correlation_id: String,
}

impl<A, S> EvaluationWorkflow<A, S>
where
    A: ConsoleApi,
    S: AuditSink,
{
    pub fn new(api: A, audit: S, settings: WorkflowSettings) -> Self {
        let engine = WorkflowEngine;
        Self {
            api,
            audit,
            state: engine.initial_state(),
            engine,
            guard: SubmissionGuard,
            settings,
            agent_id: None,
            evaluation: None,
            progress: 0.0,
            last_error: None,
            poll: None,
            correlation_id: String::new(),
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            state: self.state,
            agent_id: self.agent_id.clone(),
            evaluation: self.evaluation.clone(),
            progress: self.progress,
            last_error: self.last_error.clone(),
        }
    }

    /// Handle for the poll loop of the evaluation currently in flight.
    pub fn poll_handle(&self) -> Option<PollHandle> {
        self.poll.clone()
    }

    pub async fn submit(&mut self, draft: &GuidelineDraft) -> Result<PollHandle, WorkflowError> {
        let intent = GuardIntent::Submit {
            state: self.state,
            agent_id: draft.agent_id.as_ref(),
            condition: &draft.condition,
            action: &draft.action,
        };
        if let GuardDecision::Deny { reason_code, user_message } = self.guard.evaluate(&intent) {
            warn!(
                event_name = "console.workflow.submission_denied",
                action = intent.action_key(),
                reason_code,
                state = self.state.as_str(),
                "submission rejected before contacting backend"
            );
            if reason_code == REASON_IN_FLIGHT {
                return Err(WorkflowError::Busy);
            }
            self.last_error = Some(user_message.clone());
            return Err(WorkflowError::Validation(user_message));
        }
        let agent_id = draft
            .agent_id
            .clone()
            .ok_or_else(|| WorkflowError::Validation(SELECT_AGENT_MESSAGE.to_string()))?;

        self.correlation_id = Uuid::new_v4().to_string();
        self.apply(WorkflowEvent::SubmitRequested)?;
        self.agent_id = Some(agent_id.clone());
        self.evaluation = None;
        self.poll = None;
        self.progress = 0.0;
        self.last_error = None;

        let created = self
            .api
            .create_evaluation(&agent_id, &draft.condition, &draft.action, draft.options)
            .await;

        match created {
            Ok(evaluation) => {
                let handle = PollHandle::new(evaluation.id.clone());
                self.progress = clamp_progress(evaluation.progress);
                self.evaluation = Some(evaluation);
                self.apply(WorkflowEvent::SubmissionAccepted)?;
                self.poll = Some(handle.clone());
                info!(
                    event_name = "console.workflow.submitted",
                    evaluation_id = %handle.evaluation_id,
                    agent_id = %agent_id,
                    correlation_id = %self.correlation_id,
                    "evaluation submitted"
                );
                Ok(handle)
            }
            Err(source) => {
                warn!(
                    event_name = "console.workflow.submission_failed",
                    agent_id = %agent_id,
                    correlation_id = %self.correlation_id,
                    error = %source,
                    "failed to create evaluation"
                );
                self.apply(WorkflowEvent::SubmissionFailed)?;
                self.last_error = Some(EVALUATE_FAILED_MESSAGE.to_string());
                Err(WorkflowError::Api { context: "create evaluation", source })
            }
        }
    }

    /// Reads the tracked evaluation until it reaches a terminal status.
    ///
    /// The first read is immediate; later reads wait `poll_interval`. The
    /// loop also stops on a read error, on cancellation through the
    /// [`PollHandle`], or when the optional deadline passes. Displayed
    /// progress is 100 whenever the loop exits. Outside `Polling` this
    /// returns the current state without any request.
    pub async fn poll_until_terminal(&mut self) -> Result<WorkflowState, WorkflowError> {
        let Some(handle) = self.poll.clone() else {
            return Ok(self.state);
        };
        if self.state != WorkflowState::Polling {
            return Ok(self.state);
        }

        let deadline = self.settings.poll_deadline.map(|limit| Instant::now() + limit);
        let mut first_read = true;

        loop {
            if handle.is_cancelled() {
                return self.stop_polling(
                    WorkflowEvent::PollingCancelled,
                    WorkflowError::Cancelled,
                    CANCELLED_MESSAGE,
                );
            }

            if !first_read {
                let next_read = Instant::now() + self.settings.poll_interval;
                let wake_at = deadline.map_or(next_read, |deadline| next_read.min(deadline));
                tokio::select! {
                    biased;
                    () = handle.token.cancelled() => {
                        return self.stop_polling(
                            WorkflowEvent::PollingCancelled,
                            WorkflowError::Cancelled,
                            CANCELLED_MESSAGE,
                        );
                    }
                    () = tokio::time::sleep_until(wake_at) => {}
                }
            }
            first_read = false;

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return self.stop_polling(
                    WorkflowEvent::DeadlineExceeded,
                    WorkflowError::DeadlineExceeded,
                    DEADLINE_MESSAGE,
                );
            }

            let read = self
                .api
                .read_evaluation(&handle.evaluation_id, Some(self.settings.wait_for_completion))
                .await;

            match read {
                Ok(evaluation) => {
                    let state = self.observe(evaluation)?;
                    if state != WorkflowState::Polling {
                        return Ok(state);
                    }
                }
                Err(source) => {
                    return self.stop_polling(
                        WorkflowEvent::ReadFailed,
                        WorkflowError::Api { context: "read evaluation", source },
                        READ_FAILED_MESSAGE,
                    );
                }
            }
        }
    }

    /// Submits the draft and polls it to a terminal status.
    pub async fn run(&mut self, draft: &GuidelineDraft) -> Result<WorkflowSnapshot, WorkflowError> {
        self.submit(draft).await?;
        self.poll_until_terminal().await?;
        Ok(self.snapshot())
    }

    /// Persists the invoices of a completed evaluation as guidelines.
    pub async fn commit(&mut self) -> Result<Value, WorkflowError> {
        let intent =
            GuardIntent::Commit { state: self.state, has_evaluation: self.evaluation.is_some() };
        if let GuardDecision::Deny { reason_code, .. } = self.guard.evaluate(&intent) {
            warn!(
                event_name = "console.workflow.commit_denied",
                action = intent.action_key(),
                reason_code,
                state = self.state.as_str(),
                "commit rejected before contacting backend"
            );
            return Err(WorkflowError::CommitNotAllowed { state: self.state });
        }
        let (Some(agent_id), Some(evaluation)) = (self.agent_id.as_ref(), self.evaluation.as_ref())
        else {
            return Err(WorkflowError::CommitNotAllowed { state: self.state });
        };

        let committed = self.api.add_guideline(agent_id, &evaluation.invoices).await;

        match committed {
            Ok(created) => {
                info!(
                    event_name = "console.workflow.committed",
                    evaluation_id = %evaluation.id,
                    correlation_id = %self.correlation_id,
                    "guideline committed"
                );
                self.apply(WorkflowEvent::Committed)?;
                self.last_error = None;
                Ok(created)
            }
            Err(source) => {
                warn!(
                    event_name = "console.workflow.commit_failed",
                    evaluation_id = %evaluation.id,
                    correlation_id = %self.correlation_id,
                    error = %source,
                    "failed to commit guideline"
                );
                self.apply(WorkflowEvent::CommitFailed)?;
                self.last_error = Some(COMMIT_FAILED_MESSAGE.to_string());
                Err(WorkflowError::Api { context: "commit guideline", source })
            }
        }
    }

    /// Drops the tracked evaluation and returns to `Idle`, cancelling any
    /// armed poll handle first.
    pub fn reset(&mut self) -> Result<(), WorkflowError> {
        if let Some(handle) = self.poll.as_ref() {
            handle.cancel();
        }
        match self.state {
            WorkflowState::Polling => {
                self.apply(WorkflowEvent::PollingCancelled)?;
            }
            // A submit future dropped mid-request leaves the workflow here.
            WorkflowState::Submitted => {
                self.apply(WorkflowEvent::SubmissionFailed)?;
            }
            _ => {}
        }
        self.apply(WorkflowEvent::ResetRequested)?;
        self.last_error = None;
        Ok(())
    }

    fn observe(&mut self, evaluation: Evaluation) -> Result<WorkflowState, WorkflowError> {
        let status = evaluation.status;
        let evaluation_id = evaluation.id.clone();
        let backend_error = evaluation.error.clone();
        self.progress = clamp_progress(evaluation.progress);
        self.evaluation = Some(evaluation);

        info!(
            event_name = "console.workflow.poll_observed",
            evaluation_id = %evaluation_id,
            correlation_id = %self.correlation_id,
            status = status.as_str(),
            progress = self.progress,
            "evaluation status observed"
        );
        self.audit.emit(
            AuditEvent::new(
                &self.audit_context(),
                "evaluation.poll_observed",
                AuditCategory::Polling,
                AuditOutcome::Success,
            )
            .with_metadata("status", status.as_str())
            .with_metadata("progress", format!("{:.1}", self.progress)),
        );

        self.apply(WorkflowEvent::StatusObserved(status))?;
        if status.is_terminal() {
            self.poll = None;
        }
        if status == EvaluationStatus::Failed {
            self.last_error =
                Some(backend_error.unwrap_or_else(|| EVALUATION_FAILED_MESSAGE.to_string()));
        }
        Ok(self.state)
    }

    fn stop_polling(
        &mut self,
        event: WorkflowEvent,
        error: WorkflowError,
        user_message: &str,
    ) -> Result<WorkflowState, WorkflowError> {
        warn!(
            event_name = "console.workflow.polling_stopped",
            correlation_id = %self.correlation_id,
            error_class = error.error_class(),
            error = %error,
            "evaluation polling stopped before a terminal status"
        );
        self.apply(event)?;
        self.poll = None;
        self.last_error = Some(user_message.to_string());
        Err(error)
    }

    fn apply(&mut self, event: WorkflowEvent) -> Result<TransitionOutcome, WorkflowError> {
        let context = self.audit_context();
        let outcome = self.engine.apply_with_audit(self.state, &event, &self.audit, &context)?;
        self.state = outcome.to;

        for action in &outcome.actions {
            match action {
                WorkflowAction::ForceProgressComplete => self.progress = 100.0,
                WorkflowAction::ClearEvaluation => {
                    self.evaluation = None;
                    self.poll = None;
                    self.progress = 0.0;
                }
                WorkflowAction::CreateEvaluation
                | WorkflowAction::SchedulePoll
                | WorkflowAction::OfferCommit
                | WorkflowAction::SurfaceError => {}
            }
        }
        Ok(outcome)
    }

    fn audit_context(&self) -> AuditContext {
        let evaluation_id = self
            .evaluation
            .as_ref()
            .map(|evaluation| evaluation.id.clone())
            .or_else(|| self.poll.as_ref().map(|handle| handle.evaluation_id.clone()));
        AuditContext::new(evaluation_id, self.correlation_id.clone(), ACTOR)
    }
}

/// Backend progress is a percentage; anything outside 0..=100 is pinned.
fn clamp_progress(progress: f64) -> f64 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 100.0)
    }
}
