use serde::{Deserialize, Serialize};

use crate::domain::evaluation::EvaluationStatus;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Idle,
    Submitted,
    Polling,
    Completed,
    Failed,
    Error,
}

impl WorkflowState {
    /// A submission or a poll loop is outstanding.
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Submitted | Self::Polling)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitted => "submitted",
            Self::Polling => "polling",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowEvent {
    SubmitRequested,
    SubmissionAccepted,
    SubmissionFailed,
    StatusObserved(EvaluationStatus),
    ReadFailed,
    PollingCancelled,
    DeadlineExceeded,
    Committed,
    CommitFailed,
    ResetRequested,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowAction {
    CreateEvaluation,
    SchedulePoll,
    ForceProgressComplete,
    OfferCommit,
    ClearEvaluation,
    SurfaceError,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: WorkflowState,
    pub to: WorkflowState,
    pub event: WorkflowEvent,
    pub actions: Vec<WorkflowAction>,
}
