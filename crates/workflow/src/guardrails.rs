use parlant_console_core::domain::agent::AgentId;
use parlant_console_core::flows::WorkflowState;

pub const SELECT_AGENT_MESSAGE: &str = "Please select an agent before evaluating.";
pub const REASON_IN_FLIGHT: &str = "evaluation_in_flight";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardIntent<'a> {
    Submit {
        state: WorkflowState,
        agent_id: Option<&'a AgentId>,
        condition: &'a str,
        action: &'a str,
    },
    Commit { state: WorkflowState, has_evaluation: bool },
}

impl GuardIntent<'_> {
    pub fn action_key(&self) -> &'static str {
        match self {
            Self::Submit { .. } => "evaluation.submit",
            Self::Commit { .. } => "evaluation.commit",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Deny { reason_code: &'static str, user_message: String },
}

impl GuardDecision {
    fn deny(reason_code: &'static str, user_message: impl Into<String>) -> Self {
        Self::Deny { reason_code, user_message: user_message.into() }
    }
}

/// Checks run before the workflow talks to the backend. A denial never
/// changes workflow state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubmissionGuard;

impl SubmissionGuard {
    pub fn evaluate(&self, intent: &GuardIntent<'_>) -> GuardDecision {
        match intent {
            GuardIntent::Submit { state, .. } if state.is_in_flight() => GuardDecision::deny(
                REASON_IN_FLIGHT,
                "An evaluation is already running. Wait for it to finish or reset it.",
            ),
            GuardIntent::Submit { agent_id, .. }
                if agent_id.map_or(true, |agent_id| agent_id.0.trim().is_empty()) =>
            {
                GuardDecision::deny("agent_not_selected", SELECT_AGENT_MESSAGE)
            }
            GuardIntent::Submit { condition, .. } if condition.trim().is_empty() => {
                GuardDecision::deny("condition_missing", "Enter a condition before evaluating.")
            }
            GuardIntent::Submit { action, .. } if action.trim().is_empty() => {
                GuardDecision::deny("action_missing", "Enter an action before evaluating.")
            }
            GuardIntent::Submit { .. } => GuardDecision::Allow,
            GuardIntent::Commit { state: WorkflowState::Completed, has_evaluation: true } => {
                GuardDecision::Allow
            }
            GuardIntent::Commit { .. } => GuardDecision::deny(
                "commit_not_ready",
                "Only a completed evaluation can be committed.",
            ),
        }
    }
}
