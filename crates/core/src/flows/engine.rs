use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::evaluation::EvaluationStatus;
use crate::flows::states::{TransitionOutcome, WorkflowAction, WorkflowEvent, WorkflowState};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WorkflowTransitionError {
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: WorkflowState, event: WorkflowEvent },
}

/// Transition table of the evaluation workflow. Pure: performs no I/O and
/// the same `(state, event)` pair always yields the same outcome.
#[derive(Clone, Copy, Debug, Default)]
pub struct WorkflowEngine;

impl WorkflowEngine {
    pub fn initial_state(&self) -> WorkflowState {
        WorkflowState::Idle
    }

    pub fn apply(
        &self,
        current: WorkflowState,
        event: &WorkflowEvent,
    ) -> Result<TransitionOutcome, WorkflowTransitionError> {
        transition(current, event)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: WorkflowState,
        event: &WorkflowEvent,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, WorkflowTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event);
        let category = category_for(event);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    AuditEvent::new(
                        audit,
                        "workflow.transition_applied",
                        category,
                        AuditOutcome::Success,
                    )
                    .with_metadata("from", outcome.from.as_str())
                    .with_metadata("to", outcome.to.as_str())
                    .with_metadata("event", format!("{:?}", outcome.event)),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        audit,
                        "workflow.transition_rejected",
                        category,
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

fn category_for(event: &WorkflowEvent) -> AuditCategory {
    match event {
        WorkflowEvent::SubmitRequested
        | WorkflowEvent::SubmissionAccepted
        | WorkflowEvent::SubmissionFailed
        | WorkflowEvent::ResetRequested => AuditCategory::Submission,
        WorkflowEvent::StatusObserved(_)
        | WorkflowEvent::ReadFailed
        | WorkflowEvent::PollingCancelled
        | WorkflowEvent::DeadlineExceeded => AuditCategory::Polling,
        WorkflowEvent::Committed | WorkflowEvent::CommitFailed => AuditCategory::Commit,
    }
}

fn transition(
    current: WorkflowState,
    event: &WorkflowEvent,
) -> Result<TransitionOutcome, WorkflowTransitionError> {
    use WorkflowAction::{
        ClearEvaluation, CreateEvaluation, ForceProgressComplete, OfferCommit, SchedulePoll,
        SurfaceError,
    };
    use WorkflowEvent::{
        CommitFailed, Committed, DeadlineExceeded, PollingCancelled, ReadFailed, ResetRequested,
        StatusObserved, SubmissionAccepted, SubmissionFailed, SubmitRequested,
    };
    use WorkflowState::{Completed, Error, Failed, Idle, Polling, Submitted};

    let (to, actions) = match (current, event) {
        (Idle | Completed | Failed | Error, SubmitRequested) => (Submitted, vec![CreateEvaluation]),
        (Submitted, SubmissionAccepted) => (Polling, vec![SchedulePoll]),
        (Submitted, SubmissionFailed) => (Error, vec![ClearEvaluation, SurfaceError]),
        (Polling, StatusObserved(EvaluationStatus::Pending | EvaluationStatus::Running)) => {
            (Polling, vec![SchedulePoll])
        }
        (Polling, StatusObserved(EvaluationStatus::Completed)) => {
            (Completed, vec![ForceProgressComplete, OfferCommit])
        }
        (Polling, StatusObserved(EvaluationStatus::Failed)) => {
            (Failed, vec![ForceProgressComplete])
        }
        (Polling, ReadFailed | PollingCancelled | DeadlineExceeded) => {
            (Error, vec![ForceProgressComplete, SurfaceError])
        }
        (Completed, Committed) => (Idle, vec![ClearEvaluation]),
        (Completed, CommitFailed) => (Completed, vec![SurfaceError]),
        (Submitted | Polling, ResetRequested) => {
            return Err(WorkflowTransitionError::InvalidTransition {
                state: current,
                event: event.clone(),
            });
        }
        (_, ResetRequested) => (Idle, vec![ClearEvaluation]),
        _ => {
            return Err(WorkflowTransitionError::InvalidTransition {
                state: current,
                event: event.clone(),
            });
        }
    };

    Ok(TransitionOutcome { from: current, to, event: event.clone(), actions })
}

#[cfg(test)]
mod tests {
    use crate::audit::{AuditContext, InMemoryAuditSink};
    use crate::domain::evaluation::{EvaluationId, EvaluationStatus};
    use crate::flows::engine::{WorkflowEngine, WorkflowTransitionError};
    use crate::flows::states::{WorkflowAction, WorkflowEvent, WorkflowState};

    #[test]
    fn happy_path_reaches_completed_and_back_to_idle() {
        let engine = WorkflowEngine;
        let mut state = engine.initial_state();

        for event in [
            WorkflowEvent::SubmitRequested,
            WorkflowEvent::SubmissionAccepted,
            WorkflowEvent::StatusObserved(EvaluationStatus::Pending),
            WorkflowEvent::StatusObserved(EvaluationStatus::Running),
        ] {
            state = engine.apply(state, &event).expect("in-flight transition").to;
        }
        assert_eq!(state, WorkflowState::Polling);

        let completed = engine
            .apply(state, &WorkflowEvent::StatusObserved(EvaluationStatus::Completed))
            .expect("polling -> completed");
        assert_eq!(completed.to, WorkflowState::Completed);
        assert!(completed.actions.contains(&WorkflowAction::ForceProgressComplete));
        assert!(completed.actions.contains(&WorkflowAction::OfferCommit));

        let committed =
            engine.apply(completed.to, &WorkflowEvent::Committed).expect("completed -> idle");
        assert_eq!(committed.to, WorkflowState::Idle);
    }

    #[test]
    fn every_loop_exit_forces_progress_complete() {
        let engine = WorkflowEngine;
        for event in [
            WorkflowEvent::StatusObserved(EvaluationStatus::Completed),
            WorkflowEvent::StatusObserved(EvaluationStatus::Failed),
            WorkflowEvent::ReadFailed,
            WorkflowEvent::PollingCancelled,
            WorkflowEvent::DeadlineExceeded,
        ] {
            let outcome = engine.apply(WorkflowState::Polling, &event).expect("loop exit");
            assert!(
                outcome.actions.contains(&WorkflowAction::ForceProgressComplete),
                "{event:?} should force progress to complete"
            );
            assert_ne!(outcome.to, WorkflowState::Polling);
        }
    }

    #[test]
    fn commit_is_rejected_outside_completed() {
        let engine = WorkflowEngine;
        for state in [
            WorkflowState::Idle,
            WorkflowState::Submitted,
            WorkflowState::Polling,
            WorkflowState::Failed,
            WorkflowState::Error,
        ] {
            let error = engine
                .apply(state, &WorkflowEvent::Committed)
                .expect_err("commit only allowed from completed");
            assert!(matches!(error, WorkflowTransitionError::InvalidTransition { .. }));
        }
    }

    #[test]
    fn resubmission_is_rejected_while_in_flight() {
        let engine = WorkflowEngine;
        for state in [WorkflowState::Submitted, WorkflowState::Polling] {
            assert!(engine.apply(state, &WorkflowEvent::SubmitRequested).is_err());
            assert!(engine.apply(state, &WorkflowEvent::ResetRequested).is_err());
        }
        for state in
            [WorkflowState::Idle, WorkflowState::Completed, WorkflowState::Failed, WorkflowState::Error]
        {
            let outcome =
                engine.apply(state, &WorkflowEvent::SubmitRequested).expect("resubmit allowed");
            assert_eq!(outcome.to, WorkflowState::Submitted);
        }
    }

    #[test]
    fn failed_commit_keeps_completed_state() {
        let outcome = WorkflowEngine
            .apply(WorkflowState::Completed, &WorkflowEvent::CommitFailed)
            .expect("commit failure is a self transition");
        assert_eq!(outcome.to, WorkflowState::Completed);
        assert_eq!(outcome.actions, vec![WorkflowAction::SurfaceError]);
    }

    #[test]
    fn transition_emits_audit_event() {
        let sink = InMemoryAuditSink::default();
        let context =
            AuditContext::new(Some(EvaluationId("ev_9".to_owned())), "req-42", "workflow");

        let _ = WorkflowEngine
            .apply_with_audit(
                WorkflowState::Submitted,
                &WorkflowEvent::SubmissionAccepted,
                &sink,
                &context,
            )
            .expect("transition should succeed");
        let _ = WorkflowEngine.apply_with_audit(
            WorkflowState::Idle,
            &WorkflowEvent::Committed,
            &sink,
            &context,
        );

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "workflow.transition_applied");
        assert_eq!(events[0].metadata.get("to").map(String::as_str), Some("polling"));
        assert_eq!(events[1].event_type, "workflow.transition_rejected");
        assert_eq!(events[1].correlation_id, "req-42");
    }
}
