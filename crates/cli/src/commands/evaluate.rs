use std::future::Future;

use clap::Args;
use parlant_console_client::ConsoleClient;
use parlant_console_core::audit::TracingAuditSink;
use parlant_console_core::config::AppConfig;
use parlant_console_core::domain::agent::AgentId;
use parlant_console_core::domain::evaluation::EvaluationOptions;
use parlant_console_core::flows::WorkflowState;
use parlant_console_workflow::{
    EvaluationWorkflow, GuidelineDraft, WorkflowError, WorkflowSettings, WorkflowSnapshot,
};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::info;

use crate::commands::CommandResult;

pub const EXIT_EVALUATION_FAILED: u8 = 7;

const INTERRUPTED_MESSAGE: &str = "Evaluation interrupted before the backend accepted it.";

#[derive(Debug, Serialize)]
struct EvaluationReport {
    #[serde(flatten)]
    snapshot: WorkflowSnapshot,
    /// Backend response to the commit, absent when `--commit` was not given.
    #[serde(skip_serializing_if = "Option::is_none")]
    committed: Option<Value>,
}

#[derive(Debug, Args)]
pub struct EvaluateArgs {
    #[arg(long, value_name = "AGENT_ID")]
    pub agent: Option<String>,
    #[arg(long)]
    pub condition: String,
    #[arg(long)]
    pub action: String,
    #[arg(long, help = "Commit the resulting invoices when the evaluation completes")]
    pub commit: bool,
    #[arg(long)]
    pub no_coherence_check: bool,
    #[arg(long)]
    pub no_connection_proposition: bool,
}

impl EvaluateArgs {
    fn draft(&self) -> GuidelineDraft {
        let options = EvaluationOptions {
            coherence_check: !self.no_coherence_check,
            connection_proposition: !self.no_connection_proposition,
        };
        GuidelineDraft::new(
            self.agent.clone().map(AgentId),
            self.condition.clone(),
            self.action.clone(),
        )
        .with_options(options)
    }
}

/// Submits the guideline, polls it to a terminal status and optionally
/// commits it. Ctrl-C abandons a pending submission or stops polling
/// through the poll handle.
pub async fn run(client: ConsoleClient, config: &AppConfig, args: EvaluateArgs) -> CommandResult {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    run_until_interrupted(client, config, args, ctrl_c).await
}

/// Same as [`run`], with `interrupt` standing in for Ctrl-C.
pub async fn run_until_interrupted<I>(
    client: ConsoleClient,
    config: &AppConfig,
    args: EvaluateArgs,
    interrupt: I,
) -> CommandResult
where
    I: Future<Output = ()> + Send + 'static,
{
    let settings = WorkflowSettings::from(&config.workflow);
    let mut workflow = EvaluationWorkflow::new(client, TracingAuditSink, settings);

    let (interrupt_tx, mut interrupted) = watch::channel(false);
    let listener = tokio::spawn(async move {
        interrupt.await;
        let _ = interrupt_tx.send(true);
    });

    let draft = args.draft();
    let submitted = tokio::select! {
        result = workflow.submit(&draft) => Some(result),
        Ok(_) = interrupted.wait_for(|flag| *flag) => None,
    };
    let handle = match submitted {
        Some(Ok(handle)) => handle,
        Some(Err(error)) => {
            listener.abort();
            return workflow_failure(&error, &workflow.snapshot());
        }
        None => {
            info!(event_name = "console.cli.interrupted", "evaluation submission interrupted");
            let _ = workflow.reset();
            return CommandResult::failure(
                "evaluate",
                "cancelled",
                INTERRUPTED_MESSAGE,
                EXIT_EVALUATION_FAILED,
            );
        }
    };

    let canceller = tokio::spawn({
        let handle = handle.clone();
        async move {
            if interrupted.wait_for(|flag| *flag).await.is_ok() {
                info!(
                    event_name = "console.cli.interrupted",
                    evaluation_id = %handle.evaluation_id(),
                    "stopping evaluation polling"
                );
                handle.cancel();
            }
        }
    });
    let polled = workflow.poll_until_terminal().await;
    canceller.abort();
    listener.abort();

    let state = match polled {
        Ok(state) => state,
        Err(error) => return workflow_failure(&error, &workflow.snapshot()),
    };

    if state == WorkflowState::Failed {
        let message =
            workflow.snapshot().last_error.unwrap_or_else(|| "evaluation failed".to_string());
        return CommandResult::failure(
            "evaluate",
            "evaluation_failed",
            message,
            EXIT_EVALUATION_FAILED,
        );
    }

    let evaluation_id = handle.evaluation_id().clone();
    // Committing clears the workflow, so the report is taken first.
    let snapshot = workflow.snapshot();
    if !args.commit {
        let report = EvaluationReport { snapshot, committed: None };
        return CommandResult::success_with(
            "evaluate",
            format!("evaluation {evaluation_id} completed"),
            report,
        );
    }

    match workflow.commit().await {
        Ok(created) => CommandResult::success_with(
            "evaluate",
            format!("evaluation {evaluation_id} completed and committed"),
            EvaluationReport { snapshot, committed: Some(created) },
        ),
        Err(error) => workflow_failure(&error, &workflow.snapshot()),
    }
}

fn workflow_failure(error: &WorkflowError, snapshot: &WorkflowSnapshot) -> CommandResult {
    let message = match (error, snapshot.last_error.as_deref()) {
        (WorkflowError::Api { source, .. }, Some(last_error)) => {
            format!("{last_error} {}", source.user_message())
        }
        (_, Some(last_error)) => last_error.to_string(),
        (_, None) => error.to_string(),
    };
    CommandResult::failure("evaluate", error.error_class(), message, error.exit_code())
}
