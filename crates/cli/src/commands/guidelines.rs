use clap::Subcommand;
use parlant_console_client::ConsoleClient;
use parlant_console_core::domain::agent::AgentId;
use parlant_console_core::domain::guideline::{GuidelineId, CONNECTION_KIND_ENTAILS};
use parlant_console_workflow::{GuidelineEditor, SessionError};

use crate::commands::CommandResult;

const TOOL_NAMES_REQUIRED: &str = "Service and tool names are required.";
const TARGET_REQUIRED: &str = "A target guideline is required.";

#[derive(Debug, Subcommand)]
pub enum GuidelinesCommand {
    #[command(about = "List the guidelines of an agent")]
    List { agent_id: String },
    #[command(about = "Show a guideline with its connections and tool associations")]
    Get { agent_id: String, guideline_id: String },
    #[command(about = "Delete a guideline")]
    Delete { agent_id: String, guideline_id: String },
    #[command(about = "Associate a service tool with a guideline")]
    AssociateTool {
        agent_id: String,
        guideline_id: String,
        #[arg(long)]
        service: String,
        #[arg(long)]
        tool: String,
    },
    #[command(about = "Remove a tool association from a guideline")]
    DissociateTool {
        agent_id: String,
        guideline_id: String,
        #[arg(long)]
        service: String,
        #[arg(long)]
        tool: String,
    },
    #[command(about = "Connect a guideline to a target guideline")]
    Connect {
        agent_id: String,
        guideline_id: String,
        #[arg(long)]
        target: String,
        #[arg(long, default_value = CONNECTION_KIND_ENTAILS)]
        kind: String,
    },
    #[command(about = "Remove the connection to a target guideline")]
    Disconnect {
        agent_id: String,
        guideline_id: String,
        #[arg(long)]
        target: String,
    },
}

impl GuidelinesCommand {
    fn name(&self) -> &'static str {
        match self {
            Self::List { .. } => "guidelines.list",
            Self::Get { .. } => "guidelines.get",
            Self::Delete { .. } => "guidelines.delete",
            Self::AssociateTool { .. } => "guidelines.associate_tool",
            Self::DissociateTool { .. } => "guidelines.dissociate_tool",
            Self::Connect { .. } => "guidelines.connect",
            Self::Disconnect { .. } => "guidelines.disconnect",
        }
    }
}

pub async fn run(client: ConsoleClient, command: GuidelinesCommand) -> CommandResult {
    let name = command.name();
    let mut editor = GuidelineEditor::new(client);

    match execute(&mut editor, command).await {
        Ok(result) => result,
        Err(error) => CommandResult::session_failure(name, &error, editor.last_error()),
    }
}

async fn execute(
    editor: &mut GuidelineEditor<ConsoleClient>,
    command: GuidelinesCommand,
) -> Result<CommandResult, SessionError> {
    let name = command.name();

    let (agent_id, guideline_id) = match &command {
        GuidelinesCommand::List { agent_id } => {
            let guidelines = editor.select_agent(&AgentId(agent_id.clone())).await?.to_vec();
            let message = format!("{} guideline(s)", guidelines.len());
            return Ok(CommandResult::success_with(name, message, guidelines));
        }
        GuidelinesCommand::Get { agent_id, guideline_id }
        | GuidelinesCommand::Delete { agent_id, guideline_id }
        | GuidelinesCommand::AssociateTool { agent_id, guideline_id, .. }
        | GuidelinesCommand::DissociateTool { agent_id, guideline_id, .. }
        | GuidelinesCommand::Connect { agent_id, guideline_id, .. }
        | GuidelinesCommand::Disconnect { agent_id, guideline_id, .. } => {
            (AgentId(agent_id.clone()), GuidelineId(guideline_id.clone()))
        }
    };
    editor.select_agent(&agent_id).await?;
    editor.select_guideline(&guideline_id).await?;

    let message = match command {
        GuidelinesCommand::List { .. } | GuidelinesCommand::Get { .. } => {
            format!("guideline {guideline_id}")
        }
        GuidelinesCommand::Delete { .. } => {
            editor.delete_guideline().await?;
            return Ok(CommandResult::success(name, format!("deleted guideline {guideline_id}")));
        }
        GuidelinesCommand::AssociateTool { service, tool, .. } => {
            applied(editor.associate_tool(&service, &tool).await?, TOOL_NAMES_REQUIRED)?;
            format!("associated {service}:{tool} with guideline {guideline_id}")
        }
        GuidelinesCommand::DissociateTool { service, tool, .. } => {
            applied(editor.dissociate_tool(&service, &tool).await?, TOOL_NAMES_REQUIRED)?;
            format!("removed {service}:{tool} from guideline {guideline_id}")
        }
        GuidelinesCommand::Connect { target, kind, .. } => {
            let connected = editor.connect(&GuidelineId(target.clone()), Some(&kind)).await?;
            applied(connected, TARGET_REQUIRED)?;
            format!("connected guideline {guideline_id} to {target} ({kind})")
        }
        GuidelinesCommand::Disconnect { target, .. } => {
            applied(editor.disconnect(&GuidelineId(target.clone())).await?, TARGET_REQUIRED)?;
            format!("disconnected guideline {guideline_id} from {target}")
        }
    };

    Ok(CommandResult::success_with(name, message, editor.selected()))
}

/// The editor declines edits it cannot apply; report those instead of `ok`.
fn applied(changed: bool, message: &str) -> Result<(), SessionError> {
    if changed {
        Ok(())
    } else {
        Err(SessionError::Validation(message.to_string()))
    }
}
