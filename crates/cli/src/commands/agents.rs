use clap::Subcommand;
use parlant_console_client::ConsoleClient;
use parlant_console_core::domain::agent::AgentId;
use parlant_console_core::ports::ConsoleApi;
use parlant_console_workflow::AgentEditor;

use crate::commands::CommandResult;

#[derive(Debug, Subcommand)]
pub enum AgentsCommand {
    #[command(about = "List all agents")]
    List,
    #[command(about = "Show one agent")]
    Get { agent_id: String },
    #[command(about = "Create an agent")]
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    #[command(about = "Replace an agent's name and description")]
    Update {
        agent_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    #[command(about = "Delete an agent")]
    Delete { agent_id: String },
}

pub async fn run(client: ConsoleClient, command: AgentsCommand) -> CommandResult {
    let mut editor = AgentEditor::new(client.clone());

    match command {
        AgentsCommand::List => match editor.refresh().await.map(<[_]>::to_vec) {
            Ok(agents) => CommandResult::success_with(
                "agents.list",
                format!("{} agent(s)", agents.len()),
                agents,
            ),
            Err(error) => {
                CommandResult::session_failure("agents.list", &error, editor.last_error())
            }
        },
        AgentsCommand::Get { agent_id } => match client.get_agent(&AgentId(agent_id)).await {
            Ok(agent) => {
                CommandResult::success_with("agents.get", format!("agent {}", agent.id), agent)
            }
            Err(error) => CommandResult::api_failure("agents.get", &error),
        },
        AgentsCommand::Create { name, description } => {
            editor.new_agent();
            let draft = editor.draft_mut();
            draft.name = name;
            draft.description = description;
            match editor.save().await {
                Ok(agent_id) => CommandResult::success_with(
                    "agents.create",
                    format!("created agent {agent_id}"),
                    editor.draft(),
                ),
                Err(error) => {
                    CommandResult::session_failure("agents.create", &error, editor.last_error())
                }
            }
        }
        AgentsCommand::Update { agent_id, name, description } => {
            if let Err(error) = editor.select(&AgentId(agent_id)).await {
                return CommandResult::session_failure("agents.update", &error, editor.last_error());
            }
            let draft = editor.draft_mut();
            if let Some(name) = name {
                draft.name = name;
            }
            if let Some(description) = description {
                draft.description = description;
            }
            match editor.save().await {
                Ok(agent_id) => CommandResult::success_with(
                    "agents.update",
                    format!("updated agent {agent_id}"),
                    editor.draft(),
                ),
                Err(error) => {
                    CommandResult::session_failure("agents.update", &error, editor.last_error())
                }
            }
        }
        AgentsCommand::Delete { agent_id } => {
            let agent_id = AgentId(agent_id);
            if let Err(error) = editor.select(&agent_id).await {
                return CommandResult::session_failure("agents.delete", &error, editor.last_error());
            }
            match editor.delete().await {
                Ok(()) => {
                    CommandResult::success("agents.delete", format!("deleted agent {agent_id}"))
                }
                Err(error) => {
                    CommandResult::session_failure("agents.delete", &error, editor.last_error())
                }
            }
        }
    }
}
