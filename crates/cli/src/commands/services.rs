use clap::Subcommand;
use parlant_console_client::ConsoleClient;
use parlant_console_core::domain::service::ServiceKind;
use parlant_console_core::ports::ConsoleApi;
use parlant_console_workflow::ServicesEditor;

use crate::commands::CommandResult;

#[derive(Debug, Subcommand)]
pub enum ServicesCommand {
    #[command(about = "List registered tool services")]
    List,
    #[command(about = "Show a service and its tools")]
    Get { name: String },
    #[command(about = "Register or replace a tool service")]
    Put {
        name: String,
        #[arg(long, default_value = "sdk", help = "Service kind: sdk or openapi")]
        kind: ServiceKind,
        #[arg(long)]
        url: String,
        #[arg(long, help = "OpenAPI document location (openapi services only)")]
        source: Option<String>,
    },
    #[command(about = "Remove a tool service")]
    Delete { name: String },
}

pub async fn run(client: ConsoleClient, command: ServicesCommand) -> CommandResult {
    let mut editor = ServicesEditor::new(client.clone());

    match command {
        ServicesCommand::List => match editor.refresh().await.map(<[_]>::to_vec) {
            Ok(services) => CommandResult::success_with(
                "services.list",
                format!("{} service(s)", services.len()),
                services,
            ),
            Err(error) => {
                CommandResult::session_failure("services.list", &error, editor.last_error())
            }
        },
        ServicesCommand::Get { name } => match client.read_service(&name).await {
            Ok(service) => CommandResult::success_with(
                "services.get",
                format!("service {} with {} tool(s)", service.name, service.tools.len()),
                service,
            ),
            Err(error) => CommandResult::api_failure("services.get", &error),
        },
        ServicesCommand::Put { name, kind, url, source } => {
            editor.new_service();
            let draft = editor.draft_mut();
            draft.name = name.clone();
            draft.kind = kind;
            draft.url = url;
            draft.source = source.unwrap_or_default();
            match editor.save().await {
                Ok(()) => CommandResult::success(
                    "services.put",
                    format!("saved {} service {name}", kind.as_str()),
                ),
                Err(error) => {
                    CommandResult::session_failure("services.put", &error, editor.last_error())
                }
            }
        }
        ServicesCommand::Delete { name } => {
            if let Err(error) = editor.select(&name).await {
                return CommandResult::session_failure(
                    "services.delete",
                    &error,
                    editor.last_error(),
                );
            }
            match editor.delete().await {
                Ok(()) => {
                    CommandResult::success("services.delete", format!("deleted service {name}"))
                }
                Err(error) => {
                    CommandResult::session_failure("services.delete", &error, editor.last_error())
                }
            }
        }
    }
}
