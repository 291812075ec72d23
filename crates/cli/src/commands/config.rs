use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use parlant_console_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::{load_config, CommandResult};

struct ConfigFile {
    path: PathBuf,
    doc: Value,
}

/// Lists every effective setting with the layer it came from. Explicit CLI
/// overrides are reported as `flag`.
pub fn run(options: LoadOptions) -> CommandResult {
    let explicit_path = options.config_path.clone();
    let overrides = options.overrides.clone();
    let config = match load_config("config", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let file = load_config_file(explicit_path.as_deref());

    let rows: [(&str, &[&str], String, bool); 8] = [
        (
            "api.base_url",
            &["PARLANT_CONSOLE_API_BASE_URL"],
            config.api.base_url.clone(),
            overrides.api_base_url.is_some(),
        ),
        (
            "api.token",
            &["PARLANT_CONSOLE_API_TOKEN"],
            redact_token(&config),
            overrides.api_token.is_some(),
        ),
        (
            "api.timeout_secs",
            &["PARLANT_CONSOLE_API_TIMEOUT_SECS"],
            config.api.timeout_secs.to_string(),
            overrides.api_timeout_secs.is_some(),
        ),
        (
            "workflow.poll_interval_ms",
            &["PARLANT_CONSOLE_WORKFLOW_POLL_INTERVAL_MS"],
            config.workflow.poll_interval_ms.to_string(),
            overrides.poll_interval_ms.is_some(),
        ),
        (
            "workflow.poll_deadline_secs",
            &["PARLANT_CONSOLE_WORKFLOW_POLL_DEADLINE_SECS"],
            config
                .workflow
                .poll_deadline_secs
                .map_or_else(|| "<unset>".to_string(), |secs| secs.to_string()),
            overrides.poll_deadline_secs.is_some(),
        ),
        (
            "workflow.wait_for_completion",
            &["PARLANT_CONSOLE_WORKFLOW_WAIT_FOR_COMPLETION"],
            config.workflow.wait_for_completion.to_string(),
            false,
        ),
        (
            "logging.level",
            &["PARLANT_CONSOLE_LOGGING_LEVEL", "PARLANT_CONSOLE_LOG_LEVEL"],
            config.logging.level.clone(),
            overrides.log_level.is_some(),
        ),
        (
            "logging.format",
            &["PARLANT_CONSOLE_LOGGING_FORMAT", "PARLANT_CONSOLE_LOG_FORMAT"],
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
            overrides.log_format.is_some(),
        ),
    ];

    let mut lines =
        vec!["effective config (source precedence: flag > env > file > default):".to_string()];
    for (key, env_keys, value, from_flag) in rows {
        let source =
            if from_flag { "flag".to_string() } else { field_source(key, env_keys, file.as_ref()) };
        lines.push(format!("- {key} = {value} (source: {source})"));
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn load_config_file(explicit_path: Option<&Path>) -> Option<ConfigFile> {
    let path = resolve_config_path(explicit_path)?;
    let raw = fs::read_to_string(&path).ok()?;
    let doc = raw.parse::<Value>().ok()?;
    Some(ConfigFile { path, doc })
}

fn field_source(key_path: &str, env_keys: &[&str], file: Option<&ConfigFile>) -> String {
    let from_env = |key: &&&str| env::var(key).is_ok_and(|value| !value.trim().is_empty());
    if let Some(env_key) = env_keys.iter().find(from_env) {
        return format!("env ({env_key})");
    }

    if let Some(file) = file {
        if contains_path(&file.doc, key_path) {
            return format!("file ({})", file.path.display());
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

/// Keeps a short prefix of the token so operators can tell tokens apart.
fn redact_token(config: &AppConfig) -> String {
    let Some(token) = config.api.token.as_ref() else {
        return "<unset>".to_string();
    };
    let trimmed = token.expose_secret().trim();
    match trimmed.split_once('-') {
        Some((prefix, _)) if !prefix.is_empty() => format!("{prefix}-***"),
        _ => "<redacted>".to_string(),
    }
}
