use std::time::Instant;

use parlant_console_client::ConsoleClient;
use parlant_console_core::config::{AppConfig, LoadOptions};
use parlant_console_core::ports::ConsoleApi;
use serde::Serialize;

use crate::commands::{CommandResult, EXIT_CONFIG};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
    #[serde(skip)]
    exit_code: u8,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into(), exit_code: 0 }
    }

    fn fail(name: &'static str, details: impl Into<String>, exit_code: u8) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into(), exit_code }
    }

    fn skipped(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Skipped, details: details.into(), exit_code: 0 }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

/// Checks config, token presence and backend reachability. Exits non-zero
/// with the code of the first failing check.
pub async fn run(options: LoadOptions, json_output: bool) -> CommandResult {
    let report = build_report(options).await;
    let exit_code =
        report.checks.iter().find(|check| check.status == CheckStatus::Fail).map_or(0, |check| {
            check.exit_code
        });

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

async fn build_report(options: LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options) {
        Ok(config) => {
            checks.push(DoctorCheck::pass("config_validation", "configuration loaded and validated"));
            checks.push(check_token(&config));
            checks.push(check_backend(&config).await);
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("config_validation", error.to_string(), EXIT_CONFIG));
            checks.push(DoctorCheck::skipped(
                "api_token",
                "skipped because configuration did not load",
            ));
            checks.push(DoctorCheck::skipped(
                "backend_reachability",
                "skipped because configuration did not load",
            ));
        }
    }

    let failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let (overall_status, summary) = if failed {
        (CheckStatus::Fail, "doctor: one or more readiness checks failed".to_string())
    } else {
        (CheckStatus::Pass, "doctor: all readiness checks passed".to_string())
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_token(config: &AppConfig) -> DoctorCheck {
    if config.api.token.is_some() {
        DoctorCheck::pass("api_token", "bearer token configured")
    } else {
        DoctorCheck::skipped("api_token", "no token configured; requests are sent unauthenticated")
    }
}

async fn check_backend(config: &AppConfig) -> DoctorCheck {
    let client = match ConsoleClient::new(config.api.clone()) {
        Ok(client) => client,
        Err(error) => {
            return DoctorCheck::fail("backend_reachability", error.to_string(), EXIT_CONFIG);
        }
    };

    let started = Instant::now();
    match client.list_agents().await {
        Ok(agents) => DoctorCheck::pass(
            "backend_reachability",
            format!(
                "listed {} agent(s) from `{}` in {} ms",
                agents.len(),
                config.api.base_url,
                started.elapsed().as_millis()
            ),
        ),
        Err(error) => DoctorCheck::fail(
            "backend_reachability",
            format!("`{}`: {error}", config.api.base_url),
            error.exit_code(),
        ),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
