//! End-to-end `evaluate` runs through the real HTTP client against a mocked
//! backend.

use std::time::Duration;

use parlant_console_cli::commands::evaluate::{self, EvaluateArgs};
use parlant_console_client::ConsoleClient;
use parlant_console_core::config::AppConfig;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> AppConfig {
    let mut config = AppConfig::default();
    config.api.base_url = server.uri();
    config.workflow.poll_interval_ms = 20;
    config
}

fn refund_args(commit: bool) -> EvaluateArgs {
    EvaluateArgs {
        agent: Some("ag_1".to_string()),
        condition: "user asks for refund".to_string(),
        action: "offer store credit".to_string(),
        commit,
        no_coherence_check: false,
        no_connection_proposition: false,
    }
}

fn refund_invoice() -> Value {
    json!({
        "payload": {
            "content": {"condition": "user asks for refund", "action": "offer store credit"},
            "operation": "add"
        },
        "checksum": "chk-1",
        "approved": true,
        "data": {
            "guideline": {
                "coherence_checks": [],
                "connection_propositions": [{
                    "check_kind": "connection_with_another_evaluated_guideline",
                    "source": {"condition": "user asks for refund", "action": "offer store credit"},
                    "target": {"condition": "user accepts credit", "action": "issue voucher"}
                }]
            }
        },
        "error": null
    })
}

async fn mount_reads(server: &MockServer, reads: Vec<ResponseTemplate>) {
    let last = reads.len();
    for (index, response) in reads.into_iter().enumerate() {
        let mock = Mock::given(method("GET"))
            .and(path("/index/evaluations/ev_1"))
            .respond_with(response)
            .with_priority(u8::try_from(index + 1).unwrap_or(u8::MAX));
        // The final response keeps answering once the earlier ones are used up.
        let mock = if index + 1 == last { mock } else { mock.up_to_n_times(1) };
        mock.mount(server).await;
    }
}

async fn mount_create(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/index/evaluations"))
        .and(body_json(json!({
            "agent_id": "ag_1",
            "payloads": [{
                "kind": "guideline",
                "guideline": {
                    "content": {
                        "condition": "user asks for refund",
                        "action": "offer store credit"
                    },
                    "operation": "add",
                    "coherence_check": true,
                    "connection_proposition": true
                }
            }]
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"id": "ev_1", "status": "pending", "progress": 0.0})),
        )
        .expect(1)
        .mount(server)
        .await;
}

fn evaluation(status: &str, progress: f64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "ev_1",
        "status": status,
        "progress": progress,
        "invoices": []
    }))
}

fn completed() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "ev_1",
        "status": "completed",
        "progress": 100.0,
        "invoices": [refund_invoice()]
    }))
}

async fn run_evaluate(server: &MockServer, args: EvaluateArgs) -> (u8, Value) {
    let config = config_for(server);
    let client = ConsoleClient::new(config.api.clone()).expect("client should build");
    let result = evaluate::run(client, &config, args).await;
    let payload = serde_json::from_str(&result.output).expect("command output should be JSON");
    (result.exit_code, payload)
}

#[tokio::test]
async fn refund_scenario_completes_and_commits() {
    let server = MockServer::start().await;
    mount_create(&server).await;
    mount_reads(
        &server,
        vec![evaluation("pending", 0.0), evaluation("running", 50.0), completed()],
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/agents/ag_1/guidelines"))
        .and(body_json(json!({"invoices": [refund_invoice()]})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"items": []})))
        .expect(1)
        .mount(&server)
        .await;

    let (exit_code, payload) = run_evaluate(&server, refund_args(true)).await;

    assert_eq!(exit_code, 0, "unexpected output: {payload}");
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["message"], "evaluation ev_1 completed and committed");
    assert_eq!(payload["data"]["state"], "completed");
    assert_eq!(payload["data"]["committed"], json!({"items": []}));
    assert_eq!(payload["data"]["progress"], 100.0);
    let invoice = &payload["data"]["evaluation"]["invoices"][0];
    assert_eq!(invoice["approved"], true);
    let propositions = &invoice["data"]["guideline"]["connection_propositions"];
    assert_eq!(propositions.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn completed_evaluation_is_not_committed_without_flag() {
    let server = MockServer::start().await;
    mount_create(&server).await;
    mount_reads(&server, vec![completed()]).await;
    Mock::given(method("POST"))
        .and(path("/agents/ag_1/guidelines"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let (exit_code, payload) = run_evaluate(&server, refund_args(false)).await;

    assert_eq!(exit_code, 0);
    assert_eq!(payload["data"]["state"], "completed");
    assert!(payload["data"].get("committed").is_none());
}

#[tokio::test]
async fn server_error_mid_poll_stops_and_reports() {
    let server = MockServer::start().await;
    mount_create(&server).await;
    mount_reads(
        &server,
        vec![
            evaluation("running", 40.0),
            ResponseTemplate::new(500).set_body_json(json!({"detail": "index unavailable"})),
        ],
    )
    .await;

    let (exit_code, payload) = run_evaluate(&server, refund_args(true)).await;

    assert_eq!(exit_code, 4);
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["error_class"], "request");
    assert_eq!(payload["message"], "Failed to read evaluation. index unavailable");

    let reads = server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == "/index/evaluations/ev_1")
        .count();
    assert_eq!(reads, 2, "polling must stop after the failed read");
}

#[tokio::test]
async fn failed_evaluation_exits_with_evaluation_code() {
    let server = MockServer::start().await;
    mount_create(&server).await;
    mount_reads(
        &server,
        vec![ResponseTemplate::new(200).set_body_json(json!({
            "id": "ev_1",
            "status": "failed",
            "progress": 60.0,
            "error": "guideline conflicts with an existing one"
        }))],
    )
    .await;

    let (exit_code, payload) = run_evaluate(&server, refund_args(true)).await;

    assert_eq!(exit_code, 7);
    assert_eq!(payload["error_class"], "evaluation_failed");
    assert_eq!(payload["message"], "guideline conflicts with an existing one");
}

#[tokio::test]
async fn missing_agent_is_rejected_without_requests() {
    let server = MockServer::start().await;
    let args = EvaluateArgs { agent: None, ..refund_args(false) };

    let (exit_code, payload) = run_evaluate(&server, args).await;

    assert_eq!(exit_code, 3);
    assert_eq!(payload["error_class"], "validation");
    assert_eq!(payload["message"], "Please select an agent before evaluating.");
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn rejected_submission_reports_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/index/evaluations"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"detail": "action must not be empty"})),
        )
        .mount(&server)
        .await;

    let (exit_code, payload) = run_evaluate(&server, refund_args(false)).await;

    assert_eq!(exit_code, 4);
    assert_eq!(payload["message"], "Failed to evaluate guideline. action must not be empty");
}

fn evaluation_reads(requests: &[wiremock::Request]) -> usize {
    requests.iter().filter(|request| request.url.path() == "/index/evaluations/ev_1").count()
}

#[tokio::test]
async fn interrupt_during_submission_abandons_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/index/evaluations"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"id": "ev_1", "status": "pending", "progress": 0.0}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    let config = config_for(&server);
    let client = ConsoleClient::new(config.api.clone()).expect("client should build");

    let result =
        evaluate::run_until_interrupted(client, &config, refund_args(true), async {}).await;
    let payload: Value =
        serde_json::from_str(&result.output).expect("command output should be JSON");

    assert_eq!(result.exit_code, evaluate::EXIT_EVALUATION_FAILED);
    assert_eq!(payload["error_class"], "cancelled");
    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(evaluation_reads(&requests), 0);
}

#[tokio::test]
async fn interrupt_during_polling_stops_reads() {
    let server = MockServer::start().await;
    mount_create(&server).await;
    mount_reads(&server, vec![evaluation("running", 30.0)]).await;
    let config = config_for(&server);
    let client = ConsoleClient::new(config.api.clone()).expect("client should build");
    let interrupt = tokio::time::sleep(Duration::from_millis(150));

    let result =
        evaluate::run_until_interrupted(client, &config, refund_args(true), interrupt).await;
    let payload: Value =
        serde_json::from_str(&result.output).expect("command output should be JSON");

    assert_eq!(result.exit_code, evaluate::EXIT_EVALUATION_FAILED, "unexpected: {payload}");
    assert_eq!(payload["error_class"], "cancelled");
    let requests = server.received_requests().await.unwrap_or_default();
    let reads = evaluation_reads(&requests);
    tokio::time::sleep(Duration::from_millis(100)).await;
    let later = server.received_requests().await.unwrap_or_default();
    assert!(reads >= 1);
    assert_eq!(evaluation_reads(&later), reads, "no reads after the interrupt");
}

