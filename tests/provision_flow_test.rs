use anyhow::Result;
use httpmock::prelude::*;
use merchant_wizard::core::orchestrator::CreationOrchestrator;
use merchant_wizard::core::progress::ProgressSummary;
use merchant_wizard::domain::model::ItemStatus;
use merchant_wizard::utils::validation::Validate;
use merchant_wizard::{HttpProvisioningApi, ProvisionFile, RunOutcome};

fn request_file(base_url: &str) -> String {
    format!(
        r#"
[api]
base_url = "{}"
timeout_seconds = 5

[api.headers]
authorization = "Bearer flow-token"

[run]
user_type = "merchant"

[profile]
name = "Acme Pay"
email = "ops@acme.test"
phone = "9876543210"
phone_country_code = "+91"
default_ccy = "INR"
region = "IN"

[[accounts]]
ccy = "USD"

[[contracts]]
contract_id = "C-1"
start_at = "2026-01-01T00:00:00Z"

[[routers]]
trx_type = "in"
trx_method = "upi"
ccy = "INR"
channel_code = "paytm"
priority = 1

[[routers]]
trx_type = "out"
trx_method = "bank_transfer"
ccy = "INR"
min_amount = 100
channel_code = "cashfree"
priority = 2
"#,
        base_url
    )
}

fn ok(data: serde_json::Value) -> serde_json::Value {
    serde_json::json!({"code": 200, "msg": "ok", "data": data})
}

fn build(server: &MockServer) -> Result<CreationOrchestrator<HttpProvisioningApi>> {
    let file = ProvisionFile::from_toml_str(&request_file(&server.base_url()))?;
    file.validate()?;
    let wizard = file.to_wizard()?;
    let form = wizard.submit()?;
    Ok(CreationOrchestrator::new(
        HttpProvisioningApi::new(file.api.clone()),
        wizard.user_type(),
        &form,
    ))
}

#[tokio::test]
async fn test_full_provisioning_flow() -> Result<()> {
    let server = MockServer::start();

    let register = server.mock(|when, then| {
        when.method(POST)
            .path("/user/register")
            .header("authorization", "Bearer flow-token")
            .json_body_partial(
                r#"{"user_type": "merchant", "nickname": "Acme Pay", "company_name": "Acme Pay", "default_ccy": "INR", "region": "IN"}"#,
            );
        then.status(200).json_body(ok(serde_json::json!({"user_id": "u-900"})));
    });
    let accounts = server.mock(|when, then| {
        when.method(POST)
            .path("/user/account/create")
            .json_body_partial(r#"{"user_id": "u-900", "user_type": "merchant"}"#);
        then.status(200).json_body(ok(serde_json::Value::Null));
    });
    let contracts = server.mock(|when, then| {
        when.method(POST)
            .path("/user/contract/create")
            .json_body_partial(
                r#"{"user_id": "u-900", "contract_id": "C-1", "start_at": 1767225600000, "status": "active"}"#,
            );
        then.status(200).json_body(ok(serde_json::Value::Null));
    });
    let routers = server.mock(|when, then| {
        when.method(POST)
            .path("/user/router/create")
            .json_body_partial(r#"{"user_id": "u-900", "ccy": "INR", "country": ""}"#);
        then.status(200).json_body(ok(serde_json::Value::Null));
    });

    let orchestrator = build(&server)?;
    let outcome = orchestrator.run().await;

    assert_eq!(outcome, RunOutcome::AllSucceeded);
    register.assert_hits(1);
    accounts.assert_hits(2);
    contracts.assert_hits(1);
    routers.assert_hits(2);

    let summary = ProgressSummary::from_items(&orchestrator.items());
    assert_eq!(summary.total, 6);
    assert_eq!(summary.percent, 100);
    assert!(summary.should_auto_close());
    Ok(())
}

#[tokio::test]
async fn test_user_rejection_sends_no_dependent_requests() -> Result<()> {
    let server = MockServer::start();

    let register = server.mock(|when, then| {
        when.method(POST).path("/user/register");
        then.status(200)
            .json_body(serde_json::json!({"code": 1001, "msg": "邮箱已被注册", "data": null}));
    });
    let accounts = server.mock(|when, then| {
        when.method(POST).path("/user/account/create");
        then.status(200).json_body(ok(serde_json::Value::Null));
    });

    let orchestrator = build(&server)?;
    let outcome = orchestrator.run().await;

    assert_eq!(outcome, RunOutcome::PartialFailure { failed: 1, pending: 5 });
    register.assert_hits(1);
    accounts.assert_hits(0);

    let items = orchestrator.items();
    assert_eq!(items[0].error.as_deref(), Some("邮箱已被注册"));
    assert!(items[1..].iter().all(|item| item.status == ItemStatus::Pending));

    let summary = ProgressSummary::from_items(&items);
    assert!(!summary.should_auto_close());
    Ok(())
}

#[tokio::test]
async fn test_partial_failure_then_batch_retry() -> Result<()> {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/user/register");
        then.status(200).json_body(ok(serde_json::json!("u-901")));
    });
    server.mock(|when, then| {
        when.method(POST).path("/user/account/create");
        then.status(200).json_body(ok(serde_json::Value::Null));
    });
    server.mock(|when, then| {
        when.method(POST).path("/user/contract/create");
        then.status(200).json_body(ok(serde_json::Value::Null));
    });
    let paytm_ok = server.mock(|when, then| {
        when.method(POST)
            .path("/user/router/create")
            .json_body_partial(r#"{"channel_code": "paytm"}"#);
        then.status(200).json_body(ok(serde_json::Value::Null));
    });
    let mut cashfree_down = server.mock(|when, then| {
        when.method(POST)
            .path("/user/router/create")
            .json_body_partial(r#"{"channel_code": "cashfree"}"#);
        then.status(502).body("bad gateway");
    });

    let orchestrator = build(&server)?;
    let outcome = orchestrator.run().await;

    assert_eq!(outcome, RunOutcome::PartialFailure { failed: 1, pending: 0 });
    paytm_ok.assert_hits(1);
    cashfree_down.assert_hits(1);
    let failed = orchestrator
        .items()
        .into_iter()
        .find(|item| item.status == ItemStatus::Error)
        .expect("one failed item");
    assert_eq!(failed.id, "router-1");
    assert_eq!(failed.error.as_deref(), Some("HTTP 502 Bad Gateway"));

    // 後台恢復後批次重試
    cashfree_down.delete();
    let cashfree_ok = server.mock(|when, then| {
        when.method(POST)
            .path("/user/router/create")
            .json_body_partial(r#"{"channel_code": "cashfree"}"#);
        then.status(200).json_body(ok(serde_json::Value::Null));
    });

    let batch = orchestrator.retry_failed().await?;

    assert_eq!(batch.attempted, vec!["router-1"]);
    assert!(!batch.failures_remain);
    cashfree_ok.assert_hits(1);
    paytm_ok.assert_hits(1);
    assert_eq!(orchestrator.outcome(), RunOutcome::AllSucceeded);
    Ok(())
}
