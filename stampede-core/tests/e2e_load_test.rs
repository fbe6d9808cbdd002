#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use stampede_core::{
    AuthRole, CancelSignal, Error, HttpMethod, LoadConfig, RoleLogin, RunContext, Scenario,
    ScenarioRegistry, ThinkTime, login, run_baseline, run_load_test,
};
use stampede_http::HttpClient;
use stampede_testserver::TestServer;

fn fast_config(users: u64, duration_ms: u64) -> LoadConfig {
    LoadConfig {
        concurrent_users: users,
        duration: Duration::from_millis(duration_ms),
        ramp_up: Duration::from_millis(50),
        think_time: ThinkTime {
            min: Duration::from_millis(5),
            max: Duration::from_millis(15),
        },
        seed: Some(1),
        baseline_requests: 10,
        baseline_concurrency: 5,
        ..LoadConfig::default()
    }
}

fn registry_of(scenarios: Vec<Scenario>) -> Arc<ScenarioRegistry> {
    Arc::new(ScenarioRegistry::load(scenarios).unwrap())
}

#[tokio::test]
async fn healthy_target_yields_full_success_rate() {
    let server = TestServer::start().await.unwrap();

    let registry = registry_of(vec![
        Scenario::new("health", HttpMethod::Get, "/api/health").timeout(Duration::from_secs(2)),
        Scenario::new("ok", HttpMethod::Get, "/ok").timeout(Duration::from_secs(2)),
    ]);
    let ctx = Arc::new(RunContext::new(server.base_url()));

    let report = run_load_test(
        registry,
        &fast_config(2, 500),
        ctx,
        Arc::new(HttpClient::default()),
        Arc::new(CancelSignal::new()),
    )
    .await
    .unwrap();
    server.shutdown().await;

    assert!(report.total_requests > 0);
    assert_eq!(report.success_rate_percent, 100.0);
    assert_eq!(
        report.total_requests,
        report.successful_requests + report.failed_requests
    );
    assert!(report.throughput_per_second > 0.0);
}

#[tokio::test]
async fn unreachable_target_fails_before_spawning_users() {
    let registry = registry_of(vec![Scenario::new("health", HttpMethod::Get, "/api/health")]);
    // TEST-NET-1; nothing listens there.
    let ctx = Arc::new(RunContext::new("http://192.0.2.1:81"));

    let mut config = fast_config(2, 500);
    config.health_timeout = Duration::from_millis(300);

    let err = run_load_test(
        registry,
        &config,
        ctx,
        Arc::new(HttpClient::new(Some(Duration::from_millis(200)))),
        Arc::new(CancelSignal::new()),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::TargetUnreachable { .. }));
}

#[tokio::test]
async fn failing_health_status_is_target_unreachable() {
    let server = TestServer::start().await.unwrap();

    let registry = registry_of(vec![Scenario::new("ok", HttpMethod::Get, "/ok")]);
    let ctx = Arc::new(RunContext::new(server.base_url()));

    let mut config = fast_config(1, 200);
    config.health_path = "/fail".to_string();

    let err = run_load_test(
        registry,
        &config,
        ctx,
        Arc::new(HttpClient::default()),
        Arc::new(CancelSignal::new()),
    )
    .await
    .unwrap_err();
    server.shutdown().await;

    assert!(matches!(err, Error::TargetUnreachable { .. }));
}

#[tokio::test]
async fn forced_timeouts_are_recorded_and_the_run_still_reports() {
    let server = TestServer::start().await.unwrap();

    let registry = registry_of(vec![
        Scenario::new("too_slow", HttpMethod::Get, "/slow")
            .query("ms", "5000")
            .timeout(Duration::from_millis(100)),
    ]);
    let ctx = Arc::new(RunContext::new(server.base_url()));

    let report = run_load_test(
        registry,
        &fast_config(2, 400),
        ctx,
        Arc::new(HttpClient::default()),
        Arc::new(CancelSignal::new()),
    )
    .await
    .unwrap();
    server.shutdown().await;

    assert!(report.total_requests > 0);
    assert_eq!(report.success_rate_percent, 0.0);
    assert_eq!(report.failed_requests, report.total_requests);
}

#[tokio::test]
async fn mixed_registry_splits_per_scenario_success() {
    let server = TestServer::start().await.unwrap();

    let registry = registry_of(vec![
        Scenario::new("always_ok", HttpMethod::Get, "/ok").timeout(Duration::from_secs(2)),
        Scenario::new("always_fail", HttpMethod::Get, "/fail").timeout(Duration::from_secs(2)),
    ]);
    let ctx = Arc::new(RunContext::new(server.base_url()));

    let report = run_load_test(
        registry,
        &fast_config(4, 800),
        ctx,
        Arc::new(HttpClient::default()),
        Arc::new(CancelSignal::new()),
    )
    .await
    .unwrap();
    server.shutdown().await;

    let ok = &report.scenarios["always_ok"];
    let fail = &report.scenarios["always_fail"];
    assert_eq!(ok.success_rate_percent, 100.0);
    assert_eq!(fail.success_rate_percent, 0.0);
    assert!(report.success_rate_percent > 0.0 && report.success_rate_percent < 100.0);
}

#[tokio::test]
async fn cancellation_ends_the_run_early_with_a_report() {
    let server = TestServer::start().await.unwrap();

    let registry = registry_of(vec![
        Scenario::new("health", HttpMethod::Get, "/api/health").timeout(Duration::from_secs(2)),
    ]);
    let ctx = Arc::new(RunContext::new(server.base_url()));
    let cancel = Arc::new(CancelSignal::new());

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            cancel.cancel();
        });
    }

    let mut config = fast_config(2, 60_000);
    config.ramp_up = Duration::ZERO;

    let started = std::time::Instant::now();
    let report = run_load_test(
        registry,
        &config,
        ctx,
        Arc::new(HttpClient::default()),
        cancel,
    )
    .await
    .unwrap();
    server.shutdown().await;

    assert!(
        started.elapsed() < Duration::from_secs(10),
        "cancellation did not stop the run promptly"
    );
    assert!(report.total_requests > 0);
}

#[tokio::test]
async fn authenticated_scenarios_use_acquired_tokens() {
    let server = TestServer::start().await.unwrap();
    let client = Arc::new(HttpClient::default());

    let spec = RoleLogin::new(
        AuthRole::User,
        "/api/auth/login",
        serde_json::json!({"email": "user@example.com", "password": "pw"}),
    );
    let token = login(&client, server.base_url(), &spec).await.unwrap();

    let mut ctx = RunContext::new(server.base_url());
    ctx.tokens.insert(AuthRole::User, token);
    let ctx = Arc::new(ctx);

    let registry = registry_of(vec![
        Scenario::new("profile", HttpMethod::Get, "/api/users/profile")
            .auth(AuthRole::User)
            .timeout(Duration::from_secs(2)),
    ]);

    let report = run_load_test(
        registry,
        &fast_config(2, 400),
        ctx,
        client,
        Arc::new(CancelSignal::new()),
    )
    .await
    .unwrap();

    assert_eq!(report.success_rate_percent, 100.0);
    assert!(server.stats().authorized_requests() > 0);
    assert_eq!(server.stats().unauthorized_requests(), 0);
    server.shutdown().await;
}

#[tokio::test]
async fn expected_negative_status_counts_as_success() {
    let server = TestServer::start().await.unwrap();

    // No token in the context: the protected route returns 401, which the
    // scenario declares as its expected status.
    let registry = registry_of(vec![
        Scenario::new("profile_unauthorized", HttpMethod::Get, "/api/users/profile")
            .auth(AuthRole::User)
            .expect_status(401)
            .timeout(Duration::from_secs(2)),
    ]);
    let ctx = Arc::new(RunContext::new(server.base_url()));

    let report = run_load_test(
        registry,
        &fast_config(1, 300),
        ctx,
        Arc::new(HttpClient::default()),
        Arc::new(CancelSignal::new()),
    )
    .await
    .unwrap();
    server.shutdown().await;

    assert!(report.total_requests > 0);
    assert_eq!(report.success_rate_percent, 100.0);
}

#[tokio::test]
async fn baseline_pre_pass_issues_fixed_batches_per_scenario() {
    let server = TestServer::start().await.unwrap();

    let registry = ScenarioRegistry::load(vec![
        Scenario::new("ok", HttpMethod::Get, "/ok").timeout(Duration::from_secs(2)),
        Scenario::new("fail", HttpMethod::Get, "/fail").timeout(Duration::from_secs(2)),
    ])
    .unwrap();
    let ctx = Arc::new(RunContext::new(server.base_url()));

    let config = fast_config(1, 100);
    let baselines = run_baseline(
        &registry,
        &config,
        ctx,
        Arc::new(HttpClient::default()),
    )
    .await
    .unwrap();
    server.shutdown().await;

    assert_eq!(baselines.len(), 2);
    for b in &baselines {
        assert_eq!(b.requests, config.baseline_requests);
        assert_eq!(b.requests, b.successes + b.failures);
    }
    assert_eq!(baselines[0].scenario, "ok");
    assert_eq!(baselines[0].failures, 0);
    assert_eq!(baselines[1].scenario, "fail");
    assert_eq!(baselines[1].successes, 0);
}
