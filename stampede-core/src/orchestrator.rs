use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng as _;
use rand::rngs::StdRng;
use stampede_http::{HttpClient, HttpRequest};

use super::config::{LoadConfig, RunWindow};
use super::context::RunContext;
use super::error::{Error, Result};
use super::executor::{RequestExecutor, RequestResult};
use super::registry::ScenarioRegistry;
use super::report::{LoadTestReport, aggregate};
use super::signal::CancelSignal;
use super::vu::{VuContext, run_vu};

/// Baseline numbers for one scenario, measured by the fixed-batch pre-pass
/// before mixed traffic starts.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScenarioBaseline {
    pub scenario: String,
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,
    pub average_latency_ms: f64,
    pub duration_seconds: f64,
}

fn validate(config: &LoadConfig, registry: &ScenarioRegistry) -> Result<()> {
    if config.concurrent_users == 0 {
        return Err(Error::InvalidUsers);
    }
    if config.duration.is_zero() {
        return Err(Error::InvalidDuration);
    }
    if config.think_time.min > config.think_time.max {
        return Err(Error::InvalidThinkTime);
    }
    if registry.is_empty() {
        return Err(Error::EmptyRegistry);
    }
    Ok(())
}

/// Pre-flight readiness probe. A target that cannot answer its health
/// endpoint makes every downstream number meaningless, so this is a hard
/// stop with no retry.
pub async fn health_check(client: &HttpClient, ctx: &RunContext, config: &LoadConfig) -> Result<()> {
    let url = format!("{}{}", ctx.base_url, config.health_path);
    let req = HttpRequest::get(&url).with_timeout(config.health_timeout);

    match client.request(req).await {
        Ok(res) if (200..300).contains(&res.status) => Ok(()),
        Ok(res) => Err(Error::TargetUnreachable {
            url,
            reason: format!("health endpoint returned status {}", res.status),
        }),
        Err(err) => Err(Error::TargetUnreachable {
            url,
            reason: err.to_string(),
        }),
    }
}

fn rng_for_user(config: &LoadConfig, user_id: u64) -> StdRng {
    match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(user_id)),
        None => StdRng::from_entropy(),
    }
}

/// Runs the full mixed-traffic phase: validate, pre-flight, spawn one task
/// per virtual user, join them all, and reduce the concatenated per-user
/// buffers into a report. No virtual user is abandoned; an in-flight request
/// at the deadline is allowed to finish.
pub async fn run_load_test(
    registry: Arc<ScenarioRegistry>,
    config: &LoadConfig,
    ctx: Arc<RunContext>,
    client: Arc<HttpClient>,
    cancel: Arc<CancelSignal>,
) -> Result<LoadTestReport> {
    validate(config, &registry)?;
    health_check(&client, &ctx, config).await?;

    let executor = RequestExecutor::new(client);
    let users = config.concurrent_users;
    let ramp_up_interval = config.ramp_up / users.min(u32::MAX as u64) as u32;

    let start = tokio::time::Instant::now();
    let window = RunWindow {
        start,
        end: start + config.duration,
    };

    let mut handles = Vec::with_capacity(users.min(usize::MAX as u64) as usize);
    for user_id in 0..users {
        let vu = VuContext {
            user_id,
            registry: registry.clone(),
            executor: executor.clone(),
            ctx: ctx.clone(),
            window,
            ramp_up_interval,
            think_time: config.think_time,
            rng: rng_for_user(config, user_id),
            cancel: cancel.clone(),
        };
        handles.push(tokio::spawn(run_vu(vu)));
    }

    let mut results: Vec<RequestResult> = Vec::new();
    for handle in handles {
        results.extend(handle.await?);
    }

    Ok(aggregate(&results, start.elapsed()))
}

/// Scenario-by-scenario pre-pass: a fixed batch of requests per scenario at
/// fixed concurrency, yielding per-endpoint numbers unpolluted by the mixed
/// traffic phase.
pub async fn run_baseline(
    registry: &ScenarioRegistry,
    config: &LoadConfig,
    ctx: Arc<RunContext>,
    client: Arc<HttpClient>,
) -> Result<Vec<ScenarioBaseline>> {
    let executor = RequestExecutor::new(client);
    let concurrency = config.baseline_concurrency.max(1);

    let mut out = Vec::with_capacity(registry.len());
    for scenario in registry.iter() {
        let begin = Instant::now();
        let mut results: Vec<RequestResult> =
            Vec::with_capacity(config.baseline_requests.min(usize::MAX as u64) as usize);

        let mut remaining = config.baseline_requests;
        while remaining > 0 {
            let batch = remaining.min(concurrency);
            let mut handles = Vec::with_capacity(batch as usize);
            for _ in 0..batch {
                let executor = executor.clone();
                let scenario = scenario.clone();
                let ctx = ctx.clone();
                handles.push(tokio::spawn(async move {
                    executor.execute(&scenario, &ctx).await
                }));
            }
            for handle in handles {
                results.push(handle.await?);
            }
            remaining -= batch;
        }

        let successes = results.iter().filter(|r| r.success).count() as u64;
        let total = results.len() as u64;
        let latency_sum: f64 = results.iter().map(|r| r.latency.as_secs_f64()).sum();

        out.push(ScenarioBaseline {
            scenario: scenario.name.clone(),
            requests: total,
            successes,
            failures: total - successes,
            average_latency_ms: if total == 0 {
                0.0
            } else {
                latency_sum * 1000.0 / total as f64
            },
            duration_seconds: begin.elapsed().as_secs_f64(),
        });
    }

    Ok(out)
}
