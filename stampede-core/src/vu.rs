use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;

use super::config::{RunWindow, ThinkTime};
use super::context::RunContext;
use super::executor::{RequestExecutor, RequestResult};
use super::registry::ScenarioRegistry;
use super::signal::CancelSignal;

/// Everything one virtual user needs for its loop. Results are accumulated
/// in a user-local buffer and handed back on return; nothing shared is
/// mutated while the run is hot.
#[derive(Debug)]
pub struct VuContext {
    pub user_id: u64,
    pub registry: Arc<ScenarioRegistry>,
    pub executor: RequestExecutor,
    pub ctx: Arc<RunContext>,
    pub window: RunWindow,
    pub ramp_up_interval: Duration,
    pub think_time: ThinkTime,
    pub rng: StdRng,
    pub cancel: Arc<CancelSignal>,
}

/// Simulates one user over the test window: staggered start, then a loop of
/// pick a random scenario, issue the request, pause for a random think-time,
/// until the window closes or the run is cancelled. Request failures are
/// data, not errors; this function itself cannot fail.
pub async fn run_vu(mut vu: VuContext) -> Vec<RequestResult> {
    // Staggered ramp-up: user k comes online k * ramp_up_interval after the
    // window opens.
    let stagger = vu
        .ramp_up_interval
        .saturating_mul(vu.user_id.min(u32::MAX as u64) as u32);
    tokio::time::sleep_until(vu.window.start + stagger).await;

    let mut results = Vec::new();

    while tokio::time::Instant::now() < vu.window.end && !vu.cancel.is_cancelled() {
        let scenario = match vu.registry.pick_random(&mut vu.rng) {
            Ok(scenario) => scenario,
            // The orchestrator rejects empty registries before spawning.
            Err(_) => break,
        };

        let result = vu.executor.execute(scenario, &vu.ctx).await;
        results.push(result);

        let think = vu.think_time.sample(&mut vu.rng);
        tokio::select! {
            () = tokio::time::sleep(think) => {}
            () = vu.cancel.cancelled() => break,
        }
    }

    results
}
