use std::collections::BTreeMap;
use std::time::Duration;

use hdrhistogram::Histogram;

use super::executor::RequestResult;

/// Latencies are recorded in microseconds; anything above this is clamped.
const HISTOGRAM_MAX_US: u64 = 60_000_000;

/// How many distinct error messages are kept per scenario in the report.
const ERROR_SAMPLE_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ScenarioStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub success_rate_percent: f64,
    pub average_latency_ms: f64,
    pub p95_latency_ms: Option<f64>,
    /// Sample of distinct error messages observed for this scenario.
    pub errors: Vec<String>,
}

/// Aggregate statistics for a completed run. Computed once after every
/// virtual user has returned; immutable afterwards.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LoadTestReport {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub success_rate_percent: f64,
    pub average_latency_ms: f64,
    pub p50_latency_ms: Option<f64>,
    pub p95_latency_ms: Option<f64>,
    pub p99_latency_ms: Option<f64>,
    /// Successful requests per second of wall-clock run duration.
    pub throughput_per_second: f64,
    pub duration_seconds: f64,
    pub scenarios: BTreeMap<String, ScenarioStats>,
}

fn new_histogram() -> Histogram<u64> {
    Histogram::<u64>::new_with_bounds(1, HISTOGRAM_MAX_US, 3)
        .unwrap_or_else(|err| panic!("failed to init histogram: {err}"))
}

fn record_latency(hist: &mut Histogram<u64>, latency: Duration) {
    let us = latency.as_micros().min(HISTOGRAM_MAX_US as u128) as u64;
    hist.saturating_record(us.max(1));
}

fn quantile_ms(hist: &Histogram<u64>, q: f64) -> Option<f64> {
    #[allow(clippy::len_zero)]
    if hist.len() == 0 {
        return None;
    }
    Some(hist.value_at_quantile(q) as f64 / 1000.0)
}

/// Pure reduction from an unordered result multiset to a report. Running it
/// twice over the same input yields an identical report.
#[must_use]
pub fn aggregate(results: &[RequestResult], wall: Duration) -> LoadTestReport {
    let mut hist = new_histogram();
    let mut latency_sum = Duration::ZERO;
    let mut successes: u64 = 0;

    #[derive(Default)]
    struct PerScenario {
        total: u64,
        successes: u64,
        latency_sum: Duration,
        hist: Option<Histogram<u64>>,
        errors: Vec<String>,
    }

    let mut by_scenario: BTreeMap<String, PerScenario> = BTreeMap::new();

    for r in results {
        record_latency(&mut hist, r.latency);
        latency_sum += r.latency;
        if r.success {
            successes += 1;
        }

        let entry = by_scenario.entry(r.scenario.to_string()).or_default();
        entry.total += 1;
        entry.latency_sum += r.latency;
        if r.success {
            entry.successes += 1;
        }
        record_latency(entry.hist.get_or_insert_with(new_histogram), r.latency);

        if let Some(error) = &r.error
            && entry.errors.len() < ERROR_SAMPLE_LIMIT
            && !entry.errors.contains(error)
        {
            entry.errors.push(error.clone());
        }
    }

    let total = results.len() as u64;
    let failed = total - successes;

    let success_rate_percent = if total == 0 {
        0.0
    } else {
        (successes as f64 / total as f64) * 100.0
    };

    let average_latency_ms = if total == 0 {
        0.0
    } else {
        latency_sum.as_secs_f64() * 1000.0 / total as f64
    };

    let secs = wall.as_secs_f64();
    let throughput_per_second = if secs > 0.0 {
        successes as f64 / secs
    } else {
        0.0
    };

    let scenarios = by_scenario
        .into_iter()
        .map(|(name, s)| {
            let stats = ScenarioStats {
                total_requests: s.total,
                successful_requests: s.successes,
                failed_requests: s.total - s.successes,
                success_rate_percent: if s.total == 0 {
                    0.0
                } else {
                    (s.successes as f64 / s.total as f64) * 100.0
                },
                average_latency_ms: if s.total == 0 {
                    0.0
                } else {
                    s.latency_sum.as_secs_f64() * 1000.0 / s.total as f64
                },
                p95_latency_ms: s.hist.as_ref().and_then(|h| quantile_ms(h, 0.95)),
                errors: s.errors,
            };
            (name, stats)
        })
        .collect();

    LoadTestReport {
        total_requests: total,
        successful_requests: successes,
        failed_requests: failed,
        success_rate_percent,
        average_latency_ms,
        p50_latency_ms: quantile_ms(&hist, 0.50),
        p95_latency_ms: quantile_ms(&hist, 0.95),
        p99_latency_ms: quantile_ms(&hist, 0.99),
        throughput_per_second,
        duration_seconds: secs,
        scenarios,
    }
}
