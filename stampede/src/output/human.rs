use std::fmt::Write as _;

use stampede_core::{LoadTestReport, ScenarioBaseline};

fn format_ms(value: Option<f64>) -> String {
    match value {
        Some(ms) => format!("{ms:.1}ms"),
        None => "n/a".to_string(),
    }
}

pub(crate) fn render(report: &LoadTestReport, baselines: &[ScenarioBaseline]) -> String {
    let mut out = String::new();

    if !baselines.is_empty() {
        out.push_str(&render_baseline(baselines));
        out.push('\n');
    }

    out.push_str("summary\n");
    writeln!(&mut out, "  duration: {:.1}s", report.duration_seconds).ok();
    writeln!(
        &mut out,
        "  requests: {} (ok {}, failed {})",
        report.total_requests, report.successful_requests, report.failed_requests
    )
    .ok();
    writeln!(
        &mut out,
        "  success_rate: {:.2}%",
        report.success_rate_percent
    )
    .ok();
    writeln!(
        &mut out,
        "  latency: mean={:.1}ms p50={} p95={} p99={}",
        report.average_latency_ms,
        format_ms(report.p50_latency_ms),
        format_ms(report.p95_latency_ms),
        format_ms(report.p99_latency_ms)
    )
    .ok();
    writeln!(
        &mut out,
        "  throughput: {:.2} ok/s",
        report.throughput_per_second
    )
    .ok();
    out.push('\n');

    for (name, s) in &report.scenarios {
        writeln!(&mut out, "scenario: {name}").ok();
        writeln!(
            &mut out,
            "  requests: {} (failed {})",
            s.total_requests, s.failed_requests
        )
        .ok();
        writeln!(&mut out, "  success_rate: {:.2}%", s.success_rate_percent).ok();
        writeln!(
            &mut out,
            "  latency: mean={:.1}ms p95={}",
            s.average_latency_ms,
            format_ms(s.p95_latency_ms)
        )
        .ok();
        for error in &s.errors {
            writeln!(&mut out, "    error: {error}").ok();
        }
        out.push('\n');
    }

    out.push_str(&render_analysis(report));
    out
}

/// Qualitative read on the run, using the same thresholds operators already
/// apply by hand: 95/90% success, 1s/3s mean latency, 10/5 ok/s.
fn render_analysis(report: &LoadTestReport) -> String {
    let mut out = String::new();
    out.push_str("analysis\n");

    let rate = report.success_rate_percent;
    if rate >= 95.0 {
        out.push_str("  success rate above 95% - excellent\n");
    } else if rate >= 90.0 {
        out.push_str("  success rate above 90% - acceptable\n");
    } else {
        out.push_str("  success rate below 90% - poor\n");
    }

    let mean = report.average_latency_ms;
    if mean < 1000.0 {
        out.push_str("  mean latency below 1s - excellent\n");
    } else if mean < 3000.0 {
        out.push_str("  mean latency below 3s - acceptable\n");
    } else {
        out.push_str("  mean latency above 3s - poor\n");
    }

    let rps = report.throughput_per_second;
    if rps > 10.0 {
        out.push_str("  throughput above 10 ok/s - high\n");
    } else if rps > 5.0 {
        out.push_str("  throughput above 5 ok/s - moderate\n");
    } else {
        out.push_str("  throughput at or below 5 ok/s - low\n");
    }

    let mut recommendations = Vec::new();
    if rate < 95.0 {
        recommendations.push("review error handling on the failing endpoints");
    }
    if mean >= 1000.0 {
        recommendations.push("consider caching and database query optimizations");
    }
    if rps <= 10.0 {
        recommendations.push("consider scaling server resources or adding load balancing");
    }

    if !recommendations.is_empty() {
        out.push_str("\nrecommendations\n");
        for r in recommendations {
            writeln!(&mut out, "  {r}").ok();
        }
    }

    out
}

pub(crate) fn render_baseline(baselines: &[ScenarioBaseline]) -> String {
    let mut out = String::new();
    out.push_str("baseline\n");

    for b in baselines {
        writeln!(
            &mut out,
            "  {}: {}/{} ok, mean={:.1}ms, took {:.2}s",
            b.scenario, b.successes, b.requests, b.average_latency_ms, b.duration_seconds
        )
        .ok();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use stampede_core::aggregate;
    use std::time::Duration;

    #[test]
    fn empty_run_still_renders_a_summary() {
        let report = aggregate(&[], Duration::from_secs(1));
        let text = render(&report, &[]);

        assert!(text.contains("summary"));
        assert!(text.contains("requests: 0 (ok 0, failed 0)"));
        assert!(text.contains("success_rate: 0.00%"));
        assert!(text.contains("analysis"));
    }

    #[test]
    fn baseline_lines_list_each_scenario() {
        let baselines = vec![ScenarioBaseline {
            scenario: "health_check".to_string(),
            requests: 50,
            successes: 50,
            failures: 0,
            average_latency_ms: 12.5,
            duration_seconds: 0.4,
        }];

        let text = render_baseline(&baselines);
        assert!(text.contains("health_check: 50/50 ok"));
    }
}
