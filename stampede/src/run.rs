use std::sync::Arc;
use std::time::Duration;

use stampede_core::{
    CancelSignal, LoadConfig, RunContext, ScenarioRegistry, ThinkTime, health_check, login,
    run_baseline, run_load_test,
};
use stampede_http::HttpClient;

use crate::cli::{Cli, OutputFormat};
use crate::report_file::{ConfigEcho, ReportDocument};
use crate::run_error::RunError;
use crate::scenario_file::LoadedSuite;
use crate::{builtin, output, report_file, scenario_file};

const QUICK_USERS: u64 = 5;
const QUICK_DURATION: Duration = Duration::from_secs(30);

pub async fn run(cli: Cli) -> Result<(), RunError> {
    let suite = match &cli.scenarios {
        Some(path) => scenario_file::load(path).await.map_err(RunError::Config)?,
        None => builtin::suite(),
    };

    let base_url = resolve_base_url(&cli, &suite)?;
    let config = load_config(&cli);

    let registry =
        Arc::new(ScenarioRegistry::load(suite.scenarios).map_err(RunError::from)?);
    let client = Arc::new(HttpClient::default());

    let mut ctx = RunContext::new(base_url);
    ctx.params = suite.params;

    eprintln!("target: {}", ctx.base_url);

    // Bearer tokens are fetched once up front. A failed login degrades to
    // recorded 401 failures for that role's scenarios rather than aborting.
    let roles = registry.roles_in_use();
    for spec in &suite.auth {
        if !roles.contains(&spec.role) {
            continue;
        }
        match login(&client, &ctx.base_url, spec).await {
            Ok(token) => {
                ctx.tokens.insert(spec.role, token);
            }
            Err(err) => eprintln!("warning: {err}"),
        }
    }
    let ctx = Arc::new(ctx);

    health_check(&client, &ctx, &config)
        .await
        .map_err(RunError::from)?;

    if cli.health_check {
        let smoke = LoadConfig {
            baseline_requests: 1,
            baseline_concurrency: 1,
            ..config
        };
        let baselines = run_baseline(&registry, &smoke, ctx, client)
            .await
            .map_err(RunError::from)?;

        print!("{}", output::human::render_baseline(&baselines));
        let failed = baselines.iter().any(|b| b.failures > 0);
        eprintln!("health check: {}", if failed { "FAILED" } else { "PASSED" });
        return Ok(());
    }

    let baselines = if cli.no_baseline {
        Vec::new()
    } else {
        eprintln!(
            "baseline: {} requests per scenario at concurrency {}",
            config.baseline_requests, config.baseline_concurrency
        );
        run_baseline(&registry, &config, ctx.clone(), client.clone())
            .await
            .map_err(RunError::from)?
    };

    let cancel = Arc::new(CancelSignal::new());
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("interrupt received, stopping virtual users");
                cancel.cancel();
            }
        });
    }

    eprintln!(
        "load test: {} users for {:.0}s (ramp-up {:.0}s)",
        config.concurrent_users,
        config.duration.as_secs_f64(),
        config.ramp_up.as_secs_f64()
    );

    let report = run_load_test(registry.clone(), &config, ctx.clone(), client, cancel)
        .await
        .map_err(RunError::from)?;

    let document = ReportDocument {
        generated_at: chrono::Utc::now(),
        config: ConfigEcho {
            base_url: ctx.base_url.clone(),
            concurrent_users: config.concurrent_users,
            duration_seconds: config.duration.as_secs_f64(),
            ramp_up_seconds: config.ramp_up.as_secs_f64(),
            think_min_ms: config.think_time.min.as_millis().min(u64::MAX as u128) as u64,
            think_max_ms: config.think_time.max.as_millis().min(u64::MAX as u128) as u64,
            seed: config.seed,
            scenario_count: registry.len(),
        },
        baseline: baselines,
        report,
    };

    match cli.output {
        OutputFormat::HumanReadable => {
            print!(
                "{}",
                output::human::render(&document.report, &document.baseline)
            );
        }
        OutputFormat::Json => {
            let line = serde_json::to_string_pretty(&document)
                .map_err(|err| RunError::Internal(err.into()))?;
            println!("{line}");
        }
    }

    let path = report_file::write(&cli.results_dir, &document)
        .await
        .map_err(RunError::Internal)?;
    eprintln!("report written to {}", path.display());

    Ok(())
}

fn resolve_base_url(cli: &Cli, suite: &LoadedSuite) -> Result<String, RunError> {
    if let Some(url) = &cli.base_url {
        return Ok(url.clone());
    }
    // clap covers BASE_URL; BACKEND_URL is the legacy name some deployments use.
    if let Ok(url) = std::env::var("BACKEND_URL")
        && !url.is_empty()
    {
        return Ok(url);
    }
    if let Some(url) = &suite.base_url {
        return Ok(url.clone());
    }

    Err(RunError::Config(anyhow::anyhow!(
        "no target base URL; pass --base-url, set BASE_URL/BACKEND_URL, or add baseUrl to the scenario file"
    )))
}

fn load_config(cli: &Cli) -> LoadConfig {
    let defaults = LoadConfig::default();

    // --quick wins over explicit users/duration, matching its shorthand intent.
    let (concurrent_users, duration) = if cli.quick {
        (QUICK_USERS, QUICK_DURATION)
    } else {
        (
            cli.users.unwrap_or(defaults.concurrent_users),
            cli.duration.unwrap_or(defaults.duration),
        )
    };

    LoadConfig {
        concurrent_users,
        duration,
        ramp_up: cli.ramp_up.unwrap_or(defaults.ramp_up),
        think_time: ThinkTime {
            min: cli.think_min,
            max: cli.think_max,
        },
        seed: cli.seed,
        ..defaults
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use clap::Parser as _;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["stampede"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn quick_overrides_users_and_duration() {
        let config = load_config(&cli(&["--quick", "--users", "50", "--duration", "5m"]));
        assert_eq!(config.concurrent_users, QUICK_USERS);
        assert_eq!(config.duration, QUICK_DURATION);
    }

    #[test]
    fn flags_override_defaults() {
        let config = load_config(&cli(&["--users", "3", "--duration", "10s", "--seed", "1"]));
        assert_eq!(config.concurrent_users, 3);
        assert_eq!(config.duration, Duration::from_secs(10));
        assert_eq!(config.seed, Some(1));
    }

    #[test]
    fn base_url_falls_back_to_suite() {
        let suite = LoadedSuite {
            base_url: Some("http://from-suite:1234".to_string()),
            scenarios: Vec::new(),
            auth: Vec::new(),
            params: std::collections::HashMap::new(),
        };
        let url = resolve_base_url(&cli(&[]), &suite).unwrap();
        assert_eq!(url, "http://from-suite:1234");
    }
}
