use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

pub(crate) fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("duration cannot be empty (expected e.g. 30, 90s, 2m)".to_string());
    }

    let number_end = s
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map_or(s.len(), |(idx, _)| idx);

    if number_end == 0 {
        return Err(format!("invalid duration '{s}' (expected e.g. 30, 90s, 2m)"));
    }

    let (number_str, unit_str) = s.split_at(number_end);
    let value: u64 = number_str
        .parse()
        .map_err(|_| format!("invalid duration '{s}' (expected e.g. 30, 90s, 2m)"))?;

    // A bare number means seconds, so LOAD_TEST_DURATION=60 style env values work.
    let unit = unit_str.trim();
    match unit {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => Ok(Duration::from_secs(value)),
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => {
            Ok(Duration::from_millis(value))
        }
        "m" | "min" | "mins" | "minute" | "minutes" => {
            let secs = value
                .checked_mul(60)
                .ok_or_else(|| format!("duration '{s}' is too large"))?;
            Ok(Duration::from_secs(secs))
        }
        "h" | "hr" | "hrs" | "hour" | "hours" => {
            let secs = value
                .checked_mul(60)
                .and_then(|v| v.checked_mul(60))
                .ok_or_else(|| format!("duration '{s}' is too large"))?;
            Ok(Duration::from_secs(secs))
        }
        _ => Err(format!("invalid duration '{s}' (expected e.g. 30, 90s, 2m)")),
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    HumanReadable,
    /// Emit the full report document as JSON to stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "stampede",
    author,
    version,
    about = "Scenario-driven concurrent HTTP load testing harness",
    long_about = "stampede drives synthetic traffic against a target HTTP service.\n\nVirtual users are brought online over a ramp-up window, then each repeatedly picks a random scenario, issues the request, and pauses for a randomized think-time until the run window closes. Results are merged into a single report with per-scenario breakdowns.\n\nScenarios come from a YAML file or from the built-in suite when no file is given.",
    after_help = "Examples:\n  stampede --base-url http://localhost:3000 --quick\n  stampede scenarios.yaml --users 50 --duration 2m --ramp-up 30s\n  stampede --health-check\n  stampede scenarios.yaml --seed 42 --output json\n\nEnvironment:\n  BASE_URL / BACKEND_URL        target service root URL\n  LOAD_TEST_CONCURRENT_USERS    number of virtual users (default 10)\n  LOAD_TEST_DURATION            run duration in seconds (default 60)\n  LOAD_TEST_RAMP_UP             ramp-up window in seconds (default 10)"
)]
pub struct Cli {
    /// Path to a scenario file (.yaml). Defaults to the built-in suite.
    pub scenarios: Option<PathBuf>,

    /// Target service root URL
    #[arg(long, env = "BASE_URL")]
    pub base_url: Option<String>,

    /// Number of concurrent virtual users
    #[arg(long, env = "LOAD_TEST_CONCURRENT_USERS")]
    pub users: Option<u64>,

    /// Sustained load duration (e.g. 60, 90s, 2m)
    #[arg(long, env = "LOAD_TEST_DURATION", value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Ramp-up window over which virtual users are started
    #[arg(long, env = "LOAD_TEST_RAMP_UP", value_parser = parse_duration)]
    pub ramp_up: Option<Duration>,

    /// Run only the per-scenario smoke pass, no sustained load
    #[arg(long)]
    pub health_check: bool,

    /// Shorthand for a 30s run with 5 users
    #[arg(long, short = 'q')]
    pub quick: bool,

    /// Seed for scenario selection and think-times (omit for entropy)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Minimum think-time between a user's consecutive requests
    #[arg(long, value_parser = parse_duration, default_value = "1s")]
    pub think_min: Duration,

    /// Maximum think-time between a user's consecutive requests
    #[arg(long, value_parser = parse_duration, default_value = "5s")]
    pub think_max: Duration,

    /// Skip the per-scenario baseline pre-pass
    #[arg(long)]
    pub no_baseline: bool,

    /// Directory for JSON report artifacts
    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn parse_duration_accepts_common_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("10s"), Ok(Duration::from_secs(10)));
        assert_eq!(parse_duration("1m"), Ok(Duration::from_secs(60)));
        assert_eq!(parse_duration("2h"), Ok(Duration::from_secs(2 * 60 * 60)));
    }

    #[test]
    fn parse_duration_treats_bare_numbers_as_seconds() {
        assert_eq!(parse_duration("60"), Ok(Duration::from_secs(60)));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("10x").is_err());
    }

    #[test]
    fn cli_parses_full_flag_set() {
        let parsed = Cli::try_parse_from([
            "stampede",
            "suite.yaml",
            "--base-url",
            "http://localhost:3000",
            "--users",
            "25",
            "--duration",
            "90s",
            "--ramp-up",
            "15s",
            "--seed",
            "7",
            "--think-min",
            "500ms",
            "--think-max",
            "2s",
            "--results-dir",
            "out",
            "--output",
            "json",
        ]);

        let cli = match parsed {
            Ok(v) => v,
            Err(err) => panic!("failed to parse args: {err}"),
        };

        assert_eq!(cli.scenarios, Some(PathBuf::from("suite.yaml")));
        assert_eq!(cli.base_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(cli.users, Some(25));
        assert_eq!(cli.duration, Some(Duration::from_secs(90)));
        assert_eq!(cli.ramp_up, Some(Duration::from_secs(15)));
        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.think_min, Duration::from_millis(500));
        assert_eq!(cli.think_max, Duration::from_secs(2));
        assert_eq!(cli.results_dir, PathBuf::from("out"));
        assert!(matches!(cli.output, OutputFormat::Json));
        assert!(!cli.quick);
        assert!(!cli.health_check);
    }

    #[test]
    fn cli_defaults_are_empty_and_human_readable() {
        let cli = match Cli::try_parse_from(["stampede"]) {
            Ok(v) => v,
            Err(err) => panic!("failed to parse args: {err}"),
        };

        assert_eq!(cli.scenarios, None);
        assert_eq!(cli.users, None);
        assert_eq!(cli.think_min, Duration::from_secs(1));
        assert_eq!(cli.think_max, Duration::from_secs(5));
        assert!(matches!(cli.output, OutputFormat::HumanReadable));
    }

    #[test]
    fn quick_and_health_check_flags_parse() {
        let cli = match Cli::try_parse_from(["stampede", "-q", "--health-check"]) {
            Ok(v) => v,
            Err(err) => panic!("failed to parse args: {err}"),
        };
        assert!(cli.quick);
        assert!(cli.health_check);
    }
}
