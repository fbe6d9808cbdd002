use std::time::Duration;

use rand::Rng;

/// Randomized pause a virtual user takes between consecutive requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThinkTime {
    pub min: Duration,
    pub max: Duration,
}

impl Default for ThinkTime {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(1),
            max: Duration::from_secs(5),
        }
    }
}

impl ThinkTime {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let min = self.min.as_millis().min(u64::MAX as u128) as u64;
        let max = self.max.as_millis().min(u64::MAX as u128) as u64;
        if min >= max {
            return self.min;
        }
        Duration::from_millis(rng.gen_range(min..=max))
    }
}

#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Number of concurrent virtual users.
    pub concurrent_users: u64,

    /// Sustained load window.
    pub duration: Duration,

    /// Window over which virtual users are started, staggered evenly.
    pub ramp_up: Duration,

    pub think_time: ThinkTime,

    /// Seed for scenario selection and think-time jitter. `None` draws from
    /// OS entropy, which matches production load generation.
    pub seed: Option<u64>,

    /// Requests issued per scenario during the baseline pre-pass.
    pub baseline_requests: u64,

    /// Concurrency of the baseline pre-pass batches.
    pub baseline_concurrency: u64,

    /// Path of the unauthenticated readiness endpoint used by the pre-flight check.
    pub health_path: String,

    pub health_timeout: Duration,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            concurrent_users: 10,
            duration: Duration::from_secs(60),
            ramp_up: Duration::from_secs(10),
            think_time: ThinkTime::default(),
            seed: None,
            baseline_requests: 50,
            baseline_concurrency: 10,
            health_path: "/api/health".to_string(),
            health_timeout: Duration::from_secs(5),
        }
    }
}

/// The shared wall-clock bounds of a run. Virtual users check `end` only as a
/// loop-continuation condition; a request already in flight is allowed to finish.
#[derive(Debug, Clone, Copy)]
pub struct RunWindow {
    pub start: tokio::time::Instant,
    pub end: tokio::time::Instant,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use rand::SeedableRng as _;
    use rand::rngs::StdRng;

    #[test]
    fn think_time_stays_within_bounds() {
        let think = ThinkTime {
            min: Duration::from_millis(100),
            max: Duration::from_millis(300),
        };
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..1000 {
            let d = think.sample(&mut rng);
            assert!(d >= think.min && d <= think.max, "out of range: {d:?}");
        }
    }

    #[test]
    fn degenerate_think_time_returns_min() {
        let think = ThinkTime {
            min: Duration::from_millis(250),
            max: Duration::from_millis(250),
        };
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(think.sample(&mut rng), Duration::from_millis(250));
    }
}
