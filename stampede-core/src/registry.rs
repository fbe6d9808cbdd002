use std::collections::HashMap;
use std::time::Duration;

use rand::Rng;

use super::error::{Error, Result};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    #[must_use]
    pub fn as_http(self) -> http::Method {
        match self {
            Self::Get => http::Method::GET,
            Self::Post => http::Method::POST,
            Self::Put => http::Method::PUT,
            Self::Delete => http::Method::DELETE,
            Self::Patch => http::Method::PATCH,
        }
    }

    /// Methods that carry the scenario body template.
    #[must_use]
    pub fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AuthRole {
    #[default]
    None,
    User,
    Admin,
    Partner,
}

impl AuthRole {
    #[must_use]
    pub fn requires_token(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// A named, reusable request template. Loaded once at startup and immutable
/// for the whole run.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub method: HttpMethod,
    /// Request path; `:name` segments are substituted from the run context.
    pub path: String,
    pub auth: AuthRole,
    pub body: Option<serde_json::Value>,
    pub query: Vec<(String, String)>,
    pub timeout: Duration,
    /// Expected status for negative tests; a matching response counts as a
    /// success even outside 2xx/3xx (e.g. 401 on a protected route).
    pub expect_status: Option<u16>,
}

impl Scenario {
    pub fn new(name: &str, method: HttpMethod, path: &str) -> Self {
        Self {
            name: name.to_string(),
            method,
            path: path.to_string(),
            auth: AuthRole::None,
            body: None,
            query: Vec::new(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            expect_status: None,
        }
    }

    #[must_use]
    pub fn auth(mut self, role: AuthRole) -> Self {
        self.auth = role;
        self
    }

    #[must_use]
    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn expect_status(mut self, status: u16) -> Self {
        self.expect_status = Some(status);
        self
    }
}

/// Immutable set of scenarios shared read-only across virtual users.
#[derive(Debug)]
pub struct ScenarioRegistry {
    scenarios: Vec<Scenario>,
    by_name: HashMap<String, usize>,
}

impl ScenarioRegistry {
    pub fn load(scenarios: Vec<Scenario>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(scenarios.len());
        for (idx, scenario) in scenarios.iter().enumerate() {
            if by_name.insert(scenario.name.clone(), idx).is_some() {
                return Err(Error::DuplicateScenario(scenario.name.clone()));
            }
        }
        Ok(Self { scenarios, by_name })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter()
    }

    pub fn get(&self, name: &str) -> Result<&Scenario> {
        self.by_name
            .get(name)
            .map(|&idx| &self.scenarios[idx])
            .ok_or_else(|| Error::ScenarioNotFound(name.to_string()))
    }

    /// Uniformly random scenario. The caller owns the RNG so seeded runs stay
    /// deterministic per virtual user.
    pub fn pick_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&Scenario> {
        if self.scenarios.is_empty() {
            return Err(Error::EmptyRegistry);
        }
        let idx = rng.gen_range(0..self.scenarios.len());
        Ok(&self.scenarios[idx])
    }

    /// Distinct roles that at least one scenario needs a token for.
    #[must_use]
    pub fn roles_in_use(&self) -> Vec<AuthRole> {
        let mut roles = Vec::new();
        for scenario in &self.scenarios {
            if scenario.auth.requires_token() && !roles.contains(&scenario.auth) {
                roles.push(scenario.auth);
            }
        }
        roles
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use rand::SeedableRng as _;
    use rand::rngs::StdRng;
    use std::str::FromStr as _;

    fn registry(names: &[&str]) -> ScenarioRegistry {
        let scenarios = names
            .iter()
            .map(|n| Scenario::new(n, HttpMethod::Get, "/"))
            .collect();
        ScenarioRegistry::load(scenarios).unwrap()
    }

    #[test]
    fn load_rejects_duplicate_names() {
        let err = ScenarioRegistry::load(vec![
            Scenario::new("a", HttpMethod::Get, "/"),
            Scenario::new("a", HttpMethod::Post, "/x"),
        ])
        .unwrap_err();

        assert!(matches!(err, Error::DuplicateScenario(name) if name == "a"));
    }

    #[test]
    fn get_resolves_by_name() {
        let reg = registry(&["a", "b"]);
        assert_eq!(reg.get("b").unwrap().name, "b");
        assert!(matches!(
            reg.get("missing").unwrap_err(),
            Error::ScenarioNotFound(_)
        ));
    }

    #[test]
    fn pick_random_on_empty_registry_fails() {
        let reg = ScenarioRegistry::load(Vec::new()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            reg.pick_random(&mut rng).unwrap_err(),
            Error::EmptyRegistry
        ));
    }

    #[test]
    fn pick_random_covers_all_scenarios() {
        let reg = registry(&["a", "b", "c"]);
        let mut rng = StdRng::seed_from_u64(42);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(reg.pick_random(&mut rng).unwrap().name.clone());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn seeded_picks_are_deterministic() {
        let reg = registry(&["a", "b", "c", "d"]);

        let picks = |seed: u64| -> Vec<String> {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..32)
                .map(|_| reg.pick_random(&mut rng).unwrap().name.clone())
                .collect()
        };

        assert_eq!(picks(9), picks(9));
        assert_ne!(picks(9), picks(10));
    }

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!(HttpMethod::from_str("get").unwrap(), HttpMethod::Get);
        assert_eq!(HttpMethod::from_str("DELETE").unwrap(), HttpMethod::Delete);
        assert!(HttpMethod::from_str("TRACE").is_err());
    }

    #[test]
    fn roles_in_use_skips_none_and_dedupes() {
        let reg = ScenarioRegistry::load(vec![
            Scenario::new("open", HttpMethod::Get, "/"),
            Scenario::new("u1", HttpMethod::Get, "/a").auth(AuthRole::User),
            Scenario::new("u2", HttpMethod::Get, "/b").auth(AuthRole::User),
            Scenario::new("adm", HttpMethod::Get, "/c").auth(AuthRole::Admin),
        ])
        .unwrap();

        assert_eq!(reg.roles_in_use(), vec![AuthRole::User, AuthRole::Admin]);
    }
}
