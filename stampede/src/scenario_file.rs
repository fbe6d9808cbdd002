use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::str::FromStr as _;
use std::time::Duration;

use anyhow::Context as _;
use serde::Deserialize;
use stampede_core::{AuthRole, HttpMethod, RoleLogin, Scenario};

/// A scenario suite resolved from YAML (or built in): the request templates
/// plus per-role login specs and path-parameter values.
#[derive(Debug)]
pub(crate) struct LoadedSuite {
    pub base_url: Option<String>,
    pub scenarios: Vec<Scenario>,
    pub auth: Vec<RoleLogin>,
    pub params: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuiteYaml {
    #[serde(default)]
    base_url: Option<String>,

    scenarios: Vec<ScenarioYaml>,

    #[serde(default)]
    auth: Vec<AuthYaml>,

    /// Values substituted for `:name` path parameters.
    #[serde(default)]
    params: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioYaml {
    name: String,
    method: String,
    path: String,

    #[serde(default)]
    auth: Option<String>,

    #[serde(default)]
    body: Option<serde_json::Value>,

    #[serde(default)]
    query: BTreeMap<String, String>,

    #[serde(default)]
    timeout: Option<YamlDuration>,

    /// Expected status for negative tests (e.g. 401 on a protected route).
    #[serde(default)]
    expect_status: Option<u16>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthYaml {
    role: String,
    path: String,
    body: serde_json::Value,

    #[serde(default)]
    token_field: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct YamlDuration(Duration);

impl<'de> Deserialize<'de> for YamlDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;

        impl serde::de::Visitor<'_> for V {
            type Value = YamlDuration;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("duration as string (e.g. 10s), integer seconds, or float seconds")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(YamlDuration(Duration::from_secs(v)))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if v <= 0 {
                    return Err(E::custom("duration must be positive"));
                }
                Ok(YamlDuration(Duration::from_secs(v as u64)))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if !v.is_finite() || v <= 0.0 {
                    return Err(E::custom("duration must be a positive, finite number"));
                }
                Ok(YamlDuration(Duration::from_secs_f64(v)))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let d = humantime::parse_duration(v).map_err(E::custom)?;
                Ok(YamlDuration(d))
            }

            fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                self.visit_str(&v)
            }
        }

        deserializer.deserialize_any(V)
    }
}

pub(crate) async fn load(path: &Path) -> anyhow::Result<LoadedSuite> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read scenario file: {}", path.display()))?;

    let doc: SuiteYaml = serde_yaml::from_slice(&bytes)
        .with_context(|| format!("failed to parse YAML: {}", path.display()))?;

    suite_from_yaml(doc)
}

fn suite_from_yaml(doc: SuiteYaml) -> anyhow::Result<LoadedSuite> {
    let mut scenarios = Vec::with_capacity(doc.scenarios.len());
    for s in doc.scenarios {
        let method = HttpMethod::from_str(&s.method).map_err(|_| {
            anyhow::anyhow!(
                "scenario `{}`: invalid http method `{}` (expected GET, POST, PUT, DELETE, or PATCH)",
                s.name,
                s.method
            )
        })?;

        let auth = match &s.auth {
            Some(role) => AuthRole::from_str(role).map_err(|_| {
                anyhow::anyhow!(
                    "scenario `{}`: invalid auth role `{role}` (expected none, user, admin, or partner)",
                    s.name
                )
            })?,
            None => AuthRole::None,
        };

        let mut scenario = Scenario::new(&s.name, method, &s.path).auth(auth);
        if let Some(body) = s.body {
            scenario = scenario.body(body);
        }
        for (k, v) in s.query {
            scenario = scenario.query(&k, &v);
        }
        if let Some(YamlDuration(timeout)) = s.timeout {
            scenario = scenario.timeout(timeout);
        }
        if let Some(status) = s.expect_status {
            scenario = scenario.expect_status(status);
        }
        scenarios.push(scenario);
    }

    let mut auth = Vec::with_capacity(doc.auth.len());
    for a in doc.auth {
        let role = AuthRole::from_str(&a.role).map_err(|_| {
            anyhow::anyhow!(
                "auth: invalid role `{}` (expected user, admin, or partner)",
                a.role
            )
        })?;
        if !role.requires_token() {
            anyhow::bail!("auth: role `none` cannot have a login spec");
        }

        let mut spec = RoleLogin::new(role, &a.path, a.body);
        if let Some(field) = a.token_field {
            spec = spec.token_field(&field);
        }
        auth.push(spec);
    }

    Ok(LoadedSuite {
        base_url: doc.base_url,
        scenarios,
        auth,
        params: doc.params.into_iter().collect(),
    })
}
