use std::time::Duration;

use bytes::Bytes;
use stampede_http::{HttpClient, HttpRequest};

use super::error::{Error, Result};
use super::registry::AuthRole;

const LOGIN_TIMEOUT: Duration = Duration::from_secs(10);

/// How to obtain a bearer token for one role. Tokens are fetched once before
/// the run starts; there is no refresh path.
#[derive(Debug, Clone)]
pub struct RoleLogin {
    pub role: AuthRole,
    pub path: String,
    pub body: serde_json::Value,
    /// Dot-separated path of the token field in the login response
    /// (e.g. `token` or `data.token`).
    pub token_field: String,
}

impl RoleLogin {
    pub fn new(role: AuthRole, path: &str, body: serde_json::Value) -> Self {
        Self {
            role,
            path: path.to_string(),
            body,
            token_field: "token".to_string(),
        }
    }

    #[must_use]
    pub fn token_field(mut self, field: &str) -> Self {
        self.token_field = field.to_string();
        self
    }
}

/// Performs one login request and extracts the bearer token from the JSON
/// response.
pub async fn login(client: &HttpClient, base_url: &str, spec: &RoleLogin) -> Result<String> {
    let failed = |reason: String| Error::LoginFailed {
        role: spec.role.to_string(),
        reason,
    };

    let body = serde_json::to_vec(&spec.body)
        .map_err(|err| failed(format!("failed to serialize login body: {err}")))?;

    let url = format!("{}{}", base_url.trim_end_matches('/'), spec.path);
    let req = HttpRequest::post(&url, Bytes::from(body))
        .with_header("content-type", "application/json")
        .with_timeout(LOGIN_TIMEOUT);

    let res = client
        .request(req)
        .await
        .map_err(|err| failed(err.to_string()))?;

    if !(200..300).contains(&res.status) {
        return Err(failed(format!("login returned status {}", res.status)));
    }

    let value: serde_json::Value = serde_json::from_slice(&res.body)
        .map_err(|err| failed(format!("login response is not JSON: {err}")))?;

    extract_field(&value, &spec.token_field)
        .ok_or_else(|| failed(format!("no `{}` field in login response", spec.token_field)))
}

fn extract_field(value: &serde_json::Value, path: &str) -> Option<String> {
    let mut cur = value;
    for key in path.split('.') {
        cur = cur.get(key)?;
    }
    cur.as_str().map(str::to_string)
}
