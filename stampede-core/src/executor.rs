use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use bytes::Bytes;
use stampede_http::{HttpClient, HttpRequest};

use super::context::RunContext;
use super::registry::Scenario;

/// Outcome classification for a single request. `Timeout` and
/// `TransportError` stand in for responses that never produced a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Http(u16),
    Timeout,
    TransportError,
}

impl RequestStatus {
    #[must_use]
    pub fn code(self) -> Option<u16> {
        match self {
            Self::Http(status) => Some(status),
            Self::Timeout | Self::TransportError => None,
        }
    }
}

/// The immutable record of one executed request.
#[derive(Debug, Clone)]
pub struct RequestResult {
    pub scenario: Arc<str>,
    pub started_at: SystemTime,
    pub latency: Duration,
    pub status: RequestStatus,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: Arc<HttpClient>,
}

impl RequestExecutor {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// Issues exactly one request for `scenario`. Every outcome, including
    /// timeouts and connection errors, is converted into a `RequestResult`;
    /// one failing endpoint can never abort the run.
    pub async fn execute(&self, scenario: &Scenario, ctx: &RunContext) -> RequestResult {
        let name: Arc<str> = Arc::from(scenario.name.as_str());
        let started_at = SystemTime::now();

        let req = match build_request(scenario, ctx) {
            Ok(req) => req,
            Err(reason) => {
                return RequestResult {
                    scenario: name,
                    started_at,
                    latency: Duration::ZERO,
                    status: RequestStatus::TransportError,
                    success: false,
                    error: Some(reason),
                };
            }
        };

        let begin = Instant::now();
        match self.client.request(req).await {
            Ok(res) => {
                let success = classify(res.status, scenario.expect_status);
                RequestResult {
                    scenario: name,
                    started_at,
                    latency: begin.elapsed(),
                    status: RequestStatus::Http(res.status),
                    success,
                    error: (!success).then(|| format!("unexpected status {}", res.status)),
                }
            }
            Err(err) if err.is_timeout() => RequestResult {
                scenario: name,
                started_at,
                // A timed-out request consumed its whole deadline.
                latency: scenario.timeout,
                status: RequestStatus::Timeout,
                success: false,
                error: Some(err.to_string()),
            },
            Err(err) => RequestResult {
                scenario: name,
                started_at,
                latency: begin.elapsed(),
                status: RequestStatus::TransportError,
                success: false,
                error: Some(err.to_string()),
            },
        }
    }
}

/// A response counts as a success inside [200, 400), or when it matches the
/// scenario's explicitly expected status.
fn classify(status: u16, expect: Option<u16>) -> bool {
    if expect == Some(status) {
        return true;
    }
    (200..400).contains(&status)
}

fn build_request(scenario: &Scenario, ctx: &RunContext) -> Result<HttpRequest, String> {
    let path = substitute_params(&scenario.path, ctx)?;
    let raw = format!("{}{}", ctx.base_url, path);
    let mut url = url::Url::parse(&raw).map_err(|err| format!("invalid url `{raw}`: {err}"))?;

    if !scenario.query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in &scenario.query {
            pairs.append_pair(k, v);
        }
    }

    let mut req = HttpRequest::new(scenario.method.as_http(), url.to_string());
    req.timeout = Some(scenario.timeout);

    if scenario.auth.requires_token()
        && let Some(token) = ctx.token(scenario.auth)
    {
        req.headers
            .push(("authorization".to_string(), format!("Bearer {token}")));
    }

    if scenario.method.has_body()
        && let Some(body) = &scenario.body
    {
        req.headers
            .push(("content-type".to_string(), "application/json".to_string()));
        req.body = Bytes::from(
            serde_json::to_vec(body).map_err(|err| format!("failed to serialize body: {err}"))?,
        );
    }

    Ok(req)
}

fn substitute_params(path: &str, ctx: &RunContext) -> Result<String, String> {
    if !path.contains(':') {
        return Ok(path.to_string());
    }

    let mut out = String::with_capacity(path.len());
    for (idx, segment) in path.split('/').enumerate() {
        if idx > 0 {
            out.push('/');
        }
        match segment.strip_prefix(':') {
            Some(name) if !name.is_empty() => match ctx.param(name) {
                Some(value) => out.push_str(value),
                None => return Err(format!("missing path parameter `:{name}`")),
            },
            _ => out.push_str(segment),
        }
    }
    Ok(out)
}
