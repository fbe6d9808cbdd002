use std::collections::HashMap;

use super::registry::AuthRole;

/// Read-only runtime context shared by all virtual users: target root URL,
/// bearer tokens acquired once before the run, and values for `:name` path
/// parameters. Tokens are not refreshed during a run; a token expiring
/// mid-run surfaces as recorded 401 failures.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub base_url: String,
    pub tokens: HashMap<AuthRole, String>,
    pub params: HashMap<String, String>,
}

impl RunContext {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url: String = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Self {
            base_url,
            tokens: HashMap::new(),
            params: HashMap::new(),
        }
    }

    #[must_use]
    pub fn token(&self, role: AuthRole) -> Option<&str> {
        self.tokens.get(&role).map(String::as_str)
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}
