pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("`concurrent_users` must be a positive integer")]
    InvalidUsers,

    #[error("`duration` must be a positive duration")]
    InvalidDuration,

    #[error("`think_min` must not exceed `think_max`")]
    InvalidThinkTime,

    #[error("scenario registry is empty")]
    EmptyRegistry,

    #[error("duplicate scenario name: `{0}`")]
    DuplicateScenario(String),

    #[error("invalid http method `{0}` (expected GET, POST, PUT, DELETE, or PATCH)")]
    InvalidMethod(String),

    #[error("no scenario named `{0}`")]
    ScenarioNotFound(String),

    #[error("target unreachable: {url}: {reason}")]
    TargetUnreachable { url: String, reason: String },

    #[error("login for role `{role}` failed: {reason}")]
    LoginFailed { role: String, reason: String },

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors caused by invalid run parameters rather than the
    /// target service or the harness itself.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidUsers
                | Self::InvalidDuration
                | Self::InvalidThinkTime
                | Self::EmptyRegistry
                | Self::DuplicateScenario(_)
                | Self::InvalidMethod(_)
                | Self::ScenarioNotFound(_)
        )
    }
}
