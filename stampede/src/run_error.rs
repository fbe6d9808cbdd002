use crate::exit_codes::ExitCode;

/// Fatal run failures, bucketed by cause. Request-level failures never land
/// here; they are recorded in the report instead.
#[derive(Debug)]
pub enum RunError {
    Config(anyhow::Error),
    TargetUnreachable(anyhow::Error),
    Internal(anyhow::Error),
}

impl RunError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) | Self::TargetUnreachable(_) | Self::Internal(_) => ExitCode::Failure,
        }
    }
}

impl From<stampede_core::Error> for RunError {
    fn from(err: stampede_core::Error) -> Self {
        let unreachable = matches!(err, stampede_core::Error::TargetUnreachable { .. });
        let config = err.is_config_error();

        let err = anyhow::Error::new(err);
        if unreachable {
            Self::TargetUnreachable(err)
        } else if config {
            Self::Config(err)
        } else {
            Self::Internal(err)
        }
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) | Self::TargetUnreachable(e) | Self::Internal(e) => {
                write!(f, "{e:#}")
            }
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) | Self::TargetUnreachable(e) | Self::Internal(e) => {
                Some(e.as_ref())
            }
        }
    }
}
