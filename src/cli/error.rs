//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::CANTCREAT,
                InfraError::Serialize { .. } => crate::exitcode::SOFTWARE,
                InfraError::Application(app) => match app {
                    ApplicationError::Domain(_) => crate::exitcode::DATAERR,
                    ApplicationError::RoundNotFound { .. } => crate::exitcode::USAGE,
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::OperationFailed { .. } => crate::exitcode::IOERR,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;

    #[test]
    fn test_exit_codes() {
        let corrupt: CliError = ApplicationError::from(DomainError::StepOutsideRound).into();
        assert_eq!(corrupt.exit_code(), crate::exitcode::DATAERR);

        let missing: CliError = ApplicationError::RoundNotFound {
            number: 4,
            available: 3,
        }
        .into();
        assert_eq!(missing.exit_code(), crate::exitcode::USAGE);

        let unreadable: CliError = ApplicationError::OperationFailed {
            context: "read log: run.log".into(),
            source: Box::new(std::io::Error::from(std::io::ErrorKind::NotFound)),
        }
        .into();
        assert_eq!(unreadable.exit_code(), crate::exitcode::IOERR);
        assert_eq!(unreadable.to_string(), "operation failed: read log: run.log");
    }
}
