use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the sweep harness
#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Solver invocation error: {0}")]
    Invocation(#[from] InvocationError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures of a single solver run. None of these abort a sweep.
#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("Solver executable not found: {}", path.display())]
    ExecutableMissing { path: PathBuf },

    #[error("Solver exited with {}: {stderr}", describe_exit(*code))]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("Solver did not finish within {timeout_secs} seconds")]
    TimedOut { timeout_secs: u64 },

    #[error("Failed to spawn solver {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error while talking to solver: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl InvocationError {
    /// Short machine-friendly label, used in logs and the JSON summary.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ExecutableMissing { .. } => "executable_missing",
            Self::NonZeroExit { .. } => "non_zero_exit",
            Self::TimedOut { .. } => "timed_out",
            Self::Spawn { .. } => "spawn_failed",
            Self::Io(_) => "io",
        }
    }
}

/// Result type alias for sweep operations
pub type SweepResult<T> = Result<T, SweepError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::SweepError::Validation(format!($($arg)*))
    };
}

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::SweepError::Internal(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::SweepError::Config(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = InvocationError::NonZeroExit {
            code: Some(3),
            stderr: "instance file unreadable".to_string(),
        };

        assert!(error.to_string().contains("exit code 3"));
        assert!(error.to_string().contains("instance file unreadable"));
    }

    #[test]
    fn test_signal_exit_display() {
        let error = InvocationError::NonZeroExit {
            code: None,
            stderr: String::new(),
        };
        assert!(error.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_error_conversion() {
        let invocation_error = InvocationError::ExecutableMissing {
            path: PathBuf::from("./main_refactored"),
        };
        let sweep_error: SweepError = invocation_error.into();

        match sweep_error {
            SweepError::Invocation(InvocationError::ExecutableMissing { path }) => {
                assert_eq!(path, PathBuf::from("./main_refactored"));
            }
            _ => panic!("Expected Invocation error"),
        }
    }

    #[test]
    fn test_kind_labels() {
        let timed_out = InvocationError::TimedOut { timeout_secs: 5 };
        assert_eq!(timed_out.kind(), "timed_out");
        assert!(timed_out.to_string().contains("5 seconds"));
    }

    #[test]
    fn test_macros() {
        let validation_err = validation_error!("Invalid value: {}", 42);
        assert!(matches!(validation_err, SweepError::Validation(_)));
        let _internal_err = internal_error!("Something went wrong");
        let config_err = config_error!("Missing required field: {}", "solver");
        assert_eq!(
            config_err.to_string(),
            "Configuration error: Missing required field: solver"
        );
    }
}
