use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = RunnerError> = std::result::Result<T, E>;

/// Coarse classification shared by every failure the runners can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidPath,
    InvalidName,
    ExecutableNotFound,
    PermissionDenied,
    CommandFailed,
    Config,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::InvalidPath => "invalid_path",
            ErrorKind::InvalidName => "invalid_name",
            ErrorKind::ExecutableNotFound => "executable_not_found",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::CommandFailed => "command_failed",
            ErrorKind::Config => "config",
            ErrorKind::Io => "io",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Invalid path: {message}")]
    InvalidPath { message: String },

    #[error("Invalid name '{name}': {diagnostic}")]
    InvalidName { name: String, diagnostic: String },

    #[error("Executable not found: {message}")]
    ExecutableNotFound { message: String },

    #[error("Permission denied: '{}' is not executable", .path.display())]
    PermissionDenied { path: PathBuf },

    #[error("Command '{program}' failed with {}", describe_code(.code))]
    CommandFailed { program: String, code: Option<i32> },

    #[error("Config error: {message}")]
    Config { message: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl RunnerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RunnerError::InvalidPath { .. } => ErrorKind::InvalidPath,
            RunnerError::InvalidName { .. } => ErrorKind::InvalidName,
            RunnerError::ExecutableNotFound { .. } => ErrorKind::ExecutableNotFound,
            RunnerError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            RunnerError::CommandFailed { .. } => ErrorKind::CommandFailed,
            RunnerError::Config { .. } => ErrorKind::Config,
            RunnerError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Text reported by the container runtime when an identity check fails.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            RunnerError::InvalidName { diagnostic, .. } => Some(diagnostic.as_str()),
            _ => None,
        }
    }

    pub(crate) fn invalid_path(message: impl Into<String>) -> Self {
        RunnerError::InvalidPath {
            message: message.into(),
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        RunnerError::Io {
            context: context.into(),
            source,
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}
