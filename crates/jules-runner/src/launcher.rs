//! Executable resolution and single-process launches.

use crate::error::{Result, RunnerError};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output, Stdio};
use tracing::{debug, instrument};

/// A fully built argument vector, ready to hand to the operating system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// Arguments as strings, for assertions and log output.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&quote(&self.program.to_string_lossy()))?;
        for arg in &self.args {
            write!(f, " {}", quote(&arg.to_string_lossy()))?;
        }
        Ok(())
    }
}

fn quote(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }
    if arg.chars().all(is_shell_safe) {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}

fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c)
}

/// Locate an executable, either from an explicit path or by `name` on `PATH`.
pub fn resolve_executable(explicit: Option<&Path>, name: &str) -> Result<PathBuf> {
    let search_path = std::env::var_os("PATH").unwrap_or_default();
    resolve_executable_in(explicit, name, search_path)
}

pub(crate) fn resolve_executable_in(
    explicit: Option<&Path>,
    name: &str,
    search_path: impl AsRef<OsStr>,
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return check_explicit(path);
    }
    let cwd = std::env::current_dir()
        .map_err(|err| RunnerError::io("Failed to read current directory", err))?;
    which::which_in(name, Some(search_path), cwd).map_err(|err| RunnerError::ExecutableNotFound {
        message: format!("{} was not found in PATH ({})", name, err),
    })
}

fn check_explicit(path: &Path) -> Result<PathBuf> {
    let resolved = fs::canonicalize(path).map_err(|err| RunnerError::ExecutableNotFound {
        message: format!("Provided path '{}' cannot be resolved: {}", path.display(), err),
    })?;

    let metadata = fs::metadata(&resolved)
        .map_err(|err| RunnerError::io(format!("Failed to stat '{}'", resolved.display()), err))?;
    if !metadata.is_file() {
        return Err(RunnerError::ExecutableNotFound {
            message: format!("Provided path '{}' is not a file", resolved.display()),
        });
    }

    if !is_executable(&metadata) {
        return Err(RunnerError::PermissionDenied { path: resolved });
    }

    Ok(resolved)
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    true
}

/// Start one process with inherited stdio and wait for it to exit.
#[instrument(skip_all, fields(program = %invocation.program().display()))]
pub fn launch(invocation: &Invocation) -> Result<ExitStatus> {
    let status = invocation
        .command()
        .stdin(Stdio::inherit())
        .status()
        .map_err(|err| spawn_error(invocation, err))?;
    debug!(code = ?status.code(), "process exited");
    Ok(status)
}

/// Start one process, capture its stdout and stderr, and wait for it to exit.
#[instrument(skip_all, fields(program = %invocation.program().display()))]
pub fn capture(invocation: &Invocation) -> Result<Output> {
    let output = invocation
        .command()
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|err| spawn_error(invocation, err))?;
    debug!(code = ?output.status.code(), "process exited");
    Ok(output)
}

fn spawn_error(invocation: &Invocation, err: io::Error) -> RunnerError {
    match err.kind() {
        io::ErrorKind::NotFound => RunnerError::ExecutableNotFound {
            message: format!("'{}' could not be started: {}", invocation.program().display(), err),
        },
        io::ErrorKind::PermissionDenied => RunnerError::PermissionDenied {
            path: invocation.program().to_path_buf(),
        },
        _ => RunnerError::io(format!("Failed to start '{}'", invocation), err),
    }
}
