//! Directory resolution and containment checks for run and namelists directories.

use crate::error::{Result, RunnerError};
use serde::Serialize;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Canonicalize `path` and require it to be an existing directory.
pub fn resolve_dir(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let resolved = fs::canonicalize(path).map_err(|err| {
        RunnerError::invalid_path(format!("Failed to resolve '{}': {}", path.display(), err))
    })?;

    if !resolved.is_dir() {
        return Err(RunnerError::invalid_path(format!(
            "'{}' is not a directory",
            resolved.display()
        )));
    }

    Ok(resolved)
}

/// Check that `inner` is `outer` or lives below it and return `inner` relative to `outer`.
///
/// Both paths are expected to be absolute and already resolved; the comparison is
/// component-wise, so `/data/exp10` is not inside `/data/exp1`. Equal paths yield an
/// empty relative path.
pub fn validate_containment(inner: &Path, outer: &Path) -> Result<PathBuf> {
    if !inner.is_absolute() || !outer.is_absolute() {
        return Err(RunnerError::invalid_path(format!(
            "'{}' and '{}' must both be absolute paths",
            inner.display(),
            outer.display()
        )));
    }

    let relative = inner.strip_prefix(outer).map_err(|_| {
        RunnerError::invalid_path(format!(
            "'{}' must either be a subdirectory of '{}' or the same directory",
            inner.display(),
            outer.display()
        ))
    })?;

    let mut sanitized = PathBuf::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => sanitized.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(RunnerError::invalid_path(format!(
                    "'{}' escapes '{}'",
                    inner.display(),
                    outer.display()
                )))
            }
        }
    }

    Ok(sanitized)
}

/// Mount points are addressed from inside the container and must be absolute.
pub fn validate_mount_point(mount_point: &Path) -> Result<()> {
    if mount_point.is_absolute() {
        Ok(())
    } else {
        Err(RunnerError::invalid_path(format!(
            "mount point '{}' must be an absolute path",
            mount_point.display()
        )))
    }
}

/// A resolved run directory together with the namelists directory it contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunPaths {
    pub run_dir: PathBuf,
    pub namelists_dir: PathBuf,
    pub relative_namelists: PathBuf,
}

impl RunPaths {
    /// Resolve both directories and validate containment. `run_dir` defaults to
    /// `namelists_dir` when omitted.
    pub fn resolve(namelists_dir: &Path, run_dir: Option<&Path>) -> Result<Self> {
        let namelists_dir = resolve_dir(namelists_dir)?;
        let run_dir = match run_dir {
            Some(dir) => resolve_dir(dir)?,
            None => namelists_dir.clone(),
        };
        Self::from_resolved(namelists_dir, run_dir)
    }

    /// Build from paths that are already absolute and canonical.
    pub fn from_resolved(namelists_dir: PathBuf, run_dir: PathBuf) -> Result<Self> {
        let relative_namelists = validate_containment(&namelists_dir, &run_dir)?;
        debug!(
            run_dir = %run_dir.display(),
            namelists = %relative_namelists.display(),
            "validated namelists containment"
        );
        Ok(Self {
            run_dir,
            namelists_dir,
            relative_namelists,
        })
    }

    /// Namelists path relative to the run directory, `.` when they coincide.
    pub fn namelists_arg(&self) -> &Path {
        if self.relative_namelists.as_os_str().is_empty() {
            Path::new(".")
        } else {
            &self.relative_namelists
        }
    }

    /// Namelists path as seen from inside a container that mounts the run directory
    /// at `mount_point`.
    pub fn namelists_under(&self, mount_point: &Path) -> PathBuf {
        if self.relative_namelists.as_os_str().is_empty() {
            mount_point.to_path_buf()
        } else {
            mount_point.join(&self.relative_namelists)
        }
    }
}
