//! Runners turn a namelists directory and a run directory into one model launch.

use crate::error::Result;
use crate::launcher::{self, Invocation};
use crate::paths::{validate_mount_point, RunPaths};
use crate::reporter::Reporter;
use crate::udocker::Udocker;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Arc;
use tracing::instrument;

/// Name the model executable is looked up under when no explicit path is given.
pub const JULES_EXE: &str = "jules.exe";

/// Default location of the run directory inside the container.
pub const DEFAULT_MOUNT_POINT: &str = "/root/run";

pub trait ModelRunner {
    /// Build the argument vector for already validated paths.
    fn invocation(&self, paths: &RunPaths) -> Invocation;

    fn reporter(&self) -> &dyn Reporter;

    /// Resolve both directories, check containment and build the invocation.
    ///
    /// `run_dir` defaults to `namelists_dir`. Nothing is launched.
    fn prepare(&self, namelists_dir: &Path, run_dir: Option<&Path>) -> Result<Invocation> {
        let paths = RunPaths::resolve(namelists_dir, run_dir)?;
        Ok(self.invocation(&paths))
    }

    /// Launch the model and wait for it. A non-zero exit is returned, not raised.
    fn run(&self, namelists_dir: &Path, run_dir: Option<&Path>) -> Result<ExitStatus> {
        let invocation = self.prepare(namelists_dir, run_dir)?;
        self.reporter().invocation(&invocation);
        launcher::launch(&invocation)
    }
}

/// Runs the model binary directly with the run directory as working directory.
#[derive(Debug)]
pub struct BinaryRunner {
    exe: PathBuf,
    reporter: Arc<dyn Reporter>,
}

impl BinaryRunner {
    /// Use `exe` when given, otherwise look up `jules.exe` on `PATH`.
    pub fn new(exe: Option<&Path>, reporter: Arc<dyn Reporter>) -> Result<Self> {
        let exe = launcher::resolve_executable(exe, JULES_EXE)?;
        Ok(Self { exe, reporter })
    }

    pub fn exe(&self) -> &Path {
        &self.exe
    }
}

impl ModelRunner for BinaryRunner {
    fn invocation(&self, paths: &RunPaths) -> Invocation {
        Invocation::new(&self.exe)
            .arg("-d")
            .arg(&paths.run_dir)
            .arg(paths.namelists_arg())
            .current_dir(&paths.run_dir)
    }

    fn reporter(&self) -> &dyn Reporter {
        self.reporter.as_ref()
    }
}

impl fmt::Display for BinaryRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BinaryRunner(exe={})", self.exe.display())
    }
}

/// Runs an existing udocker container with the run directory bound at a mount point.
#[derive(Debug)]
pub struct UdockerRunner {
    udocker: Udocker,
    container_name: String,
    mount_point: PathBuf,
}

impl UdockerRunner {
    /// Checks the mount point, then asks udocker whether `container_name` exists.
    ///
    /// An unknown container makes udocker list its containers to the reporter before
    /// the error is returned.
    #[instrument(skip(udocker, mount_point))]
    pub fn new(
        udocker: Udocker,
        container_name: &str,
        mount_point: impl AsRef<Path>,
    ) -> Result<Self> {
        let mount_point = mount_point.as_ref();
        validate_mount_point(mount_point)?;
        udocker.require_container(container_name)?;

        Ok(Self {
            udocker,
            container_name: container_name.to_string(),
            mount_point: mount_point.to_path_buf(),
        })
    }

    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }
}

impl ModelRunner for UdockerRunner {
    fn invocation(&self, paths: &RunPaths) -> Invocation {
        let mut volume = paths.run_dir.clone().into_os_string();
        volume.push(":");
        volume.push(&self.mount_point);

        self.udocker
            .invocation()
            .arg("run")
            .arg("-v")
            .arg(volume)
            .arg(&self.container_name)
            .arg("-d")
            .arg(&self.mount_point)
            .arg(paths.namelists_under(&self.mount_point))
    }

    fn reporter(&self) -> &dyn Reporter {
        self.udocker.reporter()
    }
}

impl fmt::Display for UdockerRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UdockerRunner(container_name={}, mount_point={})",
            self.container_name,
            self.mount_point.display()
        )
    }
}
