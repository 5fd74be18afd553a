//! Thin client over the `udocker` command line.
//!
//! Every method launches exactly one `udocker` process (plus, after a failed identity
//! check, one listing command whose output goes to the reporter). Nothing is cached:
//! image and container names are re-inspected on every call.

use crate::error::{Result, RunnerError};
use crate::launcher::{self, Invocation};
use crate::reporter::Reporter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub const UDOCKER_BIN: &str = "udocker";

#[derive(Debug)]
pub struct Udocker {
    bin: PathBuf,
    reporter: Arc<dyn Reporter>,
}

impl Udocker {
    pub fn new(bin: impl Into<PathBuf>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            bin: bin.into(),
            reporter,
        }
    }

    /// Resolve the `udocker` executable from an explicit path or from `PATH`.
    pub fn locate(explicit: Option<&Path>, reporter: Arc<dyn Reporter>) -> Result<Self> {
        let bin = launcher::resolve_executable(explicit, UDOCKER_BIN)?;
        Ok(Self::new(bin, reporter))
    }

    pub fn bin(&self) -> &Path {
        &self.bin
    }

    pub fn reporter(&self) -> &dyn Reporter {
        self.reporter.as_ref()
    }

    pub(crate) fn invocation(&self) -> Invocation {
        Invocation::new(&self.bin)
    }

    /// `udocker -D install`
    #[instrument(skip(self))]
    pub fn install(&self) -> Result<()> {
        self.run_step(self.invocation().args(["-D", "install"]))
    }

    /// `udocker load -i <image_file> <image_name>`
    #[instrument(skip(self))]
    pub fn load(&self, image_file: &Path, image_name: &str) -> Result<()> {
        self.load_archive(image_file, image_name, false)
    }

    fn load_archive(&self, image_file: &Path, image_name: &str, allow_root: bool) -> Result<()> {
        if !image_file.is_file() {
            return Err(RunnerError::invalid_path(format!(
                "image archive '{}' is not a file",
                image_file.display()
            )));
        }
        require_name(image_name)?;
        let mut invocation = self.invocation();
        if allow_root {
            invocation = invocation.arg("--allow-root");
        }
        self.run_step(
            invocation
                .args(["load", "-i"])
                .arg(image_file)
                .arg(image_name),
        )
    }

    /// `udocker verify <image_name>`
    #[instrument(skip(self))]
    pub fn verify(&self, image_name: &str) -> Result<()> {
        require_name(image_name)?;
        self.run_step(self.invocation().arg("verify").arg(image_name))
    }

    /// Confirm that udocker knows `name` (image or container) via `udocker inspect`.
    ///
    /// A non-zero exit becomes [`RunnerError::InvalidName`] carrying udocker's stderr
    /// verbatim.
    #[instrument(skip(self))]
    pub fn validate_identity(&self, name: &str) -> Result<()> {
        require_name(name)?;
        let output = launcher::capture(&self.invocation().arg("inspect").arg(name))?;
        if output.status.success() {
            debug!(name, "udocker inspect succeeded");
            return Ok(());
        }
        Err(RunnerError::InvalidName {
            name: name.to_string(),
            diagnostic: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Output of `udocker images`.
    pub fn images(&self) -> Result<String> {
        self.listing("images")
    }

    /// Output of `udocker ps`.
    pub fn ps(&self) -> Result<String> {
        self.listing("ps")
    }

    /// `udocker create --name=<container_name> <image_name>`
    #[instrument(skip(self))]
    pub fn create(&self, image_name: &str, container_name: &str) -> Result<()> {
        require_name(container_name)?;
        self.run_step(
            self.invocation()
                .arg("create")
                .arg(format!("--name={}", container_name))
                .arg(image_name),
        )
    }

    /// One-time setup: install udocker, load the image archive as root and verify it.
    pub fn setup(&self, image_file: &Path, image_name: &str) -> Result<()> {
        self.install()?;
        self.load_archive(image_file, image_name, true)?;
        self.verify(image_name)?;
        info!(image_name, "udocker installed, image loaded and verified");
        Ok(())
    }

    /// Load an image archive produced by `docker save` and verify it.
    pub fn create_image(&self, image_file: &Path, image_name: &str) -> Result<()> {
        self.load(image_file, image_name)?;
        self.verify(image_name)?;
        info!(image_name, "image loaded and verified");
        Ok(())
    }

    /// Create a container from an existing image and return the container name used.
    ///
    /// The container name defaults to the lowercased image name.
    pub fn create_container(
        &self,
        image_name: &str,
        container_name: Option<&str>,
    ) -> Result<String> {
        let container_name = container_name
            .map(str::to_string)
            .unwrap_or_else(|| image_name.to_lowercase());

        if let Err(err) = self.validate_identity(image_name) {
            self.report_listing("udocker images", Udocker::images);
            return Err(err);
        }

        self.create(image_name, &container_name)?;
        info!(image_name, container_name = %container_name, "container created");
        Ok(container_name)
    }

    /// Validate a container name, reporting `udocker ps` when it is unknown.
    pub(crate) fn require_container(&self, container_name: &str) -> Result<()> {
        if let Err(err) = self.validate_identity(container_name) {
            self.report_listing("udocker ps", Udocker::ps);
            return Err(err);
        }
        Ok(())
    }

    pub(crate) fn run_step(&self, invocation: Invocation) -> Result<()> {
        self.reporter.invocation(&invocation);
        let status = launcher::launch(&invocation)?;
        if status.success() {
            Ok(())
        } else {
            Err(RunnerError::CommandFailed {
                program: invocation.to_string(),
                code: status.code(),
            })
        }
    }

    fn listing(&self, subcommand: &str) -> Result<String> {
        let output = launcher::capture(&self.invocation().arg(subcommand))?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    // Listings only enrich an error that is already being returned.
    fn report_listing(&self, title: &str, list: fn(&Self) -> Result<String>) {
        match list(self) {
            Ok(text) => self.reporter.diagnostic(title, &text),
            Err(err) => debug!(error = %err, "{} unavailable", title),
        }
    }
}

fn require_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(RunnerError::InvalidName {
            name: name.to_string(),
            diagnostic: "name must not be empty".to_string(),
        });
    }
    Ok(())
}
