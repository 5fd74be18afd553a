use crate::error::{Result, RunnerError};
use crate::runner::DEFAULT_MOUNT_POINT;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_IMAGE_NAME: &str = "JULES";

/// Settings shared by the runners and the udocker helpers.
///
/// Fields missing from a config file fall back to the environment and then to the
/// built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JulesConfig {
    /// Explicit udocker executable; looked up on `PATH` when unset.
    pub udocker_bin: Option<PathBuf>,
    /// Explicit model executable; `jules.exe` is looked up on `PATH` when unset.
    pub jules_exe: Option<PathBuf>,
    pub image_name: String,
    /// Defaults to the lowercased image name.
    pub container_name: Option<String>,
    pub mount_point: PathBuf,
}

impl Default for JulesConfig {
    fn default() -> Self {
        let udocker_bin = non_empty_env("JULES_UDOCKER_BIN").map(PathBuf::from);
        let jules_exe = non_empty_env("JULES_EXE").map(PathBuf::from);
        let image_name =
            non_empty_env("JULES_IMAGE").unwrap_or_else(|| DEFAULT_IMAGE_NAME.to_string());
        let container_name = non_empty_env("JULES_CONTAINER");
        let mount_point = non_empty_env("JULES_MOUNT_POINT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MOUNT_POINT));
        Self {
            udocker_bin,
            jules_exe,
            image_name,
            container_name,
            mount_point,
        }
    }
}

impl JulesConfig {
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Read a YAML config file.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading config from {}", path.display());
        let content = fs::read_to_string(path).map_err(|err| RunnerError::Config {
            message: format!("Failed to read '{}': {}", path.display(), err),
        })?;
        Self::from_yaml(&content).map_err(|err| match err {
            RunnerError::Config { message } => RunnerError::Config {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|err| RunnerError::Config {
            message: err.to_string(),
        })
    }

    pub fn container_name(&self) -> String {
        self.container_name
            .clone()
            .unwrap_or_else(|| self.image_name.to_lowercase())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
