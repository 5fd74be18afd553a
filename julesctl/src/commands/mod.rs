pub mod check;
pub mod run;
pub mod udocker;

use anyhow::{Context, Result};
use jules_runner::{JulesConfig, Reporter, TracingReporter};
use std::path::Path;
use std::process::ExitStatus;
use std::sync::Arc;
use tracing::warn;

pub(crate) fn load_config(path: Option<&Path>) -> Result<JulesConfig> {
    match path {
        Some(path) => JulesConfig::load(path)
            .with_context(|| format!("Failed to load config '{}'", path.display())),
        None => Ok(JulesConfig::from_env()),
    }
}

pub(crate) fn reporter() -> Arc<dyn Reporter> {
    Arc::new(TracingReporter)
}

/// Map the model's exit status onto ours; a signal-terminated model counts as 1.
pub(crate) fn exit_code(program: &str, status: ExitStatus) -> i32 {
    if status.success() {
        return 0;
    }
    let code = status.code().unwrap_or(1);
    warn!("{} exited with code {}", program, code);
    code
}
