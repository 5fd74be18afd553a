use crate::launcher::Invocation;
use std::fmt;
use tracing::{info, warn};

/// Receives progress from the runners: every command about to be launched and any
/// diagnostic listing gathered after a failed check.
pub trait Reporter: Send + Sync + fmt::Debug {
    fn invocation(&self, invocation: &Invocation);

    fn diagnostic(&self, title: &str, text: &str);
}

/// Reporter that forwards everything to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn invocation(&self, invocation: &Invocation) {
        match invocation.get_current_dir() {
            Some(dir) => info!(cwd = %dir.display(), "running {}", invocation),
            None => info!("running {}", invocation),
        }
    }

    fn diagnostic(&self, title: &str, text: &str) {
        warn!("{}:\n{}", title, text.trim_end());
    }
}
