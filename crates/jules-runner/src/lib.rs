//! Helpers for running the JULES land-surface model, either as a native binary or
//! inside a udocker container.
//!
//! All entry points validate their paths and names before anything is launched, and
//! each launch starts exactly one external process and waits for it.

pub mod config;
pub mod error;
pub mod launcher;
pub mod paths;
pub mod reporter;
pub mod runner;
pub mod udocker;

pub use config::JulesConfig;
pub use error::{ErrorKind, Result, RunnerError};
pub use launcher::{launch, resolve_executable, Invocation};
pub use paths::{resolve_dir, validate_containment, validate_mount_point, RunPaths};
pub use reporter::{Reporter, TracingReporter};
pub use runner::{BinaryRunner, ModelRunner, UdockerRunner, DEFAULT_MOUNT_POINT, JULES_EXE};
pub use udocker::Udocker;
