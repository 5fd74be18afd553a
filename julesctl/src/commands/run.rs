use anyhow::Result;
use clap::Args;
use jules_runner::{BinaryRunner, JulesConfig, ModelRunner};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Directory containing the namelists
    #[arg(long, value_name = "DIR")]
    pub namelists_dir: PathBuf,

    /// Directory to run in; must contain the namelists directory (default: the namelists directory)
    #[arg(long, value_name = "DIR")]
    pub run_dir: Option<PathBuf>,

    /// Model executable (default: jules.exe found on PATH)
    #[arg(long, value_name = "FILE")]
    pub jules_exe: Option<PathBuf>,
}

pub fn run(args: RunArgs, config: &JulesConfig) -> Result<i32> {
    let exe = args.jules_exe.as_deref().or(config.jules_exe.as_deref());
    let runner = BinaryRunner::new(exe, super::reporter())?;
    tracing::debug!("{}", runner);

    let status = runner.run(&args.namelists_dir, args.run_dir.as_deref())?;
    Ok(super::exit_code("jules", status))
}
