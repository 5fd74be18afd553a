//! Check command - validate directory containment without launching anything

use anyhow::Result;
use clap::Args;
use jules_runner::RunPaths;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Directory containing the namelists
    #[arg(long, value_name = "DIR")]
    pub namelists_dir: PathBuf,

    /// Directory the model would run in (default: the namelists directory)
    #[arg(long, value_name = "DIR")]
    pub run_dir: Option<PathBuf>,

    /// Output machine-readable JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: CheckArgs) -> Result<i32> {
    let resolved = RunPaths::resolve(&args.namelists_dir, args.run_dir.as_deref());

    match (resolved, args.json) {
        (Ok(paths), true) => {
            println!("{}", serde_json::to_string_pretty(&paths)?);
            Ok(0)
        }
        (Ok(paths), false) => {
            println!("{}", paths.namelists_arg().display());
            Ok(0)
        }
        (Err(err), true) => {
            let body = serde_json::json!({
                "error": err.to_string(),
                "kind": err.kind().to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(1)
        }
        (Err(err), false) => Err(err.into()),
    }
}
