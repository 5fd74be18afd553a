mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "julesctl", version, about = "Run JULES natively or in a udocker container")]
struct Cli {
    /// YAML config file; unset fields fall back to JULES_* environment variables
    #[arg(long, global = true, env = "JULES_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the model binary directly inside the run directory
    Run(commands::run::RunArgs),
    /// Check that the namelists directory lies inside the run directory
    Check(commands::check::CheckArgs),
    /// Prepare udocker images and containers, or run the containerised model
    Udocker(commands::udocker::UdockerArgs),
    /// Print version and exit
    Version,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match dispatch(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            std::process::exit(1);
        }
    }
}

fn dispatch(cli: Cli) -> Result<i32> {
    let config_path = cli.config.as_deref();

    match cli.cmd {
        Commands::Run(args) => commands::run::run(args, &commands::load_config(config_path)?),
        Commands::Check(args) => commands::check::run(args),
        Commands::Udocker(args) => {
            commands::udocker::handle(args, &commands::load_config(config_path)?)
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
    }
}
