use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use jules_runner::{JulesConfig, ModelRunner, Udocker, UdockerRunner};
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub struct UdockerArgs {
    /// udocker executable (default: udocker found on PATH)
    #[arg(long, value_name = "FILE")]
    pub udocker_bin: Option<PathBuf>,

    #[command(subcommand)]
    pub command: UdockerCommand,
}

#[derive(Subcommand, Debug)]
pub enum UdockerCommand {
    /// One-time setup: install udocker, then load and verify an image archive
    Setup {
        /// Image archive created with `docker save`
        #[arg(long, value_name = "FILE")]
        image_file: PathBuf,
        /// Name to register the image under
        #[arg(long)]
        name: Option<String>,
    },
    /// Load and verify an image archive
    CreateImage {
        /// Image archive created with `docker save`
        #[arg(long, value_name = "FILE")]
        image_file: PathBuf,
        #[arg(long)]
        image_name: Option<String>,
    },
    /// Create a container from an image udocker already knows
    CreateContainer {
        #[arg(long)]
        image_name: Option<String>,
        /// Container name (default: lowercased image name)
        #[arg(long)]
        container_name: Option<String>,
    },
    /// Run an existing container with the run directory mounted
    Run {
        /// Directory containing the namelists
        #[arg(long, value_name = "DIR")]
        namelists_dir: PathBuf,
        /// Directory mounted into the container; must contain the namelists directory
        #[arg(long, value_name = "DIR")]
        run_dir: Option<PathBuf>,
        #[arg(long)]
        container_name: Option<String>,
        /// Absolute path inside the container where the run directory is mounted
        #[arg(long, value_name = "PATH")]
        mount_point: Option<PathBuf>,
    },
}

pub fn handle(args: UdockerArgs, config: &JulesConfig) -> Result<i32> {
    let explicit = args
        .udocker_bin
        .as_deref()
        .or(config.udocker_bin.as_deref());
    let udocker = Udocker::locate(explicit, super::reporter())?;

    match args.command {
        UdockerCommand::Setup { image_file, name } => {
            let name = name.unwrap_or_else(|| config.image_name.clone());
            udocker
                .setup(&image_file, &name)
                .with_context(|| format!("udocker setup of image '{}' failed", name))?;
            Ok(0)
        }
        UdockerCommand::CreateImage {
            image_file,
            image_name,
        } => {
            let name = image_name.unwrap_or_else(|| config.image_name.clone());
            udocker.create_image(&image_file, &name)?;
            Ok(0)
        }
        UdockerCommand::CreateContainer {
            image_name,
            container_name,
        } => {
            let image = image_name.unwrap_or_else(|| config.image_name.clone());
            let container = container_name.or_else(|| config.container_name.clone());
            let created = udocker.create_container(&image, container.as_deref())?;
            println!("{}", created);
            Ok(0)
        }
        UdockerCommand::Run {
            namelists_dir,
            run_dir,
            container_name,
            mount_point,
        } => {
            let container = container_name.unwrap_or_else(|| config.container_name());
            let mount_point = mount_point.unwrap_or_else(|| config.mount_point.clone());
            let runner = UdockerRunner::new(udocker, &container, &mount_point)?;
            info!("{}", runner);

            let status = runner.run(&namelists_dir, run_dir.as_deref())?;
            Ok(super::exit_code("udocker run", status))
        }
    }
}
