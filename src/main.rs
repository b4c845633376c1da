#![warn(missing_docs)]

//! CLI around an external Windows service-wrapper executable ([WinSW](https://github.com/winsw/winsw)-style):
//! renders a validated service definition into the wrapper's XML
//! configuration file and drives the install/start/stop/uninstall lifecycle
//! of the resulting OS service.

use std::path::PathBuf;

use clap::{Parser, Subcommand, command};
use eyre::WrapErr;

pub use crate::error::{Error, Result};
use crate::service_manager::{Service, ServiceDefinition, ServiceManager, Settings};

pub mod error;
pub mod service_manager;

/// Windows service wrapper controller
///
/// Takes a json definition of one service and installs, controls or removes
/// the corresponding OS service through the wrapper executable.
///
/// # Examples
///
/// ```bash
/// svcman --config ./worker.json validate
/// svcman --config ./worker.json --wrapper C:\tools\winsw.exe install
/// svcman --config ./worker.json restart
/// ```
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the json definition of the service to manage
    #[arg(short, long)]
    pub config: PathBuf,

    /// Path to the service wrapper executable
    #[arg(short, long, default_value = "winsw.exe")]
    pub wrapper: PathBuf,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// The lifecycle operation to run
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate the service definition and print the rendered wrapper XML
    Validate,

    /// Register the service with the OS
    Install,

    /// Unregister the service and remove its configuration file
    Uninstall,

    /// Uninstall followed by install
    Reinstall,

    /// Start the registered service
    Start,

    /// Stop the registered service
    Stop,

    /// Stop followed by start
    Restart,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let args = Args::parse();

    let raw = std::fs::read_to_string(&args.config)
        .wrap_err_with(|| format!("Failed to read service definition: {:?}", args.config))?;
    let definition: ServiceDefinition = serde_json::from_str(&raw)
        .map_err(|e| Error::from(format_serde_error::SerdeError::new(raw, e)))?;

    let settings = Settings::new(args.wrapper);
    let service = Service::new(definition, &settings)?;
    let manager = ServiceManager::new(service, settings);

    match args.command {
        Command::Validate => print!("{}", manager.rendered_config()),
        Command::Install => manager.install().await?,
        Command::Uninstall => manager.uninstall().await?,
        Command::Reinstall => manager.reinstall().await?,
        Command::Start => manager.start().await?,
        Command::Stop => manager.stop().await?,
        Command::Restart => manager.restart().await?,
    }

    Ok(())
}
