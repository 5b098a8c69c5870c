//! CLI routing and command dispatch.

use crate::constants;
use crate::core::config;
use crate::core::paths::ProvisionPaths;
use crate::models::bootstrap_config::BootstrapFile;
use anyhow::{bail, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

pub mod doctor;
pub mod plan;
pub mod provision;

/// Shared context passed to all command handlers.
pub struct CliContext {
    pub paths: ProvisionPaths,
    pub config: BootstrapFile,
    pub non_interactive: bool,
    pub passphrase_file: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(
    name = "tls-bootstrap",
    version,
    about = "Provision a TLS key pair, salt, and config scaffold for a server",
    subcommand_precedence_over_arg = true
)]
pub struct Cli {
    /// Working root holding the key directory (default: current directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub root: Option<PathBuf>,

    /// Template copied to the config file (overrides bootstrap.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub template: Option<PathBuf>,

    /// Read the key passphrase from this file instead of prompting
    #[arg(long, global = true, value_name = "PATH")]
    pub passphrase_file: Option<PathBuf>,

    /// Run in non-interactive mode (no passphrase prompts, suitable for automation)
    #[arg(long, global = true)]
    pub non_interactive: bool,

    /// Increase diagnostic output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(flatten)]
    pub provision: provision::ProvisionArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        if self.command.is_some() && self.provision.is_set() {
            bail!("cipher and --no-wait apply only to a provisioning run, not to a subcommand");
        }
        if let Some(pass) = &self.passphrase_file {
            if !pass.is_file() {
                bail!("passphrase file not found: {}", pass.display());
            }
        }

        let root = ProvisionPaths::resolve_root(self.root)?;
        let config = config::load(&root.join(constants::BOOTSTRAP_TOML))?;
        let paths = ProvisionPaths::with_config(root, &config).with_template(self.template);

        let ctx = CliContext {
            paths,
            config,
            non_interactive: self.non_interactive,
            passphrase_file: self.passphrase_file,
        };

        match self.command {
            Some(Commands::Plan(args)) => plan::run(&ctx, args),
            Some(Commands::Doctor(args)) => doctor::run(&ctx, args),
            None => provision::run(&ctx, self.provision),
        }
    }

    /// Default log filter for the given verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Preview what a provisioning run would do (no changes)
    Plan(plan::PlanArgs),
    /// Diagnose the key directory and toolchain (safe, read-only)
    Doctor(doctor::DoctorArgs),
}
