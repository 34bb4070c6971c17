//! CLI command definitions and execution
//!
//! This module contains all CLI commands and their implementations.

use clap::{Parser, Subcommand};

use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

mod clear;
mod completions;
mod deploy;
mod setup;
mod status;

/// ipd - ad-hoc iOS build distribution
///
/// Uploads locally built .ipa archives to a Dropbox account together with
/// an installation manifest and a history page, and prints a shareable
/// install link.
#[derive(Parser, Debug)]
#[command(name = "ipd")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Configure the access token and deployment paths
    Setup(setup::SetupArgs),

    /// Upload the newest build and print its install link
    Deploy(deploy::DeployArgs),

    /// Show the stored configuration and account identity
    Status(status::StatusArgs),

    /// Remove the stored configuration and access token
    Clear(clear::ClearArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Setup(args) => setup::execute(args, output_config).await,
        Commands::Deploy(args) => deploy::execute(args, output_config).await,
        Commands::Status(args) => status::execute(args, output_config).await,
        Commands::Clear(args) => clear::execute(args, output_config),
        Commands::Completions(args) => completions::execute(args),
    }
}

/// Build a client from the stored configuration
pub(crate) fn client_from_config(
    config: &ipd_core::Config,
) -> ipd_core::Result<ipd_dropbox::DropboxClient> {
    let token = config
        .access_token
        .as_deref()
        .ok_or_else(|| ipd_core::Error::Config("no access token configured".into()))?;
    let options = ipd_dropbox::ClientOptions {
        ca_bundle: config.ca_bundle.clone(),
        ..Default::default()
    };
    ipd_dropbox::DropboxClient::with_options(token, options)
}
