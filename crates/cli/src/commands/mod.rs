//! CLI command definitions and execution
//!
//! This module contains all CLI commands and their implementations.
//! Commands translate flags into the option records consumed by osc-core's
//! transfer engine and stay thin otherwise.

use std::sync::Arc;

use clap::{Parser, Subcommand};

use osc_core::transfer::ResumeStore;
use osc_core::{AliasManager, ConfigManager, TransferConfig, TransferManager};
use osc_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, TransferBar};
use crate::prompt::StdinConfirm;

mod acl;
mod alias;
mod completions;
pub mod cp;
mod ls;
mod mb;
mod mv;
mod parts;
mod probe;
mod rb;
mod restore;
mod rm;
mod signurl;
mod stat;
mod versioning;

/// osc - object storage CLI client
///
/// A command-line interface for S3-compatible cloud object storage with
/// resumable multipart transfers and one-way sync.
#[derive(Parser, Debug)]
#[command(name = "osc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress bar
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage storage service aliases
    #[command(subcommand)]
    Alias(alias::AliasCommands),

    /// List buckets, objects, or object versions
    Ls(ls::LsArgs),

    /// Create a bucket
    Mb(mb::MbArgs),

    /// Remove a bucket
    Rb(rb::RbArgs),

    /// Show object metadata
    Stat(stat::StatArgs),

    /// Copy objects (local<->remote, remote<->remote) with optional sync
    Cp(cp::CpArgs),

    /// Move objects between remote locations (copy + delete source)
    Mv(mv::MvArgs),

    /// Remove objects
    Rm(rm::RmArgs),

    /// Inspect or abort in-progress multipart uploads
    #[command(subcommand)]
    Parts(parts::PartsCommands),

    /// Restore archived objects
    Restore(restore::RestoreArgs),

    /// Get or set bucket versioning
    #[command(subcommand)]
    Versioning(versioning::VersioningCommands),

    /// Get or set bucket/object ACLs
    #[command(subcommand)]
    Acl(acl::AclCommands),

    /// Generate a presigned download URL
    Signurl(signurl::SignurlArgs),

    /// Upload/download/delete round-trip health check
    Probe(probe::ProbeArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Alias(cmd) => alias::execute(cmd, cli.json).await,
        Commands::Ls(args) => ls::execute(args, output_config).await,
        Commands::Mb(args) => mb::execute(args, output_config).await,
        Commands::Rb(args) => rb::execute(args, output_config).await,
        Commands::Stat(args) => stat::execute(args, output_config).await,
        Commands::Cp(args) => cp::execute(args, output_config).await,
        Commands::Mv(args) => mv::execute(args, output_config).await,
        Commands::Rm(args) => rm::execute(args, output_config).await,
        Commands::Parts(cmd) => parts::execute(cmd, output_config).await,
        Commands::Restore(args) => restore::execute(args, output_config).await,
        Commands::Versioning(cmd) => versioning::execute(cmd, output_config).await,
        Commands::Acl(cmd) => acl::execute(cmd, output_config).await,
        Commands::Signurl(args) => signurl::execute(args, output_config).await,
        Commands::Probe(args) => probe::execute(args, output_config).await,
        Commands::Completions(args) => completions::execute(args, output_config).await,
    }
}

/// Create an S3 client for the named alias
pub(crate) async fn make_client(alias_name: &str, formatter: &Formatter) -> Result<S3Client, ExitCode> {
    let alias_manager = match AliasManager::new() {
        Ok(am) => am,
        Err(e) => {
            formatter.error(&format!("Failed to load aliases: {e}"));
            return Err(ExitCode::GeneralError);
        }
    };

    let alias = match alias_manager.get(alias_name) {
        Ok(a) => a,
        Err(_) => {
            formatter.error(&format!("Alias '{alias_name}' not found"));
            return Err(ExitCode::NotFound);
        }
    };

    match S3Client::new(alias).await {
        Ok(c) => Ok(c),
        Err(e) => {
            formatter.error(&format!("Failed to create S3 client: {e}"));
            Err(ExitCode::NetworkError)
        }
    }
}

/// Create a transfer engine for the named alias, with optional per-invocation
/// overrides of the configured part size and worker count
pub(crate) async fn make_engine(
    alias_name: &str,
    output: &OutputConfig,
    part_size_mb: Option<u64>,
    workers: Option<usize>,
    formatter: &Formatter,
) -> Result<TransferManager<S3Client>, ExitCode> {
    let config = match ConfigManager::new().and_then(|m| m.load()) {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("Failed to load configuration: {e}"));
            return Err(ExitCode::GeneralError);
        }
    };

    let client = make_client(alias_name, formatter).await?;

    let mut transfer_config = TransferConfig::from(&config.transfer);
    if let Some(mb) = part_size_mb {
        transfer_config.part_size = mb.max(1) * 1024 * 1024;
    }
    if let Some(n) = workers {
        transfer_config.max_workers = n.max(1);
    }

    let resume = match ResumeStore::new() {
        Ok(store) => store,
        Err(e) => {
            formatter.error(&format!("Failed to open resume store: {e}"));
            return Err(ExitCode::GeneralError);
        }
    };

    let engine = TransferManager::new(Arc::new(client), transfer_config, resume)
        .with_progress(Arc::new(TransferBar::new(output.clone())))
        .with_confirm(Arc::new(StdinConfirm::new(
            !output.no_color && !output.json,
        )));
    Ok(engine)
}
