//! Alias management commands
//!
//! Aliases are named references to S3-compatible storage endpoints,
//! including connection details and credentials.

use clap::Subcommand;
use serde::Serialize;

use crate::exit_code::ExitCode;
use osc_core::{Alias, AliasManager};

/// Alias subcommands for managing storage service connections
#[derive(Subcommand, Debug)]
pub enum AliasCommands {
    /// Add or update an alias
    Set(SetArgs),

    /// List all configured aliases
    List(ListArgs),

    /// Remove an alias
    Remove(RemoveArgs),
}

/// Arguments for the `alias set` command
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Alias name (e.g., "local", "s3")
    pub name: String,

    /// Endpoint URL (e.g., "http://localhost:9000")
    pub endpoint: String,

    /// Access key ID
    pub access_key: String,

    /// Secret access key
    pub secret_key: String,

    /// Region (default: us-east-1)
    #[arg(long, default_value = "us-east-1")]
    pub region: String,

    /// Bucket lookup style: auto, path, or dns (default: auto)
    #[arg(long, default_value = "auto")]
    pub bucket_lookup: String,

    /// Session token for temporary credentials
    #[arg(long)]
    pub session_token: Option<String>,

    /// Allow insecure TLS connections
    #[arg(long, default_value = "false")]
    pub insecure: bool,
}

/// Arguments for the `alias list` command
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Show full details including endpoints
    #[arg(long)]
    pub verbose: bool,
}

/// Arguments for the `alias remove` command
#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Alias name to remove
    pub name: String,
}

#[derive(Debug, Serialize)]
struct AliasView {
    name: String,
    endpoint: String,
    region: String,
    bucket_lookup: String,
}

impl From<&Alias> for AliasView {
    fn from(alias: &Alias) -> Self {
        Self {
            name: alias.name.clone(),
            endpoint: alias.endpoint.clone(),
            region: alias.region.clone(),
            bucket_lookup: alias.bucket_lookup.clone(),
        }
    }
}

/// Execute an alias subcommand
pub async fn execute(cmd: AliasCommands, json: bool) -> ExitCode {
    match cmd {
        AliasCommands::Set(args) => set(args, json),
        AliasCommands::List(args) => list(args, json),
        AliasCommands::Remove(args) => remove(args, json),
    }
}

fn set(args: SetArgs, json: bool) -> ExitCode {
    let manager = match AliasManager::new() {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Failed to open configuration: {e}");
            return ExitCode::GeneralError;
        }
    };

    let mut alias = Alias::new(&args.name, &args.endpoint, &args.access_key, &args.secret_key);
    alias.region = args.region;
    alias.bucket_lookup = args.bucket_lookup;
    alias.session_token = args.session_token;
    alias.insecure = args.insecure;

    match manager.set(alias) {
        Ok(()) => {
            if json {
                println!("{{\"status\": \"success\", \"alias\": \"{}\"}}", args.name);
            } else {
                println!("Added alias '{}' for {}", args.name, args.endpoint);
            }
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("Failed to save alias: {e}");
            ExitCode::from_error(&e)
        }
    }
}

fn list(args: ListArgs, json: bool) -> ExitCode {
    let manager = match AliasManager::new() {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Failed to open configuration: {e}");
            return ExitCode::GeneralError;
        }
    };

    let aliases = match manager.list() {
        Ok(aliases) => aliases,
        Err(e) => {
            eprintln!("Failed to load aliases: {e}");
            return ExitCode::GeneralError;
        }
    };

    if json {
        let views: Vec<AliasView> = aliases.iter().map(AliasView::from).collect();
        match serde_json::to_string_pretty(&views) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("Error serializing output: {e}");
                return ExitCode::GeneralError;
            }
        }
    } else if aliases.is_empty() {
        println!("No aliases configured. Add one with: osc alias set <name> <endpoint> <access-key> <secret-key>");
    } else {
        for alias in &aliases {
            if args.verbose {
                println!(
                    "{}\n  endpoint: {}\n  region: {}\n  lookup: {}",
                    alias.name, alias.endpoint, alias.region, alias.bucket_lookup
                );
            } else {
                println!("{} -> {}", alias.name, alias.endpoint);
            }
        }
    }
    ExitCode::Success
}

fn remove(args: RemoveArgs, json: bool) -> ExitCode {
    let manager = match AliasManager::new() {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Failed to open configuration: {e}");
            return ExitCode::GeneralError;
        }
    };

    match manager.remove(&args.name) {
        Ok(()) => {
            if json {
                println!("{{\"status\": \"success\", \"alias\": \"{}\"}}", args.name);
            } else {
                println!("Removed alias '{}'", args.name);
            }
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("Failed to remove alias: {e}");
            ExitCode::from_error(&e)
        }
    }
}
