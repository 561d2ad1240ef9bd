//! versioning command - Get or set bucket versioning

use clap::{Args, Subcommand};
use osc_core::ObjectStore as _;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::mb::parse_bucket_path;

/// Bucket versioning subcommands
#[derive(Subcommand, Debug)]
pub enum VersioningCommands {
    /// Show the bucket's versioning state
    Get(GetArgs),

    /// Enable or suspend versioning
    Set(SetArgs),
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Bucket path (alias/bucket)
    pub path: String,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Bucket path (alias/bucket)
    pub path: String,

    /// Desired state: on or off
    #[arg(value_parser = ["on", "off"])]
    pub state: String,
}

#[derive(Debug, Serialize)]
struct VersioningOutput {
    bucket: String,
    status: String,
}

/// Execute a versioning subcommand
pub async fn execute(cmd: VersioningCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    match cmd {
        VersioningCommands::Get(args) => get(args, &formatter).await,
        VersioningCommands::Set(args) => set(args, &formatter).await,
    }
}

async fn get(args: GetArgs, formatter: &Formatter) -> ExitCode {
    let Some((alias_name, bucket)) = parse_bucket_path(&args.path) else {
        formatter.error(&format!(
            "Invalid path format: '{}'. Expected: alias/bucket",
            args.path
        ));
        return ExitCode::UsageError;
    };

    let client = match super::make_client(&alias_name, formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client.get_bucket_versioning(&bucket).await {
        Ok(status) => {
            if formatter.is_json() {
                formatter.json(&VersioningOutput {
                    bucket,
                    status: status.to_string(),
                });
            } else {
                formatter.println(&format!("Versioning: {status}"));
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to get versioning state: {e}"));
            ExitCode::from_error(&e)
        }
    }
}

async fn set(args: SetArgs, formatter: &Formatter) -> ExitCode {
    let Some((alias_name, bucket)) = parse_bucket_path(&args.path) else {
        formatter.error(&format!(
            "Invalid path format: '{}'. Expected: alias/bucket",
            args.path
        ));
        return ExitCode::UsageError;
    };
    let enabled = args.state == "on";

    let client = match super::make_client(&alias_name, formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client.put_bucket_versioning(&bucket, enabled).await {
        Ok(()) => {
            formatter.success(&format!(
                "Versioning {} for bucket {bucket}",
                if enabled { "enabled" } else { "suspended" }
            ));
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to set versioning state: {e}"));
            ExitCode::from_error(&e)
        }
    }
}
