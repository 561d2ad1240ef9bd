//! acl command - Get or set bucket/object ACLs
//!
//! Thin passthrough over the remote ACL endpoints; grants are expressed as
//! comma-separated canonical ids or group URIs.

use clap::{Args, Subcommand};
use comfy_table::{presets, Table};
use osc_core::traits::AclUpdate;
use osc_core::{parse_path, ObjectStore as _, ParsedPath, RemotePath};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// ACL subcommands
#[derive(Subcommand, Debug)]
pub enum AclCommands {
    /// Show the ACL of a bucket or object
    Get(GetArgs),

    /// Change the ACL of a bucket or object
    Set(SetArgs),
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Path (alias/bucket for bucket ACL, alias/bucket/key for object ACL)
    pub path: String,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Path (alias/bucket for bucket ACL, alias/bucket/key for object ACL)
    pub path: String,

    /// Canned ACL, e.g. private, public-read
    #[arg(long)]
    pub acl: Option<String>,

    /// Grant READ to these grantees (comma-separated)
    #[arg(long)]
    pub grant_read: Option<String>,

    /// Grant WRITE to these grantees (comma-separated)
    #[arg(long)]
    pub grant_write: Option<String>,

    /// Grant FULL_CONTROL to these grantees (comma-separated)
    #[arg(long)]
    pub grant_full_control: Option<String>,
}

/// Execute an acl subcommand
pub async fn execute(cmd: AclCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    match cmd {
        AclCommands::Get(args) => get(args, &formatter).await,
        AclCommands::Set(args) => set(args, &formatter).await,
    }
}

fn parse_acl_path(raw: &str, formatter: &Formatter) -> Option<RemotePath> {
    match parse_path(raw) {
        Ok(ParsedPath::Remote(p)) => Some(p),
        Ok(_) => {
            formatter.error("ACL operations require a remote path (alias/bucket[/key])");
            None
        }
        Err(e) => {
            formatter.error(&format!("Invalid path: {e}"));
            None
        }
    }
}

async fn get(args: GetArgs, formatter: &Formatter) -> ExitCode {
    let Some(path) = parse_acl_path(&args.path, formatter) else {
        return ExitCode::UsageError;
    };

    let client = match super::make_client(&path.alias, formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    let result = if path.key.is_empty() {
        client.get_bucket_acl(&path.bucket).await
    } else {
        client.get_object_acl(&path).await
    };

    match result {
        Ok(grants) => {
            if formatter.is_json() {
                formatter.json(&grants);
            } else {
                if let Some(owner) = &grants.owner {
                    formatter.println(&format!("Owner: {owner}"));
                }
                let mut table = Table::new();
                table.load_preset(presets::UTF8_BORDERS_ONLY);
                table.set_header(["Grantee", "Permission"]);
                for grant in &grants.grants {
                    table.add_row([grant.grantee.clone(), grant.permission.clone()]);
                }
                formatter.println(&table.to_string());
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to get ACL: {e}"));
            ExitCode::from_error(&e)
        }
    }
}

async fn set(args: SetArgs, formatter: &Formatter) -> ExitCode {
    let Some(path) = parse_acl_path(&args.path, formatter) else {
        return ExitCode::UsageError;
    };

    let update = AclUpdate {
        canned: args.acl.clone(),
        grant_read: args
            .grant_read
            .as_deref()
            .map(osc_s3::acl::split_grantees)
            .unwrap_or_default(),
        grant_write: args
            .grant_write
            .as_deref()
            .map(osc_s3::acl::split_grantees)
            .unwrap_or_default(),
        grant_full_control: args
            .grant_full_control
            .as_deref()
            .map(osc_s3::acl::split_grantees)
            .unwrap_or_default(),
    };

    if update.canned.is_none()
        && update.grant_read.is_empty()
        && update.grant_write.is_empty()
        && update.grant_full_control.is_empty()
    {
        formatter.error("Nothing to change: pass --acl or at least one --grant-* flag");
        return ExitCode::UsageError;
    }

    let client = match super::make_client(&path.alias, formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    let result = if path.key.is_empty() {
        client.put_bucket_acl(&path.bucket, &update).await
    } else {
        client.put_object_acl(&path, &update).await
    };

    match result {
        Ok(()) => {
            formatter.success(&format!("ACL updated for {}", args.path));
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to set ACL: {e}"));
            ExitCode::from_error(&e)
        }
    }
}
