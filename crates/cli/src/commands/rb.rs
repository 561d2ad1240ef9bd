//! rb command - Remove bucket
//!
//! Removes a bucket from the specified storage service. With --force, the
//! bucket is emptied first (after confirmation).

use clap::Args;
use osc_core::{Confirm as _, ListOptions, ObjectIdent, ObjectStore as _, RemotePath};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};
use crate::prompt::StdinConfirm;

use super::mb::parse_bucket_path;

/// Remove a bucket
#[derive(Args, Debug)]
pub struct RbArgs {
    /// Bucket path (alias/bucket)
    pub path: String,

    /// Delete every object in the bucket first
    #[arg(long)]
    pub force: bool,

    /// Answer yes to all prompts
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Debug, Serialize)]
struct RbOutput {
    status: &'static str,
    bucket: String,
    objects_removed: usize,
}

/// Execute the rb command
pub async fn execute(args: RbArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let Some((alias_name, bucket)) = parse_bucket_path(&args.path) else {
        formatter.error(&format!(
            "Invalid path format: '{}'. Expected: alias/bucket",
            args.path
        ));
        return ExitCode::UsageError;
    };

    let client = match super::make_client(&alias_name, &formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    if args.force && !args.yes {
        let confirm = StdinConfirm::new(!output_config.no_color && !output_config.json);
        let question = format!(
            "WARN: you are deleting the bucket '{bucket}' and every object in it, please make sure"
        );
        if !confirm.confirm(&question, false) {
            return ExitCode::Interrupted;
        }
    }

    let mut objects_removed = 0usize;
    if args.force {
        match empty_bucket(&client, &alias_name, &bucket).await {
            Ok(n) => objects_removed = n,
            Err(e) => {
                formatter.error(&format!("Failed to empty bucket {bucket}: {e}"));
                return ExitCode::from_error(&e);
            }
        }
    }

    match client.delete_bucket(&bucket).await {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&RbOutput {
                    status: "success",
                    bucket: bucket.clone(),
                    objects_removed,
                });
            } else {
                formatter.success(&format!("Removed bucket: {bucket}"));
            }
            ExitCode::Success
        }
        Err(osc_core::Error::NotFound(_)) => {
            formatter.error(&format!("Bucket not found: {bucket}"));
            ExitCode::NotFound
        }
        Err(e) => {
            formatter.error(&format!("Failed to remove bucket {bucket}: {e}"));
            ExitCode::from_error(&e)
        }
    }
}

/// Delete every object in the bucket, page by page
async fn empty_bucket(
    client: &osc_s3::S3Client,
    alias_name: &str,
    bucket: &str,
) -> osc_core::Result<usize> {
    let path = RemotePath::new(alias_name, bucket, "");
    let mut removed = 0usize;
    let mut marker: Option<String> = None;

    loop {
        let options = ListOptions {
            recursive: true,
            max_keys: Some(1000),
            marker: marker.clone(),
            ..Default::default()
        };
        let page = client.list_objects(&path, options).await?;

        let idents: Vec<ObjectIdent> = page
            .items
            .iter()
            .filter(|item| !item.is_dir)
            .map(|item| ObjectIdent::key(item.key.clone()))
            .collect();
        if !idents.is_empty() {
            let result = client.delete_objects(bucket, idents).await?;
            removed += result.deleted.len();
            if !result.errors.is_empty() {
                return Err(osc_core::Error::General(format!(
                    "{} objects could not be deleted",
                    result.errors.len()
                )));
            }
        }

        if page.truncated {
            marker = page.next_marker;
        } else {
            break;
        }
    }
    Ok(removed)
}
