//! mb command - Make bucket
//!
//! Creates a new bucket on the specified storage service.

use clap::Args;
use osc_core::ObjectStore as _;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Create a bucket
#[derive(Args, Debug)]
pub struct MbArgs {
    /// Bucket path (alias/bucket)
    pub path: String,

    /// Do not fail if the bucket already exists
    #[arg(long)]
    pub ignore_existing: bool,
}

#[derive(Debug, Serialize)]
struct MbOutput {
    status: &'static str,
    bucket: String,
}

/// Execute the mb command
pub async fn execute(args: MbArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

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

    match client.bucket_exists(&bucket).await {
        Ok(true) => {
            if args.ignore_existing {
                formatter.println(&format!("Bucket already exists: {bucket}"));
                return ExitCode::Success;
            }
            formatter.error(&format!("Bucket already exists: {bucket}"));
            return ExitCode::Conflict;
        }
        Ok(false) => {}
        Err(e) => {
            formatter.error(&format!("Failed to check bucket: {e}"));
            return ExitCode::NetworkError;
        }
    }

    match client.create_bucket(&bucket).await {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&MbOutput {
                    status: "success",
                    bucket: bucket.clone(),
                });
            } else {
                formatter.success(&format!("Created bucket: {bucket}"));
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to create bucket {bucket}: {e}"));
            ExitCode::from_error(&e)
        }
    }
}

/// Parse a bucket path into (alias, bucket)
pub(crate) fn parse_bucket_path(path: &str) -> Option<(String, String)> {
    let path = path.trim_end_matches('/');
    let mut parts = path.splitn(2, '/');
    let alias = parts.next()?.to_string();
    let bucket = parts.next()?.to_string();
    if alias.is_empty() || bucket.is_empty() || bucket.contains('/') {
        return None;
    }
    Some((alias, bucket))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bucket_path() {
        assert_eq!(
            parse_bucket_path("minio/photos"),
            Some(("minio".to_string(), "photos".to_string()))
        );
        assert_eq!(
            parse_bucket_path("minio/photos/"),
            Some(("minio".to_string(), "photos".to_string()))
        );
        assert!(parse_bucket_path("minio").is_none());
        assert!(parse_bucket_path("minio/bucket/key").is_none());
        assert!(parse_bucket_path("").is_none());
    }
}
