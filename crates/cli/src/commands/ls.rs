//! ls command - List buckets, objects, or object versions
//!
//! Lists buckets when given an alias only, objects for a bucket path, and
//! version history with --versions.

use clap::Args;
use osc_core::traits::ObjectVersion;
use osc_core::{ListOptions, ObjectInfo, ObjectListing, ObjectStore as _, RemotePath};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// List buckets and objects
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Remote path (alias/ or alias/bucket[/prefix])
    pub path: String,

    /// List recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Show object versions and delete markers
    #[arg(long)]
    pub versions: bool,

    /// Summarize output (show totals)
    #[arg(long)]
    pub summarize: bool,
}

#[derive(Debug, Serialize)]
struct LsOutput {
    listing: ObjectListing,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
}

#[derive(Debug, Serialize)]
struct Summary {
    total_objects: usize,
    total_size_bytes: i64,
    total_size_human: String,
}

/// Execute the ls command
pub async fn execute(args: LsArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let (alias_name, bucket, prefix) = match parse_ls_path(&args.path) {
        Ok(parsed) => parsed,
        Err(e) => {
            formatter.error(&e);
            return ExitCode::UsageError;
        }
    };

    let client = match super::make_client(&alias_name, &formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    let Some(bucket) = bucket else {
        return list_buckets(&client, &formatter, args.summarize).await;
    };
    let path = RemotePath::new(&alias_name, &bucket, prefix.unwrap_or_default());

    if args.versions {
        list_versions(&client, &path, &args, &formatter).await
    } else {
        list_objects(&client, &path, &args, &formatter).await
    }
}

async fn list_buckets(
    client: &osc_s3::S3Client,
    formatter: &Formatter,
    summarize: bool,
) -> ExitCode {
    match client.list_buckets().await {
        Ok(buckets) => {
            if formatter.is_json() {
                formatter.json(&buckets);
            } else {
                for bucket in &buckets {
                    formatter.println(&format!("[{}]     0B {}/", date_of(bucket), bucket.key));
                }
                if summarize {
                    formatter.println(&format!("\nTotal: {} buckets", buckets.len()));
                }
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to list buckets: {e}"));
            ExitCode::NetworkError
        }
    }
}

async fn list_objects(
    client: &osc_s3::S3Client,
    path: &RemotePath,
    args: &LsArgs,
    formatter: &Formatter,
) -> ExitCode {
    let mut all_items: Vec<ObjectInfo> = Vec::new();
    let mut marker: Option<String> = None;

    loop {
        let options = ListOptions {
            recursive: args.recursive,
            max_keys: Some(1000),
            marker: marker.clone(),
            ..Default::default()
        };

        match client.list_objects(path, options).await {
            Ok(result) => {
                all_items.extend(result.items);
                if result.truncated {
                    marker = result.next_marker;
                } else {
                    break;
                }
            }
            Err(osc_core::Error::NotFound(_)) => {
                formatter.error(&format!("Bucket not found: {}", path.bucket));
                return ExitCode::NotFound;
            }
            Err(e) => {
                formatter.error(&format!("Failed to list objects: {e}"));
                return ExitCode::NetworkError;
            }
        }
    }

    let total_objects = all_items.iter().filter(|i| !i.is_dir).count();
    let total_size: i64 = all_items.iter().filter_map(|i| i.size_bytes).sum();

    if formatter.is_json() {
        let output = LsOutput {
            listing: ObjectListing::Plain(osc_core::ListResult {
                items: all_items,
                truncated: false,
                next_marker: None,
            }),
            summary: summary(args.summarize, total_objects, total_size),
        };
        formatter.json(&output);
    } else {
        for item in &all_items {
            if item.is_dir {
                formatter.println(&format!("[{}]     0B {}", date_of(item), item.key));
            } else {
                let size = item.size_human.clone().unwrap_or_else(|| "0 B".to_string());
                formatter.println(&format!("[{}] {:>10} {}", date_of(item), size, item.key));
            }
        }
        if args.summarize {
            formatter.println(&format!(
                "\nTotal: {} objects, {}",
                total_objects,
                humansize::format_size(total_size.max(0) as u64, humansize::BINARY)
            ));
        }
    }

    ExitCode::Success
}

async fn list_versions(
    client: &osc_s3::S3Client,
    path: &RemotePath,
    args: &LsArgs,
    formatter: &Formatter,
) -> ExitCode {
    let mut versions: Vec<ObjectVersion> = Vec::new();
    let mut key_marker: Option<String> = None;
    let mut version_id_marker: Option<String> = None;

    loop {
        let options = osc_core::VersionListOptions {
            recursive: args.recursive,
            max_keys: Some(1000),
            key_marker: key_marker.clone(),
            version_id_marker: version_id_marker.clone(),
            ..Default::default()
        };

        match client.list_object_versions(path, options).await {
            Ok(result) => {
                versions.extend(result.versions);
                if result.truncated {
                    key_marker = result.next_key_marker;
                    version_id_marker = result.next_version_id_marker;
                } else {
                    break;
                }
            }
            Err(e) => {
                formatter.error(&format!("Failed to list object versions: {e}"));
                return ExitCode::NetworkError;
            }
        }
    }

    let total_objects = versions.iter().filter(|v| !v.is_delete_marker).count();
    let total_size: i64 = versions.iter().filter_map(|v| v.size_bytes).sum();

    if formatter.is_json() {
        let output = LsOutput {
            listing: ObjectListing::Versioned(osc_core::VersionedListResult {
                versions,
                truncated: false,
                next_key_marker: None,
                next_version_id_marker: None,
            }),
            summary: summary(args.summarize, total_objects, total_size),
        };
        formatter.json(&output);
    } else {
        for version in &versions {
            formatter.println(&format_version(version));
        }
        if args.summarize {
            formatter.println(&format!(
                "\nTotal: {} versions, {}",
                versions.len(),
                humansize::format_size(total_size.max(0) as u64, humansize::BINARY)
            ));
        }
    }

    ExitCode::Success
}

fn summary(requested: bool, total_objects: usize, total_size: i64) -> Option<Summary> {
    requested.then(|| Summary {
        total_objects,
        total_size_bytes: total_size,
        total_size_human: humansize::format_size(total_size.max(0) as u64, humansize::BINARY),
    })
}

fn date_of(info: &ObjectInfo) -> String {
    info.last_modified
        .map(|d| d.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "                   ".to_string())
}

fn format_version(version: &ObjectVersion) -> String {
    let date = version
        .last_modified
        .map(|d| d.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "                   ".to_string());
    let size = version
        .size_bytes
        .map(|s| humansize::format_size(s.max(0) as u64, humansize::BINARY))
        .unwrap_or_else(|| "-".to_string());
    let marker = if version.is_delete_marker {
        " [delete marker]"
    } else if version.is_latest {
        " [latest]"
    } else {
        ""
    };
    format!(
        "[{date}] {size:>10} {} (versionId: {}){marker}",
        version.key, version.version_id
    )
}

/// Parse ls path into (alias, bucket, prefix)
fn parse_ls_path(path: &str) -> Result<(String, Option<String>, Option<String>), String> {
    let path = path.trim_end_matches('/');

    if path.is_empty() {
        return Err("Path cannot be empty".to_string());
    }

    let parts: Vec<&str> = path.splitn(3, '/').collect();

    match parts.len() {
        1 => Ok((parts[0].to_string(), None, None)),
        2 => Ok((parts[0].to_string(), Some(parts[1].to_string()), None)),
        3 => Ok((
            parts[0].to_string(),
            Some(parts[1].to_string()),
            Some(format!("{}/", parts[2])),
        )),
        _ => Err(format!("Invalid path format: {path}")),
    }
}
