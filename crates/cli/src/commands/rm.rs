//! rm command - Remove objects
//!
//! Removes one or more objects from a bucket; recursive prefix removal and
//! version-aware removal prompt for confirmation unless --force is set.

use clap::Args;
use osc_core::{
    Confirm as _, ListOptions, ObjectIdent, ObjectStore as _, RemotePath, VersionListOptions,
};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};
use crate::prompt::StdinConfirm;

/// Remove objects
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Object path(s) to remove (alias/bucket/key or alias/bucket/prefix/)
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// Remove recursively (remove all objects with the given prefix)
    #[arg(short, long)]
    pub recursive: bool,

    /// Remove without confirmation; ignore missing objects
    #[arg(short, long)]
    pub force: bool,

    /// Only show what would be deleted (dry run)
    #[arg(long)]
    pub dry_run: bool,

    /// Remove all versions and delete markers (requires versioning support)
    #[arg(long)]
    pub versions: bool,

    /// Remove one specific version of a single object
    #[arg(long, conflicts_with = "versions")]
    pub version_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    status: &'static str,
    deleted: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed: Option<Vec<String>>,
    total: usize,
}

/// Execute the rm command
pub async fn execute(args: RmArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());
    let confirm = StdinConfirm::new(!output_config.no_color && !output_config.json);

    let mut all_deleted = Vec::new();
    let mut all_failed = Vec::new();
    let mut has_error = false;

    for path_str in &args.paths {
        match process_rm_path(path_str, &args, &confirm, &formatter).await {
            Ok(deleted) => all_deleted.extend(deleted),
            Err((code, failed)) => {
                if code == ExitCode::Interrupted {
                    return code;
                }
                has_error = true;
                all_failed.extend(failed);
                // fail fast only on errors that affect every path
                if code == ExitCode::AuthError || code == ExitCode::UsageError {
                    return code;
                }
            }
        }
    }

    if formatter.is_json() {
        let output = RmOutput {
            status: if has_error { "partial" } else { "success" },
            deleted: all_deleted.clone(),
            failed: if all_failed.is_empty() {
                None
            } else {
                Some(all_failed)
            },
            total: all_deleted.len(),
        };
        formatter.json(&output);
    } else if !args.dry_run && !all_deleted.is_empty() {
        formatter.success(&format!("Removed {} object(s).", all_deleted.len()));
    }

    if has_error {
        ExitCode::GeneralError
    } else {
        ExitCode::Success
    }
}

async fn process_rm_path(
    path_str: &str,
    args: &RmArgs,
    confirm: &StdinConfirm,
    formatter: &Formatter,
) -> Result<Vec<String>, (ExitCode, Vec<String>)> {
    let (alias_name, bucket, key) = match parse_rm_path(path_str) {
        Ok(parsed) => parsed,
        Err(e) => {
            formatter.error(&e);
            return Err((ExitCode::UsageError, vec![path_str.to_string()]));
        }
    };

    let client = super::make_client(&alias_name, formatter)
        .await
        .map_err(|code| (code, vec![]))?;

    let is_prefix = key.ends_with('/') || key.is_empty();

    if !args.force && !args.dry_run {
        let what = if args.recursive || is_prefix {
            format!("WARN: you are deleting all objects under '{path_str}', please make sure")
        } else {
            format!("WARN: you are deleting '{path_str}', please make sure")
        };
        if !confirm.confirm(&what, false) {
            return Err((ExitCode::Interrupted, vec![]));
        }
    }

    if args.recursive || is_prefix {
        if args.versions {
            delete_versions(&client, &alias_name, &bucket, &key, args, formatter).await
        } else {
            delete_recursive(&client, &alias_name, &bucket, &key, args, formatter).await
        }
    } else {
        delete_single(&client, &alias_name, &bucket, &key, args, formatter).await
    }
}

async fn delete_single(
    client: &osc_s3::S3Client,
    alias_name: &str,
    bucket: &str,
    key: &str,
    args: &RmArgs,
    formatter: &Formatter,
) -> Result<Vec<String>, (ExitCode, Vec<String>)> {
    let path = RemotePath::new(alias_name, bucket, key);
    let full_path = format!("{alias_name}/{bucket}/{key}");

    if args.dry_run {
        formatter.println(&format!("Would remove: {full_path}"));
        return Ok(vec![full_path]);
    }

    match client
        .delete_object(&path, args.version_id.as_deref())
        .await
    {
        Ok(()) => {
            if !formatter.is_json() {
                match &args.version_id {
                    Some(version) => {
                        formatter.println(&format!("Removed: {full_path} (versionId: {version})"))
                    }
                    None => formatter.println(&format!("Removed: {full_path}")),
                }
            }
            Ok(vec![full_path])
        }
        Err(osc_core::Error::NotFound(_)) if args.force => Ok(vec![]),
        Err(osc_core::Error::NotFound(_)) => {
            formatter.error(&format!("Object not found: {full_path}"));
            Err((ExitCode::NotFound, vec![full_path]))
        }
        Err(osc_core::Error::Auth(e)) => {
            formatter.error(&format!("Access denied: {e}"));
            Err((ExitCode::AuthError, vec![full_path]))
        }
        Err(e) => {
            formatter.error(&format!("Failed to remove {full_path}: {e}"));
            Err((ExitCode::NetworkError, vec![full_path]))
        }
    }
}

async fn delete_recursive(
    client: &osc_s3::S3Client,
    alias_name: &str,
    bucket: &str,
    prefix: &str,
    args: &RmArgs,
    formatter: &Formatter,
) -> Result<Vec<String>, (ExitCode, Vec<String>)> {
    let path = RemotePath::new(alias_name, bucket, prefix);

    let mut keys_to_delete = Vec::new();
    let mut marker: Option<String> = None;

    loop {
        let options = ListOptions {
            recursive: true,
            max_keys: Some(1000),
            marker: marker.clone(),
            ..Default::default()
        };

        match client.list_objects(&path, options).await {
            Ok(result) => {
                for item in result.items {
                    if !item.is_dir {
                        keys_to_delete.push(item.key);
                    }
                }
                if result.truncated {
                    marker = result.next_marker;
                } else {
                    break;
                }
            }
            Err(osc_core::Error::NotFound(_)) => {
                formatter.error(&format!("Bucket not found: {bucket}"));
                return Err((ExitCode::NotFound, vec![]));
            }
            Err(e) => {
                formatter.error(&format!("Failed to list objects: {e}"));
                return Err((ExitCode::NetworkError, vec![]));
            }
        }
    }

    if keys_to_delete.is_empty() {
        if !args.force {
            formatter.warning(&format!(
                "No objects found matching prefix: {alias_name}/{bucket}/{prefix}"
            ));
        }
        return Ok(vec![]);
    }

    if args.dry_run {
        for key in &keys_to_delete {
            formatter.println(&format!("Would remove: {alias_name}/{bucket}/{key}"));
        }
        return Ok(keys_to_delete
            .iter()
            .map(|k| format!("{alias_name}/{bucket}/{k}"))
            .collect());
    }

    let idents = keys_to_delete.into_iter().map(ObjectIdent::key).collect();
    delete_batches(client, alias_name, bucket, idents, formatter).await
}

/// Collect and remove every version and delete marker under a prefix
async fn delete_versions(
    client: &osc_s3::S3Client,
    alias_name: &str,
    bucket: &str,
    prefix: &str,
    args: &RmArgs,
    formatter: &Formatter,
) -> Result<Vec<String>, (ExitCode, Vec<String>)> {
    let path = RemotePath::new(alias_name, bucket, prefix);

    let mut idents: Vec<ObjectIdent> = Vec::new();
    let mut key_marker: Option<String> = None;
    let mut version_id_marker: Option<String> = None;

    loop {
        let options = VersionListOptions {
            recursive: true,
            max_keys: Some(1000),
            key_marker: key_marker.clone(),
            version_id_marker: version_id_marker.clone(),
            ..Default::default()
        };

        match client.list_object_versions(&path, options).await {
            Ok(result) => {
                for version in result.versions {
                    idents.push(ObjectIdent::version(version.key, version.version_id));
                }
                if result.truncated {
                    key_marker = result.next_key_marker;
                    version_id_marker = result.next_version_id_marker;
                } else {
                    break;
                }
            }
            Err(e) => {
                formatter.error(&format!("Failed to list object versions: {e}"));
                return Err((ExitCode::NetworkError, vec![]));
            }
        }
    }

    if idents.is_empty() {
        if !args.force {
            formatter.warning(&format!(
                "No versions found matching prefix: {alias_name}/{bucket}/{prefix}"
            ));
        }
        return Ok(vec![]);
    }

    if args.dry_run {
        for ident in &idents {
            formatter.println(&format!(
                "Would remove: {alias_name}/{bucket}/{} (versionId: {})",
                ident.key,
                ident.version_id.as_deref().unwrap_or("null")
            ));
        }
        return Ok(idents
            .iter()
            .map(|i| format!("{alias_name}/{bucket}/{}", i.key))
            .collect());
    }

    delete_batches(client, alias_name, bucket, idents, formatter).await
}

/// Batch deletes, 1000 keys per request
async fn delete_batches(
    client: &osc_s3::S3Client,
    alias_name: &str,
    bucket: &str,
    idents: Vec<ObjectIdent>,
    formatter: &Formatter,
) -> Result<Vec<String>, (ExitCode, Vec<String>)> {
    let mut deleted = Vec::new();
    let mut failed = Vec::new();

    for chunk in idents.chunks(1000) {
        match client.delete_objects(bucket, chunk.to_vec()).await {
            Ok(result) => {
                for ident in result.deleted {
                    let full_path = format!("{alias_name}/{bucket}/{}", ident.key);
                    if !formatter.is_json() {
                        formatter.println(&format!("Removed: {full_path}"));
                    }
                    deleted.push(full_path);
                }
                for err in result.errors {
                    formatter.error(&format!(
                        "Failed to remove {alias_name}/{bucket}/{}: {}",
                        err.key,
                        err.message.as_deref().unwrap_or("unknown error")
                    ));
                    failed.push(format!("{alias_name}/{bucket}/{}", err.key));
                }
            }
            Err(e) => {
                formatter.error(&format!("Failed to delete batch: {e}"));
                for ident in chunk {
                    failed.push(format!("{alias_name}/{bucket}/{}", ident.key));
                }
            }
        }
    }

    if !failed.is_empty() {
        Err((ExitCode::GeneralError, failed))
    } else {
        Ok(deleted)
    }
}

/// Parse rm path into (alias, bucket, key)
fn parse_rm_path(path: &str) -> Result<(String, String, String), String> {
    if path.is_empty() {
        return Err("Path cannot be empty".to_string());
    }

    let parts: Vec<&str> = path.splitn(3, '/').collect();

    if parts.len() < 2 {
        return Err(format!(
            "Invalid path format: '{path}'. Expected: alias/bucket[/key]"
        ));
    }

    let alias = parts[0].to_string();
    let bucket = parts[1].to_string();
    let key = if parts.len() > 2 {
        parts[2].to_string()
    } else {
        String::new()
    };

    if bucket.is_empty() {
        return Err("Bucket name cannot be empty".to_string());
    }

    Ok((alias, bucket, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rm_path_with_key() {
        let (alias, bucket, key) = parse_rm_path("myalias/mybucket/file.txt").unwrap();
        assert_eq!(alias, "myalias");
        assert_eq!(bucket, "mybucket");
        assert_eq!(key, "file.txt");
    }

    #[test]
    fn test_parse_rm_path_with_prefix() {
        let (alias, bucket, key) = parse_rm_path("myalias/mybucket/path/to/").unwrap();
        assert_eq!(alias, "myalias");
        assert_eq!(bucket, "mybucket");
        assert_eq!(key, "path/to/");
    }

    #[test]
    fn test_parse_rm_path_bucket_only() {
        let (alias, bucket, key) = parse_rm_path("myalias/mybucket").unwrap();
        assert_eq!(alias, "myalias");
        assert_eq!(bucket, "mybucket");
        assert_eq!(key, "");
    }

    #[test]
    fn test_parse_rm_path_no_bucket() {
        assert!(parse_rm_path("myalias").is_err());
    }

    #[test]
    fn test_parse_rm_path_empty() {
        assert!(parse_rm_path("").is_err());
    }
}
