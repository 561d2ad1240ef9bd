//! parts command - Inspect and abort in-progress multipart uploads
//!
//! Interrupted multipart uploads keep their parts on the remote until they
//! are completed or aborted; this command lists and reclaims them.

use clap::{Args, Subcommand};
use comfy_table::{presets, Table};
use osc_core::{Confirm as _, ObjectStore as _, RemotePath};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};
use crate::prompt::StdinConfirm;

/// Multipart upload subcommands
#[derive(Subcommand, Debug)]
pub enum PartsCommands {
    /// List in-progress multipart uploads (or the parts of one upload)
    List(ListArgs),

    /// Abort in-progress multipart uploads
    Abort(AbortArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Remote path (alias/bucket[/prefix])
    pub path: String,

    /// Show the uploaded parts of one specific upload id
    #[arg(long)]
    pub upload_id: Option<String>,
}

#[derive(Args, Debug)]
pub struct AbortArgs {
    /// Remote path (alias/bucket[/prefix])
    pub path: String,

    /// Abort only this upload id (otherwise every upload under the prefix)
    #[arg(long)]
    pub upload_id: Option<String>,

    /// Abort without confirmation
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct AbortOutput {
    status: &'static str,
    aborted: usize,
    failed: usize,
}

/// Execute a parts subcommand
pub async fn execute(cmd: PartsCommands, output_config: OutputConfig) -> ExitCode {
    match cmd {
        PartsCommands::List(args) => list(args, output_config).await,
        PartsCommands::Abort(args) => abort(args, output_config).await,
    }
}

fn parse_parts_path(path: &str, formatter: &Formatter) -> Option<RemotePath> {
    let parts: Vec<&str> = path.splitn(3, '/').collect();
    if parts.len() < 2 || parts[1].is_empty() {
        formatter.error(&format!(
            "Invalid path format: '{path}'. Expected: alias/bucket[/prefix]"
        ));
        return None;
    }
    Some(RemotePath::new(
        parts[0],
        parts[1],
        parts.get(2).copied().unwrap_or(""),
    ))
}

async fn list(args: ListArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let Some(path) = parse_parts_path(&args.path, &formatter) else {
        return ExitCode::UsageError;
    };

    let client = match super::make_client(&path.alias, &formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Some(upload_id) = &args.upload_id {
        return list_upload_parts(&client, &path, upload_id, &formatter).await;
    }

    let mut uploads = Vec::new();
    let mut key_marker: Option<String> = None;
    let mut upload_id_marker: Option<String> = None;
    loop {
        match client
            .list_multipart_uploads(&path, key_marker.clone(), upload_id_marker.clone())
            .await
        {
            Ok(page) => {
                uploads.extend(page.uploads);
                if page.truncated {
                    key_marker = page.next_key_marker;
                    upload_id_marker = page.next_upload_id_marker;
                } else {
                    break;
                }
            }
            Err(e) => {
                formatter.error(&format!("Failed to list multipart uploads: {e}"));
                return ExitCode::from_error(&e);
            }
        }
    }

    if formatter.is_json() {
        formatter.json(&uploads);
    } else if uploads.is_empty() {
        formatter.println("No in-progress multipart uploads.");
    } else {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_BORDERS_ONLY);
        table.set_header(["Key", "Upload ID", "Initiated"]);
        for upload in &uploads {
            table.add_row([
                upload.key.clone(),
                upload.upload_id.clone(),
                upload
                    .initiated
                    .map(|t| t.strftime("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ]);
        }
        formatter.println(&table.to_string());
    }
    ExitCode::Success
}

async fn list_upload_parts(
    client: &osc_s3::S3Client,
    path: &RemotePath,
    upload_id: &str,
    formatter: &Formatter,
) -> ExitCode {
    let mut parts = Vec::new();
    let mut marker: Option<String> = None;
    loop {
        match client.list_parts(path, upload_id, marker.clone()).await {
            Ok(page) => {
                parts.extend(page.parts);
                if page.truncated {
                    marker = page.next_part_number_marker;
                } else {
                    break;
                }
            }
            Err(e) => {
                formatter.error(&format!("Failed to list parts of {upload_id}: {e}"));
                return ExitCode::from_error(&e);
            }
        }
    }

    if formatter.is_json() {
        formatter.json(&parts);
    } else if parts.is_empty() {
        formatter.println("No parts uploaded yet.");
    } else {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_BORDERS_ONLY);
        table.set_header(["Part", "ETag", "Size"]);
        for part in &parts {
            table.add_row([
                part.part_number.to_string(),
                part.etag.clone(),
                part.size_bytes
                    .map(|s| humansize::format_size(s.max(0) as u64, humansize::BINARY))
                    .unwrap_or_else(|| "-".to_string()),
            ]);
        }
        formatter.println(&table.to_string());
    }
    ExitCode::Success
}

async fn abort(args: AbortArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());
    let Some(path) = parse_parts_path(&args.path, &formatter) else {
        return ExitCode::UsageError;
    };

    let client = match super::make_client(&path.alias, &formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    if !args.force {
        let confirm = StdinConfirm::new(!output_config.no_color && !output_config.json);
        let question = format!(
            "WARN: aborting discards all uploaded parts under '{}', please make sure",
            args.path
        );
        if !confirm.confirm(&question, false) {
            return ExitCode::Interrupted;
        }
    }

    // Abort one specific upload directly
    if let Some(upload_id) = &args.upload_id {
        return match client.abort_multipart_upload(&path, upload_id).await {
            Ok(()) => {
                formatter.success(&format!("Aborted upload {upload_id}"));
                ExitCode::Success
            }
            Err(e) => {
                formatter.error(&format!("Failed to abort upload {upload_id}: {e}"));
                ExitCode::from_error(&e)
            }
        };
    }

    let mut aborted = 0usize;
    let mut failed = 0usize;
    let mut key_marker: Option<String> = None;
    let mut upload_id_marker: Option<String> = None;
    loop {
        let page = match client
            .list_multipart_uploads(&path, key_marker.clone(), upload_id_marker.clone())
            .await
        {
            Ok(page) => page,
            Err(e) => {
                formatter.error(&format!("Failed to list multipart uploads: {e}"));
                return ExitCode::from_error(&e);
            }
        };

        for upload in &page.uploads {
            let target = path.with_key(upload.key.clone());
            match client
                .abort_multipart_upload(&target, &upload.upload_id)
                .await
            {
                Ok(()) => {
                    formatter.println(&format!(
                        "Aborted key: {}, uploadId: {}",
                        upload.key, upload.upload_id
                    ));
                    aborted += 1;
                }
                Err(e) => {
                    formatter.error(&format!(
                        "Failed to abort key: {}, uploadId: {}: {e}",
                        upload.key, upload.upload_id
                    ));
                    failed += 1;
                }
            }
        }

        if page.truncated {
            key_marker = page.next_key_marker;
            upload_id_marker = page.next_upload_id_marker;
        } else {
            break;
        }
    }

    if formatter.is_json() {
        formatter.json(&AbortOutput {
            status: if failed == 0 { "success" } else { "partial" },
            aborted,
            failed,
        });
    } else {
        formatter.println(&format!("{aborted} uploads aborted, {failed} failed"));
    }

    if failed == 0 {
        ExitCode::Success
    } else {
        ExitCode::GeneralError
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parts_path() {
        let formatter = Formatter::default();
        let path = parse_parts_path("minio/bucket/prefix/", &formatter).unwrap();
        assert_eq!(path.alias, "minio");
        assert_eq!(path.bucket, "bucket");
        assert_eq!(path.key, "prefix/");

        assert!(parse_parts_path("minio", &formatter).is_none());
    }
}
