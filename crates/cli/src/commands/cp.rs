//! cp command - Copy objects
//!
//! Copies objects between the local filesystem and remote storage, or
//! between remote locations, through the transfer engine. Handles sync
//! mode, include/ignore filtering, and resumable multipart transfers.

use std::path::Path;

use clap::Args;
use osc_core::{
    parse_path, CopyMode, Error, ObjectMeta, ParsedPath, RemotePath, TransferCounts,
    TransferManager, TransferOptions, TransferStatus,
};
use osc_s3::S3Client;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Copy objects
#[derive(Args, Debug)]
pub struct CpArgs {
    /// Source path (local path or alias/bucket/key)
    pub source: String,

    /// Destination path (local path or alias/bucket/key)
    pub target: String,

    /// Copy directories/prefixes recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Overwrite without sync comparison and ignore resume records
    #[arg(short, long)]
    pub force: bool,

    /// Skip destinations already identical by size + content hash
    #[arg(long)]
    pub sync: bool,

    /// With --sync: delete destination entries absent from the source
    #[arg(long, requires = "sync")]
    pub delete: bool,

    /// Compare by size only; skip content hash computation
    #[arg(long)]
    pub skip_hash: bool,

    /// Only transfer paths matching these globs
    #[arg(long)]
    pub include: Vec<String>,

    /// Skip paths matching these globs
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Part size in MiB for multipart transfers
    #[arg(long)]
    pub part_size: Option<u64>,

    /// Concurrent transfer workers
    #[arg(long)]
    pub threads: Option<usize>,

    /// Storage class for the destination
    #[arg(long)]
    pub storage_class: Option<String>,

    /// Content type for uploaded objects
    #[arg(long)]
    pub content_type: Option<String>,

    /// Additional user metadata (repeatable), e.g. --meta owner=ops
    #[arg(long = "meta", value_name = "KEY=VALUE")]
    pub metadata: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CpOutput {
    status: &'static str,
    source: String,
    target: String,
}

#[derive(Debug, Serialize)]
struct CpTreeOutput {
    status: &'static str,
    source: String,
    target: String,
    succeeded: usize,
    skipped: usize,
    failed: usize,
}

/// Execute the cp command
pub async fn execute(args: CpArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let source = match parse_path(&args.source) {
        Ok(p) => p,
        Err(e) => {
            formatter.error(&format!("Invalid source path: {e}"));
            return ExitCode::UsageError;
        }
    };
    let target = match parse_path(&args.target) {
        Ok(p) => p,
        Err(e) => {
            formatter.error(&format!("Invalid target path: {e}"));
            return ExitCode::UsageError;
        }
    };

    match (&source, &target) {
        (ParsedPath::Local(src), ParsedPath::Remote(dst)) => {
            upload(src, dst, &args, &output_config, &formatter).await
        }
        (ParsedPath::Remote(src), ParsedPath::Local(dst)) => {
            download(src, dst, &args, &output_config, &formatter).await
        }
        (ParsedPath::Remote(src), ParsedPath::Remote(dst)) => {
            remote_copy(src, dst, &args, &output_config, &formatter).await
        }
        (ParsedPath::Local(_), ParsedPath::Local(_)) => {
            formatter.error("Cannot copy between two local paths. Use system cp command.");
            ExitCode::UsageError
        }
    }
}

pub(crate) fn transfer_options(args: &CpArgs) -> TransferOptions {
    TransferOptions {
        force: args.force,
        sync: args.sync,
        delete: args.delete,
        skip_hash: args.skip_hash,
        include: args.include.clone(),
        ignore: args.ignore.clone(),
    }
}

/// Parse --meta pairs and the content-type/storage-class flags
fn object_meta(args: &CpArgs, guess_from: Option<&Path>) -> Result<ObjectMeta, String> {
    let mut meta = ObjectMeta {
        storage_class: args.storage_class.clone(),
        content_type: args.content_type.clone(),
        ..Default::default()
    };
    if meta.content_type.is_none() {
        if let Some(path) = guess_from {
            meta.content_type = mime_guess::from_path(path)
                .first()
                .map(|m| m.essence_str().to_string());
        }
    }
    for pair in &args.metadata {
        match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                meta.metadata.insert(key.to_string(), value.to_string());
            }
            _ => return Err(format!("Invalid --meta entry '{pair}', expected KEY=VALUE")),
        }
    }
    Ok(meta)
}

/// Destination key for a single-file transfer into a directory-like target
fn upload_key(dst: &RemotePath, src: &Path) -> String {
    if dst.key.is_empty() || dst.key.ends_with('/') {
        let filename = src.file_name().unwrap_or_default().to_string_lossy();
        format!("{}{}", dst.key, filename)
    } else {
        dst.key.clone()
    }
}

/// Destination path for a single-file download into a directory-like target
fn download_path(dst: &Path, src: &RemotePath) -> std::path::PathBuf {
    if dst.is_dir() || dst.to_string_lossy().ends_with('/') {
        let filename = src.key.rsplit('/').next().unwrap_or(&src.key);
        dst.join(filename)
    } else {
        dst.to_path_buf()
    }
}

async fn upload(
    src: &Path,
    dst: &RemotePath,
    args: &CpArgs,
    output_config: &OutputConfig,
    formatter: &Formatter,
) -> ExitCode {
    if !src.exists() {
        formatter.error(&format!("Source not found: {}", src.display()));
        return ExitCode::NotFound;
    }
    if src.is_dir() && !args.recursive {
        formatter.error("Source is a directory. Use -r/--recursive to copy directories.");
        return ExitCode::UsageError;
    }

    let engine = match super::make_engine(
        &dst.alias,
        output_config,
        args.part_size,
        args.threads,
        formatter,
    )
    .await
    {
        Ok(engine) => engine,
        Err(code) => return code,
    };
    let opts = transfer_options(args);

    if src.is_dir() {
        let meta = match object_meta(args, None) {
            Ok(meta) => meta,
            Err(e) => {
                formatter.error(&e);
                return ExitCode::UsageError;
            }
        };
        let result = engine.upload_tree(src, dst, &meta, &opts).await;
        report_tree(result, &args.source, &args.target, formatter)
    } else {
        let meta = match object_meta(args, Some(src)) {
            Ok(meta) => meta,
            Err(e) => {
                formatter.error(&e);
                return ExitCode::UsageError;
            }
        };
        let target = dst.with_key(upload_key(dst, src));
        let result = engine.upload_file(src, &target, &meta, &opts).await;
        report_single(result, &args.source, &target.to_string(), formatter)
    }
}

async fn download(
    src: &RemotePath,
    dst: &Path,
    args: &CpArgs,
    output_config: &OutputConfig,
    formatter: &Formatter,
) -> ExitCode {
    let engine = match super::make_engine(
        &src.alias,
        output_config,
        args.part_size,
        args.threads,
        formatter,
    )
    .await
    {
        Ok(engine) => engine,
        Err(code) => return code,
    };
    let opts = transfer_options(args);

    if src.is_dir || args.recursive {
        let result = engine.download_tree(src, dst, &opts).await;
        report_tree(result, &args.source, &args.target, formatter)
    } else {
        let target = download_path(dst, src);
        let result = engine.download_file(src, &target, &opts).await;
        report_single(result, &args.source, &target.display().to_string(), formatter)
    }
}

async fn remote_copy(
    src: &RemotePath,
    dst: &RemotePath,
    args: &CpArgs,
    output_config: &OutputConfig,
    formatter: &Formatter,
) -> ExitCode {
    match copy_between(src, dst, args, output_config, formatter, CopyMode::Copy).await {
        Ok(code) => code,
        Err(code) => code,
    }
}

/// Shared by cp and mv; mv passes CopyMode::Move
pub(crate) async fn copy_between(
    src: &RemotePath,
    dst: &RemotePath,
    args: &CpArgs,
    output_config: &OutputConfig,
    formatter: &Formatter,
    mode: CopyMode,
) -> Result<ExitCode, ExitCode> {
    if src.alias != dst.alias {
        formatter.error("Cross-alias copies are not supported. Use download + upload.");
        return Err(ExitCode::UnsupportedFeature);
    }

    let engine: TransferManager<S3Client> = super::make_engine(
        &src.alias,
        output_config,
        args.part_size,
        args.threads,
        formatter,
    )
    .await?;
    let opts = transfer_options(args);
    let meta = match object_meta(args, None) {
        Ok(meta) => meta,
        Err(e) => {
            formatter.error(&e);
            return Err(ExitCode::UsageError);
        }
    };

    if src.is_dir || args.recursive {
        let result = engine.copy_tree(src, dst, &meta, &opts, mode).await;
        Ok(report_tree(result, &args.source, &args.target, formatter))
    } else {
        let target = if dst.is_dir {
            let filename = src.key.rsplit('/').next().unwrap_or(&src.key);
            dst.join(filename)
        } else {
            dst.clone()
        };
        let result = engine.copy_file(src, &target, &meta, &opts, mode).await;
        Ok(report_single(
            result,
            &args.source,
            &target.to_string(),
            formatter,
        ))
    }
}

fn report_single(
    result: osc_core::Result<TransferStatus>,
    source: &str,
    target: &str,
    formatter: &Formatter,
) -> ExitCode {
    match result {
        Ok(TransferStatus::Done) => {
            if formatter.is_json() {
                formatter.json(&CpOutput {
                    status: "success",
                    source: source.to_string(),
                    target: target.to_string(),
                });
            } else {
                formatter.println(&format!("{source} -> {target}"));
            }
            ExitCode::Success
        }
        Ok(TransferStatus::Skipped) => {
            if formatter.is_json() {
                formatter.json(&CpOutput {
                    status: "skipped",
                    source: source.to_string(),
                    target: target.to_string(),
                });
            } else {
                formatter.println(&format!("Skipped {source} (already current)"));
            }
            ExitCode::Success
        }
        Ok(TransferStatus::Failed) => {
            formatter.error(&format!("Failed to transfer {source} -> {target}"));
            ExitCode::GeneralError
        }
        Err(Error::Cancelled) => ExitCode::Interrupted,
        Err(e) => {
            formatter.error(&format!("Failed to transfer {source}: {e}"));
            ExitCode::from_error(&e)
        }
    }
}

fn report_tree(
    result: osc_core::Result<TransferCounts>,
    source: &str,
    target: &str,
    formatter: &Formatter,
) -> ExitCode {
    match result {
        Ok(counts) => {
            if formatter.is_json() {
                formatter.json(&CpTreeOutput {
                    status: if counts.all_ok() { "success" } else { "partial" },
                    source: source.to_string(),
                    target: target.to_string(),
                    succeeded: counts.succeeded,
                    skipped: counts.skipped,
                    failed: counts.failed,
                });
            } else if counts.all_ok() {
                formatter.success(&format!(
                    "{} transferred, {} skipped.",
                    counts.succeeded, counts.skipped
                ));
            } else {
                formatter.warning(&format!(
                    "Completed with errors: {} transferred, {} skipped, {} failed.",
                    counts.succeeded, counts.skipped, counts.failed
                ));
            }
            if counts.all_ok() {
                ExitCode::Success
            } else {
                ExitCode::GeneralError
            }
        }
        Err(Error::Cancelled) => ExitCode::Interrupted,
        Err(e) => {
            formatter.error(&format!("Failed to transfer {source} -> {target}: {e}"));
            ExitCode::from_error(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(metadata: Vec<String>) -> CpArgs {
        CpArgs {
            source: "a".into(),
            target: "b".into(),
            recursive: false,
            force: false,
            sync: false,
            delete: false,
            skip_hash: false,
            include: vec![],
            ignore: vec![],
            part_size: None,
            threads: None,
            storage_class: None,
            content_type: None,
            metadata,
        }
    }

    #[test]
    fn test_object_meta_parses_pairs() {
        let meta = object_meta(&args(vec!["owner=ops".into(), "tier=cold".into()]), None).unwrap();
        assert_eq!(meta.metadata.get("owner").map(String::as_str), Some("ops"));
        assert_eq!(meta.metadata.get("tier").map(String::as_str), Some("cold"));
    }

    #[test]
    fn test_object_meta_rejects_malformed_pairs() {
        assert!(object_meta(&args(vec!["broken".into()]), None).is_err());
        assert!(object_meta(&args(vec!["=value".into()]), None).is_err());
    }

    #[test]
    fn test_object_meta_guesses_content_type() {
        let meta = object_meta(&args(vec![]), Some(Path::new("photo.png"))).unwrap();
        assert_eq!(meta.content_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn test_upload_key_into_prefix() {
        let dst = RemotePath::new("minio", "bucket", "backup/");
        assert_eq!(upload_key(&dst, Path::new("/tmp/data.bin")), "backup/data.bin");

        let dst = RemotePath::new("minio", "bucket", "exact/name.bin");
        assert_eq!(upload_key(&dst, Path::new("/tmp/data.bin")), "exact/name.bin");
    }

    #[test]
    fn test_download_path_into_dir_suffix() {
        let src = RemotePath::new("minio", "bucket", "dir/file.txt");
        let path = download_path(Path::new("out/"), &src);
        assert_eq!(path, Path::new("out/file.txt"));

        let path = download_path(Path::new("out/renamed.txt"), &src);
        assert_eq!(path, Path::new("out/renamed.txt"));
    }

    #[test]
    fn test_parse_paths() {
        assert!(matches!(
            parse_path("./file.txt").unwrap(),
            ParsedPath::Local(_)
        ));
        assert!(matches!(
            parse_path("myalias/bucket/file.txt").unwrap(),
            ParsedPath::Remote(_)
        ));
    }
}
