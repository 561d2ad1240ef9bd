//! probe command - Upload/download/delete round-trip health check
//!
//! Uploads a scratch object through the transfer engine, downloads it back,
//! verifies the content hash, and deletes it, reporting per-step timings.

use std::time::Instant;

use clap::Args;
use osc_core::{hash, ObjectMeta, ObjectStore as _, RemotePath, TransferOptions, TransferStatus};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::mb::parse_bucket_path;

/// Scratch object key used by the probe
const PROBE_KEY: &str = ".osc-probe/probe.bin";

/// Run an upload/download/delete health check against a bucket
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Bucket path (alias/bucket)
    pub path: String,

    /// Size of the scratch object in MiB
    #[arg(long, default_value = "1")]
    pub size: u64,
}

#[derive(Debug, Serialize)]
struct ProbeOutput {
    status: &'static str,
    size_bytes: u64,
    upload_ms: u128,
    download_ms: u128,
    hash_ok: bool,
}

/// Execute the probe command
pub async fn execute(args: ProbeArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let Some((alias_name, bucket)) = parse_bucket_path(&args.path) else {
        formatter.error(&format!(
            "Invalid path format: '{}'. Expected: alias/bucket",
            args.path
        ));
        return ExitCode::UsageError;
    };

    let engine = match super::make_engine(&alias_name, &output_config, None, None, &formatter).await
    {
        Ok(engine) => engine,
        Err(code) => return code,
    };

    let size_bytes = args.size.max(1) * 1024 * 1024;
    let scratch = std::env::temp_dir().join(format!("osc-probe-{}", std::process::id()));
    if let Err(e) = std::fs::create_dir_all(&scratch) {
        formatter.error(&format!("Cannot create scratch directory: {e}"));
        return ExitCode::GeneralError;
    }
    let local_up = scratch.join("probe.bin");
    let local_down = scratch.join("probe-down.bin");

    let payload: Vec<u8> = (0..size_bytes).map(|i| (i % 251) as u8).collect();
    if let Err(e) = std::fs::write(&local_up, &payload) {
        formatter.error(&format!("Cannot write scratch file: {e}"));
        return ExitCode::GeneralError;
    }

    let target = RemotePath::new(&alias_name, &bucket, PROBE_KEY);
    let opts = TransferOptions {
        force: true,
        ..Default::default()
    };

    let upload_started = Instant::now();
    match engine
        .upload_file(&local_up, &target, &ObjectMeta::default(), &opts)
        .await
    {
        Ok(TransferStatus::Done) => {}
        Ok(_) => {
            formatter.error("Probe upload did not complete");
            return ExitCode::GeneralError;
        }
        Err(e) => {
            formatter.error(&format!("Probe upload failed: {e}"));
            return ExitCode::from_error(&e);
        }
    }
    let upload_ms = upload_started.elapsed().as_millis();

    let download_started = Instant::now();
    match engine.download_file(&target, &local_down, &opts).await {
        Ok(TransferStatus::Done) => {}
        Ok(_) => {
            formatter.error("Probe download did not complete");
            return ExitCode::GeneralError;
        }
        Err(e) => {
            formatter.error(&format!("Probe download failed: {e}"));
            return ExitCode::from_error(&e);
        }
    }
    let download_ms = download_started.elapsed().as_millis();

    let hash_ok = match (hash::file_md5(&local_up), hash::file_md5(&local_down)) {
        (Ok(a), Ok(b)) => hash::digests_equal(&a, &b),
        _ => false,
    };

    // best-effort cleanup of the scratch object and local files
    if let Err(e) = engine.store().delete_object(&target, None).await {
        formatter.warning(&format!("Could not delete probe object: {e}"));
    }
    let _ = std::fs::remove_dir_all(&scratch);

    if formatter.is_json() {
        formatter.json(&ProbeOutput {
            status: if hash_ok { "success" } else { "corrupt" },
            size_bytes,
            upload_ms,
            download_ms,
            hash_ok,
        });
    } else {
        formatter.println(&format!(
            "Probe of {} with {} payload:",
            args.path,
            humansize::format_size(size_bytes, humansize::BINARY)
        ));
        formatter.println(&format!("  upload   : {upload_ms} ms"));
        formatter.println(&format!("  download : {download_ms} ms"));
        formatter.println(&format!(
            "  integrity: {}",
            if hash_ok { "ok" } else { "MISMATCH" }
        ));
    }

    if hash_ok {
        ExitCode::Success
    } else {
        ExitCode::GeneralError
    }
}
