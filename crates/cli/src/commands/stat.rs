//! stat command - Show object metadata
//!
//! Displays detailed metadata information about an object, including the
//! content hash recorded at upload time.

use clap::Args;
use osc_core::{parse_path, ObjectStore as _, ParsedPath};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Show object metadata
#[derive(Args, Debug)]
pub struct StatArgs {
    /// Object path (alias/bucket/key)
    pub path: String,
}

/// Execute the stat command
pub async fn execute(args: StatArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match parse_path(&args.path) {
        Ok(ParsedPath::Remote(p)) if !p.key.is_empty() => p,
        Ok(_) => {
            formatter.error("stat requires a remote object path (alias/bucket/key)");
            return ExitCode::UsageError;
        }
        Err(e) => {
            formatter.error(&format!("Invalid path: {e}"));
            return ExitCode::UsageError;
        }
    };

    let client = match super::make_client(&path.alias, &formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client.head_object(&path).await {
        Ok(info) => {
            if formatter.is_json() {
                formatter.json(&info);
            } else {
                formatter.println(&format!("Name      : {}", info.key));
                formatter.println(&format!(
                    "Size      : {}",
                    info.size_human.as_deref().unwrap_or("0 B")
                ));
                if let Some(date) = info.last_modified {
                    formatter.println(&format!(
                        "Modified  : {}",
                        date.strftime("%Y-%m-%d %H:%M:%S")
                    ));
                }
                if let Some(etag) = &info.etag {
                    formatter.println(&format!("ETag      : {etag}"));
                }
                if let Some(md5) = &info.content_md5 {
                    formatter.println(&format!("Hash      : {md5}"));
                }
                if let Some(ct) = &info.content_type {
                    formatter.println(&format!("Type      : {ct}"));
                }
                if let Some(sc) = &info.storage_class {
                    formatter.println(&format!("Class     : {sc}"));
                }
            }
            ExitCode::Success
        }
        Err(osc_core::Error::NotFound(_)) => {
            formatter.error(&format!("Object not found: {}", args.path));
            ExitCode::NotFound
        }
        Err(e) => {
            formatter.error(&format!("Failed to stat {}: {e}", args.path));
            ExitCode::from_error(&e)
        }
    }
}
