//! restore command - Restore archived objects
//!
//! Issues restore requests for objects in archive storage classes, singly
//! or across a prefix.

use clap::Args;
use osc_core::traits::{RestoreRequest, RestoreTier};
use osc_core::{parse_path, ListOptions, ObjectStore as _, ParsedPath};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Restore archived objects
#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Object path (alias/bucket/key or alias/bucket/prefix/ with -r)
    pub path: String,

    /// Restore every object under the prefix
    #[arg(short, long)]
    pub recursive: bool,

    /// Days the restored copy stays available
    #[arg(long, default_value = "30")]
    pub days: i32,

    /// Restore tier: expedited, standard, or bulk
    #[arg(long, default_value = "standard")]
    pub tier: String,
}

#[derive(Debug, Serialize)]
struct RestoreOutput {
    status: &'static str,
    restored: usize,
    failed: usize,
}

fn parse_tier(raw: &str) -> Option<RestoreTier> {
    match raw.to_ascii_lowercase().as_str() {
        "expedited" => Some(RestoreTier::Expedited),
        "standard" => Some(RestoreTier::Standard),
        "bulk" => Some(RestoreTier::Bulk),
        _ => None,
    }
}

/// Execute the restore command
pub async fn execute(args: RestoreArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match parse_path(&args.path) {
        Ok(ParsedPath::Remote(p)) => p,
        Ok(_) => {
            formatter.error("restore requires a remote path (alias/bucket/key)");
            return ExitCode::UsageError;
        }
        Err(e) => {
            formatter.error(&format!("Invalid path: {e}"));
            return ExitCode::UsageError;
        }
    };

    let Some(tier) = parse_tier(&args.tier) else {
        formatter.error(&format!(
            "Invalid tier '{}'. Expected: expedited, standard, or bulk",
            args.tier
        ));
        return ExitCode::UsageError;
    };
    let request = RestoreRequest {
        days: args.days,
        tier,
    };

    let client = match super::make_client(&path.alias, &formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    if !args.recursive && !path.is_dir {
        return match client.restore_object(&path, &request).await {
            Ok(()) => {
                formatter.success(&format!("Restore requested for {}", args.path));
                ExitCode::Success
            }
            Err(osc_core::Error::NotFound(_)) => {
                formatter.error(&format!("Object not found: {}", args.path));
                ExitCode::NotFound
            }
            Err(e) => {
                formatter.error(&format!("Failed to restore {}: {e}", args.path));
                ExitCode::from_error(&e)
            }
        };
    }

    // prefix restore: walk the listing and restore object by object
    let mut restored = 0usize;
    let mut failed = 0usize;
    let mut marker: Option<String> = None;
    loop {
        let options = ListOptions {
            recursive: true,
            max_keys: Some(1000),
            marker: marker.clone(),
            ..Default::default()
        };
        let page = match client.list_objects(&path, options).await {
            Ok(page) => page,
            Err(e) => {
                formatter.error(&format!("Failed to list objects: {e}"));
                return ExitCode::from_error(&e);
            }
        };

        for item in &page.items {
            if item.is_dir {
                continue;
            }
            let target = path.with_key(item.key.clone());
            match client.restore_object(&target, &request).await {
                Ok(()) => {
                    formatter.println(&format!("Restore requested: {}", item.key));
                    restored += 1;
                }
                Err(e) => {
                    formatter.error(&format!("Failed to restore {}: {e}", item.key));
                    failed += 1;
                }
            }
        }

        if page.truncated {
            marker = page.next_marker;
        } else {
            break;
        }
    }

    if formatter.is_json() {
        formatter.json(&RestoreOutput {
            status: if failed == 0 { "success" } else { "partial" },
            restored,
            failed,
        });
    } else {
        formatter.println(&format!("{restored} restores requested, {failed} failed"));
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
    fn test_parse_tier() {
        assert_eq!(parse_tier("standard"), Some(RestoreTier::Standard));
        assert_eq!(parse_tier("Expedited"), Some(RestoreTier::Expedited));
        assert_eq!(parse_tier("BULK"), Some(RestoreTier::Bulk));
        assert!(parse_tier("fast").is_none());
    }
}
