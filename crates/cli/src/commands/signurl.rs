//! signurl command - Generate a presigned download URL

use clap::Args;
use osc_core::{parse_path, ObjectStore as _, ParsedPath};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Generate a presigned download URL
#[derive(Args, Debug)]
pub struct SignurlArgs {
    /// Object path (alias/bucket/key)
    pub path: String,

    /// URL validity in seconds
    #[arg(long, default_value = "10000")]
    pub expires: u64,
}

#[derive(Debug, Serialize)]
struct SignurlOutput {
    url: String,
    expires_secs: u64,
}

/// Execute the signurl command
pub async fn execute(args: SignurlArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match parse_path(&args.path) {
        Ok(ParsedPath::Remote(p)) if !p.key.is_empty() => p,
        Ok(_) => {
            formatter.error("signurl requires a remote object path (alias/bucket/key)");
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

    match client.presign_get(&path, args.expires).await {
        Ok(url) => {
            if formatter.is_json() {
                formatter.json(&SignurlOutput {
                    url,
                    expires_secs: args.expires,
                });
            } else {
                formatter.println(&url);
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to presign {}: {e}", args.path));
            ExitCode::from_error(&e)
        }
    }
}
