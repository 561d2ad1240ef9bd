//! mv command - Move objects
//!
//! Moves objects between remote locations (copy + delete source). Local
//! transfers belong to cp.

use clap::Args;
use osc_core::{parse_path, CopyMode, ParsedPath};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::cp::{self, CpArgs};

/// Move objects between remote locations
#[derive(Args, Debug)]
pub struct MvArgs {
    /// Source path (alias/bucket/key or alias/bucket/prefix/)
    pub source: String,

    /// Destination path (alias/bucket/key or alias/bucket/prefix/)
    pub target: String,

    /// Move prefixes recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Overwrite without sync comparison
    #[arg(short, long)]
    pub force: bool,

    /// Skip destinations already identical by size + content hash
    #[arg(long)]
    pub sync: bool,

    /// Compare by size only; skip content hash computation
    #[arg(long)]
    pub skip_hash: bool,

    /// Only move paths matching these globs
    #[arg(long)]
    pub include: Vec<String>,

    /// Skip paths matching these globs
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Part size in MiB for multipart copies
    #[arg(long)]
    pub part_size: Option<u64>,

    /// Concurrent transfer workers
    #[arg(long)]
    pub threads: Option<usize>,

    /// Storage class for the destination
    #[arg(long)]
    pub storage_class: Option<String>,
}

impl MvArgs {
    fn to_cp_args(&self) -> CpArgs {
        CpArgs {
            source: self.source.clone(),
            target: self.target.clone(),
            recursive: self.recursive,
            force: self.force,
            sync: self.sync,
            delete: false,
            skip_hash: self.skip_hash,
            include: self.include.clone(),
            ignore: self.ignore.clone(),
            part_size: self.part_size,
            threads: self.threads,
            storage_class: self.storage_class.clone(),
            content_type: None,
            metadata: vec![],
        }
    }
}

/// Execute the mv command
pub async fn execute(args: MvArgs, output_config: OutputConfig) -> ExitCode {
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

    let (ParsedPath::Remote(src), ParsedPath::Remote(dst)) = (&source, &target) else {
        formatter.error("mv moves objects between remote locations. Use cp for local transfers.");
        return ExitCode::UsageError;
    };

    let cp_args = args.to_cp_args();
    match cp::copy_between(src, dst, &cp_args, &output_config, &formatter, CopyMode::Move).await {
        Ok(code) => code,
        Err(code) => code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_cp_args_carries_flags() {
        let args = MvArgs {
            source: "a/b/c".into(),
            target: "a/b/d".into(),
            recursive: true,
            force: true,
            sync: true,
            skip_hash: true,
            include: vec!["*.log".into()],
            ignore: vec![],
            part_size: Some(8),
            threads: Some(2),
            storage_class: None,
        };
        let cp_args = args.to_cp_args();
        assert!(cp_args.recursive);
        assert!(cp_args.force);
        assert!(cp_args.sync);
        assert!(!cp_args.delete);
        assert_eq!(cp_args.part_size, Some(8));
        assert_eq!(cp_args.include, vec!["*.log".to_string()]);
    }
}
