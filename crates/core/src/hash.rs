//! Content hashing helpers
//!
//! MD5 is the comparison key the remote echoes back (part etags, and the
//! content hash we attach as object metadata for sync comparisons).

use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

/// Read buffer for streaming file hashes (1 MiB)
const HASH_BUF_SIZE: usize = 1024 * 1024;

/// Lowercase hex MD5 of a byte slice
pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

/// Lowercase hex MD5 of a file, streamed
pub fn file_md5(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut context = md5::Context::new();
    let mut buf = vec![0u8; HASH_BUF_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        context.consume(&buf[..n]);
    }
    Ok(format!("{:x}", context.compute()))
}

/// [`file_md5`] off the async runtime's worker threads
pub async fn file_md5_async(path: &Path) -> Result<String> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || file_md5(&path))
        .await
        .map_err(|e| Error::General(format!("hash task failed: {e}")))?
}

/// Case-insensitive hex digest comparison; remotes differ in casing
pub fn digests_equal(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
