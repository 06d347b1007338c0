//! Content identity hashing.
//!
//! SHA-256 over file bytes, independent of filename or path: the same bytes
//! always produce the same digest, which is the strong duplicate-detection
//! key for the upload route and the backfill pass.

use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Chunk size for streaming file reads.
const READ_CHUNK_BYTES: usize = 64 * 1024;

/// Incremental SHA-256 hasher producing a lowercase hex digest.
#[derive(Default)]
pub struct ContentHasher {
    inner: Sha256,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes.
    pub fn update(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    /// Consume the hasher and return the hex digest.
    pub fn finalize(self) -> String {
        hex::encode(self.inner.finalize())
    }
}

/// Hash a file on disk in bounded chunks.
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = ContentHasher::new();
    let mut buf = vec![0u8; READ_CHUNK_BYTES];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}
