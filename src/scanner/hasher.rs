//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//!
//! [`Hasher`] streams a file through BLAKE3 in fixed-size chunks so memory
//! use stays flat regardless of file size. The result carries the number of
//! bytes actually read, letting callers compare it with the size recorded at
//! enumeration time.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use super::HashError;

/// Length of a hex-encoded BLAKE3 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Default read buffer size (64 KiB).
const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Result of digesting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestOutcome {
    /// Lowercase hex digest of the full content
    pub digest: String,
    /// Bytes streamed through the hasher
    pub bytes_read: u64,
}

impl DigestOutcome {
    /// Whether the bytes read differ from `declared` size.
    #[must_use]
    pub fn size_mismatch(&self, declared: u64) -> bool {
        self.bytes_read != declared
    }
}

/// Streaming content hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    buffer_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default buffer size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Use a custom read buffer size (minimum 1 byte).
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Digest the full content of the file at `path`.
    ///
    /// The file handle is dropped before this returns, on success and on
    /// every error path.
    ///
    /// # Errors
    ///
    /// - [`HashError::Open`] if the file cannot be opened
    /// - [`HashError::Read`] if reading fails partway through
    pub fn digest(&self, path: &Path) -> Result<DigestOutcome, HashError> {
        let file = File::open(path).map_err(|source| HashError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        self.digest_reader(file).map_err(|source| HashError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Digest everything `reader` yields.
    ///
    /// # Errors
    ///
    /// Returns the first non-interrupt I/O error from `reader`.
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> io::Result<DigestOutcome> {
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; self.buffer_size];
        let mut bytes_read = 0u64;

        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..n]);
            bytes_read += n as u64;
        }

        Ok(DigestOutcome {
            digest: hasher.finalize().to_hex().to_string(),
            bytes_read,
        })
    }
}
