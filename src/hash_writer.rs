use std::io::{self, Write};

use hex::ToHex;
use sha2::{Digest, Sha256};

/// Hashing tee writer.
///
/// Forwards every byte to the inner writer and feeds the same bytes into a
/// SHA-256 hasher, so a single pass yields both the output and its digest.
pub struct HashWriter<W: Write> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> HashWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    /// Consumes the writer, returning the inner writer and the lowercase hex digest.
    pub fn finish(self) -> (W, String) {
        (self.inner, self.hasher.finalize().encode_hex())
    }
}

impl<W: Write> Write for HashWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        // Only hash what the inner writer accepted
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
