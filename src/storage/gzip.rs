//! Gzip helpers for blob payloads.

use crate::error::{Error, Result};
use flate2::read::{GzDecoder, GzEncoder};
use flate2::Compression;
use std::io::Read;

/// Gzip-compress a payload.
pub fn compress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzEncoder::new(bytes, Compression::default())
        .read_to_end(&mut out)
        .map_err(|e| Error::Internal(anyhow::anyhow!("gzip compression failed: {e}")))?;
    Ok(out)
}

/// Decompress a gzip payload.
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut out)
        .map_err(|e| Error::Internal(anyhow::anyhow!("gzip decompression failed: {e}")))?;
    Ok(out)
}
