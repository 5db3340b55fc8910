use std::io::{Read, Write};

use anyhow::ensure;
use flate2::Compression;

use super::primitive::to_u32;
use crate::error::VfsError;

/// Decodes a size-prefixed zlib payload. The output is capped one byte past
/// the declared size, so a lying prefix cannot make it balloon.
pub fn decompress_payload(data: &[u8], mut writer: impl Write) -> anyhow::Result<u64> {
    let (prefix, stream) = data.split_at_checked(4).ok_or_else(|| {
        VfsError::Decompression(format!("payload of {} bytes has no size prefix", data.len()))
    })?;

    let expected = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as u64;

    let mut decompressor = flate2::read::ZlibDecoder::new(stream).take(expected + 1);
    let copied = std::io::copy(&mut decompressor, &mut writer)
        .map_err(|e| VfsError::Decompression(e.to_string()))?;

    ensure!(
        copied == expected,
        VfsError::Decompression(format!(
            "size prefix says {expected} bytes, stream holds {}{copied}",
            if copied > expected { "more than " } else { "" }
        ))
    );

    Ok(copied)
}

/// Encodes `data` as a size-prefixed zlib payload appended to `writer`.
pub fn compress_payload(data: &[u8], level: Compression, mut writer: impl Write) -> anyhow::Result<u64> {
    let len = to_u32(data.len() as u64, "uncompressed size")?;
    writer.write_all(&len.to_le_bytes())?;

    let mut compressor = flate2::read::ZlibEncoder::new(data, level);
    let copied = std::io::copy(&mut compressor, &mut writer)?;

    Ok(4 + copied)
}
