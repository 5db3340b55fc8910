use std::io::{ErrorKind, Read, Write};

use anyhow::ensure;

use crate::error::VfsError;

/// `read_exact` that reports a short stream as [VfsError::TruncatedRead].
pub fn read_full(mut reader: impl Read, buf: &mut [u8]) -> anyhow::Result<()> {
    let expected = buf.len() as u64;
    let mut filled = 0;

    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }

    ensure!(
        filled == buf.len(),
        VfsError::TruncatedRead {
            expected,
            actual: filled as u64
        }
    );

    Ok(())
}

/// Copies exactly `len` bytes into `out`, never allocating more than the
/// stream actually delivers.
pub fn read_bytes(reader: impl Read, len: u64, out: &mut Vec<u8>) -> anyhow::Result<()> {
    let copied = std::io::copy(&mut reader.take(len), out)?;
    ensure!(
        copied == len,
        VfsError::TruncatedRead {
            expected: len,
            actual: copied
        }
    );

    Ok(())
}

pub fn read_u32(reader: impl Read) -> anyhow::Result<u32> {
    let mut buf = [0u8; 4];
    read_full(reader, &mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub fn write_u32(mut writer: impl Write, value: u32) -> anyhow::Result<()> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

/// Narrows a count, length or offset to the on-disk u32.
pub fn to_u32(value: u64, what: &'static str) -> anyhow::Result<u32> {
    u32::try_from(value).map_err(|_| VfsError::ValueOutOfRange { what, value }.into())
}

pub fn read_string(mut reader: impl Read) -> anyhow::Result<String> {
    let len = read_u32(&mut reader)?;

    let mut bytes = vec![];
    read_bytes(&mut reader, len as u64, &mut bytes)?;

    ensure!(
        bytes.is_ascii(),
        VfsError::Encoding(String::from_utf8_lossy(&bytes).into_owned())
    );

    // ascii is always valid utf-8
    Ok(String::from_utf8(bytes)?)
}

pub fn write_string(mut writer: impl Write, s: &str) -> anyhow::Result<()> {
    ensure!(s.is_ascii(), VfsError::Encoding(s.to_owned()));

    write_u32(&mut writer, to_u32(s.len() as u64, "string length")?)?;
    writer.write_all(s.as_bytes())?;
    Ok(())
}
