//! Layout, all integers little-endian u32 unless noted:
//! - magic `VFS2`
//! - directory count, then that many [VfsDir] records (20 bytes each)
//! - file count, then that many [VfsFile] records (24 bytes each)
//! - absolute stream position where the blob ends, then the blob
//! - file count again, then the file names (u32 length + ascii bytes each)
//! - directory count again, then the directory names
//!
//! A file payload lives at `blob[offset..offset + size]`. For type 0 it is the
//! file contents, for any other type a u32 uncompressed length followed by a
//! zlib stream.

use bytes::Bytes;

mod container;
mod path;
mod payload;
mod primitive;
mod record;

pub use container::{read_vfs, write_vfs};
pub use path::resolve_file;
pub use payload::{compress_payload, decompress_payload};
pub use primitive::to_u32;
pub use record::{VfsDir, VfsFile};

pub const MAGIC: [u8; 4] = *b"VFS2";

/// Whole archive held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vfs {
    pub dirs: Vec<VfsDir>,
    pub files: Vec<VfsFile>,
    pub blob: Bytes,
    pub fnames: Vec<String>,
    pub dnames: Vec<String>,
}

impl Vfs {
    /// Payload bytes of `file` as stored, possibly compressed.
    pub fn payload(&self, file: &VfsFile) -> anyhow::Result<&[u8]> {
        let (start, end) = file.span();
        self.blob
            .get(start as usize..end as usize)
            .ok_or_else(|| {
                crate::error::VfsError::MalformedLength(format!(
                    "file {} spans {start}..{end} but the blob is {} bytes",
                    file.id.get(),
                    self.blob.len()
                ))
                .into()
            })
    }
}

/// `root/a.txt` raw, `root/sub/b.bin` zlib, `root/sub/c.dat` type 1.
/// File ids are deliberately out of table order.
#[cfg(test)]
pub(crate) fn sample() -> Vfs {
    use bytes::{BufMut, BytesMut};
    use flate2::Compression;

    let mut blob = BytesMut::new();

    blob.put_slice(b"plain text");
    let b_offset = blob.len();
    compress_payload(&b"zlib ".repeat(40), Compression::new(6), (&mut blob).writer()).unwrap();
    let c_offset = blob.len();
    compress_payload(b"type one", Compression::new(6), (&mut blob).writer()).unwrap();
    let end = blob.len();

    Vfs {
        dirs: vec![
            VfsDir::new(0xA0, 0, -1, -1, 0),
            VfsDir::new(0xA1, 1, 0, 0, 0),
        ],
        files: vec![
            VfsFile::new(0xF0, 0, 0, 0, 0, 10),
            VfsFile::new(0xF1, 2, 2, 1, b_offset as u32, (c_offset - b_offset) as u32),
            VfsFile::new(0xF2, 1, 1, 1, c_offset as u32, (end - c_offset) as u32),
        ],
        blob: blob.freeze(),
        fnames: vec!["a.txt".into(), "c.dat".into(), "b.bin".into()],
        dnames: vec!["root".into(), "sub".into()],
    }
}
