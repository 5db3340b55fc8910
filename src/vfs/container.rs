use std::io::{Read, Seek, Write};

use anyhow::{ensure, Context};
use bytes::Bytes;
use tracing::{debug, trace};

use super::primitive::{read_bytes, read_full, read_string, read_u32, to_u32, write_string, write_u32};
use super::record::{read_dir, read_file, write_dir, write_file};
use super::{Vfs, VfsDir, VfsFile, MAGIC};
use crate::error::{Stage, VfsError};

/// Reads a whole archive. The reader must be positioned at the archive start,
/// the blob end offset is absolute.
///
/// Recommended to use BufReader
pub fn read_vfs<R: Read + Seek>(mut reader: R) -> anyhow::Result<Vfs> {
    read_magic(&mut reader).context(Stage::Header)?;

    let dirs: Vec<VfsDir> = read_count(&mut reader)
        .and_then(|count| (0..count).map(|_| read_dir(&mut reader)).collect())
        .context(Stage::DirectoryTable)?;
    debug!(count = dirs.len(), "Read directory table");

    let files: Vec<VfsFile> = read_count(&mut reader)
        .and_then(|count| (0..count).map(|_| read_file(&mut reader)).collect())
        .context(Stage::FileTable)?;
    debug!(count = files.len(), "Read file table");

    let blob = read_blob(&mut reader).context(Stage::Blob)?;
    debug!(len = blob.len(), "Read blob");

    let fnames = read_names(&mut reader, files.len()).context(Stage::FileNames)?;
    let dnames = read_names(&mut reader, dirs.len()).context(Stage::DirectoryNames)?;

    Ok(Vfs {
        dirs,
        files,
        blob,
        fnames,
        dnames,
    })
}

fn read_magic(reader: impl Read) -> anyhow::Result<()> {
    let mut magic = [0u8; 4];
    read_full(reader, &mut magic)?;
    ensure!(magic == MAGIC, VfsError::BadMagic { found: magic });
    Ok(())
}

fn read_count(reader: impl Read) -> anyhow::Result<u32> {
    let count = read_u32(reader)?;
    trace!(count, "Table count");
    Ok(count)
}

fn read_blob<R: Read + Seek>(mut reader: R) -> anyhow::Result<Bytes> {
    let end = read_u32(&mut reader)? as u64;
    let start = reader.stream_position()?;

    let len = end.checked_sub(start).ok_or_else(|| {
        VfsError::MalformedLength(format!("blob ends at {end} before its start at {start}"))
    })?;

    let mut blob = vec![];
    read_bytes(&mut reader, len, &mut blob)?;
    Ok(blob.into())
}

/// The name table prefix is written as the record count of the matching
/// table, a differing prefix means the archive is damaged.
fn read_names(mut reader: impl Read, records: usize) -> anyhow::Result<Vec<String>> {
    let count = read_count(&mut reader)?;
    ensure!(
        count as usize == records,
        VfsError::MalformedLength(format!(
            "name table holds {count} entries for {records} records"
        ))
    );

    (0..count).map(|_| read_string(&mut reader)).collect()
}

/// Writes `vfs` starting at the writer's current position, which becomes the
/// origin the blob end offset is relative to. The name tables are prefixed
/// with the record counts, not their own lengths.
pub fn write_vfs<W: Write + Seek>(mut writer: W, vfs: &Vfs) -> anyhow::Result<()> {
    writer.write_all(&MAGIC).context(Stage::Header)?;

    to_u32(vfs.dirs.len() as u64, "directory count")
        .and_then(|count| write_u32(&mut writer, count))
        .and_then(|_| vfs.dirs.iter().try_for_each(|dir| write_dir(&mut writer, dir)))
        .context(Stage::DirectoryTable)?;

    to_u32(vfs.files.len() as u64, "file count")
        .and_then(|count| write_u32(&mut writer, count))
        .and_then(|_| vfs.files.iter().try_for_each(|file| write_file(&mut writer, file)))
        .context(Stage::FileTable)?;

    write_blob(&mut writer, &vfs.blob).context(Stage::Blob)?;

    to_u32(vfs.files.len() as u64, "file count")
        .and_then(|count| write_u32(&mut writer, count))
        .and_then(|_| vfs.fnames.iter().try_for_each(|name| write_string(&mut writer, name)))
        .context(Stage::FileNames)?;

    to_u32(vfs.dirs.len() as u64, "directory count")
        .and_then(|count| write_u32(&mut writer, count))
        .and_then(|_| vfs.dnames.iter().try_for_each(|name| write_string(&mut writer, name)))
        .context(Stage::DirectoryNames)?;

    Ok(())
}

fn write_blob<W: Write + Seek>(mut writer: W, blob: &[u8]) -> anyhow::Result<()> {
    let end = writer.stream_position()? + 4 + blob.len() as u64;
    write_u32(&mut writer, to_u32(end, "blob end offset")?)?;
    writer.write_all(blob)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::error::{Stage, VfsError};
    use crate::vfs::{Vfs, VfsDir, VfsFile};

    use super::*;

    fn sample() -> Vfs {
        Vfs {
            dirs: vec![
                VfsDir::new(0x1111, 0, -1, -1, 0),
                VfsDir::new(0x2222, 1, 0, 0, 3),
            ],
            files: vec![
                VfsFile::new(0x3333, 0, 0, 1, 0, 5),
                VfsFile::new(0x4444, 1, 0, 0, 5, 3),
            ],
            blob: Bytes::from_static(b"helloabc"),
            fnames: vec!["a.txt".into(), "b.bin".into()],
            dnames: vec!["root".into(), "sub".into()],
        }
    }

    fn encode(vfs: &Vfs) -> Vec<u8> {
        let mut cursor = Cursor::new(vec![]);
        write_vfs(&mut cursor, vfs).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn layout() {
        let bytes = encode(&sample());

        assert_eq!(&bytes[0..4], b"VFS2");
        assert_eq!(&bytes[4..8], &[2, 0, 0, 0]);

        // magic + count + 2 dirs + count + 2 files
        let blob_offset_at = 4 + 4 + 2 * VfsDir::SIZE + 4 + 2 * VfsFile::SIZE;
        let end = u32::from_le_bytes(bytes[blob_offset_at..blob_offset_at + 4].try_into().unwrap());
        assert_eq!(end as usize, blob_offset_at + 4 + 8);
        assert_eq!(&bytes[blob_offset_at + 4..end as usize], b"helloabc");

        // file name table prefix is the file count
        assert_eq!(&bytes[end as usize..end as usize + 4], &[2, 0, 0, 0]);
    }

    #[test]
    fn read_back() {
        let vfs = sample();
        let read = read_vfs(Cursor::new(encode(&vfs))).unwrap();
        assert_eq!(read, vfs);
    }

    #[test]
    fn bad_magic_stops_reading() {
        let mut bytes = encode(&sample());
        bytes[..4].copy_from_slice(b"VFS1");

        let mut cursor = Cursor::new(bytes);
        let err = read_vfs(&mut cursor).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<VfsError>(),
            Some(VfsError::BadMagic { found }) if found == b"VFS1"
        ));
        assert_eq!(err.downcast_ref::<Stage>(), Some(&Stage::Header));
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn name_table_count_is_the_file_count() {
        let vfs = Vfs {
            dirs: vec![],
            files: vec![
                VfsFile::new(0, 0, 0, 0, 0, 0),
                VfsFile::new(0, 1, 0, 0, 0, 0),
            ],
            blob: Bytes::new(),
            fnames: vec!["a".into()],
            dnames: vec![],
        };

        let mut bytes = encode(&vfs);
        // Only one name followed the prefix of 2, the directory count (0)
        // is consumed as the length of the second name. Supply a trailing
        // directory name count so the stream stays readable.
        bytes.extend_from_slice(&0u32.to_le_bytes());

        let read = read_vfs(Cursor::new(bytes)).unwrap();
        assert_eq!(read.fnames, ["a", ""]);
        assert!(read.dnames.is_empty());
    }

    #[test]
    fn name_table_count_mismatch() {
        let mut bytes = encode(&sample());
        // file name count, 2 file names, directory name count, 2 directory names
        let at = bytes.len() - (4 + 9 + 9 + 4 + 8 + 7);
        bytes[at..at + 4].copy_from_slice(&3u32.to_le_bytes());

        let err = read_vfs(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err.downcast_ref::<VfsError>(), Some(VfsError::MalformedLength(_))));
        assert_eq!(err.downcast_ref::<Stage>(), Some(&Stage::FileNames));
    }

    #[test]
    fn blob_end_before_start() {
        let mut bytes = encode(&sample());
        let at = 4 + 4 + 2 * VfsDir::SIZE + 4 + 2 * VfsFile::SIZE;
        bytes[at..at + 4].copy_from_slice(&4u32.to_le_bytes());

        let err = read_vfs(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err.downcast_ref::<VfsError>(), Some(VfsError::MalformedLength(_))));
        assert_eq!(err.downcast_ref::<Stage>(), Some(&Stage::Blob));
    }

    #[test]
    fn truncated_tables() {
        let bytes = encode(&sample());

        let err = read_vfs(Cursor::new(&bytes[..30])).unwrap_err();
        assert!(matches!(err.downcast_ref::<VfsError>(), Some(VfsError::TruncatedRead { .. })));
        assert_eq!(err.downcast_ref::<Stage>(), Some(&Stage::DirectoryTable));

        let at = 4 + 4 + 2 * VfsDir::SIZE + 4 + 2 * VfsFile::SIZE + 4;
        let err = read_vfs(Cursor::new(&bytes[..at + 3])).unwrap_err();
        assert!(matches!(err.downcast_ref::<VfsError>(), Some(VfsError::TruncatedRead { .. })));
        assert_eq!(err.downcast_ref::<Stage>(), Some(&Stage::Blob));
    }

    #[test]
    fn non_ascii_name_is_rejected_on_write() {
        let mut vfs = sample();
        vfs.dnames[1] = "s\u{fc}b".into();

        let err = write_vfs(Cursor::new(vec![]), &vfs).unwrap_err();
        assert!(matches!(err.downcast_ref::<VfsError>(), Some(VfsError::Encoding(_))));
        assert_eq!(err.downcast_ref::<Stage>(), Some(&Stage::DirectoryNames));
    }
}
