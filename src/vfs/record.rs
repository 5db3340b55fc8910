use core::fmt::Debug;
use std::io::{Read, Write};

use zerocopy::{
    FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout, LittleEndian, Unaligned, I32, U32,
};

use super::primitive::read_full;

/// Directory node. `parent` is a position in the directory table, `id` a
/// position in the directory name table.
#[derive(Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct VfsDir {
    pub hash: U32<LittleEndian>,
    pub id: U32<LittleEndian>,
    /// -1 for a root
    pub parent: I32<LittleEndian>,
    pub from_dir: I32<LittleEndian>,
    pub from_file: U32<LittleEndian>,
}

impl VfsDir {
    pub const SIZE: usize = 20;
    pub const NO_PARENT: i32 = -1;

    pub fn new(hash: u32, id: u32, parent: i32, from_dir: i32, from_file: u32) -> Self {
        Self {
            hash: hash.into(),
            id: id.into(),
            parent: parent.into(),
            from_dir: from_dir.into(),
            from_file: from_file.into(),
        }
    }

    /// Table position of the parent, [None] for a root. Other negative
    /// values are passed through for the resolver to reject.
    pub fn parent_index(&self) -> Option<i32> {
        let parent = self.parent.get();
        (parent != Self::NO_PARENT).then_some(parent)
    }
}

impl Debug for VfsDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VfsDir")
            .field("hash", &format_args!("{:#010x}", self.hash.get()))
            .field("id", &self.id.get())
            .field("parent", &self.parent.get())
            .field("from_dir", &self.from_dir.get())
            .field("from_file", &self.from_file.get())
            .finish()
    }
}

/// Stored file. `id` indexes the file name table, `dir` the directory table,
/// `offset`/`size` address the payload inside the blob.
#[derive(Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct VfsFile {
    pub hash: U32<LittleEndian>,
    pub id: U32<LittleEndian>,
    /// The on-disk `type` field
    pub kind: U32<LittleEndian>,
    pub dir: U32<LittleEndian>,
    pub offset: U32<LittleEndian>,
    pub size: U32<LittleEndian>,
}

impl VfsFile {
    pub const SIZE: usize = 24;

    /// Payload stored verbatim.
    pub const TYPE_RAW: u32 = 0;
    /// Payload is a LE u32 uncompressed size followed by a zlib stream.
    pub const TYPE_ZLIB: u32 = 2;

    pub fn new(hash: u32, id: u32, kind: u32, dir: u32, offset: u32, size: u32) -> Self {
        Self {
            hash: hash.into(),
            id: id.into(),
            kind: kind.into(),
            dir: dir.into(),
            offset: offset.into(),
            size: size.into(),
        }
    }

    /// Whether unpacking treats the payload as size-prefixed zlib.
    /// Every nonzero type qualifies.
    pub fn is_compressed(&self) -> bool {
        self.kind.get() != Self::TYPE_RAW
    }

    /// Whether packing compresses the payload. Only [Self::TYPE_ZLIB] does,
    /// other nonzero types are written raw.
    pub fn packs_compressed(&self) -> bool {
        self.kind.get() == Self::TYPE_ZLIB
    }

    pub fn span(&self) -> (u64, u64) {
        let offset = self.offset.get() as u64;
        (offset, offset + self.size.get() as u64)
    }
}

impl Debug for VfsFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VfsFile")
            .field("hash", &format_args!("{:#010x}", self.hash.get()))
            .field("id", &self.id.get())
            .field("type", &self.kind.get())
            .field("dir", &self.dir.get())
            .field("offset", &self.offset.get())
            .field("size", &self.size.get())
            .finish()
    }
}

const _: () = assert!(core::mem::size_of::<VfsDir>() == VfsDir::SIZE);
const _: () = assert!(core::mem::size_of::<VfsFile>() == VfsFile::SIZE);

pub fn read_dir(reader: impl Read) -> anyhow::Result<VfsDir> {
    let mut dir = VfsDir::new_zeroed();
    read_full(reader, dir.as_mut_bytes())?;
    Ok(dir)
}

pub fn write_dir(mut writer: impl Write, dir: &VfsDir) -> anyhow::Result<()> {
    writer.write_all(dir.as_bytes())?;
    Ok(())
}

pub fn read_file(reader: impl Read) -> anyhow::Result<VfsFile> {
    let mut file = VfsFile::new_zeroed();
    read_full(reader, file.as_mut_bytes())?;
    Ok(file)
}

pub fn write_file(mut writer: impl Write, file: &VfsFile) -> anyhow::Result<()> {
    writer.write_all(file.as_bytes())?;
    Ok(())
}
