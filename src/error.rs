use core::fmt::{self, Display};

use thiserror::Error;

/// Failure kinds raised by the codec. They travel inside [anyhow::Error],
/// recover them with `err.downcast_ref::<VfsError>()`.
#[derive(Debug, Error)]
pub enum VfsError {
    #[error("Bad magic number for vfs header: expected \"VFS2\", got {found:02x?}")]
    BadMagic { found: [u8; 4] },

    #[error("Unexpected end of stream: expected {expected} bytes, got {actual}")]
    TruncatedRead { expected: u64, actual: u64 },

    #[error("Malformed length: {0}")]
    MalformedLength(String),

    #[error("Name is not ascii: {0:?}")]
    Encoding(String),

    #[error("{what} {value} does not fit in 32 bits")]
    ValueOutOfRange { what: &'static str, value: u64 },

    #[error("Decompression failed: {0}")]
    Decompression(String),

    #[error("{table} index {index} out of range (table length {len})")]
    IndexOutOfRange {
        table: Table,
        index: i64,
        len: usize,
    },

    #[error("Directory {start} has a parent cycle")]
    CycleDetected { start: usize },
}

/// Table an out-of-range index pointed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Directories,
    DirectoryNames,
    FileNames,
}

impl Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Table::Directories => "directory table",
            Table::DirectoryNames => "directory name table",
            Table::FileNames => "file name table",
        })
    }
}

/// Processing stage attached as context to every codec error, so the
/// diagnostic names where the run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Header,
    DirectoryTable,
    FileTable,
    Blob,
    FileNames,
    DirectoryNames,
    PathResolution,
    Compression,
    Filesystem,
}

impl Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Header => "header",
            Stage::DirectoryTable => "directory table",
            Stage::FileTable => "file table",
            Stage::Blob => "blob",
            Stage::FileNames => "file name table",
            Stage::DirectoryNames => "directory name table",
            Stage::PathResolution => "path resolution",
            Stage::Compression => "compression",
            Stage::Filesystem => "filesystem",
        })
    }
}
