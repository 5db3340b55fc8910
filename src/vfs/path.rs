use std::path::PathBuf;

use anyhow::ensure;

use super::{VfsDir, VfsFile};
use crate::error::{Table, VfsError};

fn lookup<T>(table: &[T], which: Table, index: i64) -> anyhow::Result<&T> {
    usize::try_from(index)
        .ok()
        .and_then(|i| table.get(i))
        .ok_or_else(|| {
            VfsError::IndexOutOfRange {
                table: which,
                index,
                len: table.len(),
            }
            .into()
        })
}

/// Path of the directory at table position `index`, relative to the archive
/// root, e.g. `root/mid/leaf`.
///
/// Walks parent links up to a root. More hops than there are directories
/// means the links loop.
pub fn resolve_dir(dirs: &[VfsDir], dnames: &[String], index: u32) -> anyhow::Result<PathBuf> {
    let mut components = vec![];
    let mut dir = lookup(dirs, Table::Directories, index as i64)?;

    loop {
        ensure!(
            components.len() < dirs.len(),
            VfsError::CycleDetected {
                start: index as usize
            }
        );

        let name = lookup(dnames, Table::DirectoryNames, dir.id.get() as i64)?;
        components.push(name.as_str());

        let Some(parent) = dir.parent_index() else {
            break;
        };
        dir = lookup(dirs, Table::Directories, parent as i64)?;
    }

    Ok(components.into_iter().rev().collect())
}

/// Path of `file` relative to the archive root, its directory path joined
/// with its name.
pub fn resolve_file(
    dirs: &[VfsDir],
    dnames: &[String],
    fnames: &[String],
    file: &VfsFile,
) -> anyhow::Result<PathBuf> {
    let mut path = resolve_dir(dirs, dnames, file.dir.get())?;
    path.push(lookup(fnames, Table::FileNames, file.id.get() as i64)?);
    Ok(path)
}
