use std::{
    fs::File,
    io::BufReader,
    path::Path,
};

use anyhow::Context;
use tap::Pipe;
use tracing::{debug, info, trace};

use crate::error::Stage;
use crate::vfs::{self, Vfs};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnpackStats {
    pub files: usize,
    pub bytes: u64,
}

/// Extracts every file of `archive` under `output`.
pub fn unpack_file(archive: impl AsRef<Path>, output: impl AsRef<Path>) -> anyhow::Result<UnpackStats> {
    let archive = archive.as_ref();

    let vfs = File::open(archive)
        .with_context(|| format!("Unable to open {}", archive.display()))?
        .pipe(BufReader::new)
        .pipe(vfs::read_vfs)
        .with_context(|| format!("Unable to read {}", archive.display()))?;

    let stats = unpack(&vfs, output.as_ref())?;
    info!(
        archive = %archive.display(),
        files = stats.files,
        bytes = stats.bytes,
        "Unpacked archive"
    );

    Ok(stats)
}

/// Writes each file in table order to `output/<directory path>/<name>`,
/// decompressing payloads of every nonzero type. Existing files are
/// overwritten, nothing written so far is removed on failure.
pub fn unpack(vfs: &Vfs, output: &Path) -> anyhow::Result<UnpackStats> {
    let mut stats = UnpackStats::default();
    let mut databuf = vec![];

    for file in &vfs.files {
        let path = vfs::resolve_file(&vfs.dirs, &vfs.dnames, &vfs.fnames, file)
            .context(Stage::PathResolution)
            .with_context(|| format!("{file:?}"))?;

        let payload = vfs
            .payload(file)
            .context(Stage::Blob)
            .with_context(|| path.display().to_string())?;

        let data = if file.is_compressed() {
            vfs::decompress_payload(payload, &mut databuf)
                .context(Stage::Compression)
                .with_context(|| path.display().to_string())?;
            trace!(stored = payload.len(), len = databuf.len(), "Decompressed payload");
            databuf.as_slice()
        } else {
            payload
        };

        let target = output.join(&path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .context(Stage::Filesystem)
                .with_context(|| format!("Unable to create {}", parent.display()))?;
        }

        std::fs::write(&target, data)
            .context(Stage::Filesystem)
            .with_context(|| format!("Unable to write {}", target.display()))?;

        debug!(path = %path.display(), len = data.len(), "Extracted");
        stats.files += 1;
        stats.bytes += data.len() as u64;

        databuf.clear();
    }

    Ok(stats)
}
