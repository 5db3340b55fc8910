use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::Context;
use bytes::{BufMut, Bytes, BytesMut};
use flate2::Compression;
use tap::Pipe;
use tracing::{debug, info, trace};

use crate::error::Stage;
use crate::vfs::{self, to_u32, Vfs};

#[derive(Debug, Clone, Copy)]
pub struct PackOptions {
    /// zlib level for type 2 files
    pub level: Compression,
}

impl PackOptions {
    pub const DEFAULT_LEVEL: u32 = 9;
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            level: Compression::new(Self::DEFAULT_LEVEL),
        }
    }
}

/// Rebuilds `template` from the files under `input` and writes the result to
/// `output`. A failed run leaves whatever was written so far.
pub fn pack_file(
    template: impl AsRef<Path>,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &PackOptions,
) -> anyhow::Result<Vfs> {
    let template = template.as_ref();
    let output = output.as_ref();

    let template = File::open(template)
        .with_context(|| format!("Unable to open {}", template.display()))?
        .pipe(BufReader::new)
        .pipe(vfs::read_vfs)
        .with_context(|| format!("Unable to read {}", template.display()))?;

    let packed = pack(&template, input.as_ref(), options)?;

    let mut writer = File::options()
        .write(true)
        .create(true)
        .truncate(true)
        .open(output)
        .with_context(|| format!("Unable to create {}", output.display()))?
        .pipe(BufWriter::new);

    vfs::write_vfs(&mut writer, &packed)
        .and_then(|_| writer.flush().context("Unable to flush file"))
        .with_context(|| format!("Unable to write {}", output.display()))?;

    info!(
        archive = %output.display(),
        files = packed.files.len(),
        blob = packed.blob.len(),
        "Packed archive"
    );

    Ok(packed)
}

/// Copies the tables of `template` and rebuilds the blob from the files under
/// `input`, in ascending file id order. Only type 2 files are compressed,
/// every other type, 1 included, is stored raw.
pub fn pack(template: &Vfs, input: &Path, options: &PackOptions) -> anyhow::Result<Vfs> {
    let mut packed = Vfs {
        blob: Bytes::new(),
        ..template.clone()
    };

    let mut order: Vec<usize> = (0..packed.files.len()).collect();
    order.sort_by_key(|&i| packed.files[i].id.get());

    let mut blob = BytesMut::new();
    for i in order {
        let file = &packed.files[i];

        let path = vfs::resolve_file(&packed.dirs, &packed.dnames, &packed.fnames, file)
            .context(Stage::PathResolution)
            .with_context(|| format!("{file:?}"))?;

        let source = input.join(&path);
        let data = std::fs::read(&source)
            .context(Stage::Filesystem)
            .with_context(|| format!("Unable to read {}", source.display()))?;

        let offset = blob.len();
        if file.packs_compressed() {
            vfs::compress_payload(&data, options.level, (&mut blob).writer())
                .context(Stage::Compression)
                .with_context(|| path.display().to_string())?;
        } else {
            blob.put_slice(&data);
        }
        let size = blob.len() - offset;
        trace!(len = data.len(), stored = size, "Stored payload");
        debug!(path = %path.display(), offset, size, "Packed");

        let file = &mut packed.files[i];
        file.offset = to_u32(offset as u64, "blob offset")
            .context(Stage::Blob)?
            .into();
        file.size = to_u32(size as u64, "payload size")
            .context(Stage::Blob)?
            .into();
    }

    packed.blob = blob.freeze();
    Ok(packed)
}
