use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pack::PackOptions;

mod error;
mod pack;
mod unpack;
mod vfs;

/// Unpacks and repacks VFS2 archives
#[derive(Debug, Parser)]
#[command(name = "vfs2")]
struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Extract every file of an archive into a directory
    #[command(alias = "d")]
    Decompress {
        archive: PathBuf,
        output: PathBuf,
    },

    /// Rebuild an archive from an unpacked directory, using the original
    /// archive for the directory and file tables
    #[command(alias = "c")]
    Compress {
        archive: PathBuf,
        input: PathBuf,
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match args.command {
        Command::Decompress { archive, output } => {
            unpack::unpack_file(archive, output)?;
        }
        Command::Compress {
            archive,
            input,
            output,
        } => {
            pack::pack_file(archive, input, output, &PackOptions::default())?;
        }
    }

    Ok(())
}
