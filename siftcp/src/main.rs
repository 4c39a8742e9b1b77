// siftcp/src/main.rs

mod copy;
mod info;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "siftcp", version, about = "Copy only the used blocks of an F2FS image", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy used blocks from a source image to a destination
    Copy {
        /// Source image or block device
        src: PathBuf,
        /// Destination file (should start empty or sparse)
        dst: PathBuf,

        /// Byte offset of the filesystem within the source
        #[arg(long, default_value_t = 0)]
        offset: u64,

        /// Suppress the progress bar
        #[arg(short, long)]
        quiet: bool,
    },
    /// Print superblock, checkpoint and segment table information
    Info {
        /// Source image or block device
        src: PathBuf,

        /// Byte offset of the filesystem within the source
        #[arg(long, default_value_t = 0)]
        offset: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Copy {
            src,
            dst,
            offset,
            quiet,
        } => copy::run(&src, &dst, offset, quiet),
        Commands::Info { src, offset } => info::run(&src, offset),
    }
}
