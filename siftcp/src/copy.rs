// SPDX-License-Identifier: MIT

use anyhow::Context;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{File, OpenOptions};
use std::path::Path;

use siftio::prelude::*;
use siftfs::prelude::*;

/// Copies every used block of `src` to the same offset in `dst`, then
/// resizes `dst` to the full image size.
///
/// `dst` should start as an empty or freshly allocated sparse file so
/// that unused addresses read back as zeroes; that precondition is the
/// caller's, not checked here.
pub fn run(src: &Path, dst: &Path, offset: u64, quiet: bool) -> anyhow::Result<()> {
    let mut src_file =
        File::open(src).with_context(|| format!("cannot open source {}", src.display()))?;
    let mut dst_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(dst)
        .with_context(|| format!("cannot open destination {}", dst.display()))?;

    let mut src_io = StdBlockIO::new_with_offset(&mut src_file, offset);
    let ctx = ScanContext::open(&mut src_io)
        .with_context(|| format!("cannot load filesystem metadata from {}", src.display()))?;

    let total_blocks = ctx.meta().total_blocks;
    let expected = ctx.expected_used();

    if !quiet {
        println!(
            "{} {} -> {} ({} blocks, {} expected used)",
            "[siftcp]".green().bold(),
            src.display(),
            dst.display(),
            total_blocks,
            expected,
        );
    }

    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(total_blocks)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.white}] {percent:>3}% {msg}")
            .unwrap()
            .progress_chars("█░░"),
    );

    let mut dst_io = StdBlockIO::new(&mut dst_file);
    let mut buf = vec![0u8; BLOCK_SIZE];
    let mut copied = 0u64;

    let result = ctx.for_each_used(0, |block| {
        src_io.read_at(block_offset(block), &mut buf)?;
        dst_io.write_at(block_offset(block), &buf)?;
        copied += 1;
        pb.set_position(block);
        Ok(())
    });
    pb.finish_and_clear();
    result.with_context(|| format!("copy failed after {copied} blocks"))?;

    // unused tail addresses are implied zero-fill
    dst_io
        .set_len(block_offset(total_blocks))
        .context("cannot resize destination")?;
    dst_io.flush().context("cannot flush destination")?;

    println!(
        "{} copied {} blocks, expected {}",
        "[siftcp]".green().bold(),
        copied,
        expected,
    );

    Ok(())
}
