// SPDX-License-Identifier: MIT

use anyhow::Context;
use colored::Colorize;
use std::fs::File;
use std::path::Path;

use siftio::prelude::*;
use siftfs::prelude::*;

/// Prints the metadata a scan would run on: superblock geometry, the
/// winning checkpoint and the segment table summary.
pub fn run(src: &Path, offset: u64) -> anyhow::Result<()> {
    let mut file =
        File::open(src).with_context(|| format!("cannot open source {}", src.display()))?;
    let mut io = StdBlockIO::new_with_offset(&mut file, offset);
    let ctx = ScanContext::open(&mut io)
        .with_context(|| format!("cannot load filesystem metadata from {}", src.display()))?;

    let meta = ctx.meta();
    let cp = ctx.checkpoint();

    println!("{}", "Superblock".bold());
    println!("  version:            {}.{}", meta.major_ver, meta.minor_ver);
    println!(
        "  block size:         {} (log {})",
        1u64 << meta.log_blocksize,
        meta.log_blocksize
    );
    println!(
        "  blocks per segment: {} (log {})",
        meta.blocks_per_segment, meta.log_blocks_per_seg
    );
    println!("  total blocks:       {}", meta.total_blocks);
    println!("  size:               {} sectors", meta.size_sectors());
    println!("  checkpoint at:      {}", meta.cp_blkaddr);
    println!("  SIT at:             {}", meta.sit_blkaddr);
    println!("  NAT at:             {}", meta.nat_blkaddr);
    println!("  SSA at:             {}", meta.ssa_blkaddr);
    println!("  main area at:       {}", meta.main_blkaddr);

    println!("{}", "Checkpoint".bold());
    println!("  pack address:       {}", cp.pack_addr);
    println!("  version:            {}", cp.version);
    println!("  flags:              {:?}", cp.flags);
    println!("  pack blocks:        {}", cp.pack_block_count);
    println!("  user blocks:        {}", cp.user_block_count);
    println!("  valid blocks:       {}", cp.valid_block_count);
    println!("  free segments:      {}", cp.free_segment_count);

    let shadow_blocks = (0..ctx.sit().table_block_count() as u64)
        .filter(|i| ctx.sit().copy_for_block(*i) == SitCopy::Shadow)
        .count();

    println!("{}", "Segment table".bold());
    println!("  main segments:      {}", meta.segment_count());
    println!(
        "  SIT blocks:         {} ({} in shadow)",
        ctx.sit().table_block_count(),
        shadow_blocks
    );
    println!("  journaled entries:  {}", ctx.sit().journal_len());
    println!(
        "  used blocks:        {} of {} expected",
        ctx.used_blocks(0).count(),
        ctx.expected_used(),
    );

    Ok(())
}
