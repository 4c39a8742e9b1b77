// SPDX-License-Identifier: MIT
//! Synthetic 16 MiB image builder for end-to-end scan tests.
//!
//! Geometry: 4096 blocks of 4 KiB, 128-block segments. Region layout:
//! superblock in segment 0, checkpoint packs at 128 and 256, SIT at 384
//! (primary half 384..512, shadow half 512..640), NAT at 640, SSA at 896,
//! main area at 1024 (24 segments).

use siftfs::prelude::*;
use zerocopy::{FromZeros, IntoBytes};

pub const TOTAL_BLOCKS: u64 = 4096;
pub const BLOCKS_PER_SEG: u64 = 128;
pub const PACK1_ADDR: u64 = 128;
pub const PACK2_ADDR: u64 = 256;
pub const SIT_BLKADDR: u64 = 384;
pub const MAIN_BLKADDR: u64 = 1024;
pub const PACK_BLOCKS: u32 = 8;

pub fn blank_image() -> Vec<u8> {
    vec![0u8; TOTAL_BLOCKS as usize * BLOCK_SIZE]
}

pub fn write_superblock(image: &mut [u8]) {
    let mut raw = RawSuperblock::new_zeroed();
    raw.magic = SUPER_MAGIC.to_le();
    raw.major_ver = 1u16.to_le();
    raw.log_sectorsize = 9u32.to_le();
    raw.log_sectors_per_block = 3u32.to_le();
    raw.log_blocksize = 12u32.to_le();
    raw.log_blocks_per_seg = 7u32.to_le();
    raw.segs_per_sec = 1u32.to_le();
    raw.secs_per_zone = 1u32.to_le();
    raw.block_count = TOTAL_BLOCKS.to_le();
    raw.segment_count = 32u32.to_le();
    raw.segment_count_ckpt = 2u32.to_le();
    raw.segment_count_sit = 2u32.to_le();
    raw.segment_count_nat = 2u32.to_le();
    raw.segment_count_ssa = 1u32.to_le();
    raw.segment_count_main = 24u32.to_le();
    raw.segment0_blkaddr = (PACK1_ADDR as u32).to_le();
    raw.cp_blkaddr = (PACK1_ADDR as u32).to_le();
    raw.sit_blkaddr = (SIT_BLKADDR as u32).to_le();
    raw.nat_blkaddr = 640u32.to_le();
    raw.ssa_blkaddr = 896u32.to_le();
    raw.main_blkaddr = (MAIN_BLKADDR as u32).to_le();

    let off = SUPER_OFFSET as usize;
    image[off..off + raw.as_bytes().len()].copy_from_slice(raw.as_bytes());
}

pub fn write_pack(
    image: &mut [u8],
    pack_addr: u64,
    version: u64,
    trailer_version: u64,
    flags: CpFlags,
    valid_block_count: u64,
) {
    let mut raw = RawCheckpoint::new_zeroed();
    raw.checkpoint_ver = version.to_le();
    raw.user_block_count = 3072u64.to_le();
    raw.valid_block_count = valid_block_count.to_le();
    raw.free_segment_count = 21u32.to_le();
    raw.ckpt_flags = flags.bits().to_le();
    raw.cp_pack_total_block_count = PACK_BLOCKS.to_le();
    raw.cp_pack_start_sum = 1u32.to_le();
    raw.sit_ver_bitmap_bytesize = 8u32.to_le();
    raw.nat_ver_bitmap_bytesize = 8u32.to_le();

    let head = block_offset(pack_addr) as usize;
    image[head..head + raw.as_bytes().len()].copy_from_slice(raw.as_bytes());

    let tail = block_offset(pack_addr + PACK_BLOCKS as u64 - 1) as usize;
    image[tail..tail + 8].copy_from_slice(&trailer_version.to_le_bytes());
}

pub fn sit_entry(bits: &[u64]) -> RawSitEntry {
    let mut entry = RawSitEntry::new_zeroed();
    entry.vblocks = (bits.len() as u16).to_le();
    for bit in bits {
        let bit = *bit as usize;
        entry.valid_map[bit / 8] |= 1 << (7 - (bit % 8));
    }
    entry
}

/// Blocks per SIT half with this geometry: one of the two SIT segments
/// backs the primary copies, the other the shadow copies.
pub const BLOCKS_PER_SIT: u64 = 128;

/// Writes `entry` for `segno` into the primary SIT half.
pub fn write_sit_entry(image: &mut [u8], segno: u64, entry: RawSitEntry) {
    write_sit_entry_in(image, SIT_BLKADDR, segno, entry);
}

/// Writes `entry` for `segno` into the shadow SIT half.
pub fn write_shadow_sit_entry(image: &mut [u8], segno: u64, entry: RawSitEntry) {
    write_sit_entry_in(image, SIT_BLKADDR + BLOCKS_PER_SIT, segno, entry);
}

fn write_sit_entry_in(image: &mut [u8], base: u64, segno: u64, entry: RawSitEntry) {
    let block_addr = base + segno / SIT_ENTRY_PER_BLOCK as u64;
    let slot = (segno % SIT_ENTRY_PER_BLOCK as u64) as usize;
    let off =
        block_offset(block_addr) as usize + slot * core::mem::size_of::<RawSitEntry>();
    image[off..off + entry.as_bytes().len()].copy_from_slice(entry.as_bytes());
}

/// Flips SIT table block `index` of a pack's version bitmap to the shadow
/// copy (MSB-first bit packing).
pub fn set_sit_shadow_bit(image: &mut [u8], pack_addr: u64, index: u64) {
    let off = block_offset(pack_addr) + CP_VERSION_BITMAP_OFFSET + index / 8;
    image[off as usize] |= 1 << (7 - (index % 8));
}

/// Writes a SIT journal at `journal_off` bytes into block `block_addr`.
pub fn write_journal(
    image: &mut [u8],
    block_addr: u64,
    journal_off: usize,
    entries: &[(u32, RawSitEntry)],
) {
    let mut journal = RawSitJournal::new_zeroed();
    journal.n_sits = (entries.len() as u16).to_le();
    for (slot, (segno, entry)) in entries.iter().enumerate() {
        journal.entries[slot].segno = segno.to_le();
        journal.entries[slot].entry = *entry;
    }

    let off = block_offset(block_addr) as usize + journal_off;
    image[off..off + journal.as_bytes().len()].copy_from_slice(journal.as_bytes());
}

/// Fills a whole block with a recognizable per-block pattern.
pub fn fill_block(image: &mut [u8], block: u64) {
    let off = block_offset(block) as usize;
    let pattern = (block % 251) as u8 ^ 0x5A;
    image[off..off + BLOCK_SIZE].fill(pattern);
}

/// Standard image: pack 2 newer, clean unmount, segment 5 of the main
/// area holding exactly `bits.len()` used blocks, journal empty.
pub fn build_standard(bits: &[u64]) -> Vec<u8> {
    let mut image = blank_image();
    write_superblock(&mut image);
    write_pack(
        &mut image,
        PACK1_ADDR,
        41,
        41,
        CpFlags::UMOUNT,
        bits.len() as u64,
    );
    write_pack(
        &mut image,
        PACK2_ADDR,
        42,
        42,
        CpFlags::UMOUNT,
        bits.len() as u64,
    );
    write_sit_entry(&mut image, 5, sit_entry(bits));

    for bit in bits {
        fill_block(&mut image, MAIN_BLKADDR + 5 * BLOCKS_PER_SEG + bit);
    }
    image
}
