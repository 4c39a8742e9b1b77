// SPDX-License-Identifier: MIT
//! Checkpoint pack header structure

use bitflags::bitflags;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

bitflags! {
    /// Checkpoint state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CpFlags: u32 {
        /// Written by a clean unmount (all six allocation cursors summarized).
        const UMOUNT         = 0x0000_0001;
        const ORPHAN_PRESENT = 0x0000_0002;
        /// Summaries are packed into the compact format.
        const COMPACT_SUM    = 0x0000_0004;
        const ERROR          = 0x0000_0008;
    }
}

/// Fixed header fields of a checkpoint pack's first block. The same layout
/// opens the pack's last block, whose `checkpoint_ver` must match for the
/// pack to count as fully written.
///
/// The SIT/NAT version bitmap payload follows immediately on disk
/// (`CP_VERSION_BITMAP_OFFSET` == size of this struct).
#[derive(Debug, Clone, Copy, IntoBytes, FromBytes, KnownLayout, Immutable)]
#[repr(C, packed)]
pub struct RawCheckpoint {
    // 0x00
    pub checkpoint_ver: u64,
    pub user_block_count: u64,
    /// Valid (used) blocks in the main area
    pub valid_block_count: u64,
    // 0x18
    pub rsvd_segment_count: u32,
    pub overprov_segment_count: u32,
    pub free_segment_count: u32,
    // 0x24 — allocation cursors for the six active logs
    pub cur_node_segno: [u32; 8],
    pub cur_node_blkoff: [u32; 8],
    pub cur_data_segno: [u32; 8],
    pub cur_data_blkoff: [u32; 8],
    // 0xA4
    pub ckpt_flags: u32,
    /// Total blocks in this checkpoint pack, trailer included
    pub cp_pack_total_block_count: u32,
    /// Block index of the first summary block within the pack
    pub cp_pack_start_sum: u32,
    pub valid_node_count: u32,
    pub valid_inode_count: u32,
    pub next_free_nid: u32,
    /// Byte length of the SIT version bitmap payload
    pub sit_ver_bitmap_bytesize: u32,
    pub nat_ver_bitmap_bytesize: u32,
    pub checksum_offset: u32,
    // 0xC8
    pub elapsed_time: u64,
    // 0xD0
    pub alloc_type: [u8; 16],
}

impl RawCheckpoint {
    #[inline]
    pub fn version(&self) -> u64 {
        u64::from_le(self.checkpoint_ver)
    }

    #[inline]
    pub fn flags(&self) -> CpFlags {
        CpFlags::from_bits_retain(u32::from_le(self.ckpt_flags))
    }

    #[inline]
    pub fn pack_block_count(&self) -> u64 {
        u32::from_le(self.cp_pack_total_block_count) as u64
    }

    #[inline]
    pub fn start_sum(&self) -> u64 {
        u32::from_le(self.cp_pack_start_sum) as u64
    }

    #[inline]
    pub fn valid_block_count(&self) -> u64 {
        u64::from_le(self.valid_block_count)
    }

    #[inline]
    pub fn user_block_count(&self) -> u64 {
        u64::from_le(self.user_block_count)
    }

    #[inline]
    pub fn free_segment_count(&self) -> u32 {
        u32::from_le(self.free_segment_count)
    }

    #[inline]
    pub fn sit_bitmap_bytes(&self) -> u32 {
        u32::from_le(self.sit_ver_bitmap_bytesize)
    }
}
