// SPDX-License-Identifier: MIT

use siftio::{BlockIO, BlockIOStructExt};

use crate::constant::*;
use crate::errors::*;
use crate::types::RawSuperblock;

/// Geometry digest of a filesystem, read once from the superblock and held
/// read-only for the lifetime of a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanMeta {
    pub major_ver: u16,
    pub minor_ver: u16,

    pub log_sectorsize: u32,
    pub log_sectors_per_block: u32,
    pub log_blocksize: u32,
    pub log_blocks_per_seg: u32,
    pub segs_per_sec: u32,
    pub secs_per_zone: u32,

    pub blocks_per_segment: u64,
    /// Span in blocks of one half of the SIT region; the shadow copy of a
    /// SIT block lives this far past its primary copy.
    pub blocks_per_sit: u64,

    pub cp_blkaddr: u64,
    pub sit_blkaddr: u64,
    pub nat_blkaddr: u64,
    pub ssa_blkaddr: u64,
    pub main_blkaddr: u64,

    pub total_blocks: u64,
}

impl ScanMeta {
    /// Reads and validates the superblock. Fails on a magic mismatch; no
    /// other validation, a pure parse.
    pub fn read<IO: BlockIO + ?Sized>(io: &mut IO) -> ScanResult<Self> {
        let raw: RawSuperblock = io.read_struct(SUPER_OFFSET)?;
        if !raw.is_valid() {
            return Err(ScanError::BadMagic(raw.magic()));
        }
        Ok(Self::from_raw(&raw))
    }

    pub fn from_raw(raw: &RawSuperblock) -> Self {
        let log_blocks_per_seg = u32::from_le(raw.log_blocks_per_seg);
        let segment_count_sit = u32::from_le(raw.segment_count_sit) as u64;

        Self {
            major_ver: u16::from_le(raw.major_ver),
            minor_ver: u16::from_le(raw.minor_ver),
            log_sectorsize: u32::from_le(raw.log_sectorsize),
            log_sectors_per_block: u32::from_le(raw.log_sectors_per_block),
            log_blocksize: u32::from_le(raw.log_blocksize),
            log_blocks_per_seg,
            segs_per_sec: u32::from_le(raw.segs_per_sec),
            secs_per_zone: u32::from_le(raw.secs_per_zone),
            blocks_per_segment: 1u64 << log_blocks_per_seg,
            // Half of the SIT segments back the primary copies, half the
            // shadow copies.
            blocks_per_sit: (segment_count_sit >> 1) << log_blocks_per_seg,
            cp_blkaddr: u32::from_le(raw.cp_blkaddr) as u64,
            sit_blkaddr: u32::from_le(raw.sit_blkaddr) as u64,
            nat_blkaddr: u32::from_le(raw.nat_blkaddr) as u64,
            ssa_blkaddr: u32::from_le(raw.ssa_blkaddr) as u64,
            main_blkaddr: u32::from_le(raw.main_blkaddr) as u64,
            total_blocks: u64::from_le(raw.block_count),
        }
    }

    /// Segments in the main area.
    #[inline]
    pub fn segment_count(&self) -> u64 {
        (self.total_blocks - self.main_blkaddr).div_ceil(self.blocks_per_segment)
    }

    /// Blocks occupied by one copy of the segment information table.
    #[inline]
    pub fn sit_block_count(&self) -> u64 {
        self.segment_count()
            .div_ceil(crate::types::SIT_ENTRY_PER_BLOCK as u64)
    }

    /// Main-area segment number of a block address.
    #[inline]
    pub fn segment_of(&self, block: u64) -> u64 {
        (block - self.main_blkaddr) / self.blocks_per_segment
    }

    /// Offset of a block address within its main-area segment.
    #[inline]
    pub fn offset_in_segment(&self, block: u64) -> u64 {
        (block - self.main_blkaddr) % self.blocks_per_segment
    }

    /// Filesystem size in 512-byte sectors.
    #[inline]
    pub fn size_sectors(&self) -> u64 {
        self.total_blocks * BLOCK_SIZE as u64 / DEFAULT_SECTOR_SIZE
    }
}
