// SPDX-License-Identifier: MIT
//! Segment information table loading.
//!
//! The SIT region on disk is double-buffered: each table block has a
//! primary and a shadow copy, and a per-block bit in the checkpoint's
//! version bitmap says which copy is current. The checkpoint additionally
//! carries a short journal of SIT updates that were never flushed to the
//! table; a journaled segment fully replaces its table entry.

use siftio::BlockIO;
use zerocopy::FromBytes;

use crate::checkpoint::Checkpoint;
use crate::constant::*;
use crate::errors::*;
use crate::meta::ScanMeta;
use crate::types::{RawSitBlock, RawSitEntry, RawSitJournal, SIT_ENTRY_PER_BLOCK, test_bit};

/// Which copy of a SIT table block is current.
///
/// Resolved independently per block: at any point in time some blocks may
/// live in the primary half and others in the shadow half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitCopy {
    Primary,
    Shadow,
}

impl SitCopy {
    /// Resolves the current copy of table block `index` from the version
    /// bitmap.
    #[inline]
    pub fn for_block(version_bitmap: &[u8], index: u64) -> SitCopy {
        if test_bit(index as usize, version_bitmap) {
            SitCopy::Shadow
        } else {
            SitCopy::Primary
        }
    }

    /// Block address of table block `index` in this copy.
    #[inline]
    pub fn block_addr(self, meta: &ScanMeta, index: u64) -> u64 {
        let base = meta.sit_blkaddr + index;
        match self {
            SitCopy::Primary => base,
            SitCopy::Shadow => base + meta.blocks_per_sit,
        }
    }
}

/// The fully materialized segment state: table, version bitmap and
/// journal. Loaded once, immutable for the lifetime of the scan.
#[derive(Debug, Clone)]
pub struct SitState {
    version_bitmap: Vec<u8>,
    table: Vec<RawSitBlock>,
    journal: Vec<(u32, RawSitEntry)>,
}

impl SitState {
    pub fn load<IO: BlockIO + ?Sized>(
        io: &mut IO,
        meta: &ScanMeta,
        cp: &Checkpoint,
    ) -> ScanResult<Self> {
        let version_bitmap = read_version_bitmap(io, cp)?;
        let table = read_table(io, meta, &version_bitmap)?;
        let journal = read_journal(io, cp)?;

        Ok(Self {
            version_bitmap,
            table,
            journal,
        })
    }

    /// Resolves the SIT entry for `segno`. The journal is searched first
    /// and overrides the main table unconditionally.
    pub fn entry(&self, segno: u64) -> &RawSitEntry {
        for (journaled_segno, entry) in &self.journal {
            if *journaled_segno as u64 == segno {
                return entry;
            }
        }
        let block = &self.table[(segno / SIT_ENTRY_PER_BLOCK as u64) as usize];
        &block.entries[(segno % SIT_ENTRY_PER_BLOCK as u64) as usize]
    }

    #[inline]
    pub fn journal_len(&self) -> usize {
        self.journal.len()
    }

    #[inline]
    pub fn table_block_count(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn copy_for_block(&self, index: u64) -> SitCopy {
        SitCopy::for_block(&self.version_bitmap, index)
    }

    #[cfg(test)]
    pub(crate) fn from_parts(
        version_bitmap: Vec<u8>,
        table: Vec<RawSitBlock>,
        journal: Vec<(u32, RawSitEntry)>,
    ) -> Self {
        Self {
            version_bitmap,
            table,
            journal,
        }
    }
}

/// Reads the SIT version bitmap embedded in the winning pack's first
/// block. Its byte length comes from a checkpoint field, not a constant.
fn read_version_bitmap<IO: BlockIO + ?Sized>(
    io: &mut IO,
    cp: &Checkpoint,
) -> ScanResult<Vec<u8>> {
    let size = cp.sit_bitmap_bytes as usize;

    let mut bitmap = Vec::new();
    bitmap
        .try_reserve_exact(size)
        .map_err(|_| ScanError::OutOfMemory)?;
    bitmap.resize(size, 0);

    io.read_at(
        block_offset(cp.pack_addr) + CP_VERSION_BITMAP_OFFSET,
        &mut bitmap,
    )?;
    Ok(bitmap)
}

/// Materializes the full table, resolving primary/shadow per block.
fn read_table<IO: BlockIO + ?Sized>(
    io: &mut IO,
    meta: &ScanMeta,
    version_bitmap: &[u8],
) -> ScanResult<Vec<RawSitBlock>> {
    let count = meta.sit_block_count();
    if (count as usize).div_ceil(8) > version_bitmap.len() {
        return Err(ScanError::Corrupt("SIT version bitmap too small"));
    }

    let mut table = Vec::new();
    table
        .try_reserve_exact(count as usize)
        .map_err(|_| ScanError::OutOfMemory)?;

    let mut buf = [0u8; BLOCK_SIZE];
    for index in 0..count {
        let copy = SitCopy::for_block(version_bitmap, index);
        let addr = copy.block_addr(meta, index);

        io.read_at(block_offset(addr), &mut buf)?;
        let block = RawSitBlock::read_from_bytes(&buf)
            .map_err(|_| ScanError::Corrupt("SIT block conversion failed"))?;
        table.push(block);
    }
    Ok(table)
}

/// Reads the summary block holding the SIT journal and extracts the
/// journaled (segment, entry) pairs.
fn read_journal<IO: BlockIO + ?Sized>(
    io: &mut IO,
    cp: &Checkpoint,
) -> ScanResult<Vec<(u32, RawSitEntry)>> {
    let (block, journal_off) = cp.sit_journal_location()?;

    let mut buf = [0u8; BLOCK_SIZE];
    io.read_at(block_offset(block), &mut buf)?;

    let journal = RawSitJournal::read_from_bytes(&buf[journal_off..journal_off + SUM_JOURNAL_SIZE])
        .map_err(|_| ScanError::Corrupt("SIT journal conversion failed"))?;

    Ok(journal.entries[..journal.len()]
        .iter()
        .map(|e| (e.segno(), e.entry))
        .collect())
}
