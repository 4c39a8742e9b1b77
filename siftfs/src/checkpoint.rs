// SPDX-License-Identifier: MIT
//! Checkpoint pack selection.
//!
//! Two redundant checkpoint packs exist on disk, the second starting
//! exactly one segment after the first. A pack counts as fully written
//! only when the version in its first block matches the version in its
//! last block; between two intact packs the one with the greater version
//! (wraparound-tolerant) is authoritative.

use siftio::{BlockIO, BlockIOExt, BlockIOStructExt};

use crate::constant::*;
use crate::errors::*;
use crate::meta::ScanMeta;
use crate::types::{CpFlags, RawCheckpoint};

/// Fields extracted from the winning checkpoint pack. The pack buffers
/// themselves are transient: the loser is dropped at selection time, the
/// winner as soon as this digest is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    /// Start block of the winning pack
    pub pack_addr: u64,
    pub version: u64,
    pub user_block_count: u64,
    pub valid_block_count: u64,
    pub free_segment_count: u32,
    pub flags: CpFlags,
    pub pack_block_count: u64,
    pub start_sum: u64,
    pub sit_bitmap_bytes: u32,
}

impl Checkpoint {
    fn from_raw(pack_addr: u64, raw: &RawCheckpoint) -> Self {
        Self {
            pack_addr,
            version: raw.version(),
            user_block_count: raw.user_block_count(),
            valid_block_count: raw.valid_block_count(),
            free_segment_count: raw.free_segment_count(),
            flags: raw.flags(),
            pack_block_count: raw.pack_block_count(),
            start_sum: raw.start_sum(),
            sit_bitmap_bytes: raw.sit_bitmap_bytes(),
        }
    }

    /// Location of the SIT journal: `(block address, byte offset of the
    /// journal within that block)`. Three layouts exist:
    ///
    /// - compact summaries: the journal rides inline in the block at
    ///   `start_sum`, past the NAT journal area;
    /// - clean unmount: the cold-data summary block sits `NR_CURSEG_TYPE`
    ///   slots before the end of the pack;
    /// - otherwise only the data summaries are present and the slot base
    ///   shrinks to `NR_CURSEG_DATA_TYPE`.
    pub fn sit_journal_location(&self) -> ScanResult<(u64, usize)> {
        if self.flags.contains(CpFlags::COMPACT_SUM) {
            return Ok((self.pack_addr + self.start_sum, SUM_JOURNAL_SIZE));
        }

        let base = if self.flags.contains(CpFlags::UMOUNT) {
            NR_CURSEG_TYPE
        } else {
            NR_CURSEG_DATA_TYPE
        };
        let block = (self.pack_addr + self.pack_block_count + CURSEG_COLD_DATA)
            .checked_sub(base + 1)
            .ok_or(ScanError::Corrupt("checkpoint pack too small"))?;
        Ok((block, SUM_ENTRY_SIZE))
    }
}

/// Version comparison tolerant of wraparound: the version space is
/// circular, so plain unsigned ordering would invert near the wrap.
#[inline]
pub fn ver_after(a: u64, b: u64) -> bool {
    a.wrapping_sub(b) as i64 > 0
}

/// One probed pack. `None` stands for a pack that is torn, truncated or
/// unreadable; probing never aborts the selection on its own.
fn probe_pack<IO: BlockIO + ?Sized>(io: &mut IO, pack_addr: u64) -> Option<RawCheckpoint> {
    let header: RawCheckpoint = io.read_struct(block_offset(pack_addr)).ok()?;

    let total = header.pack_block_count();
    if total == 0 {
        // would place the trailer before the header
        return None;
    }

    let trailer_addr = pack_addr + total - 1;
    let trailer_version = io.read_u64_at(block_offset(trailer_addr)).ok()?;

    if trailer_version != header.version() {
        return None;
    }
    Some(header)
}

/// Locates both checkpoint packs and picks the authoritative one.
///
/// The probe sequence is uniform — both packs are always read in full
/// (header then trailer) before any comparison — so every failure path
/// reaches the same decision point.
pub fn select_checkpoint<IO: BlockIO + ?Sized>(
    io: &mut IO,
    meta: &ScanMeta,
) -> ScanResult<Checkpoint> {
    let pack1_addr = meta.cp_blkaddr;
    // The second pack starts exactly one segment after the first.
    let pack2_addr = pack1_addr + meta.blocks_per_segment;

    let pack1 = probe_pack(io, pack1_addr);
    let pack2 = probe_pack(io, pack2_addr);

    let (addr, raw) = match (pack1, pack2) {
        (Some(p1), Some(p2)) => {
            if ver_after(p2.version(), p1.version()) {
                (pack2_addr, p2)
            } else {
                (pack1_addr, p1)
            }
        }
        (Some(p1), None) => (pack1_addr, p1),
        (None, Some(p2)) => (pack2_addr, p2),
        (None, None) => return Err(ScanError::NoValidCheckpoint),
    };

    Ok(Checkpoint::from_raw(addr, &raw))
}
