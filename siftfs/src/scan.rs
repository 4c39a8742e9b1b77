// SPDX-License-Identifier: MIT
//! Scan context and used-block iteration.

use siftio::BlockIO;

use crate::checkpoint::{Checkpoint, select_checkpoint};
use crate::errors::*;
use crate::meta::ScanMeta;
use crate::sit::SitState;

/// Everything a scan needs, loaded once and immutable thereafter:
/// geometry, the winning checkpoint's fields, the segment information
/// table and the SIT journal. Exclusively owned by one scan; dropping it
/// frees all buffers.
#[derive(Debug, Clone)]
pub struct ScanContext {
    meta: ScanMeta,
    checkpoint: Checkpoint,
    sit: SitState,
}

impl ScanContext {
    /// Loads the full scan context from a device: superblock, checkpoint
    /// selection, SIT table and journal. Any failure is fatal and nothing
    /// partially loaded escapes.
    pub fn open<IO: BlockIO + ?Sized>(io: &mut IO) -> ScanResult<Self> {
        let meta = ScanMeta::read(io)?;
        let checkpoint = select_checkpoint(io, &meta)?;
        let sit = SitState::load(io, &meta, &checkpoint)?;

        Ok(Self {
            meta,
            checkpoint,
            sit,
        })
    }

    #[inline]
    pub fn meta(&self) -> &ScanMeta {
        &self.meta
    }

    #[inline]
    pub fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    #[inline]
    pub fn sit(&self) -> &SitState {
        &self.sit
    }

    /// Expected number of used blocks: the metadata prefix plus the
    /// checkpoint's count of valid blocks in the main area.
    #[inline]
    pub fn expected_used(&self) -> u64 {
        self.meta.main_blkaddr + self.checkpoint.valid_block_count
    }

    /// Lazy, single-pass sequence of every used block address in
    /// `[start, total_blocks)`, strictly increasing, each yielded at most
    /// once. Restartable: each call produces an independent pass.
    #[inline]
    pub fn used_blocks(&self, start: u64) -> UsedBlocks<'_> {
        UsedBlocks {
            ctx: self,
            next: start,
        }
    }

    /// Drives `visit` over every used block from `start`. The visitor's
    /// first error stops the iteration immediately and becomes the scan
    /// result; `ScanError::Aborted` is the conventional "stop, no fault"
    /// value for consumers.
    pub fn for_each_used<F>(&self, start: u64, mut visit: F) -> ScanResult
    where
        F: FnMut(u64) -> ScanResult,
    {
        for block in self.used_blocks(start) {
            visit(block)?;
        }
        Ok(())
    }
}

/// Iterator over used block addresses. See [`ScanContext::used_blocks`].
#[derive(Debug, Clone)]
pub struct UsedBlocks<'a> {
    ctx: &'a ScanContext,
    next: u64,
}

impl<'a> Iterator for UsedBlocks<'a> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let meta = &self.ctx.meta;

        while self.next < meta.total_blocks {
            let block = self.next;

            // Everything below the main area is metadata and always live.
            if block < meta.main_blkaddr {
                self.next += 1;
                return Some(block);
            }

            let segno = meta.segment_of(block);
            let offset = meta.offset_in_segment(block);
            let entry = self.ctx.sit.entry(segno);

            // Empty segment: skip it whole without testing any bits.
            if offset == 0 && entry.valid_blocks() == 0 {
                self.next += meta.blocks_per_segment;
                continue;
            }

            self.next += 1;
            if entry.is_used(offset as usize) {
                return Some(block);
            }
        }
        None
    }
}
