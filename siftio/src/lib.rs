// SPDX-License-Identifier: MIT

// Core modules
pub mod errors;
mod macros;

// Backend modules
mod mem;
mod std_io;

// Prelude re-exports (central entrypoint)
pub mod prelude {
    pub use super::BlockIO;
    pub use super::BlockIOExt;
    pub use super::BlockIOSetLen;
    pub use super::BlockIOStructExt;
    pub use super::errors::*;
    pub use super::mem::MemBlockIO;
    pub use super::std_io::StdBlockIO;
}

pub use mem::MemBlockIO;
pub use std_io::StdBlockIO;

// Internal use
use errors::*;

// Constants

/// Maximum size of internal scratch buffer (used for chunked ops and
/// struct reads). 4 KiB = typical page size and common disk block size.
pub const BLOCK_BUF_SIZE: usize = 4096;

// Traits

/// Block IO abstraction trait.
///
/// Allows read/write/flush at arbitrary absolute offsets. Implementations
/// may target files, block devices or RAM buffers. A partition offset can
/// be applied so that filesystem code addresses a partition from zero even
/// when it lives inside a whole-disk image.
pub trait BlockIO {
    /// Writes `data` at `offset` (relative to the partition offset).
    fn write_at(&mut self, offset: u64, data: &[u8]) -> BlockIOResult;

    /// Reads `buf.len()` bytes into `buf` from `offset` (relative to the
    /// partition offset). Short reads are errors.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BlockIOResult;

    /// Flushes any buffered data (may be a no-op).
    fn flush(&mut self) -> BlockIOResult;

    fn set_offset(&mut self, partition_offset: u64) -> u64;
    fn partition_offset(&self) -> u64;
}

/// Extension helpers for BlockIO.
///
/// Provides convenient helpers:
/// - zero fill
/// - low-level primitive helpers (read_u16_at/read_u32_at/read_u64_at, ...)
pub trait BlockIOExt: BlockIO {
    /// Fills a region with zeroes.
    #[inline(always)]
    fn zero_fill(&mut self, offset: u64, len: usize) -> BlockIOResult {
        const ZERO_BUF: [u8; BLOCK_BUF_SIZE] = [0u8; BLOCK_BUF_SIZE];
        let mut remaining = len;
        let mut off = offset;
        while remaining > 0 {
            let chunk = remaining.min(ZERO_BUF.len());
            self.write_at(off, &ZERO_BUF[..chunk])?;
            off += chunk as u64;
            remaining -= chunk;
        }
        Ok(())
    }

    // Implements read/write helpers for primitive little-endian types.
    blockio_impl_primitive_rw!(u16, u32, u64);
}

impl<T: BlockIO + ?Sized> BlockIOExt for T {}

/// Trait for setting the length of a BlockIO object.
///
/// Allows resizing the underlying storage (if supported by the backend).
pub trait BlockIOSetLen: BlockIO {
    /// Sets the length of the storage.
    fn set_len(&mut self, len: u64) -> BlockIOResult;
}

/// Extension trait for reading structs using zerocopy.
///
/// Requires the struct to implement zerocopy traits for safe conversion.
pub trait BlockIOStructExt: BlockIO {
    /// Reads a struct of type `T` from the given offset.
    fn read_struct<T: zerocopy::FromBytes + zerocopy::KnownLayout + zerocopy::Immutable>(
        &mut self,
        offset: u64,
    ) -> BlockIOResult<T> {
        let size = core::mem::size_of::<T>();
        assert!(size <= BLOCK_BUF_SIZE, "read_struct: type too large");
        let mut buf = [0u8; BLOCK_BUF_SIZE];
        self.read_at(offset, &mut buf[..size])?;
        T::read_from_bytes(&buf[..size]).map_err(|_| BlockIOError::Other("read_struct failed"))
    }
}

impl<T: BlockIO + ?Sized> BlockIOStructExt for T {}
