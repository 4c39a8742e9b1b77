// SPDX-License-Identifier: MIT

use std::io::{Error, Read, Seek, SeekFrom, Write};

use crate::{BlockIO, BlockIOError, BlockIOResult, BlockIOSetLen};

/// File-backed implementation of `BlockIO`.
///
/// Access is explicitly positioned (seek-then-read/write); metadata regions
/// of a filesystem image are scattered, so no sequential cursor is kept.
#[derive(Debug)]
pub struct StdBlockIO<'a, T: Read + Write + Seek> {
    io: &'a mut T,
    partition_offset: u64,
}

impl<'a, T: Read + Write + Seek> StdBlockIO<'a, T> {
    #[inline]
    pub fn new(io: &'a mut T) -> Self {
        Self {
            io,
            partition_offset: 0,
        }
    }

    #[inline]
    pub fn new_with_offset(io: &'a mut T, partition_offset: u64) -> Self {
        Self {
            io,
            partition_offset,
        }
    }
}

impl<'a, T: Read + Write + Seek> BlockIO for StdBlockIO<'a, T> {
    fn write_at(&mut self, offset: u64, data: &[u8]) -> BlockIOResult {
        let abs_offset = self.partition_offset + offset;
        self.io.seek(SeekFrom::Start(abs_offset))?;
        self.io.write_all(data)?;
        Ok(())
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BlockIOResult {
        let abs_offset = self.partition_offset + offset;
        self.io.seek(SeekFrom::Start(abs_offset))?;
        self.io.read_exact(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> BlockIOResult {
        self.io.flush()?;
        Ok(())
    }

    #[inline]
    fn set_offset(&mut self, partition_offset: u64) -> u64 {
        self.partition_offset = partition_offset;
        partition_offset
    }

    #[inline]
    fn partition_offset(&self) -> u64 {
        self.partition_offset
    }
}

impl<'a> BlockIOSetLen for StdBlockIO<'a, std::fs::File> {
    fn set_len(&mut self, len: u64) -> BlockIOResult {
        self.io.set_len(self.partition_offset + len)?;
        self.flush()?;
        self.io.seek(SeekFrom::Start(0))?;
        Ok(())
    }
}

impl From<Error> for BlockIOError {
    #[cold]
    #[inline(never)]
    fn from(e: Error) -> Self {
        // Leak the string to produce a 'static str. Acceptable for error mapping.
        let leaked_str: &'static str = Box::leak(e.to_string().into_boxed_str());
        BlockIOError::Other(leaked_str)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::prelude::*;
    use tempfile::tempfile;

    #[test]
    fn test_rw() {
        let mut file = tempfile().unwrap();
        let mut io = StdBlockIO::new(&mut file);
        io.write_at(10, &[1, 2, 3, 4]).unwrap();

        let mut output = [0u8; 4];
        io.read_at(10, &mut output).unwrap();
        assert_eq!(output, [1, 2, 3, 4]);
    }

    #[test]
    fn test_short_read_is_error() {
        let mut file = tempfile().unwrap();
        let mut io = StdBlockIO::new(&mut file);
        io.write_at(0, &[0xAA; 8]).unwrap();

        let mut buf = [0u8; 16];
        assert!(io.read_at(0, &mut buf).is_err());
    }

    #[test]
    fn test_partition_offset() {
        let mut file = tempfile().unwrap();
        let mut io = StdBlockIO::new_with_offset(&mut file, 512);
        io.write_at(0, &[0xEE; 4]).unwrap();

        io.set_offset(0);
        let mut buf = [0u8; 4];
        io.read_at(512, &mut buf).unwrap();
        assert_eq!(buf, [0xEE; 4]);
    }

    #[test]
    fn test_set_len() {
        let mut file = tempfile().unwrap();
        let mut io = StdBlockIO::new(&mut file);

        io.write_at(0, &[1u8; 32]).unwrap();
        io.set_len(4096).unwrap();

        let mut tail = [0xFFu8; 8];
        io.read_at(4088, &mut tail).unwrap();
        assert_eq!(tail, [0u8; 8]);
    }

    #[test]
    fn test_primitive_rw() {
        let mut file = tempfile().unwrap();
        let mut io = StdBlockIO::new(&mut file);

        io.write_u64_at(24, 0xDEAD_BEEF_CAFE_F00D).unwrap();
        assert_eq!(io.read_u64_at(24).unwrap(), 0xDEAD_BEEF_CAFE_F00D);
        assert_eq!(io.read_u32_at(24).unwrap(), 0xCAFE_F00D);
    }
}
