// SPDX-License-Identifier: MIT

use core::fmt;

pub use siftio::errors::*;

/// Result type for scan operations.
pub type ScanResult<T = ()> = Result<T, ScanError>;

/// Error type for scan operations.
///
/// Every variant is fatal to the scan in progress: there is no retry and a
/// partially loaded context is never handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanError {
    IO(BlockIOError),
    /// Superblock magic mismatch; the value found is carried for diagnosis.
    BadMagic(u32),
    /// Metadata that parsed but cannot describe a real filesystem.
    Corrupt(&'static str),
    /// Neither checkpoint pack passed the header/trailer version check.
    NoValidCheckpoint,
    /// Allocation failure for the capacity-proportional SIT buffers.
    OutOfMemory,
    /// The visitor stopped the scan. A normal, reportable termination.
    Aborted,
}

impl ScanError {
    pub fn msg(&self) -> &'static str {
        match self {
            ScanError::IO(_) => "IO error",
            ScanError::BadMagic(_) => "Not a valid filesystem superblock",
            ScanError::Corrupt(msg) => msg,
            ScanError::NoValidCheckpoint => "No valid checkpoint pack",
            ScanError::OutOfMemory => "Out of memory",
            ScanError::Aborted => "Scan aborted by consumer",
        }
    }

    pub fn source_io(&self) -> Option<&BlockIOError> {
        match self {
            ScanError::IO(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BlockIOError> for ScanError {
    fn from(e: BlockIOError) -> Self {
        ScanError::IO(e)
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        if let ScanError::BadMagic(found) = self {
            write!(f, " (magic: {found:#010X})")?;
        }
        if let Some(src) = self.source_io() {
            write!(f, "\n  caused by: {}", src.msg())?;
        }
        Ok(())
    }
}

impl std::error::Error for ScanError {}
