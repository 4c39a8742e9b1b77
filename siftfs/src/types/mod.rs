// SPDX-License-Identifier: MIT
//! On-disk structures. All multi-byte fields are little-endian.

mod checkpoint;
mod sit;
mod superblock;

pub use checkpoint::*;
pub use sit::*;
pub use superblock::*;
