//! FAT (File Allocation Table) lookups
//!
//! The FAT is an array of 32-bit entries that form cluster chains.
//! Only the first FAT copy is consulted, and only to find the next
//! cluster of a directory.

use byteorder::{ByteOrder, LittleEndian};

use super::block_source::BlockSource;
use super::boot_sector::VolumeGeometry;
use crate::error::Result;

/// Size of one FAT32 entry in bytes
const FAT_ENTRY_SIZE: u64 = 4;

/// FAT entry types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatEntry {
    /// Cluster is free (0x00000000)
    Free,
    /// Reserved cluster (0x00000001)
    Reserved,
    /// Data cluster - value is next cluster number
    Data(u32),
    /// Bad cluster (0x0FFFFFF7)
    BadCluster,
    /// End of cluster chain (0x0FFFFFF8-0x0FFFFFFF)
    EndOfChain,
}

impl FatEntry {
    /// Parse raw 32-bit FAT entry value
    ///
    /// FAT32 uses only the lower 28 bits, upper 4 bits are reserved.
    pub fn from_raw(value: u32) -> Self {
        match value & 0x0FFFFFFF {
            0x00000000 => FatEntry::Free,
            0x00000001 => FatEntry::Reserved,
            0x0FFFFFF7 => FatEntry::BadCluster,
            0x0FFFFFF8..=0x0FFFFFFF => FatEntry::EndOfChain,
            n => FatEntry::Data(n),
        }
    }

    /// Next cluster number if this entry continues a chain
    #[inline]
    pub fn next_cluster(&self) -> Option<u32> {
        match self {
            FatEntry::Data(n) => Some(*n),
            _ => None,
        }
    }
}

/// Read the FAT entry for `cluster` from the first FAT copy.
pub fn read_fat_entry<S: BlockSource + ?Sized>(
    source: &mut S,
    geometry: &VolumeGeometry,
    cluster: u32,
) -> Result<FatEntry> {
    let offset = geometry.fat_start_sector() * geometry.bytes_per_sector as u64
        + cluster as u64 * FAT_ENTRY_SIZE;
    let mut raw = [0u8; FAT_ENTRY_SIZE as usize];
    source.read_at(offset, &mut raw)?;
    Ok(FatEntry::from_raw(LittleEndian::read_u32(&raw)))
}
