//! FAT32 Boot Sector Parser
//!
//! Decodes the BIOS Parameter Block fields needed to locate data
//! clusters, and maps cluster numbers to byte offsets in the image.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Fat32Error, Result};

/// Size of the boot sector read from the start of the image
pub const BOOT_SECTOR_SIZE: usize = 512;

/// Offset of the trailing boot signature: 446 bytes of boot code plus
/// four 16-byte partition slots
pub const SIGNATURE_OFFSET: u64 = 446 + 16 * 4;

/// Expected boot signature, read little-endian
pub const BOOT_SIGNATURE: u16 = 0xAA55;

/// Volume geometry decoded from the BPB
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeGeometry {
    /// Bytes per sector (512, 1024, 2048 or 4096)
    pub bytes_per_sector: u16,
    /// Sectors per cluster (power of 2, 1-128)
    pub sectors_per_cluster: u8,
    /// Number of reserved sectors before first FAT
    pub reserved_sectors: u16,
    /// Number of FAT tables (usually 2)
    pub fat_count: u8,
    /// Total sectors in filesystem
    pub total_sectors: u32,
    /// Sectors per FAT table
    pub sectors_per_fat: u32,
    /// Root directory starting cluster
    pub root_cluster: u32,
}

impl VolumeGeometry {
    /// Decode the BPB from a boot sector.
    ///
    /// Each field is an independent little-endian read at a fixed offset.
    /// Nothing is validated here: an implausible boot sector yields
    /// implausible geometry, and the signature check is done separately
    /// by [`check_signature`].
    pub fn decode(data: &[u8; BOOT_SECTOR_SIZE]) -> Self {
        VolumeGeometry {
            bytes_per_sector: LittleEndian::read_u16(&data[11..13]),
            sectors_per_cluster: data[13],
            reserved_sectors: LittleEndian::read_u16(&data[14..16]),
            fat_count: data[16],
            total_sectors: LittleEndian::read_u32(&data[32..36]),
            sectors_per_fat: LittleEndian::read_u32(&data[36..40]),
            root_cluster: LittleEndian::read_u32(&data[44..48]),
        }
    }

    /// First sector of the FAT region
    #[inline]
    pub fn fat_start_sector(&self) -> u64 {
        self.reserved_sectors as u64
    }

    /// First sector of the data region (cluster 2)
    #[inline]
    pub fn data_start_sector(&self) -> u64 {
        self.reserved_sectors as u64 + self.fat_count as u64 * self.sectors_per_fat as u64
    }

    #[inline]
    pub fn bytes_per_cluster(&self) -> u64 {
        self.bytes_per_sector as u64 * self.sectors_per_cluster as u64
    }

    /// Absolute byte offset of a data cluster.
    ///
    /// Clusters 0 and 1 do not address data; asking for them is an
    /// [`Fat32Error::InvalidCluster`] instead of a wrapped offset.
    pub fn cluster_offset(&self, cluster: u32) -> Result<u64> {
        if cluster < 2 {
            return Err(Fat32Error::InvalidCluster { cluster });
        }
        let sector = (cluster as u64 - 2) * self.sectors_per_cluster as u64
            + self.data_start_sector();
        Ok(sector * self.bytes_per_sector as u64)
    }

    /// Zero values that would make every cluster land on the same offset.
    pub fn degenerate_field(&self) -> Option<&'static str> {
        if self.bytes_per_sector == 0 {
            Some("bytes per sector")
        } else if self.sectors_per_cluster == 0 {
            Some("sectors per cluster")
        } else {
            None
        }
    }
}

impl fmt::Display for VolumeGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "____BIOS Parameter Block data____")?;
        writeln!(f, "BPB_BytsPerSec: {}", self.bytes_per_sector)?;
        writeln!(f, "BPB_FATSz32: {}", self.sectors_per_fat)?;
        writeln!(f, "BPB_NumFATs: {}", self.fat_count)?;
        writeln!(f, "BPB_RootClus: {}", self.root_cluster)?;
        writeln!(f, "BPB_RsvdSecCnt: {}", self.reserved_sectors)?;
        writeln!(f, "BPB_SecPerClus: {}", self.sectors_per_cluster)?;
        write!(f, "BPB_TotSec32: {}", self.total_sectors)
    }
}

/// Verify the 0xAA55 trailer of a boot sector.
pub fn check_signature(data: &[u8; BOOT_SECTOR_SIZE]) -> Result<()> {
    let at = SIGNATURE_OFFSET as usize;
    let found = LittleEndian::read_u16(&data[at..at + 2]);
    if found != BOOT_SIGNATURE {
        return Err(Fat32Error::SignatureMismatch { found });
    }
    Ok(())
}
